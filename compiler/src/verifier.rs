//! A structural check and a canonical layout for generated Go source.
//!
//! This is not a Go parser. It checks what a faulty emitter is likely to get
//! wrong: bracket nesting, the package clause, the kinds of top-level
//! declarations and duplicate top-level names.

use std::collections::HashSet;

use crate::error::GeneratorError;
use crate::tokenizer::{tokenize_go, Token, TokenKind};
use crate::utils::{numbered_listing, quote};

pub const TOP_LEVEL_KEYWORDS: [&str; 5] = ["import", "type", "func", "var", "const"];

fn bad(source: &str, at: Option<&Token>, message: String) -> GeneratorError {
    let message = match at {
        Some(token) => format!("{}:{}: {}", token.line, token.column, message),
        None => message,
    };
    GeneratorError::BadSource {
        message,
        listing: numbered_listing(source),
    }
}

fn closer_of(open: &str) -> &'static str {
    match open {
        "(" => ")",
        "[" => "]",
        _ => "}",
    }
}

/// Whether a newline after `token` ends the statement.
fn ends_statement(token: &Token) -> bool {
    match token.kind {
        TokenKind::Ident | TokenKind::Number | TokenKind::Literal => true,
        TokenKind::Punct => matches!(token.text.as_str(), "++" | "--" | ")" | "]" | "}"),
        _ => false,
    }
}

/// Splits balanced tokens into the statements found at their outermost
/// level, following Go's semicolon insertion.
fn statements<'t>(tokens: &[&'t Token]) -> Vec<Vec<&'t Token>> {
    let mut result = Vec::new();
    let mut current: Vec<&Token> = Vec::new();
    let mut depth = 0usize;

    for &token in tokens {
        if token.ends_line() {
            if depth == 0 && current.last().map_or(false, |t| ends_statement(t)) {
                result.push(std::mem::take(&mut current));
            } else if depth > 0 {
                current.push(token);
            }
            continue;
        }
        if token.is_trivia() {
            continue;
        }
        if depth == 0 && token.is(";") {
            if !current.is_empty() {
                result.push(std::mem::take(&mut current));
            }
            continue;
        }
        match token.text.as_str() {
            "(" | "[" | "{" if token.kind == TokenKind::Punct => depth += 1,
            ")" | "]" | "}" if token.kind == TokenKind::Punct => depth = depth.saturating_sub(1),
            _ => {}
        }
        current.push(token);
    }
    if !current.is_empty() {
        result.push(current);
    }
    result
}

fn check_brackets(source: &str, tokens: &[Token]) -> Result<(), GeneratorError> {
    let mut stack: Vec<&Token> = Vec::new();
    for token in tokens.iter().filter(|t| t.kind == TokenKind::Punct) {
        match token.text.as_str() {
            "(" | "[" | "{" => stack.push(token),
            ")" | "]" | "}" => match stack.pop() {
                Some(open) if closer_of(&open.text) == token.text => {}
                Some(open) => {
                    return Err(bad(
                        source,
                        Some(token),
                        format!(
                            "expected {} to close {} at {}:{}, found {}",
                            quote(closer_of(&open.text)),
                            quote(&open.text),
                            open.line,
                            open.column,
                            quote(&token.text)
                        ),
                    ))
                }
                None => return Err(bad(source, Some(token), format!("unexpected {}", quote(&token.text)))),
            },
            _ => {}
        }
    }
    match stack.pop() {
        Some(open) => Err(bad(
            source,
            Some(open),
            format!("unexpected EOF, {} is never closed", quote(&open.text)),
        )),
        None => Ok(()),
    }
}

/// The tokens between the parentheses of a grouped declaration, or `None`
/// for a single spec.
fn group<'s, 't>(stmt: &'s [&'t Token]) -> Option<&'s [&'t Token]> {
    match stmt.get(1) {
        Some(t) if t.is("(") && stmt.last().map_or(false, |l| l.is(")")) => Some(&stmt[2..stmt.len() - 1]),
        _ => None,
    }
}

struct Names<'s> {
    source:  &'s str,
    values:  HashSet<String>,
    methods: HashSet<(String, String)>,
}

impl Names<'_> {
    fn define(&mut self, token: &Token) -> Result<(), GeneratorError> {
        if token.kind != TokenKind::Ident {
            return Err(bad(self.source, Some(token), format!("expected name, found {}", quote(&token.text))));
        }
        if token.text == "_" {
            return Ok(());
        }
        if !self.values.insert(token.text.clone()) {
            return Err(bad(self.source, Some(token), format!("{} redeclared in this block", token.text)));
        }
        Ok(())
    }

    fn func(&mut self, stmt: &[&Token]) -> Result<(), GeneratorError> {
        let name = match stmt.get(1) {
            Some(t) if t.is("(") => {
                let close = stmt.iter().position(|t| t.is(")")).unwrap_or(stmt.len());
                let receiver = stmt[2..close.max(2)]
                    .iter()
                    .rev()
                    .find(|t| t.kind == TokenKind::Ident)
                    .map(|t| t.text.clone())
                    .unwrap_or_default();
                let name = match stmt.get(close + 1) {
                    Some(t) if t.kind == TokenKind::Ident => *t,
                    other => {
                        return Err(bad(self.source, other.copied().or(stmt.first().copied()), "expected method name".to_string()))
                    }
                };
                if !self.methods.insert((receiver.clone(), name.text.clone())) {
                    return Err(bad(
                        self.source,
                        Some(name),
                        format!("method {}.{} already declared", receiver, name.text),
                    ));
                }
                return Ok(());
            }
            Some(t) => *t,
            None => return Err(bad(self.source, stmt.first().copied(), "expected function name".to_string())),
        };
        if name.is("init") {
            return Ok(());
        }
        self.define(name)
    }

    /// Names of one `var` or `const` spec, e.g. `a, b = 1, 2`.
    fn value_spec(&mut self, spec: &[&Token]) -> Result<(), GeneratorError> {
        let mut i = 0;
        loop {
            match spec.get(i) {
                Some(t) => self.define(t)?,
                None => return Ok(()),
            }
            if spec.get(i + 1).map_or(false, |t| t.is(",")) {
                i += 2;
            } else {
                return Ok(());
            }
        }
    }

    fn type_spec(&mut self, spec: &[&Token]) -> Result<(), GeneratorError> {
        match spec.first() {
            Some(t) => self.define(t),
            None => Ok(()),
        }
    }
}

fn check_import(source: &str, spec: &[&Token]) -> Result<(), GeneratorError> {
    let path = match spec {
        [path] => *path,
        [name, path] if name.kind == TokenKind::Ident || name.is(".") => *path,
        _ => return Err(bad(source, spec.first().copied(), "malformed import".to_string())),
    };
    if path.kind != TokenKind::Literal || !path.text.starts_with('"') {
        return Err(bad(source, Some(path), "import path must be a string".to_string()));
    }
    Ok(())
}

/// Checks `source` for the mistakes an emitter can make.
pub fn verify_source(source: &str) -> Result<(), GeneratorError> {
    let tokens = tokenize_go(source)?;
    check_brackets(source, &tokens)?;

    let significant: Vec<&Token> = tokens.iter().filter(|t| !t.is_trivia() || t.ends_line()).collect();
    let stmts = statements(&significant);

    let mut stmts = stmts.iter();
    match stmts.next() {
        Some(stmt) if stmt.len() == 2 && stmt[0].is("package") && stmt[1].kind == TokenKind::Ident => {}
        Some(stmt) => return Err(bad(source, stmt.first().copied(), "expected package clause".to_string())),
        None => return Err(bad(source, None, "expected package clause, found EOF".to_string())),
    }

    let mut names = Names {
        source,
        values: HashSet::new(),
        methods: HashSet::new(),
    };
    let mut imports_done = false;
    for stmt in stmts {
        let keyword = stmt[0];
        if !TOP_LEVEL_KEYWORDS.iter().any(|k| keyword.is(k)) {
            return Err(bad(
                source,
                Some(keyword),
                format!("non-declaration statement outside function body: {}", quote(&keyword.text)),
            ));
        }

        // line ends inside the parentheses are kept, so a group splits
        // into specs the same way the file splits into statements
        let specs = match group(stmt) {
            Some(inner) => statements(inner),
            None => vec![stmt[1..].to_vec()],
        };

        match keyword.text.as_str() {
            "import" => {
                if imports_done {
                    return Err(bad(source, Some(keyword), "imports must appear before other declarations".to_string()));
                }
                for spec in &specs {
                    check_import(source, spec)?;
                }
            }
            "func" => {
                imports_done = true;
                names.func(stmt)?;
            }
            "type" => {
                imports_done = true;
                for spec in &specs {
                    names.type_spec(spec)?;
                }
            }
            _ => {
                imports_done = true;
                for spec in &specs {
                    names.value_spec(spec)?;
                }
            }
        }
    }
    Ok(())
}

fn is_closer(token: &Token) -> bool {
    token.kind == TokenKind::Punct && matches!(token.text.as_str(), ")" | "]" | "}")
}

fn is_opener(token: &Token) -> bool {
    token.kind == TokenKind::Punct && matches!(token.text.as_str(), "(" | "[" | "{")
}

/// Lays out already verified source: tab indentation by nesting depth,
/// single spaces between tokens, no trailing whitespace and no runs of blank
/// lines. Multi-line comments and raw strings are kept as written.
fn layout(tokens: &[Token]) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < tokens.len() {
        // one physical line, up to the next newline token
        let mut end = i;
        while end < tokens.len() && tokens[end].kind != TokenKind::Newline {
            end += 1;
        }
        let line = &tokens[i..end];
        i = end + 1;

        let words: Vec<&Token> = line.iter().filter(|t| t.kind != TokenKind::Space).collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let leading_closers = words.iter().take_while(|t| is_closer(t)).count();
        let mut indent = depth.saturating_sub(leading_closers);
        if words[0].kind == TokenKind::Ident && (words[0].text == "case" || words[0].text == "default") {
            indent = indent.saturating_sub(1);
        }

        let mut text = "\t".repeat(indent);
        let mut pending_space = false;
        for (n, token) in line.iter().skip_while(|t| t.kind == TokenKind::Space).enumerate() {
            if token.kind == TokenKind::Space {
                pending_space = true;
                continue;
            }
            if pending_space && n > 0 {
                text.push(' ');
            }
            pending_space = false;
            text.push_str(&token.text);
            if is_opener(token) {
                depth += 1;
            } else if is_closer(token) {
                depth = depth.saturating_sub(1);
            }
        }
        lines.push(text);
    }

    let mut out = String::new();
    let mut blank = true;
    for line in &lines {
        if line.is_empty() {
            if !blank {
                out.push('\n');
            }
            blank = true;
            continue;
        }
        out.push_str(line);
        out.push('\n');
        blank = false;
    }
    while out.ends_with("\n\n") {
        out.pop();
    }
    out
}

/// Verifies `source` and returns it in canonical layout. The layout is a
/// fixed point: formatting its own output changes nothing.
pub fn format_source(source: &str) -> Result<String, GeneratorError> {
    verify_source(source)?;
    let formatted = layout(&tokenize_go(source)?);
    verify_source(&formatted)?;
    Ok(formatted)
}
