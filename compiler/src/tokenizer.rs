use lazy_static::lazy_static;
use regex::Regex;

use crate::error::GeneratorError;
use crate::utils::{numbered_listing, quote};

lazy_static! {
    pub static ref GO_TOKEN_REGEX: Regex = Regex::new(concat!(
        r"(?s)(",
        r"//[^\n]*|/\*.*?\*/",
        r#"|"(?:[^"\\\n]|\\.)*"|`[^`]*`|'(?:[^'\\\n]|\\.)*'"#,
        r"|\n|[ \t\r]+",
        r"|[\p{L}_][\p{L}\p{N}_]*",
        r"|\.?[0-9](?:[eEpP][+-]|[0-9A-Za-z_.])*",
        r"|<<=|>>=|&\^=|\.\.\.|&&|\|\||<-|\+\+|--|==|!=|<=|>=|:=|<<|>>|&\^|[-+*/%&|^]=",
        r"|[-+*/%&|^<>=!~(){}\[\],;:.]",
        r")"
    ))
    .unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Comment,
    /// Interpreted, raw and rune literals.
    Literal,
    Ident,
    Number,
    Punct,
    Space,
    Newline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind:   TokenKind,
    pub text:   String,
    pub line:   usize,
    pub column: usize,
}

impl Token {
    pub fn is(&self, text: &str) -> bool {
        self.kind != TokenKind::Literal && self.kind != TokenKind::Comment && self.text == text
    }

    /// Comments and whitespace, which carry no meaning to the parser. Block
    /// comments spanning lines still end a line.
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Comment | TokenKind::Space)
    }

    pub fn ends_line(&self) -> bool {
        self.kind == TokenKind::Newline || (self.kind == TokenKind::Comment && self.text.contains('\n'))
    }
}

fn classify(part: &str) -> TokenKind {
    match part.chars().next() {
        Some('\n') => TokenKind::Newline,
        Some(' ') | Some('\t') | Some('\r') => TokenKind::Space,
        Some('"') | Some('`') | Some('\'') => TokenKind::Literal,
        Some('/') if part.starts_with("//") || part.starts_with("/*") => TokenKind::Comment,
        Some(c) if c.is_ascii_digit() => TokenKind::Number,
        Some('.') if part.len() > 1 && part != "..." => TokenKind::Number,
        Some(c) if c == '_' || c.is_alphabetic() => TokenKind::Ident,
        _ => TokenKind::Punct,
    }
}

fn syntax_error(source: &str, message: String, line: usize, column: usize) -> GeneratorError {
    GeneratorError::BadSource {
        message: format!("{}:{}: {}", line, column, message),
        listing: numbered_listing(source),
    }
}

/// Splits Go source into tokens, whitespace and comments included, so that
/// the text can be reassembled from them.
pub fn tokenize_go(text: &str) -> Result<Vec<Token>, GeneratorError> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut line = 1;
    let mut column = 1;
    let mut last_end = 0;

    for mat in GO_TOKEN_REGEX.find_iter(text) {
        let start = mat.start();
        let part = mat.as_str();

        if start > last_end {
            let unexpected = &text[last_end..start];
            return Err(syntax_error(
                text,
                format!("illegal character or unterminated literal {}", quote(unexpected)),
                line,
                column,
            ));
        }

        let kind = classify(part);
        if part == "*" {
            if let Some(prev) = tokens.last() {
                if prev.is("/") && prev.line == line && prev.column + 1 == column {
                    return Err(syntax_error(text, "comment not terminated".to_string(), prev.line, prev.column));
                }
            }
        }
        tokens.push(Token {
            kind,
            text: part.to_string(),
            line,
            column,
        });

        let newline_count = part.matches('\n').count();
        if newline_count > 0 {
            line += newline_count;
            if let Some(last_line_part) = part.split('\n').last() {
                column = last_line_part.len() + 1;
            }
        } else {
            column += part.len();
        }

        last_end = mat.end();
    }

    if last_end != text.len() {
        let unexpected = &text[last_end..];
        return Err(syntax_error(
            text,
            format!("illegal character or unterminated literal {}", quote(unexpected)),
            line,
            column,
        ));
    }

    Ok(tokens)
}
