use std::collections::BTreeSet;

/// Accumulates the body of one generated file.
///
/// Packages referenced while printing are collected on the side so that the
/// import block can be written once the body is complete.
#[derive(Debug, Clone, Default)]
pub struct Printer {
    body:    String,
    indent:  usize,
    enabled: bool,
    used:    BTreeSet<String>,
}

impl Printer {
    /// A disabled printer records package use but drops all text. Files that
    /// are only walked for their exports are emitted through one.
    pub fn new(enabled: bool) -> Printer {
        Printer {
            enabled,
            ..Default::default()
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn line(&mut self, text: impl AsRef<str>) {
        if !self.enabled {
            return;
        }
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.indent {
                self.body.push('\t');
            }
            self.body.push_str(text);
        }
        self.body.push('\n');
    }

    pub fn blank(&mut self) {
        self.line("");
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn outdent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    pub fn use_package(&mut self, pkg: &str) {
        if !self.used.contains(pkg) {
            self.used.insert(pkg.to_string());
        }
    }

    pub fn is_used(&self, pkg: &str) -> bool {
        self.used.contains(pkg)
    }

    pub fn used(&self) -> &BTreeSet<String> {
        &self.used
    }

    pub fn into_body(self) -> String {
        self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indents_with_tabs() {
        let mut p = Printer::new(true);
        p.line("func f() {");
        p.indent();
        p.line("return");
        p.blank();
        p.outdent();
        p.outdent();
        p.line("}");
        assert_eq!(p.into_body(), "func f() {\n\treturn\n\n}\n");
    }

    #[test]
    fn disabled_printer_still_tracks_packages() {
        let mut p = Printer::new(false);
        p.line("var x = fmt.Sprint(1)");
        p.use_package("fmt");
        assert!(p.is_used("fmt"));
        assert!(!p.is_used("math"));
        assert_eq!(p.into_body(), "");
    }
}
