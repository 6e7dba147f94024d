use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Anything but a Unicode letter, decimal digit or underscore.
    static ref NOT_IDENT: Regex = Regex::new(r"[^\p{L}\p{Nd}_]").unwrap();
    static ref LEADING_DIGIT: Regex = Regex::new(r"^\p{Nd}").unwrap();
}

/// Go reserved words. A package name derived from an import path must not be
/// one of these.
pub const GO_KEYWORDS: [&str; 25] = [
    "break", "case", "chan", "const", "continue", "default", "defer", "else",
    "fallthrough", "for", "func", "go", "goto", "if", "import", "interface",
    "map", "package", "range", "return", "select", "struct", "switch", "type",
    "var",
];

pub fn is_go_keyword(s: &str) -> bool {
    GO_KEYWORDS.contains(&s)
}

/// Converts a proto identifier to an exported Go identifier.
/// - An interior underscore followed by a lower case letter is dropped and the
///   letter is upper cased.
/// - A leading underscore becomes `X`.
/// - Digits are kept and start a new word.
///
/// `_my_field_name_2` becomes `XMyFieldName_2`.
pub fn camel_case(s: &str) -> String {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return String::new();
    }
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len() + 1);
    let mut i = 0;
    if bytes[0] == b'_' {
        out.push(b'X');
        i += 1;
    }
    while i < bytes.len() {
        let c = bytes[i];
        if c == b'_' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_lowercase() {
            i += 1;
            continue;
        }
        if c.is_ascii_digit() {
            out.push(c);
            i += 1;
            continue;
        }
        out.push(c.to_ascii_uppercase());
        while i + 1 < bytes.len() && bytes[i + 1].is_ascii_lowercase() {
            i += 1;
            out.push(bytes[i]);
        }
        i += 1;
    }
    match String::from_utf8(out) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

/// Like [`camel_case`], for a name split into scope segments joined by `_`.
pub fn camel_case_slice(segments: &[String]) -> String {
    camel_case(&segments.join("_"))
}

pub fn dotted(segments: &[String]) -> String {
    segments.join(".")
}

/// Maps every character that cannot appear in a Go identifier to `_`.
pub fn sanitize(name: &str) -> String {
    NOT_IDENT.replace_all(name, "_").into_owned()
}

/// Whether `name` starts with a decimal digit, in any script.
pub fn starts_with_digit(name: &str) -> bool {
    LEADING_DIGIT.is_match(name)
}

/// The last path element of `name` with its final dotted suffix removed.
pub fn base_name(name: &str) -> &str {
    let name = match name.rfind('/') {
        Some(i) => &name[i + 1..],
        None => name,
    };
    match name.rfind('.') {
        Some(i) => &name[..i],
        None => name,
    }
}

/// Go's `path.Dir`: everything before the last slash, or `.`.
pub fn dir_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(i) => &path[..i],
        None => ".",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_words() {
        assert_eq!(camel_case("foo"), "Foo");
        assert_eq!(camel_case("foo_bar"), "FooBar");
        assert_eq!(camel_case("fooBar"), "FooBar");
        assert_eq!(camel_case("FOO_BAR"), "FOO_BAR");
        assert_eq!(camel_case("_my_field_name_2"), "XMyFieldName_2");
        assert_eq!(camel_case("field2"), "Field2");
        assert_eq!(camel_case(""), "");
    }

    #[test]
    fn camel_case_scopes() {
        let segments = vec!["Outer".to_string(), "Inner".to_string()];
        assert_eq!(camel_case_slice(&segments), "Outer_Inner");
        assert_eq!(dotted(&segments), "Outer.Inner");

        // a lower case scope loses its separator
        let segments = vec!["outer".to_string(), "inner_msg".to_string()];
        assert_eq!(camel_case_slice(&segments), "OuterInnerMsg");
    }

    #[test]
    fn sanitizes_package_names() {
        assert_eq!(sanitize("foo.bar-baz"), "foo_bar_baz");
        assert_eq!(sanitize("a/b"), "a_b");
        assert_eq!(sanitize("plain_name9"), "plain_name9");
        assert_eq!(sanitize("größe٣"), "größe٣");
        // letter numbers and fractions are not identifier characters
        assert_eq!(sanitize("vⅫ½"), "v__");
    }

    #[test]
    fn leading_digits() {
        assert!(starts_with_digit("9lives"));
        assert!(starts_with_digit("٣x"));
        assert!(!starts_with_digit("Ⅻ"));
        assert!(!starts_with_digit("½"));
        assert!(!starts_with_digit(""));
    }

    #[test]
    fn path_helpers() {
        assert_eq!(base_name("a/b/c.proto"), "c");
        assert_eq!(base_name("c.v2.proto"), "c.v2");
        assert_eq!(base_name("noext"), "noext");
        assert_eq!(dir_name("a/b/c.pb.go"), "a/b");
        assert_eq!(dir_name("c.pb.go"), ".");
    }

    #[test]
    fn keywords() {
        assert!(is_go_keyword("type"));
        assert!(is_go_keyword("func"));
        assert!(!is_go_keyword("proto"));
    }
}
