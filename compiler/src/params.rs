use std::collections::BTreeMap;

use serde::Serialize;

/// The comma separated `key=value` parameter string passed by protoc, e.g.
/// `--go_out=plugins=grpc,import_path=foo,Mbar.proto=example.com/bar:.`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Parameters {
    /// Every pair as given, including the recognized ones.
    pub raw:           BTreeMap<String, String>,
    /// Prepended to every non-stdlib import path.
    pub import_prefix: String,
    /// Go import path of the package being generated.
    pub import_path:   String,
    /// `M<file>=<import path>` remaps, keyed by proto file name.
    pub import_map:    BTreeMap<String, String>,
    /// `None` enables no plugins, an empty list enables every registered one.
    pub plugins:       Option<Vec<String>>,
}

impl Parameters {
    pub fn parse(parameter: &str) -> Parameters {
        let mut params = Parameters::default();

        for pair in parameter.split(',') {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = match pair.find('=') {
                Some(i) => (&pair[..i], &pair[i + 1..]),
                None => (pair, ""),
            };
            params.raw.insert(key.to_string(), value.to_string());

            match key {
                "import_prefix" => params.import_prefix = value.to_string(),
                "import_path" => params.import_path = value.to_string(),
                // an empty list enables everything, so only a bare
                // `plugins=` may produce one
                "plugins" if value.is_empty() => params.plugins = Some(Vec::new()),
                "plugins" => params.plugins = Some(value.split('+').map(str::to_string).collect()),
                _ => {
                    if let Some(file) = key.strip_prefix('M') {
                        params.import_map.insert(file.to_string(), value.to_string());
                    }
                }
            }
        }

        params
    }

    /// Whether a plugin registered under `name` should run.
    pub fn plugin_enabled(&self, name: &str) -> bool {
        match &self.plugins {
            None => false,
            Some(list) if list.is_empty() => true,
            Some(list) => list.iter().any(|p| p == name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_keys() {
        let p = Parameters::parse("import_prefix=x/,import_path=a/b/c,plugins=grpc+cgi,Mfoo/bar.proto=example.com/bar,other");
        assert_eq!(p.import_prefix, "x/");
        assert_eq!(p.import_path, "a/b/c");
        assert_eq!(p.plugins, Some(vec!["grpc".to_string(), "cgi".to_string()]));
        assert_eq!(p.import_map.get("foo/bar.proto").map(String::as_str), Some("example.com/bar"));
        assert_eq!(p.raw.get("other").map(String::as_str), Some(""));
        assert_eq!(p.raw.len(), 5);
    }

    #[test]
    fn value_keeps_later_equals_signs() {
        let p = Parameters::parse("Ma.proto=x.com/y=z");
        assert_eq!(p.import_map.get("a.proto").map(String::as_str), Some("x.com/y=z"));
    }

    #[test]
    fn plugin_selection() {
        let none = Parameters::parse("");
        assert!(!none.plugin_enabled("grpc"));

        let all = Parameters::parse("plugins=");
        assert!(all.plugin_enabled("grpc"));
        assert!(all.plugin_enabled("anything"));

        let some = Parameters::parse("plugins=grpc");
        assert!(some.plugin_enabled("grpc"));
        assert!(!some.plugin_enabled("cgi"));
    }

    #[test]
    fn blank_plugin_names_enable_nothing() {
        for parameter in ["plugins=+", "plugins=++"] {
            let p = Parameters::parse(parameter);
            assert!(!p.plugin_enabled("grpc"), "{}", parameter);
        }

        let p = Parameters::parse("plugins=grpc+");
        assert!(p.plugin_enabled("grpc"));
        assert!(!p.plugin_enabled("cgi"));
    }
}
