use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::GeneratorError;
use crate::naming::{base_name, is_go_keyword, sanitize, starts_with_digit};
use crate::params::Parameters;
use crate::types::{DescriptorSet, FileId};

/// Support packages referenced by generated code, registered right after the
/// package being generated.
pub const BUILTIN_PACKAGES: [&str; 3] = ["fmt", "math", "proto"];

/// Registry of Go package names. Every file touched by a run and every
/// builtin gets a distinct identifier.
#[derive(Debug, Clone, Default)]
pub struct PackageNames {
    in_use:   HashSet<String>,
    by_file:  HashMap<FileId, String>,
    builtins: HashMap<&'static str, String>,
}

impl PackageNames {
    /// Sanitizes `candidate` and appends 1, 2, ... until the name is free.
    /// The first registrant of a name keeps it unmodified.
    pub fn register(&mut self, candidate: &str, file: Option<FileId>) -> String {
        let orig = sanitize(candidate);
        let mut pkg = orig.clone();
        let mut i = 1;
        while self.in_use.contains(&pkg) {
            pkg = format!("{}{}", orig, i);
            i += 1;
        }
        self.in_use.insert(pkg.clone());
        if let Some(file) = file {
            self.by_file.insert(file, pkg.clone());
        }
        pkg
    }

    fn register_builtin(&mut self, name: &'static str) {
        let pkg = self.register(name, None);
        self.builtins.insert(name, pkg);
    }

    /// The package name assigned to `file`.
    pub fn of(&self, file: FileId) -> Result<&str, GeneratorError> {
        self.by_file
            .get(&file)
            .map(String::as_str)
            .ok_or_else(|| GeneratorError::Internal(format!("no package name defined for file #{}", file.0)))
    }

    /// The local name of a builtin support package, e.g. `proto` or `proto1`.
    pub fn builtin<'a>(&'a self, name: &'a str) -> &'a str {
        self.builtins.get(name).map_or(name, String::as_str)
    }

    pub fn is_builtin(&self, pkg: &str) -> bool {
        self.builtins.values().any(|v| v == pkg)
    }

    /// Import path of a builtin, keyed by its local name.
    pub fn builtin_import_path(&self, pkg: &str) -> Option<&'static str> {
        let (&name, _) = self.builtins.iter().find(|(_, v)| v.as_str() == pkg)?;
        Some(match name {
            "proto" => "github.com/golang/protobuf/proto",
            other => other,
        })
    }
}

/// Package name derived from the `import_path` parameter, made a legal
/// identifier.
pub fn default_go_package(import_path: &str) -> Option<String> {
    let last = match import_path.rfind('/') {
        Some(i) => &import_path[i + 1..],
        None => import_path,
    };
    if last.is_empty() {
        return None;
    }
    let mut pkg = sanitize(last);
    if is_go_keyword(&pkg) {
        pkg.insert(0, '_');
    }
    if starts_with_digit(&pkg) {
        pkg.insert(0, '_');
    }
    Some(pkg)
}

/// A generated file's own idea of its package name, and whether it was
/// explicit. An `M` remap for the file wins over `go_package`.
fn declared_package(set: &DescriptorSet, file: FileId, params: &Parameters) -> (String, bool) {
    let fd = set.file(file);
    if let Some(path) = params.import_map.get(fd.name()) {
        let last = path.rsplit('/').next().unwrap_or(path);
        if !last.is_empty() {
            return (last.to_string(), true);
        }
    }
    fd.go_package_name()
}

/// Picks the package for the files being generated, checks that they agree,
/// then registers the builtins and a unique name for every other file.
/// Returns the registry and the generated package's name.
pub fn assign_package_names(
    set: &DescriptorSet,
    gen_files: &[FileId],
    params: &Parameters,
) -> Result<(PackageNames, String), GeneratorError> {
    let first = *gen_files.first().ok_or(GeneratorError::NoFilesToGenerate)?;
    let (mut pkg, mut explicit) = declared_package(set, first, params);

    for &f in gen_files {
        let (this, this_explicit) = declared_package(set, f, params);
        if this_explicit {
            if !explicit {
                pkg = this;
                explicit = true;
            } else if this != pkg {
                return Err(GeneratorError::InconsistentPackageNames {
                    found:    this,
                    expected: pkg,
                });
            }
        }
    }

    if !explicit {
        if let Some(p) = default_go_package(&params.import_path) {
            pkg = p;
            explicit = true;
        }
    }

    if !explicit {
        for &f in gen_files {
            let (this, _) = declared_package(set, f, params);
            if this != pkg {
                return Err(GeneratorError::InconsistentPackageNames {
                    found:    this,
                    expected: pkg,
                });
            }
        }
    }

    let mut names = PackageNames::default();
    let package_name = names.register(&pkg, Some(first));
    for builtin in BUILTIN_PACKAGES {
        names.register_builtin(builtin);
    }

    for file in set.file_ids() {
        if gen_files.contains(&file) {
            names.by_file.insert(file, package_name.clone());
            continue;
        }
        // A dependency's go_package only matters for its own output.
        let fd = set.file(file);
        let candidate = if fd.proto.package().is_empty() {
            base_name(fd.name())
        } else {
            fd.proto.package()
        };
        let assigned = names.register(candidate, Some(file));
        debug!(file = fd.name(), package = %assigned, "registered package");
    }

    Ok((names, package_name))
}
