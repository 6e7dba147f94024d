use std::collections::HashMap;

use prost_types::compiler::{code_generator_response::File, CodeGeneratorRequest, CodeGeneratorResponse};
use tracing::debug;

use crate::emit::alias::Symbol;
use crate::emit::FileEmitter;
use crate::error::GeneratorError;
use crate::packages::{assign_package_names, PackageNames};
use crate::params::Parameters;
use crate::plugin::Plugin;
use crate::resolver::TypeTable;
use crate::types::{DescriptorSet, FileId, Object};
use crate::wrap::wrap_files;

/// State of one code generation run.
///
/// Everything is computed up front from the request, except the exported
/// symbol table which fills up as files are emitted in request order.
pub struct Generator {
    pub set:          DescriptorSet,
    pub params:       Parameters,
    pub packages:     PackageNames,
    pub types:        TypeTable,
    /// Go package shared by every generated file.
    pub package_name: String,
    /// Files to generate, in request order.
    pub gen_files:    Vec<FileId>,
    exports:          HashMap<Object, Vec<Symbol>>,
    plugins:          Vec<Box<dyn Plugin>>,
}

impl Generator {
    pub fn new(request: CodeGeneratorRequest) -> Result<Generator, GeneratorError> {
        if request.file_to_generate.is_empty() {
            return Err(GeneratorError::NoFilesToGenerate);
        }
        let params = Parameters::parse(request.parameter());
        let mut set = wrap_files(request.proto_file)?;

        let mut gen_files = Vec::with_capacity(request.file_to_generate.len());
        for name in &request.file_to_generate {
            let id = set
                .file_by_name(name)
                .ok_or_else(|| GeneratorError::FileNotFound(name.clone()))?;
            gen_files.push(id);
        }
        for (index, id) in gen_files.iter().enumerate() {
            set.files[id.0].index = index;
        }

        let (packages, package_name) = assign_package_names(&set, &gen_files, &params)?;
        let types = TypeTable::build(&set);
        debug!(
            package = %package_name,
            files = set.files.len(),
            types = types.len(),
            "wrapped request"
        );

        Ok(Generator {
            set,
            params,
            packages,
            types,
            package_name,
            gen_files,
            exports: HashMap::new(),
            plugins: Vec::new(),
        })
    }

    pub fn register_plugin(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Resolves a type reference made from `file`.
    pub fn resolve(&self, type_name: &str, file: FileId) -> Result<Object, GeneratorError> {
        self.types.resolve(&self.set, type_name, file)
    }

    pub fn is_generated(&self, file: FileId) -> bool {
        self.gen_files.contains(&file)
    }

    /// Symbols emitted for `obj`, available once its file has been emitted.
    pub fn exports(&self, obj: Object) -> &[Symbol] {
        self.exports.get(&obj).map_or(&[], Vec::as_slice)
    }

    /// Emits every file of the request in order.
    ///
    /// Files that are not being generated still go through the emitter so
    /// that their exported symbols are known to files importing them
    /// publicly; their text is discarded.
    pub fn generate_all(&mut self) -> Result<CodeGeneratorResponse, GeneratorError> {
        let mut plugins: Vec<Box<dyn Plugin>> = std::mem::take(&mut self.plugins)
            .into_iter()
            .filter(|p| self.params.plugin_enabled(p.name()))
            .collect();
        for plugin in plugins.iter_mut() {
            plugin.init(self);
        }

        let mut response = CodeGeneratorResponse::default();
        for file in self.set.file_ids() {
            let emitted = FileEmitter::new(self, file).run(&mut plugins)?;
            for (obj, sym) in emitted.exports {
                self.exports.entry(obj).or_default().push(sym);
            }
            if let Some(content) = emitted.content {
                let name = self.set.file(file).go_file_name();
                debug!(file = %name, bytes = content.len(), "generated");
                response.file.push(File {
                    name: Some(name),
                    content: Some(content),
                    ..Default::default()
                });
            }
        }

        self.plugins = plugins;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[test]
    fn empty_requests_are_rejected() {
        let req = request(vec![file("a.proto", "a", vec![])], &[], "");
        assert!(matches!(Generator::new(req), Err(GeneratorError::NoFilesToGenerate)));
    }

    #[test]
    fn unknown_files_are_rejected() {
        let req = request(vec![file("a.proto", "a", vec![])], &["b.proto"], "");
        match Generator::new(req) {
            Err(GeneratorError::FileNotFound(name)) => assert_eq!(name, "b.proto"),
            Err(other) => panic!("unexpected error {:?}", other),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn generated_files_are_indexed_in_request_order() {
        let req = request(
            vec![file("a.proto", "p", vec![]), file("b.proto", "p", vec![]), file("c.proto", "p", vec![])],
            &["c.proto", "a.proto"],
            "",
        );
        let gen = Generator::new(req).unwrap();
        assert_eq!(gen.gen_files, vec![FileId(2), FileId(0)]);
        assert_eq!(gen.set.file(FileId(2)).index, 0);
        assert_eq!(gen.set.file(FileId(0)).index, 1);
        assert!(gen.is_generated(FileId(0)));
        assert!(!gen.is_generated(FileId(1)));
        assert_eq!(gen.package_name, "p");
    }

    #[test]
    fn only_generated_files_are_written() {
        let dep = file("dep.proto", "dep", vec![message("D", vec![])]);
        let mut main = file("main.proto", "main", vec![message("M", vec![])]);
        main.dependency.push("dep.proto".to_string());
        let mut gen = Generator::new(request(vec![dep, main], &["main.proto"], "")).unwrap();
        let response = gen.generate_all().unwrap();
        assert_eq!(response.file.len(), 1);
        assert_eq!(response.file[0].name(), "main.pb.go");
        // the dependency was still walked for its exports
        assert!(!gen.exports(Object::Message(crate::types::MessageId(0))).is_empty());
    }
}
