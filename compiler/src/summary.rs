//! A serializable overview of a request, for inspecting what protoc sent.

use serde::Serialize;

use crate::error::GeneratorError;
use crate::generator::Generator;
use crate::naming::dotted;
use crate::params::Parameters;
use crate::types::FileId;

#[derive(Debug, Serialize)]
pub struct RequestSummary {
    pub package_name: String,
    pub parameters:   Parameters,
    pub files:        Vec<FileSummary>,
}

#[derive(Debug, Serialize)]
pub struct FileSummary {
    pub name:          String,
    pub proto_package: String,
    pub syntax:        &'static str,
    pub generated:     bool,
    pub go_package:    String,
    /// Empty for files that are not being generated.
    pub output:        String,
    pub dependencies:  Vec<String>,
    pub public:        Vec<String>,
    pub messages:      Vec<String>,
    pub enums:         Vec<String>,
    pub extensions:    Vec<String>,
}

impl RequestSummary {
    pub fn of(gen: &Generator) -> Result<RequestSummary, GeneratorError> {
        let files = gen
            .set
            .file_ids()
            .map(|id| file_summary(gen, id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RequestSummary {
            package_name: gen.package_name.clone(),
            parameters: gen.params.clone(),
            files,
        })
    }
}

fn file_summary(gen: &Generator, id: FileId) -> Result<FileSummary, GeneratorError> {
    let fd = gen.set.file(id);
    let generated = gen.is_generated(id);
    Ok(FileSummary {
        name: fd.name().to_string(),
        proto_package: fd.proto.package().to_string(),
        syntax: if fd.proto3 { "proto3" } else { "proto2" },
        generated,
        go_package: gen.packages.of(id)?.to_string(),
        output: if generated { fd.go_file_name() } else { String::new() },
        dependencies: fd.proto.dependency.clone(),
        public: fd
            .proto
            .public_dependency
            .iter()
            .filter_map(|&i| fd.proto.dependency.get(i as usize).cloned())
            .collect(),
        messages: fd
            .messages
            .iter()
            .map(|&m| dotted(&gen.set.message(m).type_name))
            .collect(),
        enums: fd
            .enums
            .iter()
            .map(|&e| dotted(&gen.set.enumeration(e).type_name))
            .collect(),
        extensions: fd
            .extensions
            .iter()
            .map(|&x| dotted(&gen.set.extension(x).type_name))
            .collect(),
    })
}
