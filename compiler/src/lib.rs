//! protogo-compiler
//!
//! The core of `protoc-gen-go`. From a `CodeGeneratorRequest` it:
//!  1) Wraps the descriptors into an arena of files, messages, enums and
//!     extensions (`wrap`, `types`),
//!  2) Assigns Go package names and resolves type references (`packages`,
//!     `resolver`),
//!  3) Maps fields to Go types and struct tags (`mapper`, `alloc`),
//!  4) Emits one Go file per requested proto file (`emit`, `generator`),
//!  5) Checks and lays out every emitted file (`tokenizer`, `verifier`).

pub mod alloc;
pub mod emit;
pub mod error;
pub mod generator;
pub mod mapper;
pub mod naming;
pub mod packages;
pub mod params;
pub mod plugin;
pub mod printer;
pub mod resolver;
pub mod summary;
pub mod tokenizer;
pub mod types;
pub mod utils;
pub mod verifier;
pub mod wrap;

#[cfg(test)]
mod testing;

use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};

pub use error::GeneratorError;
pub use generator::Generator;
pub use plugin::Plugin;
pub use summary::RequestSummary;
pub use verifier::{format_source, verify_source};

/// Runs a request through the generator with no plugins registered.
pub fn generate(request: CodeGeneratorRequest) -> Result<CodeGeneratorResponse, GeneratorError> {
    generate_with_plugins(request, Vec::new())
}

/// Runs a request through the generator. Plugins run only when the request
/// enables them with the `plugins=` parameter.
pub fn generate_with_plugins(
    request: CodeGeneratorRequest,
    plugins: Vec<Box<dyn Plugin>>,
) -> Result<CodeGeneratorResponse, GeneratorError> {
    let mut gen = Generator::new(request)?;
    for plugin in plugins {
        gen.register_plugin(plugin);
    }
    gen.generate_all()
}

/// Describes a request without generating anything.
pub fn describe(request: CodeGeneratorRequest) -> Result<RequestSummary, GeneratorError> {
    RequestSummary::of(&Generator::new(request)?)
}
