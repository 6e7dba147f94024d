//! protogo
//!
//! Byte-level entry points for running `protoc-gen-go` as a library.
//!
//! - `generate_from_bytes` takes a serialized `CodeGeneratorRequest` and
//!   returns the serialized `CodeGeneratorResponse`
//! - `describe_to_json` summarizes a request without generating anything

use prost::Message;
use prost_types::compiler::CodeGeneratorRequest;

pub use protogo_compiler::error::GeneratorError;
pub use protogo_compiler::{generate, generate_with_plugins, Plugin, RequestSummary};

/// Decode a request, run the generator and encode the response.
pub fn generate_from_bytes(request: &[u8]) -> Result<Vec<u8>, GeneratorError> {
    generate_from_bytes_with_plugins(request, Vec::new())
}

/// Like `generate_from_bytes`, with extra plugins registered.
pub fn generate_from_bytes_with_plugins(
    request: &[u8],
    plugins: Vec<Box<dyn Plugin>>,
) -> Result<Vec<u8>, GeneratorError> {
    let request = CodeGeneratorRequest::decode(request)?;
    let response = generate_with_plugins(request, plugins)?;
    let mut buf = Vec::with_capacity(response.encoded_len());
    response.encode(&mut buf)?;
    Ok(buf)
}

/// Decode a request into a pretty-printed JSON summary.
pub fn describe_to_json(request: &[u8]) -> Result<String, GeneratorError> {
    let request = CodeGeneratorRequest::decode(request)?;
    let summary = protogo_compiler::describe(request)?;
    serde_json::to_string_pretty(&summary).map_err(|e| GeneratorError::Internal(e.to_string()))
}

pub mod error {
    pub use protogo_compiler::error::GeneratorError;
}

pub mod wire {
    pub use protogo_wire::*;
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_types::compiler::CodeGeneratorResponse;
    use prost_types::{DescriptorProto, FileDescriptorProto};

    fn request_bytes(generate: &[&str]) -> Vec<u8> {
        let file = FileDescriptorProto {
            name: Some("hello.proto".to_string()),
            package: Some("hello".to_string()),
            message_type: vec![DescriptorProto {
                name: Some("Greeting".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let request = CodeGeneratorRequest {
            file_to_generate: generate.iter().map(|s| s.to_string()).collect(),
            proto_file: vec![file],
            ..Default::default()
        };
        request.encode_to_vec()
    }

    #[test]
    fn test_generate_from_bytes() {
        let out = generate_from_bytes(&request_bytes(&["hello.proto"])).unwrap();
        let response = CodeGeneratorResponse::decode(out.as_slice()).unwrap();
        assert_eq!(response.file.len(), 1);
        assert_eq!(response.file[0].name(), "hello.pb.go");
        assert!(response.file[0].content().contains("type Greeting struct {"));
    }

    #[test]
    fn test_generate_rejects_garbage() {
        match generate_from_bytes(&[0xff, 0xff, 0xff]) {
            Err(GeneratorError::Decode(_)) => {}
            other => panic!("expected a decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_generate_needs_files() {
        match generate_from_bytes(&request_bytes(&[])) {
            Err(GeneratorError::NoFilesToGenerate) => {}
            other => panic!("expected NoFilesToGenerate, got {:?}", other),
        }
    }

    #[test]
    fn test_describe_to_json() {
        let json = describe_to_json(&request_bytes(&["hello.proto"])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["package_name"], "hello");
        assert_eq!(value["files"][0]["output"], "hello.pb.go");
        assert_eq!(value["files"][0]["messages"][0], "Greeting");
    }
}
