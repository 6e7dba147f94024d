#![allow(dead_code)]

//! Descriptor builders shared by the integration tests.

use prost_types::{
    compiler::CodeGeneratorRequest,
    field_descriptor_proto::{Label, Type},
    source_code_info::Location,
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, MessageOptions, OneofDescriptorProto, SourceCodeInfo,
};

pub fn file(name: &str, package: &str, messages: Vec<DescriptorProto>) -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(name.to_string()),
        package: if package.is_empty() { None } else { Some(package.to_string()) },
        message_type: messages,
        ..Default::default()
    }
}

pub fn proto3(mut f: FileDescriptorProto) -> FileDescriptorProto {
    f.syntax = Some("proto3".to_string());
    f
}

pub fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: fields,
        ..Default::default()
    }
}

pub fn field(name: &str, number: i32, label: Label, kind: Type, type_name: Option<&str>) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(label as i32),
        r#type: Some(kind as i32),
        type_name: type_name.map(str::to_string),
        ..Default::default()
    }
}

pub fn oneof_field(name: &str, number: i32, kind: Type, type_name: Option<&str>, oneof: i32) -> FieldDescriptorProto {
    let mut f = field(name, number, Label::Optional, kind, type_name);
    f.oneof_index = Some(oneof);
    f
}

pub fn oneof(name: &str) -> OneofDescriptorProto {
    OneofDescriptorProto {
        name: Some(name.to_string()),
        ..Default::default()
    }
}

pub fn enumeration(name: &str, values: &[(&str, i32)]) -> EnumDescriptorProto {
    EnumDescriptorProto {
        name: Some(name.to_string()),
        value: values
            .iter()
            .map(|(n, v)| EnumValueDescriptorProto {
                name: Some(n.to_string()),
                number: Some(*v),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

pub fn map_entry(name: &str, key: Type, value: Type, value_type: Option<&str>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: vec![
            field("key", 1, Label::Optional, key, None),
            field("value", 2, Label::Optional, value, value_type),
        ],
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn extension(name: &str, number: i32, kind: Type, extendee: &str) -> FieldDescriptorProto {
    let mut f = field(name, number, Label::Optional, kind, None);
    f.extendee = Some(extendee.to_string());
    f
}

pub fn request(files: Vec<FileDescriptorProto>, generate: &[&str], parameter: &str) -> CodeGeneratorRequest {
    CodeGeneratorRequest {
        file_to_generate: generate.iter().map(|s| s.to_string()).collect(),
        parameter: if parameter.is_empty() { None } else { Some(parameter.to_string()) },
        proto_file: files,
        ..Default::default()
    }
}

pub fn source_info(comments: &[(&[i32], &str)]) -> SourceCodeInfo {
    SourceCodeInfo {
        location: comments
            .iter()
            .map(|(path, text)| Location {
                path: path.to_vec(),
                leading_comments: Some(text.to_string()),
                ..Default::default()
            })
            .collect(),
    }
}
