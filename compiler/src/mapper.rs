use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::FieldDescriptorProto;
use protogo_wire::WireType;

use crate::error::GeneratorError;
use crate::generator::Generator;
use crate::naming::camel_case_slice;
use crate::types::{EnumDescriptor, FileId, MessageId, Object};
use crate::utils::quote;

/// Wire encodings as spelled in struct tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireKind {
    Varint,
    Fixed32,
    Fixed64,
    Zigzag32,
    Zigzag64,
    Bytes,
    Group,
}

impl WireKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WireKind::Varint => "varint",
            WireKind::Fixed32 => "fixed32",
            WireKind::Fixed64 => "fixed64",
            WireKind::Zigzag32 => "zigzag32",
            WireKind::Zigzag64 => "zigzag64",
            WireKind::Bytes => "bytes",
            WireKind::Group => "group",
        }
    }

    /// The wire type that starts a field of this kind.
    pub fn wire_type(self) -> WireType {
        match self {
            WireKind::Varint | WireKind::Zigzag32 | WireKind::Zigzag64 => WireType::Varint,
            WireKind::Fixed32 => WireType::Fixed32,
            WireKind::Fixed64 => WireType::Fixed64,
            WireKind::Bytes => WireType::Bytes,
            WireKind::Group => WireType::StartGroup,
        }
    }
}

/// A field's Go type expression and wire encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoType {
    pub typ:     String,
    pub wire:    WireKind,
    /// Package qualifying a referenced message or enum, when it is foreign.
    pub package: Option<String>,
}

pub fn field_kind(field: &FieldDescriptorProto) -> Result<Type, GeneratorError> {
    let raw = field.r#type.unwrap_or(0);
    Type::try_from(raw).map_err(|_| GeneratorError::UnknownFieldKind {
        field: field.name().to_string(),
        kind:  raw,
    })
}

fn label(field: &FieldDescriptorProto) -> Option<Label> {
    field.label.and_then(|l| Label::try_from(l).ok())
}

pub fn is_optional(field: &FieldDescriptorProto) -> bool {
    label(field) == Some(Label::Optional)
}

pub fn is_required(field: &FieldDescriptorProto) -> bool {
    label(field) == Some(Label::Required)
}

pub fn is_repeated(field: &FieldDescriptorProto) -> bool {
    label(field) == Some(Label::Repeated)
}

/// Whether a singular field of this kind is held behind a pointer so that
/// unset differs from the zero value.
pub fn needs_star(kind: Type) -> bool {
    !matches!(kind, Type::Group | Type::Message | Type::Bytes)
}

/// Numeric kinds, the ones eligible for packed encoding.
pub fn is_scalar(kind: Type) -> bool {
    !matches!(kind, Type::String | Type::Bytes | Type::Group | Type::Message)
}

/// Go type and wire kind of every kind that does not name another type.
pub fn scalar_go_type(kind: Type) -> Option<(&'static str, WireKind)> {
    let pair = match kind {
        Type::Double => ("float64", WireKind::Fixed64),
        Type::Float => ("float32", WireKind::Fixed32),
        Type::Int64 => ("int64", WireKind::Varint),
        Type::Uint64 => ("uint64", WireKind::Varint),
        Type::Int32 => ("int32", WireKind::Varint),
        Type::Uint32 => ("uint32", WireKind::Varint),
        Type::Fixed64 => ("uint64", WireKind::Fixed64),
        Type::Fixed32 => ("uint32", WireKind::Fixed32),
        Type::Bool => ("bool", WireKind::Varint),
        Type::String => ("string", WireKind::Bytes),
        Type::Bytes => ("[]byte", WireKind::Bytes),
        Type::Sfixed32 => ("int32", WireKind::Fixed32),
        Type::Sfixed64 => ("int64", WireKind::Fixed64),
        Type::Sint32 => ("int32", WireKind::Zigzag32),
        Type::Sint64 => ("int64", WireKind::Zigzag64),
        Type::Group | Type::Message | Type::Enum => return None,
    };
    Some(pair)
}

impl Generator {
    /// The Go type of `field` declared in `message`, as seen from `file`.
    ///
    /// Repeated fields become slices. Singular fields of proto3 messages and
    /// oneof members are held by value. Everything else except messages,
    /// groups and bytes is held by pointer.
    pub fn go_type(
        &self,
        file: FileId,
        message: Option<MessageId>,
        field: &FieldDescriptorProto,
    ) -> Result<GoType, GeneratorError> {
        let kind = field_kind(field)?;
        let (mut typ, wire, package) = match scalar_go_type(kind) {
            Some((typ, wire)) => (typ.to_string(), wire, None),
            None => {
                let obj = self.resolve(field.type_name(), file)?;
                let (name, package) = self.qualified_type_name(obj)?;
                match kind {
                    Type::Group => (format!("*{}", name), WireKind::Group, package),
                    Type::Message => (format!("*{}", name), WireKind::Bytes, package),
                    _ => (name, WireKind::Varint, package),
                }
            }
        };

        let proto3 = message.map_or(false, |m| self.set.message(m).proto3);
        if is_repeated(field) {
            typ = format!("[]{}", typ);
        } else if proto3 || (field.oneof_index.is_some() && message.is_some()) {
            // held by value
        } else if needs_star(kind) {
            typ = format!("*{}", typ);
        }

        Ok(GoType { typ, wire, package })
    }

    /// The printed name of an object: bare inside the generated package,
    /// `pkg.Name` otherwise.
    pub fn type_name(&self, obj: Object) -> Result<String, GeneratorError> {
        Ok(self.qualified_type_name(obj)?.0)
    }

    /// Like [`Generator::type_name`], also returning the qualifying package.
    pub fn qualified_type_name(&self, obj: Object) -> Result<(String, Option<String>), GeneratorError> {
        let pkg = self.packages.of(self.set.file_of(obj))?;
        let name = camel_case_slice(self.set.type_name(obj));
        if pkg == self.package_name {
            Ok((name, None))
        } else {
            Ok((format!("{}.{}", pkg, name), Some(pkg.to_string())))
        }
    }

    /// The enum behind `type_name`, looking through a public-import alias.
    pub fn underlying_enum(&self, type_name: &str, file: FileId) -> Result<(Object, &EnumDescriptor), GeneratorError> {
        let obj = self.resolve(type_name, file)?;
        match self.set.underlying(obj) {
            Object::Enum(id) => Ok((obj, self.set.enumeration(id))),
            other => Err(GeneratorError::NotAnEnum(camel_case_slice(self.set.type_name(other)))),
        }
    }

    /// The quoted `protobuf:` struct tag value, e.g.
    /// `"varint,2,opt,name=count,def=7"`.
    ///
    /// Defaults are rendered for use at run time: booleans become 0 or 1 and
    /// enum names become their numbers.
    pub fn go_tag(
        &self,
        file: FileId,
        message: MessageId,
        field: &FieldDescriptorProto,
        wire: WireKind,
    ) -> Result<String, GeneratorError> {
        let kind = field_kind(field)?;
        let cardinality = if is_optional(field) {
            "opt"
        } else if is_required(field) {
            "req"
        } else if is_repeated(field) {
            "rep"
        } else {
            ""
        };

        let default = match &field.default_value {
            Some(dv) => {
                let value = match kind {
                    Type::Bool => if dv == "true" { "1" } else { "0" }.to_string(),
                    Type::Enum => {
                        let (_, desc) = self.underlying_enum(field.type_name(), file)?;
                        desc.integer_value_as_string(dv).ok_or_else(|| {
                            GeneratorError::UnresolvedEnumDefault {
                                enum_name: camel_case_slice(&desc.type_name),
                                value:     dv.clone(),
                            }
                        })?
                    }
                    // string and bytes are escaped with the whole tag
                    _ => dv.clone(),
                };
                format!(",def={}", value)
            }
            None => String::new(),
        };

        // The enum reference uses the proto package, not the Go one.
        let enum_ref = if kind == Type::Enum {
            let (obj, _) = self.underlying_enum(field.type_name(), file)?;
            let obj = self.set.underlying(obj);
            let pkg = self.set.file(self.set.file_of(obj)).proto.package();
            let name = camel_case_slice(self.set.type_name(obj));
            if pkg.is_empty() {
                format!(",enum={}", name)
            } else {
                format!(",enum={}.{}", pkg, name)
            }
        } else {
            String::new()
        };

        let msg = self.set.message(message);
        let explicit_packed = field.options.as_ref().and_then(|o| o.packed);
        // proto3 packs repeated numeric fields unless told otherwise
        let packed = explicit_packed == Some(true)
            || (msg.proto3 && explicit_packed.is_none() && is_repeated(field) && is_scalar(kind));

        let mut name = field.name().to_string();
        if kind == Type::Group {
            // groups keep the capitalization of the type name
            let type_name = field.type_name();
            name = type_name.rsplit('.').next().unwrap_or(type_name).to_string();
        }
        if let Some(json) = field.json_name.as_deref() {
            if !json.is_empty() && json != name {
                name = format!("{},json={}", name, json);
            }
        }
        let mut name = format!(",name={}", name);
        if msg.proto3 && kind == Type::Bytes {
            name.push_str(",proto3");
        }

        let oneof = if field.oneof_index.is_some() { ",oneof" } else { "" };

        Ok(quote(&format!(
            "{},{},{}{}{}{}{}{}",
            wire.as_str(),
            field.number(),
            cardinality,
            if packed { ",packed" } else { "" },
            name,
            enum_ref,
            oneof,
            default
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use crate::types::EnumId;
    use prost_types::{FieldOptions, FileDescriptorProto};

    fn generator(files: Vec<FileDescriptorProto>, generate: &[&str]) -> Generator {
        Generator::new(request(files, generate, "")).unwrap()
    }

    fn sample() -> Generator {
        let mut m = message(
            "M",
            vec![
                field("a", 1, Label::Optional, Type::Int32, None),
                field("b", 2, Label::Repeated, Type::String, None),
                field("c", 3, Label::Optional, Type::Bytes, None),
                field("d", 4, Label::Optional, Type::Message, Some(".pkg.M")),
                field("e", 5, Label::Optional, Type::Enum, Some(".pkg.Color")),
                field("f", 6, Label::Required, Type::Sint64, None),
                field("g", 7, Label::Optional, Type::Message, Some(".dep.Other")),
                oneof_field("h", 8, Type::Double, None, 0),
            ],
        );
        m.oneof_decl.push(oneof("choice"));
        let mut f = file("a.proto", "pkg", vec![m]);
        f.enum_type.push(enumeration("Color", &[("RED", 1), ("GREEN", 2)]));
        f.dependency.push("dep.proto".to_string());
        let dep = file("dep.proto", "dep", vec![message("Other", vec![])]);
        generator(vec![dep, f], &["a.proto"])
    }

    fn types_of(g: &Generator, message: MessageId) -> Vec<(String, WireKind)> {
        let file = g.set.message(message).file;
        g.set
            .message(message)
            .proto
            .field
            .iter()
            .map(|f| {
                let t = g.go_type(file, Some(message), f).unwrap();
                (t.typ, t.wire)
            })
            .collect()
    }

    #[test]
    fn proto2_types() {
        let g = sample();
        let m = g.set.file(FileId(1)).messages[0];
        let got = types_of(&g, m);
        let want = vec![
            ("*int32", WireKind::Varint),
            ("[]string", WireKind::Bytes),
            ("[]byte", WireKind::Bytes),
            ("*M", WireKind::Bytes),
            ("*Color", WireKind::Varint),
            ("*int64", WireKind::Zigzag64),
            ("*dep.Other", WireKind::Bytes),
            ("float64", WireKind::Fixed64),
        ];
        let want: Vec<(String, WireKind)> = want.into_iter().map(|(t, w)| (t.to_string(), w)).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn foreign_types_report_their_package() {
        let g = sample();
        let m = g.set.file(FileId(1)).messages[0];
        let f = &g.set.message(m).proto.field[6];
        assert_eq!(g.go_type(FileId(1), Some(m), f).unwrap().package.as_deref(), Some("dep"));
        let f = &g.set.message(m).proto.field[3];
        assert_eq!(g.go_type(FileId(1), Some(m), f).unwrap().package, None);
    }

    #[test]
    fn mapping_is_pure() {
        let g = sample();
        let m = g.set.file(FileId(1)).messages[0];
        let first = types_of(&g, m);
        let second = types_of(&g, m);
        assert_eq!(first, second);
        for f in &g.set.message(m).proto.field {
            let t1 = g.go_type(FileId(1), Some(m), f).unwrap();
            let t2 = g.go_type(FileId(1), Some(m), f).unwrap();
            assert_eq!(t1, t2);
        }
    }

    #[test]
    fn proto3_scalars_are_values() {
        let m = message(
            "P",
            vec![
                field("a", 1, Label::Optional, Type::Int32, None),
                field("b", 2, Label::Optional, Type::Message, Some(".p3.P")),
                field("c", 3, Label::Repeated, Type::Int64, None),
            ],
        );
        let g = generator(vec![proto3(file("p.proto", "p3", vec![m]))], &["p.proto"]);
        let got = types_of(&g, MessageId(0));
        assert_eq!(got[0].0, "int32");
        assert_eq!(got[1].0, "*P");
        assert_eq!(got[2].0, "[]int64");
    }

    #[test]
    fn extensions_without_scope_use_pointers() {
        let g = sample();
        let f = extension("ext", 100, Type::Bool, ".pkg.M");
        assert_eq!(g.go_type(FileId(1), None, &f).unwrap().typ, "*bool");
    }

    #[test]
    fn tags() {
        let g = sample();
        let m = g.set.file(FileId(1)).messages[0];
        let fields = g.set.message(m).proto.field.clone();
        let tag = |i: usize| {
            let t = g.go_type(FileId(1), Some(m), &fields[i]).unwrap();
            g.go_tag(FileId(1), m, &fields[i], t.wire).unwrap()
        };
        assert_eq!(tag(0), "\"varint,1,opt,name=a\"");
        assert_eq!(tag(1), "\"bytes,2,rep,name=b\"");
        assert_eq!(tag(4), "\"varint,5,opt,name=e,enum=pkg.Color\"");
        assert_eq!(tag(5), "\"zigzag64,6,req,name=f\"");
        assert_eq!(tag(7), "\"fixed64,8,opt,name=h,oneof\"");
    }

    #[test]
    fn tag_defaults_and_json_names() {
        let g = sample();
        let m = g.set.file(FileId(1)).messages[0];

        let mut b = field("flag", 9, Label::Optional, Type::Bool, None);
        b.default_value = Some("true".to_string());
        assert_eq!(g.go_tag(FileId(1), m, &b, WireKind::Varint).unwrap(), "\"varint,9,opt,name=flag,def=1\"");

        let mut e = field("color", 10, Label::Optional, Type::Enum, Some(".pkg.Color"));
        e.default_value = Some("GREEN".to_string());
        assert_eq!(
            g.go_tag(FileId(1), m, &e, WireKind::Varint).unwrap(),
            "\"varint,10,opt,name=color,enum=pkg.Color,def=2\""
        );

        let mut s = field("my_name", 11, Label::Optional, Type::String, None);
        s.json_name = Some("myName".to_string());
        s.default_value = Some("hi".to_string());
        assert_eq!(
            g.go_tag(FileId(1), m, &s, WireKind::Bytes).unwrap(),
            "\"bytes,11,opt,name=my_name,json=myName,def=hi\""
        );
    }

    #[test]
    fn unknown_enum_default_is_fatal() {
        let g = sample();
        let m = g.set.file(FileId(1)).messages[0];
        let mut e = field("color", 10, Label::Optional, Type::Enum, Some(".pkg.Color"));
        e.default_value = Some("PURPLE".to_string());
        let err = g.go_tag(FileId(1), m, &e, WireKind::Varint).unwrap_err();
        match err {
            GeneratorError::UnresolvedEnumDefault { enum_name, value } => {
                assert_eq!(enum_name, "Color");
                assert_eq!(value, "PURPLE");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(g.set.enumeration(EnumId(0)).integer_value_as_string("RED"), Some("1".to_string()));
    }

    #[test]
    fn packed_encoding() {
        let mut explicit = field("x", 1, Label::Repeated, Type::Int32, None);
        explicit.options = Some(FieldOptions {
            packed: Some(true),
            ..Default::default()
        });
        let mut unpacked = field("y", 2, Label::Repeated, Type::Int32, None);
        unpacked.options = Some(FieldOptions {
            packed: Some(false),
            ..Default::default()
        });
        let implicit = field("z", 3, Label::Repeated, Type::Fixed32, None);
        let strings = field("s", 4, Label::Repeated, Type::String, None);
        let m = message("R", vec![explicit, unpacked, implicit, strings]);
        let g = generator(vec![proto3(file("r.proto", "r", vec![m]))], &["r.proto"]);

        let fields = g.set.message(MessageId(0)).proto.field.clone();
        let tags: Vec<String> = fields
            .iter()
            .map(|f| {
                let t = g.go_type(FileId(0), Some(MessageId(0)), f).unwrap();
                g.go_tag(FileId(0), MessageId(0), f, t.wire).unwrap()
            })
            .collect();
        assert_eq!(tags[0], "\"varint,1,rep,packed,name=x\"");
        assert_eq!(tags[1], "\"varint,2,rep,name=y\"");
        assert_eq!(tags[2], "\"fixed32,3,rep,packed,name=z\"");
        assert_eq!(tags[3], "\"bytes,4,rep,name=s\"");
    }

    #[test]
    fn unknown_kind_is_fatal() {
        let mut f = field("weird", 1, Label::Optional, Type::Int32, None);
        f.r#type = Some(99);
        assert!(matches!(
            field_kind(&f),
            Err(GeneratorError::UnknownFieldKind { kind: 99, .. })
        ));
    }

    #[test]
    fn wire_types() {
        assert_eq!(WireKind::Zigzag32.wire_type(), WireType::Varint);
        assert_eq!(WireKind::Group.wire_type(), WireType::StartGroup);
        assert_eq!(WireKind::Fixed64.as_str(), "fixed64");
    }
}
