use std::collections::{HashMap, HashSet};

use prost_types::field_descriptor_proto::Type;
use prost_types::FieldDescriptorProto;
use tracing::warn;

use super::alias::{ConstOrVarSymbol, GetterShape, GetterSymbol, MessageSymbol, Symbol};
use super::{descriptor_indexes, FileEmitter};
use crate::alloc::NameAllocator;
use crate::error::GeneratorError;
use crate::mapper::{field_kind, is_repeated, needs_star, GoType};
use crate::naming::{camel_case, camel_case_slice};
use crate::types::{MessageDescriptor, MessageId, Object};
use crate::utils::quote;
use crate::wrap::{MESSAGE_FIELD_PATH, MESSAGE_ONEOF_PATH};

/// `google.protobuf` messages that report themselves as well-known types.
const WELL_KNOWN_TYPES: [&str; 16] = [
    "Any",
    "Duration",
    "Empty",
    "Struct",
    "Timestamp",
    "Value",
    "ListValue",
    "DoubleValue",
    "FloatValue",
    "Int64Value",
    "UInt64Value",
    "Int32Value",
    "UInt32Value",
    "BoolValue",
    "StringValue",
    "BytesValue",
];

/// Everything decided about a field before any of the message is printed.
pub(super) struct FieldPlan<'f> {
    pub field:      &'f FieldDescriptorProto,
    pub kind:       Type,
    pub name:       String,
    pub getter:     String,
    pub go_type:    GoType,
    /// Declared Go type; `map[K]V` for map fields.
    pub type_expr:  String,
    /// The quoted `protobuf:` tag value alone.
    pub proto_tag:  String,
    /// The complete struct tag.
    pub tag:        String,
    pub map:        Option<MapPlan>,
    pub oneof:      Option<usize>,
    /// Payload struct name, for oneof members.
    pub oneof_type: String,
}

pub(super) struct MapPlan {
    pub key:    String,
    pub value:  String,
    /// The message or enum held as value, if any.
    pub target: Option<Object>,
}

pub(super) struct OneofPlan {
    /// Go name of the union field.
    pub name:       String,
    /// Name of the discriminant interface.
    pub disc:       String,
    pub proto_name: String,
}

impl FileEmitter<'_> {
    pub(super) fn message(&mut self, id: MessageId) -> Result<(), GeneratorError> {
        let gen = self.gen;
        let msg = gen.set.message(id);
        let cc = camel_case_slice(&msg.type_name);

        let (plans, oneofs) = self.plan_fields(id, msg, &cc)?;

        // struct
        self.print_comments(&msg.path);
        self.out.line(format!("type {} struct {{", cc));
        self.out.indent();
        let mut declared = HashSet::new();
        for (i, plan) in plans.iter().enumerate() {
            if let Some(oi) = plan.oneof {
                if !declared.insert(oi) {
                    continue;
                }
                let oneof = oneof_plan(&oneofs, oi)?;
                if self.print_comments(&format!("{},{},{}", msg.path, MESSAGE_ONEOF_PATH, oi)) {
                    self.out.line("//");
                }
                self.out
                    .line(format!("// Types that are valid to be assigned to {}:", oneof.name));
                for member in plans.iter().filter(|p| p.oneof == Some(oi)) {
                    self.out.line(format!("//\t*{}", member.oneof_type));
                }
                self.out.line(format!(
                    "{} {} `protobuf_oneof:{}`",
                    oneof.name,
                    oneof.disc,
                    quote(&oneof.proto_name)
                ));
                continue;
            }
            self.print_comments(&format!("{},{},{}", msg.path, MESSAGE_FIELD_PATH, i));
            self.out
                .line(format!("{}\t{}\t`{}`", plan.name, plan.type_expr, plan.tag));
        }
        let has_extensions = !msg.proto.extension_range.is_empty();
        if has_extensions {
            let proto = self.proto_pkg();
            self.out
                .line(format!("{}.XXX_InternalExtensions `json:\"-\"`", proto));
        }
        if !msg.proto3 {
            self.out.line("XXX_unrecognized\t[]byte `json:\"-\"`");
        }
        self.out.outdent();
        self.out.line("}");

        // Reset, String, ProtoMessage and Descriptor
        let proto = self.proto_pkg();
        self.out
            .line(format!("func (m *{}) Reset() {{ *m = {}{{}} }}", cc, cc));
        self.out.line(format!(
            "func (m *{}) String() string {{ return {}.CompactTextString(m) }}",
            cc, proto
        ));
        self.out.line(format!("func (*{}) ProtoMessage() {{}}", cc));
        self.out.line(format!(
            "func (*{}) Descriptor() ([]byte, []int) {{ return {}, []int{{{}}} }}",
            cc,
            self.fd().var_name(),
            descriptor_indexes(gen, Some(id), None)
        ));
        if gen.set.file(msg.file).proto.package() == "google.protobuf" && WELL_KNOWN_TYPES.contains(&msg.name()) {
            self.out.line(format!(
                "func (*{}) XXX_WellKnownType() string {{ return {} }}",
                cc,
                quote(msg.name())
            ));
        }

        // message_set_wire_format only makes sense with extensions
        let is_message_set = has_extensions && msg.is_message_set();
        if has_extensions {
            if is_message_set {
                self.message_set_methods(&cc);
            }
            self.out.blank();
            self.out
                .line(format!("var extRange_{} = []{}.ExtensionRange{{", cc, proto));
            self.out.indent();
            for range in &msg.proto.extension_range {
                // inclusive on both ends
                self.out
                    .line(format!("{{{}, {}}},", range.start(), range.end() - 1));
            }
            self.out.outdent();
            self.out.line("}");
            self.out.line(format!(
                "func (*{}) ExtensionRangeArray() []{}.ExtensionRange {{",
                cc, proto
            ));
            self.out.indent();
            self.out.line(format!("return extRange_{}", cc));
            self.out.outdent();
            self.out.line("}");
        }

        let defaults = self.default_constants(id, &cc, &plans)?;
        self.out.blank();

        if !oneofs.is_empty() {
            self.oneof_types(&cc, &plans, &oneofs)?;
        }

        let getters = self.getters(id, &cc, &plans, &oneofs, &defaults)?;

        if !msg.group {
            self.export(
                Object::Message(id),
                Symbol::Message(MessageSymbol {
                    sym: cc.clone(),
                    has_extensions,
                    is_message_set,
                    has_oneof: !msg.proto.oneof_decl.is_empty(),
                    getters,
                }),
            );
        }

        if !oneofs.is_empty() {
            self.oneof_funcs(&cc, &plans, &oneofs)?;
        }

        for &ext in &msg.extensions {
            self.extension(ext)?;
        }

        let package = gen.set.file(msg.file).proto.package();
        let full_name = if package.is_empty() {
            msg.type_name.join(".")
        } else {
            format!("{}.{}", package, msg.type_name.join("."))
        };
        self.init.push(format!(
            "{}.RegisterType((*{})(nil), {})",
            proto,
            cc,
            quote(&full_name)
        ));
        Ok(())
    }

    /// Allocates names, types and tags for every field, in declaration
    /// order. The oneof union field takes its name when its first member is
    /// met.
    fn plan_fields<'m>(
        &mut self,
        id: MessageId,
        msg: &'m MessageDescriptor,
        cc: &str,
    ) -> Result<(Vec<FieldPlan<'m>>, Vec<Option<OneofPlan>>), GeneratorError> {
        let gen = self.gen;
        let mut names = NameAllocator::new();
        let mut oneofs: Vec<Option<OneofPlan>> = msg.proto.oneof_decl.iter().map(|_| None).collect();
        let mut plans = Vec::with_capacity(msg.proto.field.len());

        for field in &msg.proto.field {
            let kind = field_kind(field)?;
            let base = camel_case(field.name());
            let [name, getter] = names.allocate([base.clone(), format!("Get{}", base)]);
            let go_type = self.go_type(Some(id), field)?;
            let proto_tag = gen.go_tag(self.file, id, field, go_type.wire)?;
            let mut tag = format!(
                "protobuf:{} json:{}",
                proto_tag,
                quote(&format!("{},omitempty", field.name()))
            );

            let oneof = field.oneof_index.map(|i| i as usize);
            if let Some(oi) = oneof {
                let slot = oneofs.get_mut(oi).ok_or_else(|| {
                    GeneratorError::Internal(format!("field {} names unknown oneof #{}", field.name(), oi))
                })?;
                if slot.is_none() {
                    let proto_name = msg.proto.oneof_decl[oi].name().to_string();
                    let union = names.allocate_one(camel_case(&proto_name));
                    *slot = Some(OneofPlan {
                        disc: format!("is{}_{}", cc, union),
                        name: union,
                        proto_name,
                    });
                }
            }

            let mut type_expr = go_type.typ.clone();
            let mut map = None;
            if kind == Type::Message {
                if let Object::Message(entry) = gen.resolve(field.type_name(), self.file)? {
                    let entry_msg = gen.set.message(entry);
                    if entry_msg.is_map_entry() && entry_msg.proto.field.len() == 2 {
                        let (key_field, val_field) = (&entry_msg.proto.field[0], &entry_msg.proto.field[1]);
                        let key_type = self.go_type(Some(entry), key_field)?;
                        let val_type = self.go_type(Some(entry), val_field)?;
                        let key_tag = gen.go_tag(self.file, entry, key_field, key_type.wire)?;
                        let val_tag = gen.go_tag(self.file, entry, val_field, val_type.wire)?;

                        // Only message values stay pointers.
                        let key = strip_star(&key_type.typ).to_string();
                        let val_kind = field_kind(val_field)?;
                        let (value, target) = match val_kind {
                            Type::Message => (
                                val_type.typ.clone(),
                                Some(gen.set.underlying(gen.resolve(val_field.type_name(), self.file)?)),
                            ),
                            Type::Enum => (
                                strip_star(&val_type.typ).to_string(),
                                Some(gen.set.underlying(gen.resolve(val_field.type_name(), self.file)?)),
                            ),
                            _ => (strip_star(&val_type.typ).to_string(), None),
                        };

                        type_expr = format!("map[{}]{}", key, value);
                        tag.push_str(&format!(" protobuf_key:{} protobuf_val:{}", key_tag, val_tag));
                        map = Some(MapPlan { key, value, target });
                    }
                }
            }

            let mut oneof_type = String::new();
            if oneof.is_some() {
                // may collide with a nested message or enum
                oneof_type = format!("{}_{}", cc, name);
                while msg
                    .nested
                    .iter()
                    .any(|&n| camel_case_slice(&gen.set.message(n).type_name) == oneof_type)
                    || msg
                        .enums
                        .iter()
                        .any(|&e| camel_case_slice(&gen.set.enumeration(e).type_name) == oneof_type)
                {
                    oneof_type.push('_');
                }
            }

            plans.push(FieldPlan {
                field,
                kind,
                name,
                getter,
                go_type,
                type_expr,
                proto_tag,
                tag,
                map,
                oneof,
                oneof_type,
            });
        }

        Ok((plans, oneofs))
    }

    fn message_set_methods(&mut self, cc: &str) {
        let proto = self.proto_pkg();
        self.out.blank();
        let methods = [
            ("Marshal() ([]byte, error)", "MarshalMessageSet(&m.XXX_InternalExtensions)"),
            ("Unmarshal(buf []byte) error", "UnmarshalMessageSet(buf, &m.XXX_InternalExtensions)"),
            ("MarshalJSON() ([]byte, error)", "MarshalMessageSetJSON(&m.XXX_InternalExtensions)"),
            ("UnmarshalJSON(buf []byte) error", "UnmarshalMessageSetJSON(buf, &m.XXX_InternalExtensions)"),
        ];
        for (signature, call) in methods {
            self.out.line(format!("func (m *{}) {} {{", cc, signature));
            self.out.indent();
            self.out.line(format!("return {}.{}", proto, call));
            self.out.outdent();
            self.out.line("}");
        }
        self.out
            .line(format!("// ensure {} satisfies proto.Marshaler and proto.Unmarshaler", cc));
        self.out
            .line(format!("var _ {}.Marshaler = (*{})(nil)", proto, cc));
        self.out
            .line(format!("var _ {}.Unmarshaler = (*{})(nil)", proto, cc));
    }

    /// Prints `Default_<Msg>_<Field>` for every field with a default value.
    /// Returns the constant names keyed by field position.
    fn default_constants(
        &mut self,
        id: MessageId,
        cc: &str,
        plans: &[FieldPlan<'_>],
    ) -> Result<HashMap<usize, String>, GeneratorError> {
        let gen = self.gen;
        let mut defaults = HashMap::new();

        for (i, plan) in plans.iter().enumerate() {
            let field = plan.field;
            let mut def = match field.default_value.as_deref() {
                Some(def) if !def.is_empty() => def.to_string(),
                _ => continue,
            };
            let const_name = format!("Default_{}_{}", cc, camel_case(field.name()));
            let typ = strip_star(&plan.go_type.typ).to_string();

            let mut decl = "const";
            if typ == "bool" {
                // as is
            } else if typ == "string" {
                def = quote(&def);
            } else if typ == "[]byte" {
                def = format!("[]byte({})", quote(&def));
                decl = "var";
            } else if matches!(def.as_str(), "inf" | "-inf" | "nan") {
                // names defined by the protocol language
                let math = self.math_pkg();
                def = match def.as_str() {
                    "inf" => format!("{}.Inf(1)", math),
                    "-inf" => format!("{}.Inf(-1)", math),
                    _ => format!("{}.NaN()", math),
                };
                if plan.kind == Type::Float {
                    def = format!("float32({})", def);
                }
                decl = "var";
            } else if plan.kind == Type::Enum {
                let obj = gen.resolve(field.type_name(), self.file)?;
                let e = match gen.set.underlying(obj) {
                    Object::Enum(e) => gen.set.enumeration(e),
                    _ => {
                        warn!(constant = %const_name, "default refers to a type that is not an enum, skipping");
                        continue;
                    }
                };
                def = format!("{}{}{}", self.package_prefix(obj)?, e.prefix(), def);
            }

            self.out
                .line(format!("{} {} {} = {}", decl, const_name, typ, def));
            self.export(
                Object::Message(id),
                Symbol::ConstOrVar(ConstOrVarSymbol {
                    sym:  const_name.clone(),
                    kind: decl,
                    cast: None,
                }),
            );
            defaults.insert(i, const_name);
        }
        Ok(defaults)
    }

    /// Discriminant interfaces, payload structs and union getters.
    fn oneof_types(&mut self, cc: &str, plans: &[FieldPlan<'_>], oneofs: &[Option<OneofPlan>]) -> Result<(), GeneratorError> {
        for oneof in oneofs.iter().flatten() {
            self.out
                .line(format!("type {} interface {{ {}() }}", oneof.disc, oneof.disc));
        }
        self.out.blank();
        for plan in plans.iter().filter(|p| p.oneof.is_some()) {
            self.out.line(format!(
                "type {} struct{{ {} {} `protobuf:{}` }}",
                plan.oneof_type, plan.name, plan.type_expr, plan.proto_tag
            ));
        }
        self.out.blank();
        for plan in plans {
            if let Some(oi) = plan.oneof {
                let oneof = oneof_plan(oneofs, oi)?;
                self.out
                    .line(format!("func (*{}) {}() {{}}", plan.oneof_type, oneof.disc));
            }
        }
        self.out.blank();
        for oneof in oneofs.iter().flatten() {
            self.out.line(format!(
                "func (m *{}) Get{}() {} {{",
                cc, oneof.name, oneof.disc
            ));
            self.out.indent();
            self.out
                .line(format!("if m != nil {{ return m.{} }}", oneof.name));
            self.out.line("return nil");
            self.out.outdent();
            self.out.line("}");
        }
        self.out.blank();
        Ok(())
    }

    /// Prints a getter per field and returns the ones importers may forward.
    fn getters(
        &mut self,
        id: MessageId,
        cc: &str,
        plans: &[FieldPlan<'_>],
        oneofs: &[Option<OneofPlan>],
        defaults: &HashMap<usize, String>,
    ) -> Result<Vec<GetterSymbol>, GeneratorError> {
        let gen = self.gen;
        let msg = gen.set.message(id);
        let mut getters = Vec::new();

        for (i, plan) in plans.iter().enumerate() {
            let field = plan.field;
            let kind = plan.kind;
            let mut typename = plan.type_expr.as_str();
            let mut star = "";
            if needs_star(kind) && typename.starts_with('*') {
                typename = &typename[1..];
                star = "*";
            }

            // Groups are never forwarded.
            let shape = match (kind, &plan.map) {
                (Type::Group, _) => None,
                (_, Some(map)) => Some(match map.target {
                    Some(target) => GetterShape::Map {
                        key: map.key.clone(),
                        target,
                        pointer: map.value.starts_with('*'),
                    },
                    None => GetterShape::Plain(typename.to_string()),
                }),
                (Type::Message, None) | (Type::Enum, None) => Some(GetterShape::Named {
                    target:   gen.set.underlying(gen.resolve(field.type_name(), self.file)?),
                    pointer:  typename.trim_start_matches("[]").starts_with('*'),
                    repeated: is_repeated(field),
                }),
                _ => Some(GetterShape::Plain(typename.to_string())),
            };
            if let Some(shape) = shape {
                getters.push(GetterSymbol {
                    name: plan.getter.clone(),
                    shape,
                });
            }

            self.out
                .line(format!("func (m *{}) {}() {} {{", cc, plan.getter, typename));
            self.out.indent();

            let default = defaults.get(&i);
            let nil_default = match kind {
                Type::Bytes => default.is_none(),
                Type::Group | Type::Message => true,
                _ => false,
            } || is_repeated(field);

            if nil_default && plan.oneof.is_none() {
                self.out.line("if m != nil {");
                self.out.indent();
                self.out.line(format!("return m.{}", plan.name));
                self.out.outdent();
                self.out.line("}");
                self.out.line("return nil");
                self.out.outdent();
                self.out.line("}");
                self.out.blank();
                continue;
            }

            match plan.oneof {
                None => {
                    if msg.proto3 {
                        self.out.line("if m != nil {");
                    } else {
                        self.out
                            .line(format!("if m != nil && m.{} != nil {{", plan.name));
                    }
                    self.out.indent();
                    self.out.line(format!("return {}m.{}", star, plan.name));
                    self.out.outdent();
                    self.out.line("}");
                }
                Some(oi) => {
                    let oneof = oneof_plan(oneofs, oi)?;
                    self.out.line(format!(
                        "if x, ok := m.Get{}().(*{}); ok {{",
                        oneof.name, plan.oneof_type
                    ));
                    self.out.indent();
                    self.out.line(format!("return x.{}", plan.name));
                    self.out.outdent();
                    self.out.line("}");
                }
            }

            match default {
                // the []byte var is copied, never handed out
                Some(def) if kind == Type::Bytes => {
                    self.out.line(format!("return append([]byte(nil), {}...)", def))
                }
                Some(def) => self.out.line(format!("return {}", def)),
                None => match kind {
                    Type::Bool => self.out.line("return false"),
                    Type::String => self.out.line("return \"\""),
                    // only reachable for oneof members
                    Type::Group | Type::Message | Type::Bytes => self.out.line("return nil"),
                    Type::Enum => self.enum_zero_value(field)?,
                    _ => self.out.line("return 0"),
                },
            }
            self.out.outdent();
            self.out.line("}");
            self.out.blank();
        }

        Ok(getters)
    }

    /// The default of an enum is its first declared value, not zero.
    fn enum_zero_value(&mut self, field: &FieldDescriptorProto) -> Result<(), GeneratorError> {
        let gen = self.gen;
        let obj = gen.resolve(field.type_name(), self.file)?;
        let e = match gen.set.underlying(obj) {
            Object::Enum(e) => gen.set.enumeration(e),
            other => {
                return Err(GeneratorError::NotAnEnum(camel_case_slice(gen.set.type_name(other))));
            }
        };
        match e.proto.value.first() {
            Some(first) => {
                let prefix = self.package_prefix(obj)?;
                self.out
                    .line(format!("return {}{}{}", prefix, e.prefix(), first.name()));
            }
            None => {
                warn!(field = field.name(), "enum has no values, returning zero");
                self.out.line("return 0 // empty enum");
            }
        }
        Ok(())
    }
}

pub(super) fn oneof_plan(oneofs: &[Option<OneofPlan>], index: usize) -> Result<&OneofPlan, GeneratorError> {
    oneofs
        .get(index)
        .and_then(Option::as_ref)
        .ok_or_else(|| GeneratorError::Internal(format!("oneof #{} has no members", index)))
}

fn strip_star(typ: &str) -> &str {
    typ.strip_prefix('*').unwrap_or(typ)
}
