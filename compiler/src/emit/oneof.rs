//! Hand-written binary codec for oneof unions, which the reflection based
//! runtime cannot marshal on its own.

use prost_types::field_descriptor_proto::Type;
use protogo_wire::{make_key, size_varint, WireType};

use super::message::{oneof_plan, FieldPlan, OneofPlan};
use super::FileEmitter;
use crate::error::GeneratorError;

impl FileEmitter<'_> {
    pub(super) fn oneof_funcs(
        &mut self,
        cc: &str,
        plans: &[FieldPlan<'_>],
        oneofs: &[Option<OneofPlan>],
    ) -> Result<(), GeneratorError> {
        let proto = self.proto_pkg();
        let enc = format!("_{}_OneofMarshaler", cc);
        let dec = format!("_{}_OneofUnmarshaler", cc);
        let size = format!("_{}_OneofSizer", cc);
        let enc_sig = format!("(msg {p}.Message, b *{p}.Buffer) error", p = proto);
        let dec_sig = format!("(msg {p}.Message, tag, wire int, b *{p}.Buffer) (bool, error)", p = proto);
        let size_sig = format!("(msg {}.Message) (n int)", proto);
        let members: Vec<&FieldPlan<'_>> = plans.iter().filter(|p| p.oneof.is_some()).collect();

        self.out
            .line("// XXX_OneofFuncs is for the internal use of the proto package.");
        self.out.line(format!(
            "func (*{}) XXX_OneofFuncs() (func{}, func{}, func{}, []interface{{}}) {{",
            cc, enc_sig, dec_sig, size_sig
        ));
        self.out.indent();
        self.out
            .line(format!("return {}, {}, {}, []interface{{}}{{", enc, dec, size));
        self.out.indent();
        for plan in &members {
            self.out.line(format!("(*{})(nil),", plan.oneof_type));
        }
        self.out.outdent();
        self.out.line("}");
        self.out.outdent();
        self.out.line("}");
        self.out.blank();

        self.oneof_marshaler(cc, &enc, &enc_sig, plans, oneofs)?;
        self.oneof_unmarshaler(cc, &dec, &dec_sig, plans, oneofs)?;
        self.oneof_sizer(cc, &size, &size_sig, plans, oneofs)?;
        Ok(())
    }

    fn oneof_marshaler(
        &mut self,
        cc: &str,
        name: &str,
        sig: &str,
        plans: &[FieldPlan<'_>],
        oneofs: &[Option<OneofPlan>],
    ) -> Result<(), GeneratorError> {
        let proto = self.proto_pkg();
        self.out.line(format!("func {}{} {{", name, sig));
        self.out.indent();
        self.out.line(format!("m := msg.(*{})", cc));
        for (oi, oneof) in oneofs.iter().enumerate() {
            let oneof = match oneof {
                Some(oneof) => oneof,
                None => continue,
            };
            self.out.line(format!("// {}", oneof.proto_name));
            self.out
                .line(format!("switch x := m.{}.(type) {{", oneof.name));
            for plan in plans.iter().filter(|p| p.oneof == Some(oi)) {
                self.out.line(format!("case *{}:", plan.oneof_type));
                self.out.indent();
                let number = plan.field.number();
                let wire = plan.go_type.wire.wire_type().go_constant();
                self.out
                    .line(format!("b.EncodeVarint({}<<3 | {}.{})", number, proto, wire));
                let value = format!("x.{}", plan.name);
                match plan.kind {
                    Type::Double => {
                        let math = self.math_pkg();
                        self.out
                            .line(format!("b.EncodeFixed64({}.Float64bits({}))", math, value));
                    }
                    Type::Float => {
                        let math = self.math_pkg();
                        self.out.line(format!(
                            "b.EncodeFixed32(uint64({}.Float32bits({})))",
                            math, value
                        ));
                    }
                    Type::Int64 | Type::Uint64 | Type::Int32 | Type::Uint32 | Type::Enum => {
                        self.out.line(format!("b.EncodeVarint(uint64({}))", value));
                    }
                    Type::Fixed64 | Type::Sfixed64 => {
                        self.out.line(format!("b.EncodeFixed64(uint64({}))", value));
                    }
                    Type::Fixed32 | Type::Sfixed32 => {
                        self.out.line(format!("b.EncodeFixed32(uint64({}))", value));
                    }
                    Type::Bool => {
                        self.out.line("t := uint64(0)");
                        self.out.line(format!("if {} {{", value));
                        self.out.indent();
                        self.out.line("t = 1");
                        self.out.outdent();
                        self.out.line("}");
                        self.out.line("b.EncodeVarint(t)");
                    }
                    Type::String => {
                        self.out.line(format!("b.EncodeStringBytes({})", value));
                    }
                    Type::Group => {
                        self.out
                            .line(format!("if err := b.Marshal({}); err != nil {{", value));
                        self.out.indent();
                        self.out.line("return err");
                        self.out.outdent();
                        self.out.line("}");
                        self.out.line(format!(
                            "b.EncodeVarint({}<<3 | {}.{})",
                            number,
                            proto,
                            WireType::EndGroup.go_constant()
                        ));
                    }
                    Type::Message => {
                        self.out
                            .line(format!("if err := b.EncodeMessage({}); err != nil {{", value));
                        self.out.indent();
                        self.out.line("return err");
                        self.out.outdent();
                        self.out.line("}");
                    }
                    Type::Bytes => {
                        self.out.line(format!("b.EncodeRawBytes({})", value));
                    }
                    Type::Sint32 => {
                        self.out.line(format!("b.EncodeZigzag32(uint64({}))", value));
                    }
                    Type::Sint64 => {
                        self.out.line(format!("b.EncodeZigzag64(uint64({}))", value));
                    }
                }
                self.out.outdent();
            }
            let fmt = self.fmt_pkg();
            self.out.line("case nil:");
            self.out.line("default:");
            self.out.indent();
            self.out.line(format!(
                "return {}.Errorf(\"{}.{} has unexpected type %T\", x)",
                fmt, cc, oneof.name
            ));
            self.out.outdent();
            self.out.line("}");
        }
        self.out.line("return nil");
        self.out.outdent();
        self.out.line("}");
        self.out.blank();
        Ok(())
    }

    fn oneof_unmarshaler(
        &mut self,
        cc: &str,
        name: &str,
        sig: &str,
        plans: &[FieldPlan<'_>],
        oneofs: &[Option<OneofPlan>],
    ) -> Result<(), GeneratorError> {
        let proto = self.proto_pkg();
        self.out.line(format!("func {}{} {{", name, sig));
        self.out.indent();
        self.out.line(format!("m := msg.(*{})", cc));
        self.out.line("switch tag {");
        for plan in plans {
            let oi = match plan.oneof {
                Some(oi) => oi,
                None => continue,
            };
            let union = oneof_plan(oneofs, oi)?;
            self.out.line(format!(
                "case {}: // {}.{}",
                plan.field.number(),
                union.proto_name,
                plan.field.name()
            ));
            self.out.indent();
            let wire = plan.go_type.wire.wire_type().go_constant();
            self.out.line(format!("if wire != {}.{} {{", proto, wire));
            self.out.indent();
            self.out
                .line(format!("return true, {}.ErrInternalBadWireType", proto));
            self.out.outdent();
            self.out.line("}");

            let union_field = &union.name;
            match plan.kind {
                Type::Group | Type::Message => {
                    let decode = if plan.kind == Type::Group { "DecodeGroup" } else { "DecodeMessage" };
                    let typ = plan.type_expr.strip_prefix('*').unwrap_or(&plan.type_expr);
                    self.out.line(format!("msg := new({})", typ));
                    self.out.line(format!("err := b.{}(msg)", decode));
                    self.out
                        .line(format!("m.{} = &{}{{msg}}", union_field, plan.oneof_type));
                }
                kind => {
                    let (decode, value) = self.oneof_decode(kind, &plan.type_expr);
                    self.out.line(format!("x, err := b.{}", decode));
                    self.out
                        .line(format!("m.{} = &{}{{{}}}", union_field, plan.oneof_type, value));
                }
            }
            self.out.line("return true, err");
            self.out.outdent();
        }
        self.out.line("default:");
        self.out.indent();
        self.out.line("return false, nil");
        self.out.outdent();
        self.out.line("}");
        self.out.outdent();
        self.out.line("}");
        self.out.blank();
        Ok(())
    }

    /// The decoding call and the conversion of its result `x` for a scalar
    /// oneof member.
    fn oneof_decode(&mut self, kind: Type, typ: &str) -> (&'static str, String) {
        match kind {
            Type::Double => {
                let math = self.math_pkg();
                ("DecodeFixed64()", format!("{}.Float64frombits(x)", math))
            }
            Type::Float => {
                let math = self.math_pkg();
                ("DecodeFixed32()", format!("{}.Float32frombits(uint32(x))", math))
            }
            Type::Int64 => ("DecodeVarint()", "int64(x)".to_string()),
            Type::Uint64 => ("DecodeVarint()", "x".to_string()),
            Type::Int32 => ("DecodeVarint()", "int32(x)".to_string()),
            Type::Uint32 => ("DecodeVarint()", "uint32(x)".to_string()),
            Type::Fixed64 => ("DecodeFixed64()", "x".to_string()),
            Type::Fixed32 => ("DecodeFixed32()", "uint32(x)".to_string()),
            Type::Sfixed64 => ("DecodeFixed64()", "int64(x)".to_string()),
            Type::Sfixed32 => ("DecodeFixed32()", "int32(x)".to_string()),
            Type::Bool => ("DecodeVarint()", "x != 0".to_string()),
            Type::String => ("DecodeStringBytes()", "x".to_string()),
            Type::Bytes => ("DecodeRawBytes(true)", "x".to_string()),
            Type::Enum => ("DecodeVarint()", format!("{}(x)", typ)),
            Type::Sint32 => ("DecodeZigzag32()", "int32(x)".to_string()),
            Type::Sint64 => ("DecodeZigzag64()", "int64(x)".to_string()),
            // handled by the caller
            Type::Group | Type::Message => ("", String::new()),
        }
    }

    fn oneof_sizer(
        &mut self,
        cc: &str,
        name: &str,
        sig: &str,
        plans: &[FieldPlan<'_>],
        oneofs: &[Option<OneofPlan>],
    ) -> Result<(), GeneratorError> {
        let proto = self.proto_pkg();
        self.out.line(format!("func {}{} {{", name, sig));
        self.out.indent();
        self.out.line(format!("m := msg.(*{})", cc));
        for (oi, oneof) in oneofs.iter().enumerate() {
            let oneof = match oneof {
                Some(oneof) => oneof,
                None => continue,
            };
            self.out.line(format!("// {}", oneof.proto_name));
            self.out
                .line(format!("switch x := m.{}.(type) {{", oneof.name));
            for plan in plans.iter().filter(|p| p.oneof == Some(oi)) {
                self.out.line(format!("case *{}:", plan.oneof_type));
                self.out.indent();
                let number = plan.field.number();
                let value = format!("x.{}", plan.name);

                // (fixed, varint) size contributions
                let (fixed, varint) = match plan.kind {
                    Type::Double | Type::Fixed64 | Type::Sfixed64 => (Some("8".to_string()), None),
                    Type::Float | Type::Fixed32 | Type::Sfixed32 => (Some("4".to_string()), None),
                    Type::Int64 | Type::Uint64 | Type::Int32 | Type::Uint32 | Type::Enum => {
                        (None, Some(value.clone()))
                    }
                    Type::Bool => (Some("1".to_string()), None),
                    Type::String | Type::Bytes => {
                        let len = format!("len({})", value);
                        (Some(len.clone()), Some(len))
                    }
                    Type::Group => (Some(format!("{}.Size({})", proto, value)), None),
                    Type::Message => {
                        self.out.line(format!("s := {}.Size({})", proto, value));
                        (Some("s".to_string()), Some("s".to_string()))
                    }
                    Type::Sint32 => (
                        None,
                        Some(format!("(uint32({v}) << 1) ^ uint32((int32({v}) >> 31))", v = value)),
                    ),
                    Type::Sint64 => (
                        None,
                        Some(format!("uint64({v} << 1) ^ uint64((int64({v}) >> 63))", v = value)),
                    ),
                };

                let key = size_varint(make_key(number, plan.go_type.wire.wire_type()));
                self.out.line(format!("n += {} // tag and wire", key));
                if let Some(varint) = varint {
                    self.out
                        .line(format!("n += {}.SizeVarint(uint64({}))", proto, varint));
                }
                if let Some(fixed) = fixed {
                    self.out.line(format!("n += {}", fixed));
                }
                if plan.kind == Type::Group {
                    let end = size_varint(make_key(number, WireType::EndGroup));
                    self.out.line(format!("n += {} // tag and wire", end));
                }
                self.out.outdent();
            }
            let fmt = self.fmt_pkg();
            self.out.line("case nil:");
            self.out.line("default:");
            self.out.indent();
            self.out.line(format!(
                "panic({}.Sprintf(\"proto: unexpected type %T in oneof\", x))",
                fmt
            ));
            self.out.outdent();
            self.out.line("}");
        }
        self.out.line("return n");
        self.out.outdent();
        self.out.line("}");
        self.out.blank();
        Ok(())
    }
}
