use std::collections::HashSet;

use super::alias::{ConstOrVarSymbol, EnumSymbol, Symbol};
use super::{descriptor_indexes, FileEmitter};
use crate::error::GeneratorError;
use crate::naming::camel_case_slice;
use crate::types::{EnumId, Object};
use crate::utils::quote;
use crate::wrap::ENUM_VALUE_PATH;

impl FileEmitter<'_> {
    pub(super) fn enumeration(&mut self, id: EnumId) -> Result<(), GeneratorError> {
        let gen = self.gen;
        let e = gen.set.enumeration(id);
        let cc = camel_case_slice(&e.type_name);
        let prefix = e.prefix();
        let obj = Object::Enum(id);

        self.print_comments(&e.path);
        self.out.line(format!("type {} int32", cc));
        self.export(
            obj,
            Symbol::Enum(EnumSymbol {
                name:   cc.clone(),
                proto3: e.proto3,
            }),
        );

        self.out.line("const (");
        self.out.indent();
        for (i, value) in e.proto.value.iter().enumerate() {
            self.print_comments(&format!("{},{},{}", e.path, ENUM_VALUE_PATH, i));
            let name = format!("{}{}", prefix, value.name());
            self.out.line(format!("{} {} = {}", name, cc, value.number()));
            self.export(
                obj,
                Symbol::ConstOrVar(ConstOrVarSymbol {
                    sym:  name,
                    kind: "const",
                    cast: Some(cc.clone()),
                }),
            );
        }
        self.out.outdent();
        self.out.line(")");

        // Numbers shared by several names keep their first name.
        self.out.line(format!("var {}_name = map[int32]string{{", cc));
        self.out.indent();
        let mut seen = HashSet::new();
        for value in &e.proto.value {
            let duplicate = if seen.insert(value.number()) { "" } else { "// Duplicate value: " };
            self.out
                .line(format!("{}{}: {},", duplicate, value.number(), quote(value.name())));
        }
        self.out.outdent();
        self.out.line("}");
        self.out.line(format!("var {}_value = map[string]int32{{", cc));
        self.out.indent();
        for value in &e.proto.value {
            self.out.line(format!("{}: {},", quote(value.name()), value.number()));
        }
        self.out.outdent();
        self.out.line("}");

        if !e.proto3 {
            self.out.line(format!("func (x {}) Enum() *{} {{", cc, cc));
            self.out.indent();
            self.out.line(format!("p := new({})", cc));
            self.out.line("*p = x");
            self.out.line("return p");
            self.out.outdent();
            self.out.line("}");
        }

        let proto = self.proto_pkg();
        self.out.line(format!("func (x {}) String() string {{", cc));
        self.out.indent();
        self.out
            .line(format!("return {}.EnumName({}_name, int32(x))", proto, cc));
        self.out.outdent();
        self.out.line("}");

        if !e.proto3 {
            self.out.line(format!("func (x *{}) UnmarshalJSON(data []byte) error {{", cc));
            self.out.indent();
            self.out.line(format!(
                "value, err := {}.UnmarshalJSONEnum({}_value, data, {})",
                proto,
                cc,
                quote(&cc)
            ));
            self.out.line("if err != nil {");
            self.out.indent();
            self.out.line("return err");
            self.out.outdent();
            self.out.line("}");
            self.out.line(format!("*x = {}(value)", cc));
            self.out.line("return nil");
            self.out.outdent();
            self.out.line("}");
        }

        self.out.line(format!(
            "func ({}) EnumDescriptor() ([]byte, []int) {{ return {}, []int{{{}}} }}",
            cc,
            self.fd().var_name(),
            descriptor_indexes(gen, e.parent, Some(e.index))
        ));
        if gen.set.file(e.file).proto.package() == "google.protobuf" && e.name() == "NullValue" {
            self.out.line(format!(
                "func ({}) XXX_WellKnownType() string {{ return {} }}",
                cc,
                quote(e.name())
            ));
        }

        self.out.blank();
        Ok(())
    }
}
