use super::alias::{ConstOrVarSymbol, Symbol};
use super::FileEmitter;
use crate::error::GeneratorError;
use crate::types::{ExtensionId, Object};
use crate::utils::quote;

impl FileEmitter<'_> {
    pub(super) fn extension(&mut self, id: ExtensionId) -> Result<(), GeneratorError> {
        let gen = self.gen;
        let ext = gen.set.extension(id);
        let field = &ext.field;
        let desc_name = ext.desc_name();

        // The tag is computed against the extended message itself, even
        // when it is reached through a public import.
        let extendee = gen.resolve(field.extendee(), self.file)?;
        let extended = match gen.set.underlying(extendee) {
            Object::Message(m) => m,
            _ => {
                return Err(GeneratorError::Internal(format!(
                    "extension {} extends {}, which is not a message",
                    desc_name,
                    field.extendee()
                )))
            }
        };
        let (extended_name, extended_pkg) = gen.qualified_type_name(extendee)?;
        if let Some(pkg) = &extended_pkg {
            self.out.use_package(pkg);
        }
        let extended_type = format!("*{}", extended_name);

        let go_type = self.go_type(ext.parent, field)?;
        let tag = gen.go_tag(self.file, extended, field, go_type.wire)?;

        // Extensions of proto2_bridge.MessageSet named message_set_extension
        // are registered under their enclosing scope.
        let mut type_name: &[String] = &ext.type_name;
        let mut message_set = false;
        if extended_type == "*proto2_bridge.MessageSet"
            && type_name.last().map_or(false, |n| n == "message_set_extension")
        {
            type_name = &type_name[..type_name.len() - 1];
            message_set = true;
        }

        // Text formatting wants the package exactly as the file declares it.
        let package = self.fd().proto.package();
        let ext_name = if package.is_empty() {
            type_name.join(".")
        } else {
            format!("{}.{}", package, type_name.join("."))
        };

        let proto = self.proto_pkg();
        self.out
            .line(format!("var {} = &{}.ExtensionDesc{{", desc_name, proto));
        self.out.indent();
        self.out.line(format!("ExtendedType: ({})(nil),", extended_type));
        self.out.line(format!("ExtensionType: ({})(nil),", go_type.typ));
        self.out.line(format!("Field: {},", field.number()));
        self.out.line(format!("Name: {},", quote(&ext_name)));
        self.out.line(format!("Tag: {},", tag));
        self.out.line(format!("Filename: {},", quote(self.fd().name())));
        self.out.outdent();
        self.out.line("}");
        self.out.blank();

        if message_set {
            self.init.push(format!(
                "{}.RegisterMessageSetType(({})(nil), {}, {})",
                proto,
                go_type.typ,
                field.number(),
                quote(&ext_name)
            ));
        }

        self.export(
            Object::Extension(id),
            Symbol::ConstOrVar(ConstOrVarSymbol {
                sym:  desc_name,
                kind: "var",
                cast: None,
            }),
        );
        Ok(())
    }
}
