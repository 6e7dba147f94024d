//! Symbols a file exports, and the forwarding declarations that re-export
//! them from a file importing it publicly.

use tracing::debug;

use super::FileEmitter;
use crate::error::GeneratorError;
use crate::resolver::is_direct;
use crate::types::Object;

/// A Go declaration that importers may need to forward.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Message(MessageSymbol),
    Enum(EnumSymbol),
    ConstOrVar(ConstOrVarSymbol),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageSymbol {
    pub sym:            String,
    pub has_extensions: bool,
    pub is_message_set: bool,
    pub has_oneof:      bool,
    pub getters:        Vec<GetterSymbol>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetterSymbol {
    pub name:  String,
    pub shape: GetterShape,
}

/// What a getter returns, in enough detail to rebuild the return type in
/// another package.
#[derive(Debug, Clone, PartialEq)]
pub enum GetterShape {
    /// A type that names no generated type, printed as is.
    Plain(String),
    /// A message or enum, possibly behind a pointer or in a slice.
    Named {
        target:   Object,
        pointer:  bool,
        repeated: bool,
    },
    /// A map whose values are messages or enums.
    Map {
        key:     String,
        target:  Object,
        pointer: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumSymbol {
    pub name:   String,
    pub proto3: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstOrVarSymbol {
    pub sym:  String,
    /// `const` or `var`.
    pub kind: &'static str,
    /// Conversion applied to the forwarded value, used for enum constants.
    pub cast: Option<String>,
}

impl FileEmitter<'_> {
    pub(super) fn alias(&mut self, sym: &Symbol, pkg: &str) -> Result<(), GeneratorError> {
        match sym {
            Symbol::Message(ms) => self.message_alias(ms, pkg),
            Symbol::Enum(es) => {
                self.enum_alias(es, pkg);
                Ok(())
            }
            Symbol::ConstOrVar(cs) => {
                let mut value = format!("{}.{}", pkg, cs.sym);
                if let Some(cast) = &cs.cast {
                    value = format!("{}({})", cast, value);
                }
                self.out.line(format!("{} {} = {}", cs.kind, cs.sym, value));
                Ok(())
            }
        }
    }

    fn enum_alias(&mut self, es: &EnumSymbol, pkg: &str) {
        let s = &es.name;
        self.out.line(format!("type {} {}.{}", s, pkg, s));
        self.out.line(format!("var {}_name = {}.{}_name", s, pkg, s));
        self.out.line(format!("var {}_value = {}.{}_value", s, pkg, s));
        self.out.line(format!(
            "func (x {}) String() string {{ return ({}.{})(x).String() }}",
            s, pkg, s
        ));
        if !es.proto3 {
            self.out.line(format!(
                "func (x {s}) Enum() *{s} {{ return (*{s})(({p}.{s})(x).Enum()) }}",
                s = s,
                p = pkg
            ));
            self.out.line(format!(
                "func (x *{s}) UnmarshalJSON(data []byte) error {{ return (*{p}.{s})(x).UnmarshalJSON(data) }}",
                s = s,
                p = pkg
            ));
        }
    }

    fn message_alias(&mut self, ms: &MessageSymbol, pkg: &str) -> Result<(), GeneratorError> {
        let sym = &ms.sym;
        let remote = format!("{}.{}", pkg, sym);

        self.out.line(format!("type {} {}", sym, remote));
        self.out
            .line(format!("func (m *{}) Reset() {{ (*{})(m).Reset() }}", sym, remote));
        self.out.line(format!(
            "func (m *{}) String() string {{ return (*{})(m).String() }}",
            sym, remote
        ));
        self.out.line(format!("func (*{}) ProtoMessage() {{}}", sym));

        if ms.has_extensions {
            let proto = self.proto_pkg();
            self.out.line(format!(
                "func (*{}) ExtensionRangeArray() []{}.ExtensionRange {{ return (*{})(nil).ExtensionRangeArray() }}",
                sym, proto, remote
            ));
            if ms.is_message_set {
                self.out.line(format!(
                    "func (m *{}) Marshal() ([]byte, error) {{ return (*{})(m).Marshal() }}",
                    sym, remote
                ));
                self.out.line(format!(
                    "func (m *{}) Unmarshal(buf []byte) error {{ return (*{})(m).Unmarshal(buf) }}",
                    sym, remote
                ));
            }
        }

        if ms.has_oneof {
            self.oneof_alias(sym, &remote);
        }

        for getter in &ms.getters {
            self.getter_alias(sym, &remote, getter)?;
        }
        Ok(())
    }

    /// Bridges the oneof functions of the aliased type. Only the binary
    /// format goes through these.
    fn oneof_alias(&mut self, sym: &str, remote: &str) {
        let proto = self.proto_pkg();
        let enc = format!("_{}_OneofMarshaler", sym);
        let dec = format!("_{}_OneofUnmarshaler", sym);
        let size = format!("_{}_OneofSizer", sym);
        // the aliased package may itself be named `b`
        let enc_sig = format!("(msg {p}.Message, buf *{p}.Buffer) error", p = proto);
        let dec_sig = format!("(msg {p}.Message, tag, wire int, buf *{p}.Buffer) (bool, error)", p = proto);
        let size_sig = format!("(msg {}.Message) int", proto);

        self.out.line(format!(
            "func (m *{}) XXX_OneofFuncs() (func{}, func{}, func{}, []interface{{}}) {{",
            sym, enc_sig, dec_sig, size_sig
        ));
        self.out.indent();
        self.out.line(format!("return {}, {}, {}, nil", enc, dec, size));
        self.out.outdent();
        self.out.line("}");

        let bridges = [
            (&enc, &enc_sig, "enc, _, _, _", "enc(m0, buf)"),
            (&dec, &dec_sig, "_, dec, _, _", "dec(m0, tag, wire, buf)"),
            (&size, &size_sig, "_, _, size, _", "size(m0)"),
        ];
        for (name, sig, unpack, call) in bridges {
            self.out.line(format!("func {}{} {{", name, sig));
            self.out.indent();
            self.out.line(format!("m := msg.(*{})", sym));
            self.out.line(format!("m0 := (*{})(m)", remote));
            self.out.line(format!("{} := m0.XXX_OneofFuncs()", unpack));
            self.out.line(format!("return {}", call));
            self.out.outdent();
            self.out.line("}");
        }
    }

    /// The name under which `target` can be written in this file. A type
    /// from a file this one does not import is qualified with its own
    /// package, which is then imported as well.
    fn local_type_name(&mut self, target: Object) -> Result<String, GeneratorError> {
        let gen = self.gen;

        // Our own forwarding alias of the same type.
        for &alias in &gen.set.file(self.file).imported {
            if gen.set.imported(alias).target == target {
                return gen.type_name(Object::Imported(alias));
            }
        }

        let owner = gen.set.file_of(target);
        let obj = if is_direct(&gen.set, owner, self.file) {
            target
        } else {
            match gen.types.alias_of(&gen.set, target, self.file) {
                Some(alias) => alias,
                None => {
                    debug!(
                        file = gen.set.file(self.file).name(),
                        owner = gen.set.file(owner).name(),
                        "importing package of a forwarded getter type"
                    );
                    self.indirect.insert(owner);
                    target
                }
            }
        };
        let (name, pkg) = gen.qualified_type_name(obj)?;
        if let Some(pkg) = pkg {
            self.out.use_package(&pkg);
        }
        Ok(name)
    }

    fn getter_alias(&mut self, sym: &str, remote: &str, getter: &GetterSymbol) -> Result<(), GeneratorError> {
        let value = format!("(*{})(m).{}()", remote, getter.name);
        let (target, pointer) = match &getter.shape {
            GetterShape::Plain(typ) => {
                self.out.line(format!(
                    "func (m *{}) {}() {} {{ return {} }}",
                    sym, getter.name, typ, value
                ));
                return Ok(());
            }
            GetterShape::Named { target, pointer, .. } | GetterShape::Map { target, pointer, .. } => {
                (*target, *pointer)
            }
        };

        let elem = self.local_type_name(target)?;
        let (typ, conv) = if pointer {
            (format!("*{}", elem), format!("(*{})", elem))
        } else {
            (elem.clone(), elem)
        };

        match &getter.shape {
            GetterShape::Named { repeated: true, .. } => {
                // Slices of distinct named types do not convert, so copy.
                self.out
                    .line(format!("func (m *{}) {}() []{} {{", sym, getter.name, typ));
                self.out.indent();
                self.out.line(format!("o := {}", value));
                self.out.line("if o == nil {");
                self.out.indent();
                self.out.line("return nil");
                self.out.outdent();
                self.out.line("}");
                self.out.line(format!("s := make([]{}, len(o))", typ));
                self.out.line("for i, x := range o {");
                self.out.indent();
                self.out.line(format!("s[i] = {}(x)", conv));
                self.out.outdent();
                self.out.line("}");
                self.out.line("return s");
                self.out.outdent();
                self.out.line("}");
            }
            GetterShape::Map { key, .. } => {
                let map = format!("map[{}]{}", key, typ);
                self.out
                    .line(format!("func (m *{}) {}() {} {{", sym, getter.name, map));
                self.out.indent();
                self.out.line(format!("o := {}", value));
                self.out.line("if o == nil {");
                self.out.indent();
                self.out.line("return nil");
                self.out.outdent();
                self.out.line("}");
                self.out.line(format!("s := make({}, len(o))", map));
                self.out.line("for k, v := range o {");
                self.out.indent();
                self.out.line(format!("s[k] = {}(v)", conv));
                self.out.outdent();
                self.out.line("}");
                self.out.line("return s");
                self.out.outdent();
                self.out.line("}");
            }
            _ => {
                self.out.line(format!(
                    "func (m *{}) {}() {} {{ return {}({}) }}",
                    sym, getter.name, typ, conv, value
                ));
            }
        }
        Ok(())
    }
}
