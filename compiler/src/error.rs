use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parsing input proto: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("failed to marshal output proto: {0}")]
    Encode(#[from] prost::EncodeError),

    #[error("no files to generate")]
    NoFilesToGenerate,

    #[error("could not find file named {0}")]
    FileNotFound(String),

    #[error("inconsistent package names: {found} {expected}")]
    InconsistentPackageNames {
        found:    String,
        expected: String,
    },

    #[error("internal error: {kind} nesting failure for {message}")]
    NestingMismatch {
        message: String,
        kind:    &'static str,
    },

    #[error("unknown type {kind} for field {field}")]
    UnknownFieldKind {
        field: String,
        kind:  i32,
    },

    #[error("can't find object with type {0}")]
    UnknownObject(String),

    #[error("cannot find value {value:?} for enum {enum_name}")]
    UnresolvedEnumDefault {
        enum_name: String,
        value:     String,
    },

    #[error("unknown enum type {0}")]
    NotAnEnum(String),

    #[error("bad Go source code was generated: {message}\n{listing}")]
    BadSource {
        message: String,
        listing: String,
    },

    #[error("internal error: {0}")]
    Internal(String),
}
