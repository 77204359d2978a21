//! Error types for XdrAsm

use thiserror::Error;

#[derive(Error, Debug)]
pub enum XdrAsmError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Integer out of range: {value} does not fit in {target}")]
    IntegerRange {
        value: String,
        target: &'static str,
    },

    #[error("Integer overflow: {0}")]
    IntegerOverflow(String),

    #[error("Invalid integer: {0:?} is not a decimal number")]
    InvalidInteger(String),

    #[error("Missing argument: {0}")]
    MissingArgument(String),

    #[error("Type mismatch: expected {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Unknown struct field: {0}")]
    UnknownField(String),

    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),

    #[error("Argument `{name}`: {source}")]
    Argument {
        name: String,
        #[source]
        source: Box<XdrAsmError>,
    },

    #[error("Transaction has no operations")]
    EmptyTransaction,

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Simulation failed: {0}")]
    SimulationFailed(String),

    #[error("Envelope invokes a contract and must be prepared before signing")]
    PreparationRequired,

    #[error("Invalid secret key: {0}")]
    InvalidSecretKey(String),

    #[error("Too many signatures: at most {max} allowed")]
    TooManySignatures { max: usize },

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Envelope carries no signatures")]
    Unsigned,

    #[error("Buffer too small: needed {needed} bytes, got {available}")]
    BufferTooSmall {
        needed: usize,
        available: usize,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl XdrAsmError {
    /// Attach the name of the contract argument that produced this error.
    pub fn for_argument(self, name: &str) -> Self {
        XdrAsmError::Argument {
            name: name.to_string(),
            source: Box::new(self),
        }
    }

    /// Collapse any decoding failure into `MalformedEnvelope`.
    pub(crate) fn into_malformed(self) -> Self {
        match self {
            e @ XdrAsmError::MalformedEnvelope(_) => e,
            other => XdrAsmError::MalformedEnvelope(other.to_string()),
        }
    }
}

impl From<std::io::Error> for XdrAsmError {
    fn from(err: std::io::Error) -> Self {
        XdrAsmError::SerializationError(err.to_string())
    }
}

impl From<base64::DecodeError> for XdrAsmError {
    fn from(err: base64::DecodeError) -> Self {
        XdrAsmError::MalformedEnvelope(format!("invalid base64: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, XdrAsmError>;
