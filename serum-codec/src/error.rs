//! Error types for layout, instruction and queue codecs.

use solana_pubkey::Pubkey;
use thiserror::Error;

use crate::queue::QueueKind;

/// Every failure the codec can report.
///
/// Encode/decode failures are returned to the immediate caller. Registry
/// construction failures are fatal: the registry is never handed out.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("value {value} does not fit in {width}-byte field `{field}`")]
    OutOfRange {
        field: &'static str,
        width: usize,
        value: u128,
    },

    #[error("field `{field}` expects {expected} bytes, got {actual}")]
    SizeMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("buffer too short: need {needed} bytes at offset {offset}, {available} available")]
    MalformedBuffer {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("string field `{0}` is not valid UTF-8")]
    InvalidUtf8(&'static str),

    #[error("missing value for field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` is not declared by the schema")]
    UnknownField(String),

    #[error("field `{field}` expects a {expected} value")]
    KindMismatch {
        field: &'static str,
        expected: &'static str,
    },

    #[error("flag `{flag}` is not declared on field `{field}`")]
    UnknownFlag { field: &'static str, flag: String },

    #[error("invalid schema: {0}")]
    OverlappingOrInvalidSchema(String),

    #[error("discriminant {0} is already registered")]
    DuplicateDiscriminant(u32),

    #[error("instruction `{0}` is already registered")]
    DuplicateName(&'static str),

    #[error("unknown instruction discriminant {0}")]
    UnknownDiscriminant(u32),

    #[error("unknown instruction `{0}`")]
    UnknownInstruction(String),

    #[error("unsupported instruction version: expected {expected}, found {found}")]
    UnsupportedVersion { expected: u8, found: u8 },

    #[error("instruction targets {actual}, expected {expected}")]
    WrongProgram { expected: Pubkey, actual: Pubkey },

    #[error("instruction `{name}` needs {expected} accounts, got {actual}")]
    InsufficientKeys {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("no account supplied for role `{0}`")]
    MissingKey(&'static str),

    #[error("account for role `{0}` is supplied more than once")]
    DuplicateKey(&'static str),

    #[error("instruction `{name}` has no account role `{role}`")]
    UnknownRole { name: &'static str, role: String },

    #[error("account flags do not mark an initialized {0} queue")]
    InvalidQueueFlags(QueueKind),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Convenient Result type
pub type Result<T> = std::result::Result<T, CodecError>;
