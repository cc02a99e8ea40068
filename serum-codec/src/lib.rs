//! Binary codecs for Solana programs and Serum DEX queue accounts.
//!
//! This crate provides:
//! - A field codec and layout schemas for fixed and length-prefixed binary layouts
//! - Instruction registries mapping names, discriminants, schemas and account roles
//! - Built-in registries and typed builders for the System and Serum DEX programs
//! - A ring-buffer decoder for DEX request and event queues
//! - A decoder registry, display configuration, table formatting and snapshots
//!
//! Registries and queue layouts are built once per process and are immutable
//! afterwards; every codec operation is a pure function over borrowed input.

pub use solana_instruction;
pub use solana_pubkey;

pub mod config;
pub mod cursor;
pub mod decoder;
pub mod error;
pub mod field;
pub mod formatter;
pub mod instruction;
pub mod programs;
pub mod queue;
pub mod registry;
pub mod schema;
pub mod snapshot;

pub use config::{CodecConfig, LogVerbosity};
pub use decoder::{DecoderRegistry, InstructionDecoder, ProgramDecoder, UNKNOWN_PROGRAM};
pub use error::{CodecError, Result};
pub use field::{FieldKind, FieldSpec, FieldValue, FieldValues, FlagSet};
pub use formatter::Formatter;
pub use instruction::{decode_discriminant, DecodedInstruction, KeyBinding};
pub use queue::{
    decode_event_queue, decode_queue, decode_request_queue, AccountFlags, DecodedQueue, EventNode,
    QueueHeader, QueueKind, QueueMode, QueueNode, RequestNode,
};
pub use registry::{InstructionRegistry, InstructionVariant, KeyRole, RegistryBuilder, VariantDef};
pub use schema::LayoutSchema;
