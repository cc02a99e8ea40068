//! JSON-serializable snapshots of decoded output (for insta).
//!
//! Values are rendered to strings so snapshots stay stable across numeric
//! widths and key types.

use serde::Serialize;
use solana_instruction::Instruction;

use crate::{
    decoder::DecoderRegistry,
    field::FieldValues,
    queue::{DecodedQueue, QueueNode},
};

/// JSON-serializable snapshot of a single instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructionSnapshot {
    pub program_id: String,
    pub program_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction_name: Option<String>,
    pub accounts: Vec<AccountSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoded_fields: Option<Vec<FieldSnapshot>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// JSON-serializable snapshot of an account reference within an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub pubkey: String,
    pub is_signer: bool,
    pub is_writable: bool,
}

/// JSON-serializable snapshot of a decoded field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSnapshot {
    pub name: String,
    pub value: String,
}

/// JSON-serializable snapshot of a decoded queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueSnapshot {
    pub kind: String,
    pub account_flags: String,
    pub head: u32,
    pub count: u32,
    pub seq_num: u32,
    pub nodes: Vec<Vec<FieldSnapshot>>,
}

pub(crate) fn field_snapshots(values: &FieldValues) -> Vec<FieldSnapshot> {
    values
        .iter()
        .map(|(name, value)| FieldSnapshot {
            name: name.to_string(),
            value: value.to_string(),
        })
        .collect()
}

/// Decode `instruction` with `decoders` and snapshot the result.
///
/// Unknown programs keep only their accounts; decode failures are recorded
/// in `error`.
pub fn instruction_snapshot(decoders: &DecoderRegistry, instruction: &Instruction) -> InstructionSnapshot {
    let decoded = decoders.decode(instruction);
    let (instruction_name, decoded_fields, error, roles): (_, _, _, Vec<&str>) = match &decoded {
        Some(Ok(decoded)) => (
            Some(decoded.name.to_string()),
            Some(field_snapshots(&decoded.fields)),
            None,
            decoded.accounts.iter().map(|binding| binding.role).collect(),
        ),
        Some(Err(err)) => (None, None, Some(err.to_string()), Vec::new()),
        None => (None, None, None, Vec::new()),
    };

    let accounts = instruction
        .accounts
        .iter()
        .enumerate()
        .map(|(index, meta)| AccountSnapshot {
            role: roles.get(index).map(|role| role.to_string()),
            pubkey: meta.pubkey.to_string(),
            is_signer: meta.is_signer,
            is_writable: meta.is_writable,
        })
        .collect();

    InstructionSnapshot {
        program_id: instruction.program_id.to_string(),
        program_name: decoders.program_name(&instruction.program_id).to_string(),
        instruction_name,
        accounts,
        decoded_fields,
        error,
    }
}

pub fn queue_snapshot(queue: &DecodedQueue) -> QueueSnapshot {
    let header = queue.header.to_values();
    QueueSnapshot {
        kind: queue.kind.to_string(),
        account_flags: header
            .get("account_flags")
            .map(ToString::to_string)
            .unwrap_or_default(),
        head: queue.header.head,
        count: queue.header.count,
        seq_num: queue.header.seq_num,
        nodes: queue
            .nodes
            .iter()
            .map(QueueNode::to_values)
            .map(|values| field_snapshots(&values))
            .collect(),
    }
}
