//! Human-readable tables for decoded instructions and queues.

use std::fmt::Write;

use solana_instruction::Instruction;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

use crate::{
    config::{CodecConfig, LogVerbosity},
    decoder::DecoderRegistry,
    error::Result,
    field::FieldValues,
    instruction::DecodedInstruction,
    queue::{DecodedQueue, QueueNode},
};

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    name: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Account")]
    pubkey: String,
    #[tabled(rename = "Access")]
    access: &'static str,
}

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Flags")]
    flags: String,
    #[tabled(rename = "Order Id")]
    order_id: u128,
    #[tabled(rename = "Open Orders")]
    open_orders: String,
}

fn access(is_signer: bool, is_writable: bool) -> &'static str {
    match (is_signer, is_writable) {
        (true, true) => "signer, writable",
        (true, false) => "signer",
        (false, true) => "writable",
        (false, false) => "readonly",
    }
}

fn render(mut table: Table) -> String {
    table.with(Style::rounded());
    table.to_string()
}

/// Renders decoded output according to a [`CodecConfig`].
pub struct Formatter<'a> {
    config: &'a CodecConfig,
}

impl<'a> Formatter<'a> {
    pub fn new(config: &'a CodecConfig) -> Self {
        Self { config }
    }

    /// Decode `instruction` with `decoders` and render it.
    pub fn format_instruction(&self, decoders: &DecoderRegistry, instruction: &Instruction) -> String {
        self.format_decoded(decoders, instruction, decoders.decode(instruction))
    }

    /// Render an instruction from an already computed decode result.
    fn format_decoded(
        &self,
        decoders: &DecoderRegistry,
        instruction: &Instruction,
        decoded: Option<Result<DecodedInstruction>>,
    ) -> String {
        let program_name = decoders.program_name(&instruction.program_id);
        let mut out = String::new();

        let decoded = match decoded {
            None => {
                let _ = writeln!(
                    out,
                    "[{program_name}] {} ({} bytes)",
                    instruction.program_id,
                    instruction.data.len()
                );
                None
            }
            Some(Err(err)) => {
                let _ = writeln!(out, "[{program_name}] <decode failed: {err}>");
                None
            }
            Some(Ok(decoded)) => {
                let _ = writeln!(out, "[{program_name}] {}", decoded.name);
                Some(decoded)
            }
        };
        if self.config.verbosity == LogVerbosity::Brief {
            return out;
        }

        if let Some(decoded) = &decoded {
            if !decoded.fields.is_empty() {
                out.push_str(&render(Table::new(field_rows(&decoded.fields))));
                out.push('\n');
            }
        }

        let roles: Vec<&str> = decoded
            .as_ref()
            .map(|decoded| decoded.accounts.iter().map(|binding| binding.role).collect())
            .unwrap_or_default();
        if !instruction.accounts.is_empty() {
            let rows = instruction.accounts.iter().enumerate().map(|(index, meta)| AccountRow {
                index,
                role: roles.get(index).copied().unwrap_or("-").to_string(),
                pubkey: meta.pubkey.to_string(),
                access: access(meta.is_signer, meta.is_writable),
            });
            out.push_str(&render(Table::new(rows)));
            out.push('\n');
        }

        if self.config.verbosity == LogVerbosity::Detailed {
            let _ = writeln!(out, "data: {}", bs58::encode(&instruction.data).into_string());
        }
        out
    }

    /// Format and emit one instruction through `tracing`.
    ///
    /// Failed decodes are always emitted; successful ones only when
    /// `log_events` is set.
    pub fn log_instruction(&self, decoders: &DecoderRegistry, instruction: &Instruction) {
        let decoded = decoders.decode(instruction);
        let failed = matches!(decoded, Some(Err(_)));
        if self.config.log_events || failed {
            tracing::info!("\n{}", self.format_decoded(decoders, instruction, decoded));
        }
    }

    /// Render a queue header and up to `max_queue_rows` nodes.
    pub fn format_queue(&self, queue: &DecodedQueue) -> String {
        let header = queue.header.to_values();
        let flags = header
            .get("account_flags")
            .map(ToString::to_string)
            .unwrap_or_default();
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} queue: head={} count={} seq_num={} flags={flags}",
            queue.kind, queue.header.head, queue.header.count, queue.header.seq_num
        );
        if self.config.verbosity == LogVerbosity::Brief || queue.nodes.is_empty() {
            return out;
        }

        let shown = queue.nodes.len().min(self.config.max_queue_rows);
        let nodes = &queue.nodes[..shown];
        let table = if self.config.verbosity == LogVerbosity::Detailed {
            detailed_node_table(nodes)
        } else {
            Table::new(nodes.iter().enumerate().map(|(index, node)| NodeRow {
                index,
                flags: node_flags(node),
                order_id: node.order_id(),
                open_orders: node.open_orders().to_string(),
            }))
        };
        out.push_str(&render(table));
        out.push('\n');
        if shown < queue.nodes.len() {
            let _ = writeln!(out, "... {} more", queue.nodes.len() - shown);
        }
        out
    }
}

fn field_rows(values: &FieldValues) -> Vec<FieldRow> {
    values
        .iter()
        .map(|(name, value)| FieldRow {
            name,
            value: value.to_string(),
        })
        .collect()
}

fn node_flags(node: &QueueNode) -> String {
    let values = node.to_values();
    let field = match node {
        QueueNode::Request(_) => "request_flags",
        QueueNode::Event(_) => "event_flags",
    };
    values.get(field).map(ToString::to_string).unwrap_or_default()
}

/// Every node field as a column, in name order.
fn detailed_node_table(nodes: &[QueueNode]) -> Table {
    let mut builder = Builder::default();
    let rows: Vec<FieldValues> = nodes.iter().map(QueueNode::to_values).collect();
    if let Some(first) = rows.first() {
        let header = std::iter::once("#".to_string())
            .chain(first.iter().map(|(name, _)| name.to_string()));
        builder.push_record(header);
    }
    for (index, values) in rows.iter().enumerate() {
        let record = std::iter::once(index.to_string())
            .chain(values.iter().map(|(_, value)| value.to_string()));
        builder.push_record(record);
    }
    builder.build()
}
