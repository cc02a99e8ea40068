//! Shared fixtures for the serum-codec integration suites.
//!
//! Provides deterministic keys, a sample market, and a builder that lays out
//! queue account buffers through the same schemas the decoder reads.

use serum_codec::{
    programs::dex::MarketAccounts,
    queue::{EventFlags, QueueLayout, RequestFlags},
    AccountFlags, EventNode, QueueHeader, QueueKind, QueueNode, RequestNode,
};
use solana_pubkey::Pubkey;

/// Deterministic key filled with `seed`.
pub fn key(seed: u8) -> Pubkey {
    Pubkey::new_from_array([seed; 32])
}

pub fn market_accounts() -> MarketAccounts {
    MarketAccounts {
        market: key(1),
        request_queue: key(2),
        event_queue: key(3),
        bids: key(4),
        asks: key(5),
        base_vault: key(6),
        quote_vault: key(7),
    }
}

/// Request node whose order id is `slot`.
pub fn request_node(slot: usize) -> RequestNode {
    RequestNode {
        flags: RequestFlags {
            new_order: true,
            bid: slot % 2 == 0,
            ..RequestFlags::default()
        },
        open_orders_slot: (slot % 128) as u8,
        fee_tier: 0,
        max_base_size_or_cancel_id: 1_000 + slot as u64,
        native_quote_quantity_locked: 50_000,
        order_id: slot as u128,
        open_orders: key(100),
        client_order_id: 7,
    }
}

/// Event node whose order id is `slot`.
pub fn event_node(slot: usize) -> EventNode {
    EventNode {
        flags: EventFlags {
            fill: true,
            maker: slot % 2 == 1,
            ..EventFlags::default()
        },
        open_orders_slot: (slot % 128) as u8,
        fee_tier: 2,
        native_quantity_released: 10 * slot as u64,
        native_quantity_paid: 20 * slot as u64,
        order_id: slot as u128,
        open_orders: key(101),
        client_order_id: 9,
    }
}

pub fn node_at(kind: QueueKind, slot: usize) -> QueueNode {
    match kind {
        QueueKind::Request => QueueNode::Request(request_node(slot)),
        QueueKind::Event => QueueNode::Event(event_node(slot)),
    }
}

/// Builds a queue account buffer. Slot `i` holds [`node_at`]`(kind, i)`.
#[derive(Debug, Clone)]
pub struct QueueBuilder {
    kind: QueueKind,
    header: QueueHeader,
    alloc_len: usize,
    trailing_bytes: usize,
}

impl QueueBuilder {
    pub fn new(kind: QueueKind, alloc_len: usize) -> Self {
        Self {
            kind,
            header: QueueHeader {
                account_flags: AccountFlags::queue(kind),
                head: 0,
                count: 0,
                seq_num: 0,
            },
            alloc_len,
            trailing_bytes: 0,
        }
    }

    pub fn head(mut self, head: u32) -> Self {
        self.header.head = head;
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.header.count = count;
        self
    }

    pub fn seq_num(mut self, seq_num: u32) -> Self {
        self.header.seq_num = seq_num;
        self
    }

    pub fn flags(mut self, flags: AccountFlags) -> Self {
        self.header.account_flags = flags;
        self
    }

    /// Extra bytes after the last whole node (too few to hold another one).
    pub fn trailing_bytes(mut self, len: usize) -> Self {
        self.trailing_bytes = len;
        self
    }

    pub fn header(&self) -> QueueHeader {
        self.header
    }

    pub fn build(&self) -> Vec<u8> {
        let layout = QueueLayout::get(self.kind).expect("queue layout");
        let mut buffer = layout
            .header()
            .encode(&self.header.to_values())
            .expect("encode header");
        for slot in 0..self.alloc_len {
            layout
                .node()
                .encode_into(&node_at(self.kind, slot).to_values(), &mut buffer)
                .expect("encode node");
        }
        buffer.resize(buffer.len() + self.trailing_bytes, 0xaa);
        buffer
    }
}
