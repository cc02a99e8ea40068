//! Ring-buffer queue accounts.
//!
//! A queue account is a 37-byte header followed by a circular array of 80-byte
//! nodes. The header's `head` is the slot of the oldest live node and `count`
//! the number of live nodes; capacity (`alloc_len`) is whatever fits in the
//! rest of the buffer.
//!
//! Two read modes:
//! - [`QueueMode::Full`]: the live nodes, oldest first.
//! - [`QueueMode::History`]: the most recently written slots, newest first.
//!   When `count < alloc_len` this can surface slots left over from an earlier
//!   wraparound; they are returned as-is.

use std::{fmt, sync::OnceLock};

use solana_pubkey::Pubkey;

use crate::{
    error::{CodecError, Result},
    field::{FieldSpec, FieldValues, FlagSet},
    schema::LayoutSchema,
};

pub const ACCOUNT_FLAG_NAMES: &[&str] = &[
    "initialized",
    "market",
    "open_orders",
    "request_queue",
    "event_queue",
    "bids",
    "asks",
];
pub const REQUEST_FLAG_NAMES: &[&str] = &["new_order", "cancel_order", "bid", "post_only", "ioc"];
pub const EVENT_FLAG_NAMES: &[&str] = &["fill", "out", "bid", "maker"];

const HEADER_FIELDS: &[FieldSpec] = &[
    FieldSpec::padding(5),
    FieldSpec::flags("account_flags", 8, ACCOUNT_FLAG_NAMES),
    FieldSpec::u32("head"),
    FieldSpec::padding(4),
    FieldSpec::u32("count"),
    FieldSpec::padding(4),
    FieldSpec::u32("seq_num"),
    FieldSpec::padding(4),
];

const REQUEST_FIELDS: &[FieldSpec] = &[
    FieldSpec::flags("request_flags", 1, REQUEST_FLAG_NAMES),
    FieldSpec::u8("open_orders_slot"),
    FieldSpec::u8("fee_tier"),
    FieldSpec::padding(5),
    FieldSpec::u64("max_base_size_or_cancel_id"),
    FieldSpec::u64("native_quote_quantity_locked"),
    FieldSpec::u128("order_id"),
    FieldSpec::pubkey("open_orders"),
    FieldSpec::u64("client_order_id"),
];

const EVENT_FIELDS: &[FieldSpec] = &[
    FieldSpec::flags("event_flags", 1, EVENT_FLAG_NAMES),
    FieldSpec::u8("open_orders_slot"),
    FieldSpec::u8("fee_tier"),
    FieldSpec::padding(5),
    FieldSpec::u64("native_quantity_released"),
    FieldSpec::u64("native_quantity_paid"),
    FieldSpec::u128("order_id"),
    FieldSpec::pubkey("open_orders"),
    FieldSpec::u64("client_order_id"),
];

/// Span of the queue header.
pub const HEADER_SPAN: usize = 37;
/// Span of one request or event node.
pub const NODE_SPAN: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueKind {
    Request,
    Event,
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueKind::Request => write!(f, "request"),
            QueueKind::Event => write!(f, "event"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueMode {
    /// Every live node, oldest first.
    Full,
    /// Up to this many of the most recent slots, newest first.
    History(usize),
}

impl QueueMode {
    /// `None` reads the live nodes; `Some(n)` reads the last `n` slots.
    pub fn from_history(history: Option<usize>) -> Self {
        history.map_or(QueueMode::Full, QueueMode::History)
    }
}

/// Header and node schemas for one queue kind, built once per process.
#[derive(Debug)]
pub struct QueueLayout {
    kind: QueueKind,
    header: LayoutSchema,
    node: LayoutSchema,
    header_span: usize,
    node_span: usize,
}

static REQUEST_LAYOUT: OnceLock<Result<QueueLayout>> = OnceLock::new();
static EVENT_LAYOUT: OnceLock<Result<QueueLayout>> = OnceLock::new();

impl QueueLayout {
    pub fn get(kind: QueueKind) -> Result<&'static QueueLayout> {
        let cell = match kind {
            QueueKind::Request => &REQUEST_LAYOUT,
            QueueKind::Event => &EVENT_LAYOUT,
        };
        cell.get_or_init(|| Self::build(kind))
            .as_ref()
            .map_err(Clone::clone)
    }

    fn build(kind: QueueKind) -> Result<Self> {
        let node_fields = match kind {
            QueueKind::Request => REQUEST_FIELDS,
            QueueKind::Event => EVENT_FIELDS,
        };
        let header = LayoutSchema::compose(HEADER_FIELDS.iter().copied())?;
        let node = LayoutSchema::compose(node_fields.iter().copied())?;
        let (Some(header_span), Some(node_span @ 1..)) = (header.span(), node.span()) else {
            return Err(CodecError::OverlappingOrInvalidSchema(format!(
                "{kind} queue layout must have fixed, non-empty spans"
            )));
        };
        tracing::debug!(%kind, header_span, node_span, "built queue layout");
        Ok(Self {
            kind,
            header,
            node,
            header_span,
            node_span,
        })
    }

    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    pub fn header(&self) -> &LayoutSchema {
        &self.header
    }

    pub fn node(&self) -> &LayoutSchema {
        &self.node
    }

    pub fn header_span(&self) -> usize {
        self.header_span
    }

    pub fn node_span(&self) -> usize {
        self.node_span
    }

    /// Number of whole nodes that fit after the header.
    pub fn alloc_len(&self, buffer_len: usize) -> usize {
        buffer_len.saturating_sub(self.header_span) / self.node_span
    }
}

/// Bits 0..=6 of the header's 8-byte flag field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccountFlags {
    pub initialized: bool,
    pub market: bool,
    pub open_orders: bool,
    pub request_queue: bool,
    pub event_queue: bool,
    pub bids: bool,
    pub asks: bool,
}

impl AccountFlags {
    /// Flags of an initialized queue of `kind`.
    pub fn queue(kind: QueueKind) -> Self {
        Self {
            initialized: true,
            request_queue: kind == QueueKind::Request,
            event_queue: kind == QueueKind::Event,
            ..Self::default()
        }
    }

    /// Whether these flags mark an initialized queue of `kind`.
    pub fn marks(&self, kind: QueueKind) -> bool {
        self.initialized
            && match kind {
                QueueKind::Request => self.request_queue,
                QueueKind::Event => self.event_queue,
            }
    }

    fn from_set(set: &FlagSet) -> Self {
        let bit = |name: &str| set.get(name).copied().unwrap_or(false);
        Self {
            initialized: bit("initialized"),
            market: bit("market"),
            open_orders: bit("open_orders"),
            request_queue: bit("request_queue"),
            event_queue: bit("event_queue"),
            bids: bit("bids"),
            asks: bit("asks"),
        }
    }

    fn to_set(self) -> FlagSet {
        [
            ("initialized", self.initialized),
            ("market", self.market),
            ("open_orders", self.open_orders),
            ("request_queue", self.request_queue),
            ("event_queue", self.event_queue),
            ("bids", self.bids),
            ("asks", self.asks),
        ]
        .into_iter()
        .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueHeader {
    pub account_flags: AccountFlags,
    pub head: u32,
    pub count: u32,
    pub seq_num: u32,
}

impl QueueHeader {
    pub fn from_values(values: &FieldValues) -> Result<Self> {
        Ok(Self {
            account_flags: AccountFlags::from_set(values.flags("account_flags")?),
            head: values.u32("head")?,
            count: values.u32("count")?,
            seq_num: values.u32("seq_num")?,
        })
    }

    pub fn to_values(&self) -> FieldValues {
        FieldValues::new()
            .with("account_flags", self.account_flags.to_set())
            .with("head", self.head)
            .with("count", self.count)
            .with("seq_num", self.seq_num)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestFlags {
    pub new_order: bool,
    pub cancel_order: bool,
    pub bid: bool,
    pub post_only: bool,
    pub ioc: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestNode {
    pub flags: RequestFlags,
    pub open_orders_slot: u8,
    pub fee_tier: u8,
    pub max_base_size_or_cancel_id: u64,
    pub native_quote_quantity_locked: u64,
    pub order_id: u128,
    pub open_orders: Pubkey,
    pub client_order_id: u64,
}

impl RequestNode {
    pub fn from_values(values: &FieldValues) -> Result<Self> {
        let bit = |name| values.flag("request_flags", name);
        Ok(Self {
            flags: RequestFlags {
                new_order: bit("new_order")?,
                cancel_order: bit("cancel_order")?,
                bid: bit("bid")?,
                post_only: bit("post_only")?,
                ioc: bit("ioc")?,
            },
            open_orders_slot: values.u8("open_orders_slot")?,
            fee_tier: values.u8("fee_tier")?,
            max_base_size_or_cancel_id: values.u64("max_base_size_or_cancel_id")?,
            native_quote_quantity_locked: values.u64("native_quote_quantity_locked")?,
            order_id: values.unsigned("order_id")?,
            open_orders: values.pubkey("open_orders")?,
            client_order_id: values.u64("client_order_id")?,
        })
    }

    pub fn to_values(&self) -> FieldValues {
        let flags: FlagSet = [
            ("new_order", self.flags.new_order),
            ("cancel_order", self.flags.cancel_order),
            ("bid", self.flags.bid),
            ("post_only", self.flags.post_only),
            ("ioc", self.flags.ioc),
        ]
        .into_iter()
        .collect();
        FieldValues::new()
            .with("request_flags", flags)
            .with("open_orders_slot", self.open_orders_slot)
            .with("fee_tier", self.fee_tier)
            .with("max_base_size_or_cancel_id", self.max_base_size_or_cancel_id)
            .with("native_quote_quantity_locked", self.native_quote_quantity_locked)
            .with("order_id", self.order_id)
            .with("open_orders", self.open_orders)
            .with("client_order_id", self.client_order_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventFlags {
    pub fill: bool,
    pub out: bool,
    pub bid: bool,
    pub maker: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventNode {
    pub flags: EventFlags,
    pub open_orders_slot: u8,
    pub fee_tier: u8,
    pub native_quantity_released: u64,
    pub native_quantity_paid: u64,
    pub order_id: u128,
    pub open_orders: Pubkey,
    pub client_order_id: u64,
}

impl EventNode {
    pub fn from_values(values: &FieldValues) -> Result<Self> {
        let bit = |name| values.flag("event_flags", name);
        Ok(Self {
            flags: EventFlags {
                fill: bit("fill")?,
                out: bit("out")?,
                bid: bit("bid")?,
                maker: bit("maker")?,
            },
            open_orders_slot: values.u8("open_orders_slot")?,
            fee_tier: values.u8("fee_tier")?,
            native_quantity_released: values.u64("native_quantity_released")?,
            native_quantity_paid: values.u64("native_quantity_paid")?,
            order_id: values.unsigned("order_id")?,
            open_orders: values.pubkey("open_orders")?,
            client_order_id: values.u64("client_order_id")?,
        })
    }

    pub fn to_values(&self) -> FieldValues {
        let flags: FlagSet = [
            ("fill", self.flags.fill),
            ("out", self.flags.out),
            ("bid", self.flags.bid),
            ("maker", self.flags.maker),
        ]
        .into_iter()
        .collect();
        FieldValues::new()
            .with("event_flags", flags)
            .with("open_orders_slot", self.open_orders_slot)
            .with("fee_tier", self.fee_tier)
            .with("native_quantity_released", self.native_quantity_released)
            .with("native_quantity_paid", self.native_quantity_paid)
            .with("order_id", self.order_id)
            .with("open_orders", self.open_orders)
            .with("client_order_id", self.client_order_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueNode {
    Request(RequestNode),
    Event(EventNode),
}

impl QueueNode {
    pub fn from_values(kind: QueueKind, values: &FieldValues) -> Result<Self> {
        match kind {
            QueueKind::Request => RequestNode::from_values(values).map(QueueNode::Request),
            QueueKind::Event => EventNode::from_values(values).map(QueueNode::Event),
        }
    }

    pub fn to_values(&self) -> FieldValues {
        match self {
            QueueNode::Request(node) => node.to_values(),
            QueueNode::Event(node) => node.to_values(),
        }
    }

    pub fn kind(&self) -> QueueKind {
        match self {
            QueueNode::Request(_) => QueueKind::Request,
            QueueNode::Event(_) => QueueKind::Event,
        }
    }

    pub fn order_id(&self) -> u128 {
        match self {
            QueueNode::Request(node) => node.order_id,
            QueueNode::Event(node) => node.order_id,
        }
    }

    pub fn open_orders(&self) -> Pubkey {
        match self {
            QueueNode::Request(node) => node.open_orders,
            QueueNode::Event(node) => node.open_orders,
        }
    }
}

/// A queue read from one account snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedQueue {
    pub kind: QueueKind,
    pub header: QueueHeader,
    pub nodes: Vec<QueueNode>,
}

/// Slot indices to read, in emission order.
///
/// Full mode walks forward from `head` over at most `alloc_len` live slots;
/// history mode walks backward from the newest slot.
pub fn node_indices(head: u32, count: u32, alloc_len: usize, mode: QueueMode) -> Vec<usize> {
    if alloc_len == 0 {
        return Vec::new();
    }
    let head = head as usize;
    let count = count as usize;
    match mode {
        QueueMode::Full => (0..count.min(alloc_len))
            .map(|i| (head + i) % alloc_len)
            .collect(),
        QueueMode::History(limit) => (0..limit.min(alloc_len))
            .map(|i| (head + count + alloc_len - 1 - i) % alloc_len)
            .collect(),
    }
}

/// Decode a queue account snapshot.
///
/// Fails with `InvalidQueueFlags` unless the header marks an initialized queue
/// of `kind`. A buffer with no room for a whole node yields no nodes.
pub fn decode_queue(buffer: &[u8], kind: QueueKind, mode: QueueMode) -> Result<DecodedQueue> {
    let layout = QueueLayout::get(kind)?;
    let header = QueueHeader::from_values(&layout.header.decode(buffer, 0)?)?;
    if !header.account_flags.marks(kind) {
        return Err(CodecError::InvalidQueueFlags(kind));
    }

    let alloc_len = layout.alloc_len(buffer.len());
    let nodes = node_indices(header.head, header.count, alloc_len, mode)
        .into_iter()
        .map(|index| {
            let offset = layout.header_span + index * layout.node_span;
            QueueNode::from_values(kind, &layout.node.decode(buffer, offset)?)
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::trace!(
        %kind,
        head = header.head,
        count = header.count,
        alloc_len,
        emitted = nodes.len(),
        "decoded queue"
    );
    Ok(DecodedQueue {
        kind,
        header,
        nodes,
    })
}

pub fn decode_request_queue(buffer: &[u8], history: Option<usize>) -> Result<Vec<RequestNode>> {
    let queue = decode_queue(buffer, QueueKind::Request, QueueMode::from_history(history))?;
    Ok(queue
        .nodes
        .into_iter()
        .filter_map(|node| match node {
            QueueNode::Request(node) => Some(node),
            QueueNode::Event(_) => None,
        })
        .collect())
}

pub fn decode_event_queue(buffer: &[u8], history: Option<usize>) -> Result<Vec<EventNode>> {
    let queue = decode_queue(buffer, QueueKind::Event, QueueMode::from_history(history))?;
    Ok(queue
        .nodes
        .into_iter()
        .filter_map(|node| match node {
            QueueNode::Event(node) => Some(node),
            QueueNode::Request(_) => None,
        })
        .collect())
}
