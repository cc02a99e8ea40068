//! Serum DEX program: instruction table and typed builders.
//!
//! DEX instruction data starts with a version byte (0) ahead of the u32 tag.
//! Builders take the program id explicitly since one market program can be
//! deployed at several addresses; [`ID`] is the v3 mainnet deployment.

use std::sync::OnceLock;

use solana_instruction::{AccountMeta, Instruction};
use solana_pubkey::Pubkey;

use crate::{
    error::{CodecError, Result},
    field::{FieldSpec, FieldValues},
    registry::{InstructionRegistry, KeyRole, VariantDef},
};

use super::system::RENT_SYSVAR;

pub const ID: Pubkey = solana_pubkey::pubkey!("9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin");
pub const PROGRAM_NAME: &str = "Serum DEX v3";
pub const TOKEN_PROGRAM_ID: Pubkey =
    solana_pubkey::pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");

/// Version byte written before every DEX discriminant.
pub const INSTRUCTION_VERSION: u8 = 0;

const VARIANTS: &[VariantDef] = &[
    VariantDef {
        name: "InitializeMarket",
        discriminant: 0,
        fields: &[
            FieldSpec::u64("base_lot_size"),
            FieldSpec::u64("quote_lot_size"),
            FieldSpec::u16("fee_rate_bps"),
            FieldSpec::u64("vault_signer_nonce"),
            FieldSpec::u64("quote_dust_threshold"),
        ],
        key_roles: &[
            KeyRole::writable("market"),
            KeyRole::writable("request_queue"),
            KeyRole::writable("event_queue"),
            KeyRole::writable("bids"),
            KeyRole::writable("asks"),
            KeyRole::writable("base_vault"),
            KeyRole::writable("quote_vault"),
            KeyRole::readonly("base_mint"),
            KeyRole::readonly("quote_mint"),
            KeyRole::readonly("rent"),
        ],
    },
    VariantDef {
        name: "NewOrder",
        discriminant: 1,
        fields: &[
            FieldSpec::u32("side"),
            FieldSpec::u64("limit_price"),
            FieldSpec::u64("max_quantity"),
            FieldSpec::u32("order_type"),
            FieldSpec::u64("client_id"),
        ],
        key_roles: &[
            KeyRole::writable("market"),
            KeyRole::writable("open_orders"),
            KeyRole::writable("request_queue"),
            KeyRole::writable("payer"),
            KeyRole::signer("owner"),
            KeyRole::writable("base_vault"),
            KeyRole::writable("quote_vault"),
            KeyRole::readonly("token_program"),
            KeyRole::readonly("rent"),
        ],
    },
    VariantDef {
        name: "MatchOrders",
        discriminant: 2,
        fields: &[FieldSpec::u16("limit")],
        key_roles: &[
            KeyRole::writable("market"),
            KeyRole::writable("request_queue"),
            KeyRole::writable("event_queue"),
            KeyRole::writable("bids"),
            KeyRole::writable("asks"),
            KeyRole::writable("base_vault"),
            KeyRole::writable("quote_vault"),
        ],
    },
    // Accounts are the open-orders list followed by market, event queue and
    // the two fee accounts; all of them trail.
    VariantDef {
        name: "ConsumeEvents",
        discriminant: 3,
        fields: &[FieldSpec::u16("limit")],
        key_roles: &[],
    },
    VariantDef {
        name: "CancelOrder",
        discriminant: 4,
        fields: &[
            FieldSpec::u32("side"),
            FieldSpec::u128("order_id"),
            FieldSpec::pubkey("open_orders"),
            FieldSpec::u8("open_orders_slot"),
        ],
        key_roles: &[
            KeyRole::readonly("market"),
            KeyRole::writable("open_orders"),
            KeyRole::writable("request_queue"),
            KeyRole::signer("owner"),
        ],
    },
    VariantDef {
        name: "SettleFunds",
        discriminant: 5,
        fields: &[],
        key_roles: &[
            KeyRole::writable("market"),
            KeyRole::writable("open_orders"),
            KeyRole::signer("owner"),
            KeyRole::writable("base_vault"),
            KeyRole::writable("quote_vault"),
            KeyRole::writable("base_wallet"),
            KeyRole::writable("quote_wallet"),
            KeyRole::readonly("vault_signer"),
            KeyRole::readonly("token_program"),
        ],
    },
    VariantDef {
        name: "CancelOrderByClientId",
        discriminant: 6,
        fields: &[FieldSpec::u64("client_id")],
        key_roles: &[
            KeyRole::readonly("market"),
            KeyRole::writable("open_orders"),
            KeyRole::writable("request_queue"),
            KeyRole::signer("owner"),
        ],
    },
    VariantDef {
        name: "NewOrderV3",
        discriminant: 10,
        fields: &[
            FieldSpec::u32("side"),
            FieldSpec::u64("limit_price"),
            FieldSpec::u64("max_base_quantity"),
            FieldSpec::u64("max_quote_quantity"),
            FieldSpec::u32("self_trade_behavior"),
            FieldSpec::u32("order_type"),
            FieldSpec::u64("client_id"),
            FieldSpec::u16("limit"),
        ],
        key_roles: &[
            KeyRole::writable("market"),
            KeyRole::writable("open_orders"),
            KeyRole::writable("request_queue"),
            KeyRole::writable("event_queue"),
            KeyRole::writable("bids"),
            KeyRole::writable("asks"),
            KeyRole::writable("payer"),
            KeyRole::signer("owner"),
            KeyRole::writable("base_vault"),
            KeyRole::writable("quote_vault"),
            KeyRole::readonly("token_program"),
            KeyRole::readonly("rent"),
        ],
    },
    VariantDef {
        name: "CancelOrderV2",
        discriminant: 11,
        fields: &[FieldSpec::u32("side"), FieldSpec::u128("order_id")],
        key_roles: CANCEL_V2_ROLES,
    },
    VariantDef {
        name: "CancelOrderByClientIdV2",
        discriminant: 12,
        fields: &[FieldSpec::u64("client_id")],
        key_roles: CANCEL_V2_ROLES,
    },
];

const CANCEL_V2_ROLES: &[KeyRole] = &[
    KeyRole::readonly("market"),
    KeyRole::writable("bids"),
    KeyRole::writable("asks"),
    KeyRole::writable("open_orders"),
    KeyRole::signer("owner"),
    KeyRole::writable("event_queue"),
];

static REGISTRY: OnceLock<Result<InstructionRegistry>> = OnceLock::new();

/// The DEX registry, built on first use.
pub fn registry() -> Result<&'static InstructionRegistry> {
    REGISTRY
        .get_or_init(|| {
            Ok(InstructionRegistry::builder(PROGRAM_NAME)
                .version(INSTRUCTION_VERSION)
                .register_all(VARIANTS)?
                .build())
        })
        .as_ref()
        .map_err(Clone::clone)
}

fn build(
    program_id: Pubkey,
    name: &str,
    values: FieldValues,
    keys: &[(&str, Pubkey)],
    remaining: Vec<AccountMeta>,
) -> Result<Instruction> {
    registry()?.build(program_id, name, &values, keys, remaining)
}

// ---------------------------------------------------------------------------
// Enumerated fields (encoded as u32)
// ---------------------------------------------------------------------------

macro_rules! u32_enum {
    ($name:ident, $field:literal { $($variant:ident = $code:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn code(self) -> u32 {
                match self {
                    $($name::$variant => $code),+
                }
            }
        }

        impl TryFrom<u32> for $name {
            type Error = CodecError;

            fn try_from(code: u32) -> Result<Self> {
                match code {
                    $($code => Ok($name::$variant),)+
                    other => Err(CodecError::OutOfRange {
                        field: $field,
                        width: 4,
                        value: other.into(),
                    }),
                }
            }
        }
    };
}

u32_enum!(Side, "side" { Buy = 0, Sell = 1 });
u32_enum!(OrderType, "order_type" {
    Limit = 0,
    ImmediateOrCancel = 1,
    PostOnly = 2,
});
u32_enum!(SelfTradeBehavior, "self_trade_behavior" {
    DecrementTake = 0,
    CancelProvide = 1,
    AbortTransaction = 2,
});

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// The accounts that make up one market.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketAccounts {
    pub market: Pubkey,
    pub request_queue: Pubkey,
    pub event_queue: Pubkey,
    pub bids: Pubkey,
    pub asks: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializeMarketParams {
    pub accounts: MarketAccounts,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub base_lot_size: u64,
    pub quote_lot_size: u64,
    pub fee_rate_bps: u16,
    pub vault_signer_nonce: u64,
    pub quote_dust_threshold: u64,
}

pub fn initialize_market(program_id: Pubkey, params: &InitializeMarketParams) -> Result<Instruction> {
    let m = &params.accounts;
    build(
        program_id,
        "InitializeMarket",
        FieldValues::new()
            .with("base_lot_size", params.base_lot_size)
            .with("quote_lot_size", params.quote_lot_size)
            .with("fee_rate_bps", params.fee_rate_bps)
            .with("vault_signer_nonce", params.vault_signer_nonce)
            .with("quote_dust_threshold", params.quote_dust_threshold),
        &[
            ("market", m.market),
            ("request_queue", m.request_queue),
            ("event_queue", m.event_queue),
            ("bids", m.bids),
            ("asks", m.asks),
            ("base_vault", m.base_vault),
            ("quote_vault", m.quote_vault),
            ("base_mint", params.base_mint),
            ("quote_mint", params.quote_mint),
            ("rent", RENT_SYSVAR),
        ],
        Vec::new(),
    )
}

/// Optional fee-discount account, appended read-only after the declared roles.
fn fee_discount(account: Option<Pubkey>) -> Vec<AccountMeta> {
    account
        .map(|key| AccountMeta::new_readonly(key, false))
        .into_iter()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderParams {
    pub market: Pubkey,
    pub open_orders: Pubkey,
    pub request_queue: Pubkey,
    pub payer: Pubkey,
    pub owner: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub side: Side,
    pub limit_price: u64,
    pub max_quantity: u64,
    pub order_type: OrderType,
    pub client_id: u64,
    pub fee_discount: Option<Pubkey>,
}

pub fn new_order(program_id: Pubkey, params: &NewOrderParams) -> Result<Instruction> {
    build(
        program_id,
        "NewOrder",
        FieldValues::new()
            .with("side", params.side.code())
            .with("limit_price", params.limit_price)
            .with("max_quantity", params.max_quantity)
            .with("order_type", params.order_type.code())
            .with("client_id", params.client_id),
        &[
            ("market", params.market),
            ("open_orders", params.open_orders),
            ("request_queue", params.request_queue),
            ("payer", params.payer),
            ("owner", params.owner),
            ("base_vault", params.base_vault),
            ("quote_vault", params.quote_vault),
            ("token_program", TOKEN_PROGRAM_ID),
            ("rent", RENT_SYSVAR),
        ],
        fee_discount(params.fee_discount),
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderV3Params {
    pub accounts: MarketAccounts,
    pub open_orders: Pubkey,
    pub payer: Pubkey,
    pub owner: Pubkey,
    pub side: Side,
    pub limit_price: u64,
    pub max_base_quantity: u64,
    pub max_quote_quantity: u64,
    pub order_type: OrderType,
    pub self_trade_behavior: SelfTradeBehavior,
    pub client_id: u64,
    pub limit: u16,
    pub fee_discount: Option<Pubkey>,
}

pub fn new_order_v3(program_id: Pubkey, params: &NewOrderV3Params) -> Result<Instruction> {
    let m = &params.accounts;
    build(
        program_id,
        "NewOrderV3",
        FieldValues::new()
            .with("side", params.side.code())
            .with("limit_price", params.limit_price)
            .with("max_base_quantity", params.max_base_quantity)
            .with("max_quote_quantity", params.max_quote_quantity)
            .with("self_trade_behavior", params.self_trade_behavior.code())
            .with("order_type", params.order_type.code())
            .with("client_id", params.client_id)
            .with("limit", params.limit),
        &[
            ("market", m.market),
            ("open_orders", params.open_orders),
            ("request_queue", m.request_queue),
            ("event_queue", m.event_queue),
            ("bids", m.bids),
            ("asks", m.asks),
            ("payer", params.payer),
            ("owner", params.owner),
            ("base_vault", m.base_vault),
            ("quote_vault", m.quote_vault),
            ("token_program", TOKEN_PROGRAM_ID),
            ("rent", RENT_SYSVAR),
        ],
        fee_discount(params.fee_discount),
    )
}

pub fn match_orders(program_id: Pubkey, accounts: &MarketAccounts, limit: u16) -> Result<Instruction> {
    build(
        program_id,
        "MatchOrders",
        FieldValues::new().with("limit", limit),
        &[
            ("market", accounts.market),
            ("request_queue", accounts.request_queue),
            ("event_queue", accounts.event_queue),
            ("bids", accounts.bids),
            ("asks", accounts.asks),
            ("base_vault", accounts.base_vault),
            ("quote_vault", accounts.quote_vault),
        ],
        Vec::new(),
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumeEventsParams {
    pub market: Pubkey,
    pub event_queue: Pubkey,
    pub open_orders: Vec<Pubkey>,
    pub base_fee_receivable: Pubkey,
    pub quote_fee_receivable: Pubkey,
    pub limit: u16,
}

pub fn consume_events(program_id: Pubkey, params: &ConsumeEventsParams) -> Result<Instruction> {
    let accounts = params
        .open_orders
        .iter()
        .chain([
            &params.market,
            &params.event_queue,
            &params.base_fee_receivable,
            &params.quote_fee_receivable,
        ])
        .map(|key| AccountMeta::new(*key, false))
        .collect();
    build(
        program_id,
        "ConsumeEvents",
        FieldValues::new().with("limit", params.limit),
        &[],
        accounts,
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelOrderParams {
    pub market: Pubkey,
    pub open_orders: Pubkey,
    pub request_queue: Pubkey,
    pub owner: Pubkey,
    pub side: Side,
    pub order_id: u128,
    pub open_orders_slot: u8,
}

pub fn cancel_order(program_id: Pubkey, params: &CancelOrderParams) -> Result<Instruction> {
    build(
        program_id,
        "CancelOrder",
        FieldValues::new()
            .with("side", params.side.code())
            .with("order_id", params.order_id)
            .with("open_orders", params.open_orders)
            .with("open_orders_slot", params.open_orders_slot),
        &[
            ("market", params.market),
            ("open_orders", params.open_orders),
            ("request_queue", params.request_queue),
            ("owner", params.owner),
        ],
        Vec::new(),
    )
}

pub fn cancel_order_by_client_id(
    program_id: Pubkey,
    market: Pubkey,
    open_orders: Pubkey,
    request_queue: Pubkey,
    owner: Pubkey,
    client_id: u64,
) -> Result<Instruction> {
    build(
        program_id,
        "CancelOrderByClientId",
        FieldValues::new().with("client_id", client_id),
        &[
            ("market", market),
            ("open_orders", open_orders),
            ("request_queue", request_queue),
            ("owner", owner),
        ],
        Vec::new(),
    )
}

fn cancel_v2_keys(
    accounts: &MarketAccounts,
    open_orders: Pubkey,
    owner: Pubkey,
) -> [(&'static str, Pubkey); 6] {
    [
        ("market", accounts.market),
        ("bids", accounts.bids),
        ("asks", accounts.asks),
        ("open_orders", open_orders),
        ("owner", owner),
        ("event_queue", accounts.event_queue),
    ]
}

pub fn cancel_order_v2(
    program_id: Pubkey,
    accounts: &MarketAccounts,
    open_orders: Pubkey,
    owner: Pubkey,
    side: Side,
    order_id: u128,
) -> Result<Instruction> {
    build(
        program_id,
        "CancelOrderV2",
        FieldValues::new()
            .with("side", side.code())
            .with("order_id", order_id),
        &cancel_v2_keys(accounts, open_orders, owner),
        Vec::new(),
    )
}

pub fn cancel_order_by_client_id_v2(
    program_id: Pubkey,
    accounts: &MarketAccounts,
    open_orders: Pubkey,
    owner: Pubkey,
    client_id: u64,
) -> Result<Instruction> {
    build(
        program_id,
        "CancelOrderByClientIdV2",
        FieldValues::new().with("client_id", client_id),
        &cancel_v2_keys(accounts, open_orders, owner),
        Vec::new(),
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettleFundsParams {
    pub market: Pubkey,
    pub open_orders: Pubkey,
    pub owner: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub base_wallet: Pubkey,
    pub quote_wallet: Pubkey,
    pub vault_signer: Pubkey,
    pub referrer_quote_wallet: Option<Pubkey>,
}

pub fn settle_funds(program_id: Pubkey, params: &SettleFundsParams) -> Result<Instruction> {
    build(
        program_id,
        "SettleFunds",
        FieldValues::new(),
        &[
            ("market", params.market),
            ("open_orders", params.open_orders),
            ("owner", params.owner),
            ("base_vault", params.base_vault),
            ("quote_vault", params.quote_vault),
            ("base_wallet", params.base_wallet),
            ("quote_wallet", params.quote_wallet),
            ("vault_signer", params.vault_signer),
            ("token_program", TOKEN_PROGRAM_ID),
        ],
        params
            .referrer_quote_wallet
            .map(|key| AccountMeta::new(key, false))
            .into_iter()
            .collect(),
    )
}
