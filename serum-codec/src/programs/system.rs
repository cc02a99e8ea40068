//! System program: instruction table and typed builders.
//!
//! Operations with a base form and a seeded form are tagged enums
//! ([`Transfer`], [`Assign`], [`Allocate`]). Each tag maps to exactly one
//! discriminant; the `new` constructors pick the tag from whether a
//! [`SeedDerivation`] was supplied, never from its contents.

use std::sync::OnceLock;

use solana_instruction::Instruction;
use solana_pubkey::Pubkey;

use crate::{
    error::{CodecError, Result},
    field::{FieldSpec, FieldValues},
    instruction::DecodedInstruction,
    registry::{InstructionRegistry, KeyRole, VariantDef},
};

pub const ID: Pubkey = solana_pubkey::pubkey!("11111111111111111111111111111111");
pub const PROGRAM_NAME: &str = "System Program";

pub const RENT_SYSVAR: Pubkey = solana_pubkey::pubkey!("SysvarRent111111111111111111111111111111111");
pub const RECENT_BLOCKHASHES_SYSVAR: Pubkey =
    solana_pubkey::pubkey!("SysvarRecentB1ockHashes11111111111111111111");

/// Space allocated for a nonce account.
pub const NONCE_ACCOUNT_LENGTH: u64 = 80;

const VARIANTS: &[VariantDef] = &[
    VariantDef {
        name: "CreateAccount",
        discriminant: 0,
        fields: &[
            FieldSpec::u64("lamports"),
            FieldSpec::u64("space"),
            FieldSpec::pubkey("program_id"),
        ],
        key_roles: &[
            KeyRole::signer_writable("from"),
            KeyRole::signer_writable("new_account"),
        ],
    },
    VariantDef {
        name: "Assign",
        discriminant: 1,
        fields: &[FieldSpec::pubkey("program_id")],
        key_roles: &[KeyRole::signer_writable("account")],
    },
    VariantDef {
        name: "Transfer",
        discriminant: 2,
        fields: &[FieldSpec::u64("lamports")],
        key_roles: &[KeyRole::signer_writable("from"), KeyRole::writable("to")],
    },
    VariantDef {
        name: "CreateAccountWithSeed",
        discriminant: 3,
        fields: &[
            FieldSpec::pubkey("base"),
            FieldSpec::string("seed"),
            FieldSpec::u64("lamports"),
            FieldSpec::u64("space"),
            FieldSpec::pubkey("program_id"),
        ],
        key_roles: &[
            KeyRole::signer_writable("from"),
            KeyRole::writable("new_account"),
        ],
    },
    VariantDef {
        name: "AdvanceNonceAccount",
        discriminant: 4,
        fields: &[],
        key_roles: &[
            KeyRole::writable("nonce"),
            KeyRole::readonly("recent_blockhashes"),
            KeyRole::signer("authorized"),
        ],
    },
    VariantDef {
        name: "WithdrawNonceAccount",
        discriminant: 5,
        fields: &[FieldSpec::u64("lamports")],
        key_roles: &[
            KeyRole::writable("nonce"),
            KeyRole::writable("to"),
            KeyRole::readonly("recent_blockhashes"),
            KeyRole::readonly("rent"),
            KeyRole::signer("authorized"),
        ],
    },
    VariantDef {
        name: "InitializeNonceAccount",
        discriminant: 6,
        fields: &[FieldSpec::pubkey("authorized")],
        key_roles: &[
            KeyRole::writable("nonce"),
            KeyRole::readonly("recent_blockhashes"),
            KeyRole::readonly("rent"),
        ],
    },
    VariantDef {
        name: "AuthorizeNonceAccount",
        discriminant: 7,
        fields: &[FieldSpec::pubkey("authorized")],
        key_roles: &[KeyRole::writable("nonce"), KeyRole::signer("authorized")],
    },
    VariantDef {
        name: "Allocate",
        discriminant: 8,
        fields: &[FieldSpec::u64("space")],
        key_roles: &[KeyRole::signer_writable("account")],
    },
    VariantDef {
        name: "AllocateWithSeed",
        discriminant: 9,
        fields: &[
            FieldSpec::pubkey("base"),
            FieldSpec::string("seed"),
            FieldSpec::u64("space"),
            FieldSpec::pubkey("program_id"),
        ],
        key_roles: &[KeyRole::writable("account"), KeyRole::signer("base")],
    },
    VariantDef {
        name: "AssignWithSeed",
        discriminant: 10,
        fields: &[
            FieldSpec::pubkey("base"),
            FieldSpec::string("seed"),
            FieldSpec::pubkey("program_id"),
        ],
        key_roles: &[KeyRole::writable("account"), KeyRole::signer("base")],
    },
    VariantDef {
        name: "TransferWithSeed",
        discriminant: 11,
        fields: &[
            FieldSpec::u64("lamports"),
            FieldSpec::string("seed"),
            FieldSpec::pubkey("program_id"),
        ],
        key_roles: &[
            KeyRole::writable("from"),
            KeyRole::signer("base"),
            KeyRole::writable("to"),
        ],
    },
];

static REGISTRY: OnceLock<Result<InstructionRegistry>> = OnceLock::new();

/// The System program registry, built on first use.
pub fn registry() -> Result<&'static InstructionRegistry> {
    REGISTRY
        .get_or_init(|| {
            Ok(InstructionRegistry::builder(PROGRAM_NAME)
                .register_all(VARIANTS)?
                .build())
        })
        .as_ref()
        .map_err(Clone::clone)
}

fn build(name: &str, values: FieldValues, keys: &[(&str, Pubkey)]) -> Result<Instruction> {
    registry()?.build(ID, name, &values, keys, Vec::new())
}

fn decode(instruction: &Instruction) -> Result<DecodedInstruction> {
    registry()?.decode_instruction(&ID, instruction)
}

fn bound(decoded: &DecodedInstruction, role: &'static str) -> Result<Pubkey> {
    decoded.account(role).ok_or(CodecError::MissingKey(role))
}

/// Derivation input for the seeded variants: the address is derived from
/// `base`, `seed` and `program_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedDerivation {
    pub base: Pubkey,
    pub seed: String,
    pub program_id: Pubkey,
}

impl SeedDerivation {
    fn from_fields(base: Pubkey, fields: &FieldValues) -> Result<Self> {
        Ok(Self {
            base,
            seed: fields.string("seed")?.to_owned(),
            program_id: fields.pubkey("program_id")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAccountParams {
    pub from: Pubkey,
    pub new_account: Pubkey,
    pub lamports: u64,
    pub space: u64,
    pub program_id: Pubkey,
}

pub fn create_account(params: &CreateAccountParams) -> Result<Instruction> {
    build(
        "CreateAccount",
        FieldValues::new()
            .with("lamports", params.lamports)
            .with("space", params.space)
            .with("program_id", params.program_id),
        &[("from", params.from), ("new_account", params.new_account)],
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAccountWithSeedParams {
    pub from: Pubkey,
    pub new_account: Pubkey,
    pub derivation: SeedDerivation,
    pub lamports: u64,
    pub space: u64,
}

pub fn create_account_with_seed(params: &CreateAccountWithSeedParams) -> Result<Instruction> {
    let derivation = &params.derivation;
    build(
        "CreateAccountWithSeed",
        FieldValues::new()
            .with("base", derivation.base)
            .with("seed", derivation.seed.as_str())
            .with("lamports", params.lamports)
            .with("space", params.space)
            .with("program_id", derivation.program_id),
        &[("from", params.from), ("new_account", params.new_account)],
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transfer {
    Base {
        from: Pubkey,
        to: Pubkey,
        lamports: u64,
    },
    /// `from` is the derived address; `derivation.base` signs.
    WithSeed {
        from: Pubkey,
        derivation: SeedDerivation,
        to: Pubkey,
        lamports: u64,
    },
}

impl Transfer {
    pub fn new(from: Pubkey, to: Pubkey, lamports: u64, derivation: Option<SeedDerivation>) -> Self {
        match derivation {
            None => Transfer::Base { from, to, lamports },
            Some(derivation) => Transfer::WithSeed {
                from,
                derivation,
                to,
                lamports,
            },
        }
    }

    pub fn instruction(&self) -> Result<Instruction> {
        transfer(self)
    }

    /// Map a decoded `Transfer` or `TransferWithSeed` instruction back to its tag.
    pub fn decode(instruction: &Instruction) -> Result<Self> {
        let decoded = decode(instruction)?;
        match decoded.name {
            "Transfer" => Ok(Transfer::Base {
                from: bound(&decoded, "from")?,
                to: bound(&decoded, "to")?,
                lamports: decoded.fields.u64("lamports")?,
            }),
            "TransferWithSeed" => Ok(Transfer::WithSeed {
                from: bound(&decoded, "from")?,
                derivation: SeedDerivation::from_fields(bound(&decoded, "base")?, &decoded.fields)?,
                to: bound(&decoded, "to")?,
                lamports: decoded.fields.u64("lamports")?,
            }),
            other => Err(CodecError::UnknownInstruction(other.to_string())),
        }
    }
}

pub fn transfer(params: &Transfer) -> Result<Instruction> {
    match params {
        Transfer::Base { from, to, lamports } => build(
            "Transfer",
            FieldValues::new().with("lamports", *lamports),
            &[("from", *from), ("to", *to)],
        ),
        Transfer::WithSeed {
            from,
            derivation,
            to,
            lamports,
        } => build(
            "TransferWithSeed",
            FieldValues::new()
                .with("lamports", *lamports)
                .with("seed", derivation.seed.as_str())
                .with("program_id", derivation.program_id),
            &[("from", *from), ("base", derivation.base), ("to", *to)],
        ),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assign {
    Base {
        account: Pubkey,
        program_id: Pubkey,
    },
    /// The new owner is `derivation.program_id`.
    WithSeed {
        account: Pubkey,
        derivation: SeedDerivation,
    },
}

impl Assign {
    pub fn new(account: Pubkey, program_id: Pubkey, seed: Option<(Pubkey, String)>) -> Self {
        match seed {
            None => Assign::Base {
                account,
                program_id,
            },
            Some((base, seed)) => Assign::WithSeed {
                account,
                derivation: SeedDerivation {
                    base,
                    seed,
                    program_id,
                },
            },
        }
    }
}

pub fn assign(params: &Assign) -> Result<Instruction> {
    match params {
        Assign::Base {
            account,
            program_id,
        } => build(
            "Assign",
            FieldValues::new().with("program_id", *program_id),
            &[("account", *account)],
        ),
        Assign::WithSeed {
            account,
            derivation,
        } => build(
            "AssignWithSeed",
            FieldValues::new()
                .with("base", derivation.base)
                .with("seed", derivation.seed.as_str())
                .with("program_id", derivation.program_id),
            &[("account", *account), ("base", derivation.base)],
        ),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Allocate {
    Base {
        account: Pubkey,
        space: u64,
    },
    WithSeed {
        account: Pubkey,
        derivation: SeedDerivation,
        space: u64,
    },
}

impl Allocate {
    pub fn new(account: Pubkey, space: u64, derivation: Option<SeedDerivation>) -> Self {
        match derivation {
            None => Allocate::Base { account, space },
            Some(derivation) => Allocate::WithSeed {
                account,
                derivation,
                space,
            },
        }
    }
}

pub fn allocate(params: &Allocate) -> Result<Instruction> {
    match params {
        Allocate::Base { account, space } => build(
            "Allocate",
            FieldValues::new().with("space", *space),
            &[("account", *account)],
        ),
        Allocate::WithSeed {
            account,
            derivation,
            space,
        } => build(
            "AllocateWithSeed",
            FieldValues::new()
                .with("base", derivation.base)
                .with("seed", derivation.seed.as_str())
                .with("space", *space)
                .with("program_id", derivation.program_id),
            &[("account", *account), ("base", derivation.base)],
        ),
    }
}

pub fn nonce_initialize(nonce: Pubkey, authorized: Pubkey) -> Result<Instruction> {
    build(
        "InitializeNonceAccount",
        FieldValues::new().with("authorized", authorized),
        &[
            ("nonce", nonce),
            ("recent_blockhashes", RECENT_BLOCKHASHES_SYSVAR),
            ("rent", RENT_SYSVAR),
        ],
    )
}

pub fn nonce_advance(nonce: Pubkey, authorized: Pubkey) -> Result<Instruction> {
    build(
        "AdvanceNonceAccount",
        FieldValues::new(),
        &[
            ("nonce", nonce),
            ("recent_blockhashes", RECENT_BLOCKHASHES_SYSVAR),
            ("authorized", authorized),
        ],
    )
}

pub fn nonce_withdraw(
    nonce: Pubkey,
    authorized: Pubkey,
    to: Pubkey,
    lamports: u64,
) -> Result<Instruction> {
    build(
        "WithdrawNonceAccount",
        FieldValues::new().with("lamports", lamports),
        &[
            ("nonce", nonce),
            ("to", to),
            ("recent_blockhashes", RECENT_BLOCKHASHES_SYSVAR),
            ("rent", RENT_SYSVAR),
            ("authorized", authorized),
        ],
    )
}

/// `authorized` is the current authority (signer); the data carries the new one.
pub fn nonce_authorize(
    nonce: Pubkey,
    authorized: Pubkey,
    new_authorized: Pubkey,
) -> Result<Instruction> {
    build(
        "AuthorizeNonceAccount",
        FieldValues::new().with("authorized", new_authorized),
        &[("nonce", nonce), ("authorized", authorized)],
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateNonceAccountParams {
    pub from: Pubkey,
    pub nonce: Pubkey,
    pub authorized: Pubkey,
    pub lamports: u64,
    /// Base and seed when `nonce` is a derived address.
    pub base_and_seed: Option<(Pubkey, String)>,
}

/// Create and initialize a nonce account: returns the create instruction
/// (seeded when `base_and_seed` is present) followed by the initialize one.
pub fn create_nonce_account(params: &CreateNonceAccountParams) -> Result<Vec<Instruction>> {
    let create = match &params.base_and_seed {
        None => create_account(&CreateAccountParams {
            from: params.from,
            new_account: params.nonce,
            lamports: params.lamports,
            space: NONCE_ACCOUNT_LENGTH,
            program_id: ID,
        })?,
        Some((base, seed)) => create_account_with_seed(&CreateAccountWithSeedParams {
            from: params.from,
            new_account: params.nonce,
            derivation: SeedDerivation {
                base: *base,
                seed: seed.clone(),
                program_id: ID,
            },
            lamports: params.lamports,
            space: NONCE_ACCOUNT_LENGTH,
        })?,
    };
    Ok(vec![create, nonce_initialize(params.nonce, params.authorized)?])
}
