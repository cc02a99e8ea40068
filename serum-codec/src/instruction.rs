//! Building and decoding complete instructions against a registry.
//!
//! Wire form: `[version byte]? ++ u32 LE discriminant ++ schema payload`.
//! The account list is the variant's key roles in declared order, followed by
//! any trailing accounts the caller supplies (optional accounts such as a
//! referrer wallet). Signer/writable flags come only from the role table.

use solana_instruction::{AccountMeta, Instruction};
use solana_pubkey::Pubkey;

use crate::{
    cursor::{self, ByteReader},
    error::{CodecError, Result},
    field::FieldValues,
    registry::{InstructionRegistry, InstructionVariant},
};

/// Width of the discriminant that precedes every payload.
pub const DISCRIMINANT_LEN: usize = 4;

/// Read the first 4 bytes of `data` as a little-endian discriminant.
pub fn decode_discriminant(data: &[u8]) -> Result<u32> {
    ByteReader::new(data).read::<u32>(DISCRIMINANT_LEN)
}

/// An account bound to the role it plays in a decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub role: &'static str,
    pub meta: AccountMeta,
}

/// Result of decoding an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedInstruction {
    /// Variant name (e.g. "Transfer", "NewOrderV3")
    pub name: &'static str,
    pub discriminant: u32,
    pub fields: FieldValues,
    /// Accounts bound positionally to the variant's roles
    pub accounts: Vec<KeyBinding>,
    /// Trailing accounts beyond the declared roles, left for the caller
    pub remaining_accounts: Vec<AccountMeta>,
}

impl DecodedInstruction {
    /// Public key bound to `role`, if the variant declares it.
    pub fn account(&self, role: &str) -> Option<Pubkey> {
        self.accounts
            .iter()
            .find(|binding| binding.role == role)
            .map(|binding| binding.meta.pubkey)
    }
}

impl InstructionRegistry {
    fn prefix_len(&self) -> usize {
        usize::from(self.version().is_some()) + DISCRIMINANT_LEN
    }

    /// Encode `values` for `variant`: prefix, discriminant, then the schema payload.
    pub fn encode(&self, variant: &InstructionVariant, values: &FieldValues) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(self.prefix_len() + variant.schema().span_for(values));
        if let Some(version) = self.version() {
            data.push(version);
        }
        cursor::write(&mut data, &variant.discriminant())?;
        variant.schema().encode_into(values, &mut data)?;
        Ok(data)
    }

    pub fn encode_by_name(&self, name: &str, values: &FieldValues) -> Result<Vec<u8>> {
        self.encode(self.variant(name)?, values)
    }

    /// Build an instruction for `program_id`, substituting `keys` (role name →
    /// account) into the variant's role positions and appending `remaining`.
    /// Every declared role must be supplied exactly once.
    pub fn build(
        &self,
        program_id: Pubkey,
        name: &str,
        values: &FieldValues,
        keys: &[(&str, Pubkey)],
        remaining: Vec<AccountMeta>,
    ) -> Result<Instruction> {
        let variant = self.variant(name)?;
        if let Some((role, _)) = keys
            .iter()
            .find(|(role, _)| !variant.key_roles().iter().any(|r| r.name == *role))
        {
            return Err(CodecError::UnknownRole {
                name: variant.name(),
                role: role.to_string(),
            });
        }
        let mut accounts = Vec::with_capacity(variant.key_roles().len() + remaining.len());
        for role in variant.key_roles() {
            let mut supplied = keys
                .iter()
                .filter(|(name, _)| *name == role.name)
                .map(|(_, key)| *key);
            let pubkey = supplied.next().ok_or(CodecError::MissingKey(role.name))?;
            if supplied.next().is_some() {
                return Err(CodecError::DuplicateKey(role.name));
            }
            accounts.push(AccountMeta {
                pubkey,
                is_signer: role.is_signer,
                is_writable: role.is_writable,
            });
        }
        accounts.extend(remaining);
        Ok(Instruction {
            program_id,
            accounts,
            data: self.encode(variant, values)?,
        })
    }

    /// Discriminant of `data`, after checking the version byte when the
    /// registry declares one.
    pub fn discriminant_of(&self, data: &[u8]) -> Result<u32> {
        let mut reader = ByteReader::new(data);
        self.read_prefix(&mut reader)
    }

    fn read_prefix(&self, reader: &mut ByteReader<'_>) -> Result<u32> {
        if let Some(expected) = self.version() {
            let found = reader.read::<u8>(1)?;
            if found != expected {
                return Err(CodecError::UnsupportedVersion { expected, found });
            }
        }
        reader.read::<u32>(DISCRIMINANT_LEN)
    }

    /// Decode instruction data alone: resolve the variant and read its fields.
    /// Bytes past the schema are ignored.
    pub fn decode_data(&self, data: &[u8]) -> Result<(&InstructionVariant, FieldValues)> {
        let mut reader = ByteReader::new(data);
        let variant = self.resolve(self.read_prefix(&mut reader)?)?;
        let fields = variant.schema().decode_from(&mut reader)?;
        Ok((variant, fields))
    }

    /// Decode a complete instruction addressed to `expected_program`.
    pub fn decode_instruction(
        &self,
        expected_program: &Pubkey,
        instruction: &Instruction,
    ) -> Result<DecodedInstruction> {
        if instruction.program_id != *expected_program {
            return Err(CodecError::WrongProgram {
                expected: *expected_program,
                actual: instruction.program_id,
            });
        }
        self.decode_parts(&instruction.data, &instruction.accounts)
    }

    /// Decode instruction data and its account list without a program check.
    pub fn decode_parts(&self, data: &[u8], accounts: &[AccountMeta]) -> Result<DecodedInstruction> {
        let mut reader = ByteReader::new(data);
        let variant = self.resolve(self.read_prefix(&mut reader)?)?;

        let roles = variant.key_roles();
        if accounts.len() < roles.len() {
            return Err(CodecError::InsufficientKeys {
                name: variant.name(),
                expected: roles.len(),
                actual: accounts.len(),
            });
        }
        let fields = variant.schema().decode_from(&mut reader)?;

        let bindings = roles
            .iter()
            .zip(accounts)
            .map(|(role, meta)| KeyBinding {
                role: role.name,
                meta: meta.clone(),
            })
            .collect();
        let remaining_accounts = accounts[roles.len()..].to_vec();

        tracing::trace!(
            program = self.program_name(),
            instruction = variant.name(),
            remaining = remaining_accounts.len(),
            "decoded instruction"
        );

        Ok(DecodedInstruction {
            name: variant.name(),
            discriminant: variant.discriminant(),
            fields,
            accounts: bindings,
            remaining_accounts,
        })
    }
}
