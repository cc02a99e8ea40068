//! Program-id keyed decoders for display and logging.
//!
//! [`DecoderRegistry`] maps a program id to an [`InstructionDecoder`]. Programs
//! described by an [`InstructionRegistry`] are served by [`ProgramDecoder`];
//! anything else can plug in through the trait.

use std::collections::HashMap;

use solana_instruction::{AccountMeta, Instruction};
use solana_pubkey::Pubkey;

use crate::{
    error::Result,
    instruction::DecodedInstruction,
    programs::{dex, system},
    registry::InstructionRegistry,
};

/// Name shown for programs without a registered decoder.
pub const UNKNOWN_PROGRAM: &str = "Unknown Program";

/// Trait for instruction decoders - each program implements this.
pub trait InstructionDecoder: Send + Sync {
    /// Program ID this decoder handles.
    fn program_id(&self) -> Pubkey;

    /// Human-readable program name (e.g., "System Program").
    fn program_name(&self) -> &'static str;

    /// Decode instruction data and accounts into a structured representation.
    fn decode(&self, data: &[u8], accounts: &[AccountMeta]) -> Result<DecodedInstruction>;
}

/// Decoder backed by a static instruction registry.
#[derive(Debug, Clone, Copy)]
pub struct ProgramDecoder {
    program_id: Pubkey,
    registry: &'static InstructionRegistry,
}

impl ProgramDecoder {
    pub fn new(program_id: Pubkey, registry: &'static InstructionRegistry) -> Self {
        Self {
            program_id,
            registry,
        }
    }

    pub fn system() -> Result<Self> {
        Ok(Self::new(system::ID, system::registry()?))
    }

    /// DEX decoder at `program_id`; pass [`dex::ID`] for the v3 deployment.
    pub fn dex(program_id: Pubkey) -> Result<Self> {
        Ok(Self::new(program_id, dex::registry()?))
    }
}

impl InstructionDecoder for ProgramDecoder {
    fn program_id(&self) -> Pubkey {
        self.program_id
    }

    fn program_name(&self) -> &'static str {
        self.registry.program_name()
    }

    fn decode(&self, data: &[u8], accounts: &[AccountMeta]) -> Result<DecodedInstruction> {
        self.registry.decode_parts(data, accounts)
    }
}

#[derive(Default)]
pub struct DecoderRegistry {
    decoders: HashMap<Pubkey, Box<dyn InstructionDecoder>>,
}

impl std::fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderRegistry")
            .field("programs", &self.decoders.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the System program and the DEX v3 program.
    pub fn with_defaults() -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Box::new(ProgramDecoder::system()?));
        registry.register(Box::new(ProgramDecoder::dex(dex::ID)?));
        Ok(registry)
    }

    /// Register a decoder, replacing any previous one for the same program.
    pub fn register(&mut self, decoder: Box<dyn InstructionDecoder>) {
        self.decoders.insert(decoder.program_id(), decoder);
    }

    pub fn has_decoder(&self, program_id: &Pubkey) -> bool {
        self.decoders.contains_key(program_id)
    }

    pub fn get(&self, program_id: &Pubkey) -> Option<&dyn InstructionDecoder> {
        self.decoders.get(program_id).map(|decoder| decoder.as_ref())
    }

    pub fn program_name(&self, program_id: &Pubkey) -> &'static str {
        self.get(program_id)
            .map_or(UNKNOWN_PROGRAM, |decoder| decoder.program_name())
    }

    /// `None` when no decoder is registered for the instruction's program.
    pub fn decode(&self, instruction: &Instruction) -> Option<Result<DecodedInstruction>> {
        self.get(&instruction.program_id)
            .map(|decoder| decoder.decode(&instruction.data, &instruction.accounts))
    }
}
