//! Instruction registries: name ↔ discriminant ↔ schema ↔ key roles.
//!
//! A registry is assembled once through [`RegistryBuilder`] and is immutable
//! afterwards, so one instance can be shared by every thread without locking.
//! A failed registration consumes the builder, so a partially built registry
//! can never escape.

use std::collections::HashMap;

use crate::{
    error::{CodecError, Result},
    field::FieldSpec,
    schema::LayoutSchema,
};

/// A named account position with access flags fixed by the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRole {
    pub name: &'static str,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl KeyRole {
    pub const fn new(name: &'static str, is_signer: bool, is_writable: bool) -> Self {
        Self {
            name,
            is_signer,
            is_writable,
        }
    }

    pub const fn signer_writable(name: &'static str) -> Self {
        Self::new(name, true, true)
    }

    pub const fn signer(name: &'static str) -> Self {
        Self::new(name, true, false)
    }

    pub const fn writable(name: &'static str) -> Self {
        Self::new(name, false, true)
    }

    pub const fn readonly(name: &'static str) -> Self {
        Self::new(name, false, false)
    }
}

/// Static description of one variant, for declaring registries as const tables.
#[derive(Debug, Clone, Copy)]
pub struct VariantDef {
    pub name: &'static str,
    pub discriminant: u32,
    pub fields: &'static [FieldSpec],
    pub key_roles: &'static [KeyRole],
}

/// One fully typed instruction shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionVariant {
    name: &'static str,
    discriminant: u32,
    schema: LayoutSchema,
    key_roles: Vec<KeyRole>,
}

impl InstructionVariant {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn discriminant(&self) -> u32 {
        self.discriminant
    }

    pub fn schema(&self) -> &LayoutSchema {
        &self.schema
    }

    pub fn key_roles(&self) -> &[KeyRole] {
        &self.key_roles
    }
}

#[derive(Debug)]
pub struct InstructionRegistry {
    program_name: &'static str,
    version: Option<u8>,
    variants: Vec<InstructionVariant>,
    by_discriminant: HashMap<u32, usize>,
    by_name: HashMap<&'static str, usize>,
}

impl InstructionRegistry {
    pub fn builder(program_name: &'static str) -> RegistryBuilder {
        RegistryBuilder {
            registry: Self {
                program_name,
                version: None,
                variants: Vec::new(),
                by_discriminant: HashMap::new(),
                by_name: HashMap::new(),
            },
        }
    }

    pub fn program_name(&self) -> &'static str {
        self.program_name
    }

    /// Version byte written in front of the discriminant, if the program uses one.
    pub fn version(&self) -> Option<u8> {
        self.version
    }

    /// Variants in registration order.
    pub fn variants(&self) -> &[InstructionVariant] {
        &self.variants
    }

    pub fn resolve(&self, discriminant: u32) -> Result<&InstructionVariant> {
        self.by_discriminant
            .get(&discriminant)
            .map(|&index| &self.variants[index])
            .ok_or(CodecError::UnknownDiscriminant(discriminant))
    }

    pub fn variant(&self, name: &str) -> Result<&InstructionVariant> {
        self.by_name
            .get(name)
            .map(|&index| &self.variants[index])
            .ok_or_else(|| CodecError::UnknownInstruction(name.to_string()))
    }
}

/// Consuming builder; the only way to add variants to a registry.
#[derive(Debug)]
pub struct RegistryBuilder {
    registry: InstructionRegistry,
}

impl RegistryBuilder {
    pub fn version(mut self, version: u8) -> Self {
        self.registry.version = Some(version);
        self
    }

    pub fn register(
        mut self,
        name: &'static str,
        discriminant: u32,
        schema: LayoutSchema,
        key_roles: &[KeyRole],
    ) -> Result<Self> {
        let registry = &mut self.registry;
        if registry.by_discriminant.contains_key(&discriminant) {
            return Err(CodecError::DuplicateDiscriminant(discriminant));
        }
        if registry.by_name.contains_key(name) {
            return Err(CodecError::DuplicateName(name));
        }
        let index = registry.variants.len();
        registry.variants.push(InstructionVariant {
            name,
            discriminant,
            schema,
            key_roles: key_roles.to_vec(),
        });
        registry.by_discriminant.insert(discriminant, index);
        registry.by_name.insert(name, index);
        Ok(self)
    }

    /// Compose and register every entry of a const table.
    pub fn register_all(self, defs: &[VariantDef]) -> Result<Self> {
        defs.iter().try_fold(self, |builder, def| {
            let schema = LayoutSchema::compose(def.fields.iter().copied())?;
            builder.register(def.name, def.discriminant, schema, def.key_roles)
        })
    }

    pub fn build(self) -> InstructionRegistry {
        tracing::debug!(
            program = self.registry.program_name,
            variants = self.registry.variants.len(),
            version = ?self.registry.version,
            "built instruction registry"
        );
        self.registry
    }
}
