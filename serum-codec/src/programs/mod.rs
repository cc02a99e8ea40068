//! Built-in program tables.
//!
//! Both programs use a 4-byte little-endian discriminant; the DEX program
//! additionally prefixes it with a version byte.

pub mod dex;
pub mod system;
