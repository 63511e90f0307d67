//! Implementation of the LS-8, an 8-bit teaching machine with 256 bytes of
//! memory, eight registers and a handful of instructions.
//!
//! Programs are written by hand as one binary literal per line, parsed by
//! [`loader`], and executed by [`vm::Machine`].

pub mod alu;
pub mod loader;
pub mod opcode;
pub mod region;
pub mod vm;
