//! The full implementation of the chip8 interpreter, from the state over the
//! instruction execution to an option to pretty print them.
mod chipset;
mod opcodes;
mod print;

/// reexport chipset structs and data for simpler usage
pub use chipset::*;
