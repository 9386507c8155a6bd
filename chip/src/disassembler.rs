//! Turns a rom back into assembly style listings.
use std::{convert::TryFrom, fmt};

use crate::{
    definitions::{cpu, memory},
    opcode::{Instruction, Opcode, OpcodeTrait},
};

/// A single word of the rom together with where it would be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub address: usize,
    pub opcode: Opcode,
    pub instruction: Option<Instruction>,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x} {:04x} ", self.address, self.opcode)?;
        match self.instruction {
            Some(instruction) => write!(f, "{}", instruction),
            // machine code routines
            None if self.opcode.family() == 0x0 => write!(f, "SYS {:#05X}", self.opcode.nnn()),
            None => write!(f, "DW {:#06X}", self.opcode),
        }
    }
}

/// Iterates over the words of `rom` as if loaded at the program origin.
/// A trailing odd byte is padded with zero.
pub fn disassemble(rom: &[u8]) -> impl Iterator<Item = Line> + '_ {
    rom.chunks(memory::opcodes::SIZE)
        .enumerate()
        .map(|(index, pair)| {
            let opcode = Opcode::from_be_bytes([pair[0], pair.get(1).copied().unwrap_or(0)]);
            Line {
                address: cpu::PROGRAM_COUNTER + index * memory::opcodes::SIZE,
                opcode,
                instruction: Instruction::try_from(opcode).ok(),
            }
        })
}

/// The full listing, one line per word.
pub fn listing(rom: &[u8]) -> String {
    disassemble(rom)
        .map(|line| line.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
