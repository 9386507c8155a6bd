use thiserror::Error;

use crate::opcode::Opcode;

/// Everything that can stop a single instruction cycle.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum ProcessError {
    #[error("Invalid opcode state '{0}'.")]
    Opcode(#[from] OpcodeError),
    #[error("Invalid stack state '{0}'.")]
    Stack(#[from] StackError),
    #[error("Invalid memory access '{0}'.")]
    Memory(#[from] MemoryError),
    #[error("Input device failed '{0}'.")]
    Input(#[from] InputError),
}

#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum OpcodeError {
    #[error("An unsupported opcode was used {opcode:#06X} at {pointer:#06X}.")]
    InvalidOpcode { opcode: Opcode, pointer: usize },
    #[error("Pointer location invalid there can not be an opcode at {pointer}, if data len is {len}")]
    MemoryInvalid { pointer: usize, len: usize },
}

/// The raw decode failure, it does not know where the opcode came from.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
#[error("An unsupported opcode was used {0:#06X}.")]
pub struct UnsupportedOpcode(pub Opcode);

#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum StackError {
    #[error("Stack is full!")]
    Full,
    #[error("Stack is empty!")]
    Empty,
}

#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum MemoryError {
    #[error("Access of {len} bytes at {address:#06X} is out of bounds.")]
    OutOfBounds { address: usize, len: usize },
}

#[derive(Error, Debug, PartialEq, Clone)]
pub enum InputError {
    #[error("A quit was requested while waiting for a key.")]
    Quit,
    #[error("{0}")]
    Device(String),
}

/// The errors the [`Runner`](crate::runner::Runner) can run into.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("Unable to present the display: {0}")]
    Display(#[from] std::io::Error),
}

#[derive(Error, Debug, PartialEq, Clone)]
pub enum FontError {
    #[error("Glyph row {line} is {width} pixels wide, only 4 are allowed.")]
    RowTooWide { line: usize, width: usize },
    #[error("Glyph row {line} contains the invalid symbol {symbol:?}.")]
    InvalidSymbol { line: usize, symbol: char },
}

/// The errors while getting the rom data.
#[derive(Error, Debug)]
pub enum RomError {
    #[error("Unable to read the rom: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unable to read the rom archive: {0}")]
    Archive(#[from] zip::result::ZipError),
}
