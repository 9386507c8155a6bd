pub mod chip8;
pub mod definitions;
pub mod devices;
pub mod disassembler;
pub mod display;
pub mod font;
pub mod opcode;
pub mod resources;
pub mod runner;
pub mod timer;
mod error;

// reexporting for convenience
pub use error::*;
