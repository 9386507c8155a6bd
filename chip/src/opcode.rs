//! Opcode abstractions, functionality and constants.
use std::{convert::TryFrom, fmt};

use crate::{definitions::memory, OpcodeError, UnsupportedOpcode};

/// the mask for the opcode family
pub(crate) const OPCODE_MASK_F000: u16 = 0xF000;

/// the mask for the `X` register index
pub(crate) const OPCODE_MASK_0F00: u16 = 0x0F00;

/// the mask for the `Y` register index
pub(crate) const OPCODE_MASK_00F0: u16 = 0x00F0;

/// the mask for the last four bits
pub(crate) const OPCODE_MASK_000F: u16 = 0x000F;

/// the mask for the last eight bits
pub(crate) const OPCODE_MASK_00FF: u16 = 0x00FF;

/// the mask for the last twelve bits
pub(crate) const OPCODE_MASK_0FFF: u16 = 0x0FFF;

/// a wrapper type for u16 to make it clear what is meant to be used
pub type Opcode = u16;

/// will build an opcode from data and the given point
/// # Arguments
///
/// - `data` - A slice of u8 data entries used to generate the opcodes
/// - `pointer` - Where in the data the opcode shall be extracted, so `pointer` and `pointer + 1` make
/// the opcode up
///
/// # Example
/// ```rust
/// # use chip::opcode::*;
/// # use chip::OpcodeError;
///  const OPCODES: [Opcode; 2] = [0x00EE, 0x1EDA];
///  const SPLIT_OPCODE: [u8; 4] = [0x00, 0xEE, 0x1E, 0xDA];
///  for (i, val) in OPCODES.iter().enumerate() {
///      let opcode = build_opcode(&SPLIT_OPCODE, i * 2).expect("This will work.");
///      assert_eq!(opcode, *val);
///  }
/// # let pointer = 3;
/// # let err = OpcodeError::MemoryInvalid {pointer, len: SPLIT_OPCODE.len() };
/// # assert_eq!(Err(err), build_opcode(&SPLIT_OPCODE, pointer));
/// ```
pub fn build_opcode(data: &[u8], pointer: usize) -> Result<Opcode, OpcodeError> {
    // controlling that there is no illegal access here
    if pointer.checked_add(1).map_or(false, |next| next < data.len()) {
        Ok(Opcode::from_be_bytes([data[pointer], data[pointer + 1]]))
    } else {
        Err(OpcodeError::MemoryInvalid {
            pointer,
            len: data.len(),
        })
    }
}

/// Field extractors for the raw opcode word.
///
/// An opcode `TXYN` is split into the family `T`, the register indices `X`
/// and `Y` and the immediates `N`, `NN` (`YN`) and `NNN` (`XYN`).
pub trait OpcodeTrait {
    /// the opcode family, the top nibble `T`
    fn family(&self) -> u8;

    /// the register index `X`
    fn x(&self) -> usize;

    /// the register index `Y`
    fn y(&self) -> usize;

    /// the lowest nibble `N`
    fn n(&self) -> usize;

    /// the lowest byte `NN`
    fn nn(&self) -> u8;

    /// the lowest twelve bits `NNN`
    fn nnn(&self) -> usize;
}

impl OpcodeTrait for Opcode {
    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.family(), 0x1);
    /// ```
    fn family(&self) -> u8 {
        ((self & OPCODE_MASK_F000) >> 12) as u8
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.x(), 0xE);
    /// ```
    fn x(&self) -> usize {
        ((self & OPCODE_MASK_0F00) >> 8) as usize
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.y(), 0xD);
    /// ```
    fn y(&self) -> usize {
        ((self & OPCODE_MASK_00F0) >> 4) as usize
    }

    fn n(&self) -> usize {
        (self & OPCODE_MASK_000F) as usize
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.nn(), 0xDA);
    /// ```
    fn nn(&self) -> u8 {
        (self & OPCODE_MASK_00FF) as u8
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.nnn(), 0xEDA);
    /// ```
    fn nnn(&self) -> usize {
        (self & OPCODE_MASK_0FFF) as usize
    }
}

/// The `0NNN` family, only the two exact matches are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum System {
    /// `00E0` clears the display
    ClearScreen,
    /// `00EE` returns from the subroutine
    Return,
}

/// The `8XYT` family, `T` selects the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arithmetic {
    /// `8XY0` - `Vx = Vy`
    Assign,
    /// `8XY1` - `Vx |= Vy`
    Or,
    /// `8XY2` - `Vx &= Vy`
    And,
    /// `8XY3` - `Vx ^= Vy`
    Xor,
    /// `8XY4` - `Vx += Vy`, `VF` is the carry
    Add,
    /// `8XY5` - `Vx -= Vy`, `VF` is the inverted borrow
    Sub,
    /// `8XY6` - `Vx >>= 1`, `VF` is the shifted out bit
    ShiftRight,
    /// `8XY7` - `Vx = Vy - Vx`, `VF` is the inverted borrow
    SubReversed,
    /// `8XYE` - `Vx <<= 1`, `VF` is the shifted out bit
    ShiftLeft,
}

impl TryFrom<usize> for Arithmetic {
    type Error = ();

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        let ops = match value {
            0x0 => Arithmetic::Assign,
            0x1 => Arithmetic::Or,
            0x2 => Arithmetic::And,
            0x3 => Arithmetic::Xor,
            0x4 => Arithmetic::Add,
            0x5 => Arithmetic::Sub,
            0x6 => Arithmetic::ShiftRight,
            0x7 => Arithmetic::SubReversed,
            0xE => Arithmetic::ShiftLeft,
            _ => return Err(()),
        };
        Ok(ops)
    }
}

/// The `EXTT` family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCondition {
    /// `EX9E` skips if the key in `VX` is pressed
    Pressed,
    /// `EXA1` skips if the key in `VX` isn't pressed
    NotPressed,
}

impl TryFrom<u8> for KeyCondition {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x9E => Ok(KeyCondition::Pressed),
            0xA1 => Ok(KeyCondition::NotPressed),
            _ => Err(()),
        }
    }
}

/// The `FXTT` family, timers, key waits and memory helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Misc {
    /// `FX07` - `Vx = delay`
    GetDelayTimer,
    /// `FX0A` - `Vx = wait_for_key()`
    AwaitKeyPress,
    /// `FX15` - `delay = Vx`
    SetDelayTimer,
    /// `FX18` - `sound = Vx`
    SetSoundTimer,
    /// `FX1E` - `I += Vx`, `VF` is the 12 bit overflow
    AddVxToI,
    /// `FX29` - `I = font + Vx * 5`
    SetIToSprite,
    /// `FX33` - `mem[I..I+3] = bcd(Vx)`
    StoreBCD,
    /// `FX55` - `mem[I..=I+X] = V0..=Vx`
    StoreV0ToVx,
    /// `FX65` - `V0..=Vx = mem[I..=I+X]`
    FillV0ToVx,
}

impl TryFrom<u8> for Misc {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let ops = match value {
            0x07 => Misc::GetDelayTimer,
            0x0A => Misc::AwaitKeyPress,
            0x15 => Misc::SetDelayTimer,
            0x18 => Misc::SetSoundTimer,
            0x1E => Misc::AddVxToI,
            0x29 => Misc::SetIToSprite,
            0x33 => Misc::StoreBCD,
            0x55 => Misc::StoreV0ToVx,
            0x65 => Misc::FillV0ToVx,
            _ => return Err(()),
        };
        Ok(ops)
    }
}

/// A fully decoded instruction, one variant per opcode family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `00E0` / `00EE`
    System(System),
    /// `1NNN` - `goto NNN`
    Jump { nnn: usize },
    /// `2NNN` - `*(0xNNN)()`
    Call { nnn: usize },
    /// `3XNN` - `if (Vx == NN) skip`
    SkipIfEqual { x: usize, nn: u8 },
    /// `4XNN` - `if (Vx != NN) skip`
    SkipIfNotEqual { x: usize, nn: u8 },
    /// `5XY0` - `if (Vx == Vy) skip`
    SkipIfRegistersEqual { x: usize, y: usize },
    /// `6XNN` - `Vx = NN`
    Load { x: usize, nn: u8 },
    /// `7XNN` - `Vx += NN`, the carry flag is not changed
    Add { x: usize, nn: u8 },
    /// `8XYT`
    Arithmetic { ops: Arithmetic, x: usize, y: usize },
    /// `9XY0` - `if (Vx != Vy) skip`
    SkipIfRegistersNotEqual { x: usize, y: usize },
    /// `ANNN` - `I = NNN`
    LoadIndex { nnn: usize },
    /// `BNNN` - `PC = V0 + NNN`
    JumpOffset { nnn: usize },
    /// `CXNN` - `Vx = rand() & NN`
    Random { x: usize, nn: u8 },
    /// `DXYN` - `draw(Vx, Vy, N)`
    Draw { x: usize, y: usize, n: usize },
    /// `EXTT`
    Key { ops: KeyCondition, x: usize },
    /// `FXTT`
    Misc { ops: Misc, x: usize },
}

impl TryFrom<Opcode> for Instruction {
    type Error = UnsupportedOpcode;

    fn try_from(value: Opcode) -> Result<Self, Self::Error> {
        let err = |_| UnsupportedOpcode(value);
        let (x, y, n, nn, nnn) = (value.x(), value.y(), value.n(), value.nn(), value.nnn());

        let instruction = match value.family() {
            0x0 => match value {
                0x00E0 => Instruction::System(System::ClearScreen),
                0x00EE => Instruction::System(System::Return),
                // 0NNN machine code routines are not supported
                _ => return Err(UnsupportedOpcode(value)),
            },
            0x1 => Instruction::Jump { nnn },
            0x2 => Instruction::Call { nnn },
            0x3 => Instruction::SkipIfEqual { x, nn },
            0x4 => Instruction::SkipIfNotEqual { x, nn },
            0x5 => Instruction::SkipIfRegistersEqual { x, y },
            0x6 => Instruction::Load { x, nn },
            0x7 => Instruction::Add { x, nn },
            0x8 => Instruction::Arithmetic {
                ops: Arithmetic::try_from(n).map_err(err)?,
                x,
                y,
            },
            0x9 => Instruction::SkipIfRegistersNotEqual { x, y },
            0xA => Instruction::LoadIndex { nnn },
            0xB => Instruction::JumpOffset { nnn },
            0xC => Instruction::Random { x, nn },
            0xD => Instruction::Draw { x, y, n },
            0xE => Instruction::Key {
                ops: KeyCondition::try_from(nn).map_err(err)?,
                x,
            },
            _ => Instruction::Misc {
                ops: Misc::try_from(nn).map_err(err)?,
                x,
            },
        };
        Ok(instruction)
    }
}

impl Instruction {
    /// If the instruction suspends the interpreter until a key is pressed.
    pub fn is_key_wait(&self) -> bool {
        matches!(
            self,
            Instruction::Misc {
                ops: Misc::AwaitKeyPress,
                ..
            }
        )
    }
}

/// Assembly style mnemonics, as used by the [`disassembler`](crate::disassembler).
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instruction::System(System::ClearScreen) => write!(f, "CLS"),
            Instruction::System(System::Return) => write!(f, "RET"),
            Instruction::Jump { nnn } => write!(f, "JP {:#05X}", nnn),
            Instruction::Call { nnn } => write!(f, "CALL {:#05X}", nnn),
            Instruction::SkipIfEqual { x, nn } => write!(f, "SE V{:X}, {:#04X}", x, nn),
            Instruction::SkipIfNotEqual { x, nn } => write!(f, "SNE V{:X}, {:#04X}", x, nn),
            Instruction::SkipIfRegistersEqual { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            Instruction::Load { x, nn } => write!(f, "LD V{:X}, {:#04X}", x, nn),
            Instruction::Add { x, nn } => write!(f, "ADD V{:X}, {:#04X}", x, nn),
            Instruction::Arithmetic { ops, x, y } => {
                let name = match ops {
                    Arithmetic::Assign => "LD",
                    Arithmetic::Or => "OR",
                    Arithmetic::And => "AND",
                    Arithmetic::Xor => "XOR",
                    Arithmetic::Add => "ADD",
                    Arithmetic::Sub => "SUB",
                    Arithmetic::ShiftRight => "SHR",
                    Arithmetic::SubReversed => "SUBN",
                    Arithmetic::ShiftLeft => "SHL",
                };
                write!(f, "{} V{:X}, V{:X}", name, x, y)
            }
            Instruction::SkipIfRegistersNotEqual { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            Instruction::LoadIndex { nnn } => write!(f, "LD I, {:#05X}", nnn),
            Instruction::JumpOffset { nnn } => write!(f, "JP V0, {:#05X}", nnn),
            Instruction::Random { x, nn } => write!(f, "RND V{:X}, {:#04X}", x, nn),
            Instruction::Draw { x, y, n } => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            Instruction::Key { ops, x } => match ops {
                KeyCondition::Pressed => write!(f, "SKP V{:X}", x),
                KeyCondition::NotPressed => write!(f, "SKNP V{:X}", x),
            },
            Instruction::Misc { ops, x } => match ops {
                Misc::GetDelayTimer => write!(f, "LD V{:X}, DT", x),
                Misc::AwaitKeyPress => write!(f, "LD V{:X}, K", x),
                Misc::SetDelayTimer => write!(f, "LD DT, V{:X}", x),
                Misc::SetSoundTimer => write!(f, "LD ST, V{:X}", x),
                Misc::AddVxToI => write!(f, "ADD I, V{:X}", x),
                Misc::SetIToSprite => write!(f, "LD F, V{:X}", x),
                Misc::StoreBCD => write!(f, "LD B, V{:X}", x),
                Misc::StoreV0ToVx => write!(f, "LD [I], V{:X}", x),
                Misc::FillV0ToVx => write!(f, "LD V{:X}, [I]", x),
            },
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
/// Represents the program steps an instruction takes, after the program
/// counter was already moved past the fetched opcode.
pub enum ProgramCounterStep {
    /// Keeps the already advanced program counter
    Next,
    /// Will skip the following instruction
    Skip,
    /// Will simply move the program counter to the given location.
    ///
    /// The location is not checked, running out of memory is detected by
    /// the next fetch.
    Jump(usize),
}

impl ProgramCounterStep {
    /// Will return a Skip if the condition is true.
    ///
    /// # Example
    /// ```rust
    /// # use chip::opcode::ProgramCounterStep;
    /// assert_eq!(ProgramCounterStep::Next, ProgramCounterStep::cond(false));
    /// assert_eq!(ProgramCounterStep::Skip, ProgramCounterStep::cond(true));
    /// ```
    #[inline]
    pub fn cond(cond: bool) -> Self {
        if cond {
            ProgramCounterStep::Skip
        } else {
            ProgramCounterStep::Next
        }
    }

    /// Applies the step to an already advanced program counter.
    ///
    /// # Example
    /// ```rust
    /// # use chip::opcode::ProgramCounterStep;
    /// assert_eq!(ProgramCounterStep::Next.apply(0x202), 0x202);
    /// assert_eq!(ProgramCounterStep::Skip.apply(0x202), 0x204);
    /// assert_eq!(ProgramCounterStep::Jump(0x300).apply(0x202), 0x300);
    /// ```
    #[inline]
    pub fn apply(&self, program_counter: usize) -> usize {
        match *self {
            ProgramCounterStep::Next => program_counter,
            ProgramCounterStep::Skip => program_counter + memory::opcodes::SIZE,
            ProgramCounterStep::Jump(pointer) => pointer,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// Represents the outcome of a single step reported to the host.
pub enum Operation {
    /// If no action has to be taken.
    None,
    /// The framebuffer changed and should be presented again.
    Draw,
    /// The program counter ran past the end of memory, the program is done.
    Halt,
}

#[cfg(test)]
mod tests {
    use std::convert::TryInto;

    use super::*;

    #[test]
    fn test_tryfrom_opcode_simple() {
        let value: Opcode = 0x00E0;
        let conv = value.try_into();
        assert_eq!(conv, Ok(Instruction::System(System::ClearScreen)));
    }

    #[test]
    fn test_tryfrom_opcode_simple_fail() {
        let value: Opcode = 0x00E1;
        let conv: Result<Instruction, _> = value.try_into();
        assert_eq!(conv, Err(UnsupportedOpcode(value)));
    }

    #[test]
    fn test_tryfrom_opcode_multiple() {
        let tests: &[(Opcode, Result<Instruction, ()>)] = &[
            (0x00E0, Ok(Instruction::System(System::ClearScreen))),
            (0x00EE, Ok(Instruction::System(System::Return))),
            (0x0123, Err(())),
            (0x1919, Ok(Instruction::Jump { nnn: 0x919 })),
            (0x2222, Ok(Instruction::Call { nnn: 0x222 })),
            (0x3123, Ok(Instruction::SkipIfEqual { x: 0x1, nn: 0x23 })),
            (0x4123, Ok(Instruction::SkipIfNotEqual { x: 0x1, nn: 0x23 })),
            (0x5120, Ok(Instruction::SkipIfRegistersEqual { x: 0x1, y: 0x2 })),
            (0x6123, Ok(Instruction::Load { x: 0x1, nn: 0x23 })),
            (0x7123, Ok(Instruction::Add { x: 0x1, nn: 0x23 })),
            (
                0x8124,
                Ok(Instruction::Arithmetic {
                    ops: Arithmetic::Add,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (
                0x812E,
                Ok(Instruction::Arithmetic {
                    ops: Arithmetic::ShiftLeft,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (0x8128, Err(())),
            (0x812F, Err(())),
            (0x9120, Ok(Instruction::SkipIfRegistersNotEqual { x: 0x1, y: 0x2 })),
            (0xA222, Ok(Instruction::LoadIndex { nnn: 0x222 })),
            (0xB222, Ok(Instruction::JumpOffset { nnn: 0x222 })),
            (0xC123, Ok(Instruction::Random { x: 0x1, nn: 0x23 })),
            (0xD123, Ok(Instruction::Draw { x: 0x1, y: 0x2, n: 0x3 })),
            (
                0xE19E,
                Ok(Instruction::Key {
                    ops: KeyCondition::Pressed,
                    x: 0x1,
                }),
            ),
            (
                0xE1A1,
                Ok(Instruction::Key {
                    ops: KeyCondition::NotPressed,
                    x: 0x1,
                }),
            ),
            (0xE111, Err(())),
            (
                0xF00A,
                Ok(Instruction::Misc {
                    ops: Misc::AwaitKeyPress,
                    x: 0x0,
                }),
            ),
            (
                0xF533,
                Ok(Instruction::Misc {
                    ops: Misc::StoreBCD,
                    x: 0x5,
                }),
            ),
            (0xF0AA, Err(())),
        ];
        for (value, res) in tests.iter() {
            let conv: Result<Instruction, _> = (*value).try_into();
            assert_eq!(conv, res.map_err(|_| UnsupportedOpcode(*value)), "{:#06X}", value);
        }
    }

    #[test]
    fn test_every_sub_opcode_of_eight_and_f_decodes() {
        let eight = [0x0, 0x1, 0x2, 0x3, 0x4, 0x5, 0x6, 0x7, 0xE];
        for n in 0x0..=0xF {
            let conv = Instruction::try_from(0x8AB0 | n as Opcode);
            assert_eq!(conv.is_ok(), eight.contains(&n), "8XY{:X}", n);
        }

        let fifteen = [0x07, 0x0A, 0x15, 0x18, 0x1E, 0x29, 0x33, 0x55, 0x65];
        for nn in 0x00..=0xFF {
            let conv = Instruction::try_from(0xF300 | nn as Opcode);
            assert_eq!(conv.is_ok(), fifteen.contains(&nn), "FX{:02X}", nn);
        }
    }

    #[test]
    fn test_mnemonics() {
        let tests: &[(Opcode, &str)] = &[
            (0x00E0, "CLS"),
            (0x00EE, "RET"),
            (0x1200, "JP 0x200"),
            (0x2ABC, "CALL 0xABC"),
            (0x3A0F, "SE VA, 0x0F"),
            (0x5AB0, "SE VA, VB"),
            (0x6123, "LD V1, 0x23"),
            (0x8127, "SUBN V1, V2"),
            (0xB300, "JP V0, 0x300"),
            (0xD015, "DRW V0, V1, 5"),
            (0xE3A1, "SKNP V3"),
            (0xF00A, "LD V0, K"),
            (0xFF65, "LD VF, [I]"),
        ];
        for (opcode, text) in tests.iter() {
            let instruction = Instruction::try_from(*opcode).unwrap();
            assert_eq!(format!("{}", instruction), *text);
        }
    }

    #[test]
    fn test_build_opcode_at_the_end_of_memory() {
        let data = [0u8; memory::SIZE];
        assert!(build_opcode(&data, memory::SIZE - 2).is_ok());
        assert_eq!(
            build_opcode(&data, memory::SIZE - 1),
            Err(OpcodeError::MemoryInvalid {
                pointer: memory::SIZE - 1,
                len: memory::SIZE
            })
        );
        assert!(build_opcode(&data, usize::MAX).is_err());
    }
}
