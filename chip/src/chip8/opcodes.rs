use rand::RngCore;

use crate::{
    definitions::{cpu, display, memory},
    devices::{InputProvider, SoundDriver},
    opcode::{Arithmetic, Instruction, KeyCondition, Misc, Operation, ProgramCounterStep, System},
    ProcessError,
};

use super::ChipSet;

const FLAG: usize = cpu::register::LAST;

impl<I, S> ChipSet<I, S>
where
    I: InputProvider,
    S: SoundDriver,
{
    /// Runs a single decoded instruction against the state.
    ///
    /// The program counter already points past the instruction, the returned
    /// step is applied to it by the caller.
    pub(super) fn execute(
        &mut self,
        instruction: Instruction,
    ) -> Result<(ProgramCounterStep, Operation), ProcessError> {
        let step = match instruction {
            Instruction::System(System::ClearScreen) => {
                // 00E0
                self.framebuffer.clear();
                return Ok((ProgramCounterStep::Next, Operation::Draw));
            }
            Instruction::System(System::Return) => {
                // 00EE
                let pc = self.pop_stack()?;
                ProgramCounterStep::Jump(pc)
            }
            Instruction::Jump { nnn } => ProgramCounterStep::Jump(nnn),
            Instruction::Call { nnn } => {
                // 2NNN
                // the return address is the already advanced program counter
                self.push_stack(self.program_counter)?;
                ProgramCounterStep::Jump(nnn)
            }
            Instruction::SkipIfEqual { x, nn } => ProgramCounterStep::cond(self.registers[x] == nn),
            Instruction::SkipIfNotEqual { x, nn } => {
                ProgramCounterStep::cond(self.registers[x] != nn)
            }
            Instruction::SkipIfRegistersEqual { x, y } => {
                ProgramCounterStep::cond(self.registers[x] == self.registers[y])
            }
            Instruction::Load { x, nn } => {
                self.registers[x] = nn;
                ProgramCounterStep::Next
            }
            Instruction::Add { x, nn } => {
                // 7XNN
                // carry flag is not changed
                self.registers[x] = self.registers[x].wrapping_add(nn);
                ProgramCounterStep::Next
            }
            Instruction::Arithmetic { ops, x, y } => {
                self.arithmetic(ops, x, y);
                ProgramCounterStep::Next
            }
            Instruction::SkipIfRegistersNotEqual { x, y } => {
                ProgramCounterStep::cond(self.registers[x] != self.registers[y])
            }
            Instruction::LoadIndex { nnn } => {
                self.index_register = nnn;
                ProgramCounterStep::Next
            }
            Instruction::JumpOffset { nnn } => {
                // BNNN
                // an address past the memory is caught by the next fetch
                ProgramCounterStep::Jump(self.registers[0] as usize + nnn)
            }
            Instruction::Random { x, nn } => {
                let value = self.rng.next_u32() as u8;
                self.registers[x] = value & nn;
                ProgramCounterStep::Next
            }
            Instruction::Draw { x, y, n } => {
                // DXYN
                return Ok(self.draw(x, y, n));
            }
            Instruction::Key { ops, x } => {
                let key = self.registers[x] as usize;
                let pressed = self.input.pressed_keys().is_pressed(key);
                match ops {
                    KeyCondition::Pressed => ProgramCounterStep::cond(pressed),
                    KeyCondition::NotPressed => ProgramCounterStep::cond(!pressed),
                }
            }
            Instruction::Misc { ops, x } => {
                self.misc(ops, x)?;
                ProgramCounterStep::Next
            }
        };

        Ok((step, Operation::None))
    }

    /// `8XYT`, the flag is written after the result, so with `X = F` the
    /// flag wins.
    fn arithmetic(&mut self, ops: Arithmetic, x: usize, y: usize) {
        let vx = self.registers[x];
        let vy = self.registers[y];

        let (result, flag) = match ops {
            Arithmetic::Assign => (vy, None),
            Arithmetic::Or => (vx | vy, None),
            Arithmetic::And => (vx & vy, None),
            Arithmetic::Xor => (vx ^ vy, None),
            Arithmetic::Add => {
                let (res, carry) = vx.overflowing_add(vy);
                (res, Some(carry as u8))
            }
            Arithmetic::Sub => (vx.wrapping_sub(vy), Some((vx >= vy) as u8)),
            Arithmetic::ShiftRight => (vx >> 1, Some(vx & 0x01)),
            Arithmetic::SubReversed => (vy.wrapping_sub(vx), Some((vy >= vx) as u8)),
            Arithmetic::ShiftLeft => (vx << 1, Some(vx >> 7)),
        };

        self.registers[x] = result;
        if let Some(flag) = flag {
            self.registers[FLAG] = flag;
        }
    }

    fn draw(&mut self, x: usize, y: usize, n: usize) -> (ProgramCounterStep, Operation) {
        // rows past the end of memory are not drawn
        let end = self.memory.len();
        let from = self.index_register.min(end);
        let sprite = &self.memory[from..(from + n).min(end)];

        let x_anchor = self.registers[x] as usize;
        let y_anchor = self.registers[y] as usize;
        let collided = self.framebuffer.draw_sprite(x_anchor, y_anchor, sprite);

        self.registers[FLAG] = collided as u8;
        log::debug!(
            "draw {} rows at ({}, {}), collision {}",
            n,
            x_anchor,
            y_anchor,
            collided
        );

        (ProgramCounterStep::Next, Operation::Draw)
    }

    fn misc(&mut self, ops: Misc, x: usize) -> Result<(), ProcessError> {
        match ops {
            Misc::GetDelayTimer => self.registers[x] = self.delay_timer.get_value(),
            Misc::AwaitKeyPress => {
                // FX0A
                // blocks this step until the input delivers a key, the
                // timers are not ticked in the meantime
                log::debug!("waiting for a key into V{:X}", x);
                let key = self.input.wait_for_key()?;
                self.registers[x] = key;
            }
            Misc::SetDelayTimer => self.delay_timer.set_value(self.registers[x]),
            Misc::SetSoundTimer => {
                let value = self.registers[x];
                self.sound_timer.set_value(value);
                if value == 0 {
                    self.sound.stop();
                }
            }
            Misc::AddVxToI => {
                // FX1E
                let sum = self.index_register + self.registers[x] as usize;
                self.registers[FLAG] = (sum > memory::ADDRESS_MASK) as u8;
                self.index_register = sum & memory::ADDRESS_MASK;
            }
            Misc::SetIToSprite => {
                // FX29
                self.index_register = display::fontset::LOCATION
                    + self.registers[x] as usize * display::fontset::GLYPH_SIZE;
            }
            Misc::StoreBCD => {
                // FX33
                let value = self.registers[x];
                let cells = self.memory_slice_mut(self.index_register, 3)?;
                cells[0] = value / 100;
                cells[1] = (value / 10) % 10;
                cells[2] = value % 10;
            }
            Misc::StoreV0ToVx => {
                // FX55
                let registers = self.registers;
                let cells = self.memory_slice_mut(self.index_register, x + 1)?;
                cells.copy_from_slice(&registers[..=x]);
            }
            Misc::FillV0ToVx => {
                // FX65
                let mut cells = [0; cpu::register::SIZE];
                cells[..=x].copy_from_slice(self.memory_slice(self.index_register, x + 1)?);
                self.registers[..=x].copy_from_slice(&cells[..=x]);
            }
        }
        Ok(())
    }
}
