use std::convert::TryFrom;

use {
    crate::{
        definitions::{cpu, display, memory},
        devices::{InputProvider, SoundDriver},
        display::Framebuffer,
        opcode::{self, Instruction, Operation},
        timer::Timer,
        MemoryError, OpcodeError, ProcessError, StackError, UnsupportedOpcode,
    },
    rand::RngCore,
    tinyvec::ArrayVec,
};

/// Where [`ChipSet::load`] shall place the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadRegion {
    /// The program origin at `0x200`
    Program,
    /// The font origin at `0x000`
    Font,
}

impl LoadRegion {
    /// The first address the region's data is copied to.
    pub fn origin(&self) -> usize {
        match self {
            LoadRegion::Program => cpu::PROGRAM_COUNTER,
            LoadRegion::Font => display::fontset::LOCATION,
        }
    }
}

/// The ChipSet struct represents the current state
/// of the system, it contains all the structures
/// needed for emulating an instant on the
/// Chip8 CPU.
pub struct ChipSet<I, S>
where
    I: InputProvider,
    S: SoundDriver,
{
    /// - `0x000-0x1FF` - Chip 8 interpreter (contains font set in emu)
    /// - `0x000-0x04F` - Used for the built in `4x5` pixel font set (`0-F`)
    /// - `0x200-0xFFF` - Program ROM and work RAM
    pub(super) memory: Vec<u8>,
    /// `8-bit` data registers named `V0` to `VF`. The `VF` register doubles as a flag for some
    /// instructions; thus, it should be avoided. In an addition operation, `VF` is the carry flag,
    /// while in subtraction, it is the "no borrow" flag. In the draw instruction `VF` is set upon
    /// pixel collision.
    pub(super) registers: [u8; cpu::register::SIZE],
    /// The index for the register, this is a special register entry
    /// called index `I`
    pub(super) index_register: usize,
    /// The program counter is a CPU register in the computer processor which has the address of the
    /// next instruction to be executed from memory.
    pub(super) program_counter: usize,
    /// The stack is only used to store return addresses when subroutines are called. The original
    /// [RCA 1802](https://de.wikipedia.org/wiki/RCA1802) version allocated `48` bytes for up to
    /// `12` levels of nesting; modern implementations usually have more.
    /// (here we are using `16`)
    pub(super) stack: ArrayVec<[usize; cpu::stack::SIZE]>,
    /// Delay timer: This timer is intended to be used for timing the events of games. Its value
    /// can be set and read.
    pub(super) delay_timer: Timer,
    /// Sound timer: This timer is used for sound effects. When its value is nonzero, a beeping
    /// sound is made.
    pub(super) sound_timer: Timer,
    pub(super) framebuffer: Framebuffer,
    pub(super) input: I,
    pub(super) sound: S,
    /// This stores the random number generator, used by the chipset.
    /// It is stored into the chipset, so as to enable simple mocking
    /// of the given type.
    pub(super) rng: Box<dyn RngCore + Send>,
}

impl<I, S> ChipSet<I, S>
where
    I: InputProvider,
    S: SoundDriver,
{
    /// Will create a new chipset object with blank memory, the program and
    /// the font have to be loaded with [`load`](Self::load).
    pub fn new(input: I, sound: S) -> Self {
        Self {
            memory: vec![0; memory::SIZE],
            registers: [0; cpu::register::SIZE],
            index_register: 0,
            program_counter: cpu::PROGRAM_COUNTER,
            stack: ArrayVec::new(),
            delay_timer: Timer::default(),
            sound_timer: Timer::default(),
            framebuffer: Framebuffer::new(),
            input,
            sound,
            rng: Box::new(rand::rngs::OsRng),
        }
    }

    /// Copies the data into memory at the origin of the given region.
    /// Nothing else gets reset.
    pub fn load(&mut self, data: &[u8], region: LoadRegion) -> Result<(), MemoryError> {
        let address = region.origin();
        let target = self
            .memory
            .get_mut(address..address + data.len())
            .ok_or(MemoryError::OutOfBounds {
                address,
                len: data.len(),
            })?;
        target.copy_from_slice(data);

        log::debug!(
            "loaded {} bytes into {:?} at {:#06X}",
            data.len(),
            region,
            address
        );
        Ok(())
    }

    /// Will advance the program by a single instruction.
    ///
    /// Running off the end of memory is not an error, it is reported as
    /// [`Operation::Halt`] and the program counter stays where it is.
    pub fn step(&mut self) -> Result<Operation, ProcessError> {
        let pointer = self.program_counter;
        let opcode = match opcode::build_opcode(&self.memory, pointer) {
            Ok(opcode) => opcode,
            Err(OpcodeError::MemoryInvalid { .. }) => {
                log::debug!("halted at {:#06X}", pointer);
                return Ok(Operation::Halt);
            }
            Err(err) => return Err(err.into()),
        };

        // the program counter is advanced before the instruction runs, so that
        // jumps and calls overwrite it
        self.program_counter = pointer + memory::opcodes::SIZE;

        let instruction = Instruction::try_from(opcode)
            .map_err(|UnsupportedOpcode(opcode)| OpcodeError::InvalidOpcode { opcode, pointer })?;
        log::trace!("{:#06X}: {:#06X} {}", pointer, opcode, instruction);

        let (step, operation) = self.execute(instruction)?;
        self.program_counter = step.apply(self.program_counter);

        Ok(operation)
    }

    /// Decodes the instruction at the program counter without running it.
    pub fn next_instruction(&self) -> Option<Instruction> {
        opcode::build_opcode(&self.memory, self.program_counter)
            .ok()
            .and_then(|opcode| Instruction::try_from(opcode).ok())
    }

    /// Counts both timers down by one, never below zero.
    ///
    /// Has to be called at [`timer::HERTZ`](crate::definitions::timer::HERTZ),
    /// independent of the instruction rate. The sound driver is told to play
    /// for every tick the sound timer is running and to stop once it ran out.
    pub fn tick_timers(&mut self) {
        self.delay_timer.tick();

        if self.sound_timer.is_running() {
            self.sound.play();
            if self.sound_timer.tick() {
                log::debug!("sound timer ran out");
                self.sound.stop();
            }
        }
    }

    pub fn program_counter(&self) -> usize {
        self.program_counter
    }

    pub fn index_register(&self) -> usize {
        self.index_register
    }

    pub fn registers(&self) -> &[u8] {
        &self.registers
    }

    pub fn stack(&self) -> &[usize] {
        &self.stack
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// will return the delay timer
    pub fn get_delay_timer(&self) -> u8 {
        self.delay_timer.get_value()
    }

    /// will return the sound timer
    pub fn get_sound_timer(&self) -> u8 {
        self.sound_timer.get_value()
    }

    /// The current state of the screen, read only.
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// Replaces the random number source used by `CXNN`.
    pub fn set_rng(&mut self, rng: Box<dyn RngCore + Send>) {
        self.rng = rng;
    }

    /// Will push the return address onto the stack
    pub(super) fn push_stack(&mut self, pointer: usize) -> Result<(), StackError> {
        if self.stack.len() == self.stack.capacity() {
            return Err(StackError::Full);
        }
        self.stack.push(pointer);
        log::debug!("pushed {:#06X}, depth {}", pointer, self.stack.len());
        Ok(())
    }

    /// Will pop the last return address from the stack
    pub(super) fn pop_stack(&mut self) -> Result<usize, StackError> {
        let pointer = self.stack.pop().ok_or(StackError::Empty)?;
        log::debug!("popped {:#06X}, depth {}", pointer, self.stack.len());
        Ok(pointer)
    }

    /// Will return the memory block at `from` of `len` bytes.
    pub(super) fn memory_slice(&self, from: usize, len: usize) -> Result<&[u8], MemoryError> {
        self.memory
            .get(from..from + len)
            .ok_or(MemoryError::OutOfBounds { address: from, len })
    }

    /// Will return the writable memory block at `from` of `len` bytes.
    pub(super) fn memory_slice_mut(
        &mut self,
        from: usize,
        len: usize,
    ) -> Result<&mut [u8], MemoryError> {
        self.memory
            .get_mut(from..from + len)
            .ok_or(MemoryError::OutOfBounds { address: from, len })
    }
}
