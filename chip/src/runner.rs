use std::time::{Duration, Instant};

use crate::{
    chip8::ChipSet,
    definitions::{cpu, timer},
    devices::{DisplayCommands, InputProvider, SoundDriver},
    opcode::Operation,
    timer::Pacer,
    RunnerError,
};

/// The runtime configuration of the [`Runner`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunnerConfig {
    /// instructions per second
    pub cpu_hertz: u32,
    /// timer ticks per second
    pub timer_hertz: u32,
    /// The most time a single update catches up on, everything past it is dropped.
    pub max_catch_up: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            cpu_hertz: cpu::HERTZ,
            timer_hertz: timer::HERTZ,
            max_catch_up: Duration::from_millis(100),
        }
    }
}

impl RunnerConfig {
    /// How many cycles of `hertz` fit into the catch up window, at least one.
    fn cap(&self, hertz: u32) -> u32 {
        ((self.max_catch_up.as_secs_f64() * hertz as f64) as u32).max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    /// The program ran off the end of memory.
    Halted,
}

/// Drives the interpreter and its timers at their own fixed rates and
/// presents the framebuffer whenever it changed.
pub struct Runner<D: DisplayCommands> {
    display: D,
    config: RunnerConfig,
    cpu: Pacer,
    timers: Pacer,
    state: RunState,
}

impl<D: DisplayCommands> Runner<D> {
    /// # Panics
    /// If one of the configured frequencies is zero.
    pub fn new(display: D, config: RunnerConfig, start: Instant) -> Self {
        Self {
            display,
            config,
            cpu: Pacer::new(config.cpu_hertz, start),
            timers: Pacer::new(config.timer_hertz, start),
            state: RunState::Running,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    /// Runs every timer tick and instruction that came due up until `now`.
    ///
    /// Once halted, the chip is not touched anymore.
    pub fn update<I, S>(
        &mut self,
        chip: &mut ChipSet<I, S>,
        now: Instant,
    ) -> Result<RunState, RunnerError>
    where
        I: InputProvider,
        S: SoundDriver,
    {
        if self.state == RunState::Halted {
            return Ok(self.state);
        }

        let ticks = self.due(Source::Timers, now);
        for _ in 0..ticks {
            chip.tick_timers();
        }

        let cycles = self.due(Source::Cpu, now);
        let mut redraw = false;
        for _ in 0..cycles {
            // the screen has to be up to date before waiting on the user
            if redraw && chip.next_instruction().map_or(false, |i| i.is_key_wait()) {
                self.display.display(chip.framebuffer())?;
                redraw = false;
            }

            match chip.step()? {
                Operation::None => {}
                Operation::Draw => redraw = true,
                Operation::Halt => {
                    log::info!("program halted at {:#06X}", chip.program_counter());
                    self.state = RunState::Halted;
                    break;
                }
            }
        }

        if redraw {
            self.display.display(chip.framebuffer())?;
        }

        Ok(self.state)
    }

    /// Forgets about all the work that piled up, e.g. after the host was paused.
    pub fn resync(&mut self, now: Instant) {
        self.cpu.resync(now);
        self.timers.resync(now);
    }

    fn due(&mut self, source: Source, now: Instant) -> u32 {
        let (pacer, hertz) = match source {
            Source::Cpu => (&mut self.cpu, self.config.cpu_hertz),
            Source::Timers => (&mut self.timers, self.config.timer_hertz),
        };
        let due = pacer.due(now);
        let cap = self.config.cap(hertz);
        if due > cap {
            log::warn!("{:?} fell behind, dropping {} cycles", source, due - cap);
            return cap;
        }
        due
    }
}

#[derive(Debug, Clone, Copy)]
enum Source {
    Cpu,
    Timers,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chip8::LoadRegion,
        devices::{MockDisplayCommands, MockInputProvider, Mute},
        OpcodeError, ProcessError,
    };
    use mockall::Sequence;
    use std::io;

    type TestChip = ChipSet<MockInputProvider, Mute>;

    fn chip_with(program: &[u8]) -> TestChip {
        let mut chip = ChipSet::new(MockInputProvider::new(), Mute);
        chip.load(program, LoadRegion::Program)
            .expect("the program fits");
        chip
    }

    /// `ADD V0, 1` then `JP 0x200`
    const COUNTER: [u8; 4] = [0x70, 0x01, 0x12, 0x00];

    #[test]
    fn test_runs_due_cycles() {
        let start = Instant::now();
        let mut chip = chip_with(&COUNTER);
        let mut runner = Runner::new(MockDisplayCommands::new(), RunnerConfig::default(), start);

        // 500 Hz, so 5 cycles in 10 ms
        let state = runner.update(&mut chip, start + Duration::from_millis(10));
        assert!(matches!(state, Ok(RunState::Running)));
        assert_eq!(3, chip.registers()[0]);

        // nothing new came due
        let state = runner.update(&mut chip, start + Duration::from_millis(10));
        assert!(matches!(state, Ok(RunState::Running)));
        assert_eq!(3, chip.registers()[0]);
    }

    #[test]
    fn test_catch_up_is_capped() {
        let start = Instant::now();
        let mut chip = chip_with(&COUNTER);
        let mut runner = Runner::new(MockDisplayCommands::new(), RunnerConfig::default(), start);

        // only 100 ms worth of cycles are run
        assert!(runner.update(&mut chip, start + Duration::from_secs(10)).is_ok());
        assert_eq!(25, chip.registers()[0]);
    }

    #[test]
    fn test_timers_tick_at_their_own_rate() {
        let start = Instant::now();
        // `LD VA, 10`, `LD DT, VA`, `JP 0x204`
        let mut chip = chip_with(&[0x6A, 0x0A, 0xFA, 0x15, 0x12, 0x04]);
        let config = RunnerConfig {
            cpu_hertz: 1000,
            ..RunnerConfig::default()
        };
        let mut runner = Runner::new(MockDisplayCommands::new(), config, start);

        // the first two cycles set the delay timer to 10
        assert!(runner.update(&mut chip, start + Duration::from_millis(2)).is_ok());
        assert_eq!(10, chip.get_delay_timer());

        let interval = Duration::from_secs(1) / timer::HERTZ;
        assert!(runner.update(&mut chip, start + interval * 3).is_ok());
        assert_eq!(7, chip.get_delay_timer());
    }

    #[test]
    fn test_redraw_once_per_update() {
        let start = Instant::now();
        // `CLS`, `CLS`, `JP 0x204`
        let mut chip = chip_with(&[0x00, 0xE0, 0x00, 0xE0, 0x12, 0x04]);
        let mut display = MockDisplayCommands::new();
        display.expect_display().times(1).returning(|_| Ok(()));
        let mut runner = Runner::new(display, RunnerConfig::default(), start);

        assert!(runner.update(&mut chip, start + Duration::from_millis(10)).is_ok());
        // only jumps from here on, no redraw
        assert!(runner.update(&mut chip, start + Duration::from_millis(20)).is_ok());
    }

    #[test]
    fn test_redraw_before_key_wait() {
        let start = Instant::now();
        // `CLS`, `LD V0, K`, `JP 0x204`
        let mut chip = chip_with(&[0x00, 0xE0, 0xF0, 0x0A, 0x12, 0x04]);
        let mut seq = Sequence::new();
        let mut display = MockDisplayCommands::new();
        display
            .expect_display()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        chip.input_mut()
            .expect_wait_for_key()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(0x7));
        let mut runner = Runner::new(display, RunnerConfig::default(), start);

        assert!(runner.update(&mut chip, start + Duration::from_millis(10)).is_ok());
        assert_eq!(0x7, chip.registers()[0]);
    }

    #[test]
    fn test_halted() {
        let start = Instant::now();
        // `JP 0xFFF`, there is no complete opcode there
        let mut chip = chip_with(&[0x1F, 0xFF]);
        let mut runner = Runner::new(MockDisplayCommands::new(), RunnerConfig::default(), start);

        let state = runner.update(&mut chip, start + Duration::from_millis(10));
        assert!(matches!(state, Ok(RunState::Halted)));
        assert_eq!(RunState::Halted, runner.state());
        assert_eq!(0x0FFF, chip.program_counter());

        let state = runner.update(&mut chip, start + Duration::from_secs(1));
        assert!(matches!(state, Ok(RunState::Halted)));
    }

    #[test]
    fn test_fault_is_reported() {
        let start = Instant::now();
        let mut chip = chip_with(&[0x01, 0x23]);
        let mut runner = Runner::new(MockDisplayCommands::new(), RunnerConfig::default(), start);

        let state = runner.update(&mut chip, start + Duration::from_millis(10));
        assert!(matches!(
            state,
            Err(RunnerError::Process(ProcessError::Opcode(
                OpcodeError::InvalidOpcode {
                    opcode: 0x0123,
                    pointer: 0x0200
                }
            )))
        ));
    }

    #[test]
    fn test_display_error_is_reported() {
        let start = Instant::now();
        let mut chip = chip_with(&[0x00, 0xE0, 0x12, 0x02]);
        let mut display = MockDisplayCommands::new();
        display
            .expect_display()
            .returning(|_| Err(io::Error::new(io::ErrorKind::Other, "gone")));
        let mut runner = Runner::new(display, RunnerConfig::default(), start);

        let state = runner.update(&mut chip, start + Duration::from_millis(10));
        assert!(matches!(state, Err(RunnerError::Display(_))));
    }

    #[test]
    fn test_very_high_frequency() {
        let start = Instant::now();
        let mut chip = chip_with(&COUNTER);
        let config = RunnerConfig {
            cpu_hertz: 2_000_000_000,
            ..RunnerConfig::default()
        };
        let mut runner = Runner::new(MockDisplayCommands::new(), config, start);

        // one cycle per nanosecond
        let state = runner.update(&mut chip, start + Duration::from_nanos(10));
        assert!(matches!(state, Ok(RunState::Running)));
        assert_eq!(5, chip.registers()[0]);
    }

    #[test]
    fn test_resync_drops_pending_work() {
        let start = Instant::now();
        let mut chip = chip_with(&COUNTER);
        let mut runner = Runner::new(MockDisplayCommands::new(), RunnerConfig::default(), start);

        let later = start + Duration::from_secs(5);
        runner.resync(later);
        assert!(runner.update(&mut chip, later).is_ok());
        assert_eq!(0, chip.registers()[0]);
    }
}
