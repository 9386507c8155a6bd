mod adapter;
mod definitions;
mod terminal;

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    thread,
    time::Instant,
};

use {
    anyhow::Context,
    chip::{
        chip8::{ChipSet, LoadRegion},
        definitions::cpu,
        devices::{DisplayCommands, Mute, SoundDriver},
        disassembler,
        font::{self, FONTSET},
        resources::{Rom, RomArchive},
        runner::{Runner, RunnerConfig},
        InputError, ProcessError, RunnerError,
    },
    clap::{Args, Parser, Subcommand},
    env_logger::{Builder, Env, Target},
};

use crate::{
    adapter::{BellAdapter, DisplayAdapter, KeyboardAdapter},
    definitions::{keyboard::HOLD, FRAME, MAX_HERTZ},
    terminal::RawScreen,
};

#[derive(Parser)]
#[command(author, version, about = "A chip8 interpreter for the terminal", long_about = None)]
struct Cli {
    /// Writes the log into this file, nothing is logged without it
    #[arg(long, value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Runs the rom, press Esc to leave
    Run(RunArgs),
    /// Prints the rom as assembly
    Disasm(RomArgs),
    /// Lists the roms inside a zip archive
    List {
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,
    },
}

#[derive(Args)]
struct RomArgs {
    /// A plain rom file or, together with `--entry`, a zip archive
    #[arg(value_name = "ROM")]
    rom: PathBuf,
    /// The rom inside the zip archive
    #[arg(short, long, value_name = "NAME")]
    entry: Option<String>,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    rom: RomArgs,
    /// Instructions per second
    #[arg(
        long,
        default_value_t = cpu::HERTZ,
        value_parser = clap::value_parser!(u32).range(1..=MAX_HERTZ as i64)
    )]
    hertz: u32,
    /// Replaces the built in font with the glyphs in this file
    #[arg(long, value_name = "GLYPHS")]
    font: Option<PathBuf>,
    /// Don't ring the terminal bell
    #[arg(long)]
    mute: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_file.as_deref())?;

    match cli.command {
        Command::Run(args) => run(&args),
        Command::Disasm(args) => disasm(&args),
        Command::List { archive } => list(&archive),
    }
}

/// The terminal belongs to the screen, so the log can only go into a file.
fn setup_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let path = match log_file {
        Some(path) => path,
        None => return Ok(()),
    };
    let file = fs::File::create(path)
        .with_context(|| format!("unable to create the log file {}", path.display()))?;

    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn load_rom(args: &RomArgs) -> anyhow::Result<Rom> {
    Rom::open(&args.rom, args.entry.as_deref())
        .with_context(|| format!("unable to load the rom {}", args.rom.display()))
}

fn run(args: &RunArgs) -> anyhow::Result<()> {
    let rom = load_rom(&args.rom)?;
    let font = match &args.font {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("unable to read the font {}", path.display()))?;
            font::compile(&text).with_context(|| format!("invalid font {}", path.display()))?
        }
        None => FONTSET.to_vec(),
    };
    let config = RunnerConfig {
        cpu_hertz: args.hertz,
        ..RunnerConfig::default()
    };

    if args.mute {
        play(&rom, &font, config, Mute)
    } else {
        play(&rom, &font, config, BellAdapter::new())
    }
}

fn play<S: SoundDriver>(
    rom: &Rom,
    font: &[u8],
    config: RunnerConfig,
    sound: S,
) -> anyhow::Result<()> {
    let mut chip = ChipSet::new(KeyboardAdapter::new(HOLD), sound);
    chip.load(font, LoadRegion::Font)
        .context("the font does not fit into memory")?;
    chip.load(rom.get_data(), LoadRegion::Program)
        .with_context(|| format!("{} does not fit into memory", rom.get_name()))?;
    log::info!(
        "running {} ({} bytes) at {} Hz",
        rom.get_name(),
        rom.get_data().len(),
        config.cpu_hertz
    );

    let screen = RawScreen::enter()?;
    let outcome = DisplayAdapter::new(rom.get_name())
        .map_err(anyhow::Error::from)
        .and_then(|display| {
            let mut runner = Runner::new(display, config, Instant::now());
            main_loop(&mut chip, &mut runner)
        });
    // the terminal has to be usable again before anything gets printed
    drop(screen);

    if let Err(err) = outcome {
        log::error!("stopped with: {:#}", err);
        eprintln!("{}", chip);
        return Err(err);
    }

    log::info!("bye");
    Ok(())
}

fn main_loop<S: SoundDriver>(
    chip: &mut ChipSet<KeyboardAdapter, S>,
    runner: &mut Runner<DisplayAdapter>,
) -> anyhow::Result<()> {
    runner.display_mut().display(chip.framebuffer())?;

    loop {
        chip.input_mut().pump()?;
        if chip.input().quit_requested() {
            return Ok(());
        }

        match runner.update(chip, Instant::now()) {
            Ok(_) => {}
            Err(RunnerError::Process(ProcessError::Input(InputError::Quit))) => return Ok(()),
            Err(err) => return Err(err).context("the interpreter stopped"),
        }

        thread::sleep(FRAME);
    }
}

fn disasm(args: &RomArgs) -> anyhow::Result<()> {
    let rom = load_rom(args)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in disassembler::disassemble(rom.get_data()) {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

fn list(archive: &Path) -> anyhow::Result<()> {
    let archive = RomArchive::open(archive)
        .with_context(|| format!("unable to open the archive {}", archive.display()))?;
    for name in archive.file_names() {
        println!("{}", name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_arguments() {
        let cli = Cli::try_parse_from([
            "chip8", "run", "roms.zip", "--entry", "PONG", "--hertz", "700", "--mute",
            "--log-file", "chip8.log",
        ])
        .unwrap();

        assert_eq!(Some(PathBuf::from("chip8.log")), cli.log_file);
        match cli.command {
            Command::Run(args) => {
                assert_eq!(PathBuf::from("roms.zip"), args.rom.rom);
                assert_eq!(Some("PONG"), args.rom.entry.as_deref());
                assert_eq!(700, args.hertz);
                assert!(args.mute);
                assert!(args.font.is_none());
            }
            _ => panic!("expected the run command"),
        }
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["chip8", "run", "PONG.ch8"]).unwrap();

        assert!(cli.log_file.is_none());
        match cli.command {
            Command::Run(args) => {
                assert_eq!(cpu::HERTZ, args.hertz);
                assert!(!args.mute);
                assert!(args.rom.entry.is_none());
            }
            _ => panic!("expected the run command"),
        }
    }

    #[test]
    fn test_hertz_out_of_range_is_rejected() {
        assert!(Cli::try_parse_from(["chip8", "run", "PONG.ch8", "--hertz", "0"]).is_err());
        assert!(
            Cli::try_parse_from(["chip8", "run", "PONG.ch8", "--hertz", "2000000000"]).is_err()
        );

        let highest = MAX_HERTZ.to_string();
        let cli =
            Cli::try_parse_from(["chip8", "run", "PONG.ch8", "--hertz", highest.as_str()]).unwrap();
        assert!(matches!(cli.command, Command::Run(RunArgs { hertz: MAX_HERTZ, .. })));
    }

    #[test]
    fn test_disasm_and_list() {
        let cli = Cli::try_parse_from(["chip8", "disasm", "MAZE.ch8"]).unwrap();
        assert!(matches!(cli.command, Command::Disasm(RomArgs { entry: None, .. })));

        let cli = Cli::try_parse_from(["chip8", "list", "roms.zip"]).unwrap();
        assert!(matches!(cli.command, Command::List { .. }));
    }
}
