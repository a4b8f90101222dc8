mod loader;

use std::fs;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use emu::config::SimConfig;
use emu::cpu::interpreter::{CalloutKind, Interpreter};
use emu::cpu::status::Status;

/// Read when `--config` is not given and the file exists.
const DEFAULT_CONFIG: &str = "a64sim.toml";

#[derive(Debug, Parser)]
#[command(name = "a64sim", version, about = "AArch64 instruction-level simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Runs an image until it returns from its entry point, halts or fails.
    Run(RunArgs),

    /// Prints the entry point, segments and heap symbol of an image.
    Info {
        elf: PathBuf,
    },
}

#[derive(Debug, Args)]
struct RunArgs {
    elf: PathBuf,

    /// TOML file with simulator settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write log output to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log every executed instruction.
    #[arg(long)]
    trace: bool,

    /// Stop after this many instructions, counted across callouts and
    /// breakpoints.
    #[arg(long)]
    max_instructions: Option<u64>,

    /// Initial stack pointer, in hex.
    #[arg(long, value_parser = parse_hex)]
    stack_top: Option<u64>,
}

impl RunArgs {
    /// Layers the command line over `config`.
    fn apply(&self, mut config: SimConfig) -> SimConfig {
        if let Some(stack_top) = self.stack_top {
            config.stack_top = stack_top;
        }
        if let Some(max) = self.max_instructions {
            config.max_instructions = Some(max);
        }
        config.trace |= self.trace;
        config
    }
}

fn parse_hex(text: &str) -> Result<u64, ParseIntError> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u64::from_str_radix(&digits.replace('_', ""), 16)
}

fn read_config(path: Option<&Path>) -> anyhow::Result<SimConfig> {
    let default_path = Path::new(DEFAULT_CONFIG);
    let path = match path {
        Some(path) => path,
        None if default_path.exists() => default_path,
        None => return Ok(SimConfig::default()),
    };

    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// The returned guard flushes the log file when dropped.
fn init_logging(log_file: Option<&Path>, trace: bool) -> anyhow::Result<Option<WorkerGuard>> {
    let default_directive = if trace { "info,emu=trace" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let Some(path) = log_file else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return Ok(None);
    };

    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("{} is not a file path", path.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .init();

    Ok(Some(guard))
}

fn run(args: &RunArgs) -> anyhow::Result<ExitCode> {
    let config = args.apply(read_config(args.config.as_deref())?);
    let image = loader::load_file(&args.elf)?;

    let mut cpu = Interpreter::new(config);
    cpu.load(&image.segments)
        .with_context(|| format!("placing {}", args.elf.display()))?;
    cpu.init(image.entry, image.heap_start())
        .context("setting up the stack")?;

    loop {
        match cpu.run() {
            Status::Return => {
                let code = cpu.state.x(0);
                println!("returned {code} (X0 = {code:#X})");
                return Ok(ExitCode::from(code as u8));
            }
            Status::Halt => {
                println!("halted at {:#018X}", cpu.state.pc);
                return Ok(ExitCode::SUCCESS);
            }
            Status::Break => {
                tracing::info!("breakpoint, continuing at {:#018X}", cpu.state.pc);
            }
            Status::Callout => {
                // No host services are attached; the program sees X0 unchanged.
                if let Some(callout) = cpu.callout() {
                    match callout.kind {
                        CalloutKind::Supervisor(imm) => {
                            tracing::warn!("SVC #{imm:#X} at {:#018X} ignored", callout.pc);
                        }
                        kind => tracing::warn!("{kind:?} at {:#018X} ignored", callout.pc),
                    }
                }
                cpu.resume()?;
            }
            Status::Ready => {
                println!(
                    "instruction budget spent after {} instructions at {:#018X}",
                    cpu.retired(),
                    cpu.state.pc
                );
                return Ok(ExitCode::SUCCESS);
            }
            Status::Error => bail!(
                "{} at {:#018X} (instruction {:#010X})",
                cpu.error_text(),
                cpu.state.pc,
                cpu.instruction()
            ),
        }
    }
}

fn info(path: &Path) -> anyhow::Result<()> {
    let image = loader::load_file(path)?;

    println!("entry  {:#018X}", image.entry);
    match image.heap {
        Some((name, address)) => println!("heap   {address:#018X} ({name})"),
        None => println!("heap   none (defaults below the stack top)"),
    }
    for segment in &image.segments {
        println!(
            "load   {:#018X} {:>10} bytes ({} from file) {}",
            segment.base,
            segment.mem_len,
            segment.bytes.len(),
            if segment.writable { "rw" } else { "r-" }
        );
    }

    Ok(())
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    match &cli.command {
        Command::Run(args) => {
            let _guard = init_logging(args.log_file.as_deref(), args.trace)?;
            run(args)
        }
        Command::Info { elf } => {
            let _guard = init_logging(None, false)?;
            info(elf)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
