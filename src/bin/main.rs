use std::ffi::OsString;
use std::io::{self, Write};
use std::num::ParseIntError;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use log::LevelFilter;
use ls8::loader::{self, LoadError};
use ls8::region::Chunk;
use ls8::vm::Machine;

const EXIT_SUCCESS: u8 = 0;
const EXIT_USAGE: u8 = 1;
const EXIT_NOT_FOUND: u8 = 2;
const EXIT_RUNTIME: u8 = 3;

/// LS-8 emulator
#[derive(Parser)]
#[command(version)]
struct Args {
  /// Program to run, either a path or a file name inside `programs/`
  program: PathBuf,

  /// Print the machine state before every instruction
  #[arg(long)]
  trace: bool,

  /// Give up once this many instructions have executed
  #[arg(long, value_name = "N")]
  max_steps: Option<usize>,

  /// Initial stack pointer, decimal or `0x` hex
  #[arg(long, value_name = "ADDR", value_parser = parse_address)]
  stack_pointer: Option<u8>,
}

fn parse_address(s: &str) -> Result<u8, ParseIntError> {
  match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
    Some(hex) => u8::from_str_radix(hex, 16),
    None => s.parse(),
  }
}

/// Parses the command line, giving back the exit code on a usage error.
///
/// `--help` and `--version` print and exit straight away.
fn parse_args<I, T>(argv: I) -> Result<Args, u8>
where
  I: IntoIterator<Item = T>,
  T: Into<OsString> + Clone,
{
  Args::try_parse_from(argv).map_err(|err| match err.kind() {
    ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
    _ => {
      let _ = err.print();
      EXIT_USAGE
    }
  })
}

fn main() -> ExitCode {
  let args = match parse_args(std::env::args_os()) {
    Ok(args) => args,
    Err(code) => return ExitCode::from(code),
  };

  let level = if args.trace {
    LevelFilter::Trace
  } else {
    LevelFilter::Warn
  };
  env_logger::Builder::new()
    .filter_level(level)
    .parse_default_env()
    .init();

  let stdout = io::stdout();
  let stderr = io::stderr();
  ExitCode::from(run(&args, &mut stdout.lock(), &mut stderr.lock()))
}

/// Loads and runs the program named by `args`, printing its output to `out`
/// and any failure to `err`. Returns the process exit code.
fn run<O, E>(args: &Args, out: &mut O, err: &mut E) -> u8
where
  O: Write,
  E: Write,
{
  let chunk = match read_program(args) {
    Ok(chunk) => chunk,
    Err(e) => {
      log::debug!("{e:?}");
      let _ = writeln!(err, "Couldn't open {}", args.program.display());
      return EXIT_NOT_FOUND;
    }
  };

  match execute(args, &chunk, out) {
    Ok(()) => EXIT_SUCCESS,
    Err(e) => {
      let _ = writeln!(err, "error: {e:#}");
      EXIT_RUNTIME
    }
  }
}

fn read_program(args: &Args) -> Result<Chunk, LoadError> {
  let path = loader::resolve(&args.program)?;
  loader::load_file(path)
}

fn execute<W: Write>(args: &Args, chunk: &Chunk, out: &mut W) -> anyhow::Result<()> {
  let mut machine = match args.stack_pointer {
    Some(sp) => Machine::with_stack_pointer(sp),
    None => Machine::new(),
  };
  machine.load(chunk).context("failed to load program")?;

  match args.max_steps {
    Some(limit) => {
      let steps = machine
        .run_bounded(out, limit)
        .with_context(|| format!("failed at pc {:#04x}", machine.pc()))?;
      log::debug!("halted after {steps} steps");
    }
    None => machine
      .run(out)
      .with_context(|| format!("failed at pc {:#04x}", machine.pc()))?,
  }
  Ok(())
}
