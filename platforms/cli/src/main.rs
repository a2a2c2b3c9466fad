use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tmsim::{
    analyze, simulate, Mode, ProgramLoader, Report, TuringMachineError, BLANK_SYMBOL,
    DEFAULT_STEP_LIMIT,
};

const EXIT_ACCEPTED: u8 = 0;
const EXIT_REJECTED: u8 = 1;
const EXIT_INPUT_ERROR: u8 = 2;
const EXIT_IO_ERROR: u8 = 3;

/// Printed to stdout when the description or tape is malformed.
const INPUT_ERROR: &str = "input error";

/// Runs a Turing machine description against a tape and reports whether it accepts.
#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
#[clap(after_help = "EXIT STATUS:
  0 accepted, 1 not accepted, 2 input error, 3 file error")]
struct Cli {
    /// The Turing machine description file
    machine: PathBuf,

    /// The tape file. A single blank cell is used when omitted
    tape: Option<PathBuf>,

    /// Explore every transition that applies instead of allowing one per state and symbol
    #[clap(short = 'n', long)]
    nondeterministic: bool,

    /// Number of steps after which the machine is presumed not to halt
    #[clap(long, default_value_t = DEFAULT_STEP_LIMIT)]
    step_limit: usize,

    /// Output format of the final report
    #[clap(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Print the execution mode and analyzer warnings to stderr
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let outcome = run(&cli);

    match &outcome {
        Ok(report) => print_report(report, cli.format),
        Err(e) => {
            eprintln!("{e}");
            if matches!(e, TuringMachineError::FormatError(_)) {
                println!("{INPUT_ERROR}");
            }
        }
    }

    ExitCode::from(exit_code(&outcome))
}

/// Maps the outcome of a run to the process exit status.
fn exit_code(outcome: &Result<Report, TuringMachineError>) -> u8 {
    match outcome {
        Ok(report) if report.accepted() => EXIT_ACCEPTED,
        Ok(_) => EXIT_REJECTED,
        Err(TuringMachineError::FormatError(_)) => EXIT_INPUT_ERROR,
        Err(TuringMachineError::FileError(_)) => EXIT_IO_ERROR,
    }
}

fn run(cli: &Cli) -> Result<Report, TuringMachineError> {
    let mode = if cli.nondeterministic {
        Mode::NonDeterministic
    } else {
        Mode::Deterministic
    };

    let program = ProgramLoader::load_program(&cli.machine, mode)?;
    let tape = match &cli.tape {
        Some(path) => ProgramLoader::load_tape(path, &program.alphabet)?,
        None => vec![BLANK_SYMBOL],
    };

    if cli.verbose {
        eprintln!("Running in {mode:?} mode");
        for warning in analyze(&program) {
            eprintln!("warning: {warning}");
        }
    }

    Ok(simulate(&program, tape, cli.step_limit))
}

fn print_report(report: &Report, format: Format) {
    match format {
        Format::Text => println!("{report}"),
        Format::Json => match serde_json::to_string_pretty(report) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Failed to serialize report: {e}"),
        },
    }
}
