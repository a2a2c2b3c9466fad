//! This crate provides the core logic for a Turing Machine simulator.
//! It includes modules for parsing machine descriptions and tapes, executing them
//! deterministically or non-deterministically, and analyzing descriptions for likely mistakes.

pub mod analyzer;
pub mod loader;
pub mod machine;
pub mod nondeterministic;
pub mod parser;
pub mod tape;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `analyze` function and `AnalysisWarning` enum from the analyzer module.
pub use analyzer::{analyze, AnalysisWarning};
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the deterministic engine and the mode-dispatching `simulate` function.
pub use machine::{simulate, TuringMachine};
/// Re-exports the non-deterministic engine and its branches.
pub use nondeterministic::{Branch, NonDeterministicMachine};
/// Re-exports the description and tape parsers.
pub use parser::{parse, parse_tape};
/// Re-exports the persistent tape history used by non-deterministic branches.
pub use tape::TapeHistory;
/// Re-exports various types related to Turing Machine definition and execution from the types module.
pub use types::{
    Direction, Halt, Mode, Program, Rejection, Report, Step, Transition, TuringMachineError,
    BLANK_SYMBOL, DEFAULT_STEP_LIMIT,
};
