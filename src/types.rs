//! This module defines the core data structures and types used throughout the Turing Machine
//! simulator, including the validated machine model, transitions, execution results, and
//! error types.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use thiserror::Error;

use crate::tape::render;
use crate::Rule;

/// The reserved symbol for an unwritten tape cell. It is implicitly part of every alphabet
/// and may not be declared explicitly.
pub const BLANK_SYMBOL: char = '_';
/// The default number of transitions executed before a run is presumed non-halting.
pub const DEFAULT_STEP_LIMIT: usize = 500_000_000;

/// A validated Turing Machine description.
///
/// Programs are only produced by the parser, which guarantees that every transition
/// references declared states and in-alphabet symbols, and that the alphabet contains
/// [`BLANK_SYMBOL`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Program {
    /// Declared states, in declaration order.
    pub states: Vec<String>,
    /// The tape alphabet, blank symbol included.
    pub alphabet: BTreeSet<char>,
    /// The first declared state.
    pub initial_state: String,
    /// The state marked with `+`, if any.
    pub accept_state: Option<String>,
    /// The state marked with `-`, if any.
    pub reject_state: Option<String>,
    /// Execution mode the program was parsed for.
    pub mode: Mode,
    /// Transition rules keyed by source state, then by the symbol under the head.
    /// Every stored sequence is non-empty and keeps declaration order.
    pub rules: HashMap<String, HashMap<char, Vec<Transition>>>,
}

impl Program {
    /// Returns the transitions available from `state` when reading `symbol`.
    pub fn transitions(&self, state: &str, symbol: char) -> Option<&[Transition]> {
        self.rules
            .get(state)
            .and_then(|by_symbol| by_symbol.get(&symbol))
            .map(Vec::as_slice)
    }

    pub fn is_accept(&self, state: &str) -> bool {
        self.accept_state.as_deref() == Some(state)
    }

    pub fn is_reject(&self, state: &str) -> bool {
        self.reject_state.as_deref() == Some(state)
    }
}

/// The execution mode for a Turing Machine program.
///
/// The mode is fixed at parse time because it decides whether a repeated
/// `(state, symbol)` key is an error or an additional branch.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Mode {
    /// At most one transition per `(state, symbol)` key.
    #[default]
    Deterministic,
    /// Repeated keys are kept in declaration order and all explored.
    NonDeterministic,
}

/// A single transition rule. The source state and the read symbol form the key it is
/// stored under in [`Program::rules`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// The next state the machine transitions to.
    pub next_state: String,
    /// The symbol written at the head position.
    pub write: char,
    /// The direction the head moves after writing.
    pub direction: Direction,
}

/// Represents the possible directions a Turing Machine head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left, staying put at index 0.
    Left,
    /// Move the head one position to the right.
    Right,
}

impl Direction {
    /// Returns the head position after moving from `head`. The tape is bounded on the left.
    pub fn apply(self, head: usize) -> usize {
        match self {
            Direction::Left => head.saturating_sub(1),
            Direction::Right => head + 1,
        }
    }
}

/// Represents the outcome of a Turing Machine execution step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The machine successfully performed a step and continues execution.
    Continue,
    /// The machine has halted.
    Halt(Halt),
}

/// Terminal outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Halt {
    /// The machine entered its accept state.
    Accept,
    /// The machine stopped without accepting, for the given reason.
    Reject(Rejection),
}

impl Halt {
    pub fn is_accept(&self) -> bool {
        matches!(self, Halt::Accept)
    }
}

/// Why a run ended without acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    /// The machine entered its reject state.
    RejectState,
    /// No transition exists for the current state and symbol.
    UndefinedTransition,
    /// The step bound was reached; the machine is presumed non-halting.
    StepLimit,
    /// Every non-deterministic branch was pruned.
    NoBranches,
}

/// The terminal report of a run: outcome, step count and the trimmed final tape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// How the run ended.
    pub halt: Halt,
    /// Transitions taken, minus one when the run halted in a final state or on the step bound.
    pub steps: usize,
    /// The final tape with leading and trailing blanks removed, or `"_"` if entirely blank.
    pub tape: String,
}

impl Report {
    pub fn new(halt: Halt, steps: usize, tape: &[char]) -> Self {
        Self {
            halt,
            steps,
            tape: render(tape),
        }
    }

    pub fn accepted(&self) -> bool {
        self.halt.is_accept()
    }
}

/// Renders the report as three lines: `accepted` or `not accepted`, the step count, and the tape.
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.accepted() {
            "accepted"
        } else {
            "not accepted"
        };
        write!(f, "{verdict}\n{}\n{}", self.steps, self.tape)
    }
}

/// Represents the errors that can occur while loading a Turing Machine and its tape.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuringMachineError {
    /// The machine description or tape text violates the input format.
    #[error("Format error: {0}")]
    FormatError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates an error related to file system operations, such as reading program files.
    #[error("File error: {0}")]
    FileError(String),
}
