//! This module defines the `TuringMachine` struct, which executes a deterministic program over a
//! single tape that is bounded on the left and extended with blanks on the right as the head
//! advances. It also provides [`simulate`], which runs a program with the engine matching its
//! mode.

use crate::nondeterministic::NonDeterministicMachine;
use crate::types::{
    Halt, Mode, Program, Rejection, Report, Step, BLANK_SYMBOL, DEFAULT_STEP_LIMIT,
};

/// Runs `program` on `tape` to completion with the engine matching its [`Mode`].
///
/// An empty tape is treated as a single blank cell.
pub fn simulate(program: &Program, tape: Vec<char>, step_limit: usize) -> Report {
    match program.mode {
        Mode::Deterministic => TuringMachine::new(program, tape)
            .with_step_limit(step_limit)
            .run(),
        Mode::NonDeterministic => NonDeterministicMachine::new(program, tape)
            .with_step_limit(step_limit)
            .run(),
    }
}

/// Converts the number of transitions taken into the step count reported for `halt`.
///
/// A run that stops because no transition applies reports every transition taken; any other
/// halt reports one fewer, so a machine accepting on its first move reports zero steps.
pub(crate) fn reported_steps(halt: Halt, taken: usize) -> usize {
    match halt {
        Halt::Reject(Rejection::UndefinedTransition) => taken,
        _ => taken.saturating_sub(1),
    }
}

/// A deterministic single-tape Turing Machine.
///
/// The machine borrows its program and owns its tape for the duration of one run.
pub struct TuringMachine<'a> {
    program: &'a Program,
    state: &'a str,
    tape: Vec<char>,
    head: usize,
    step_count: usize,
    step_limit: usize,
    halt: Option<Halt>,
}

impl<'a> TuringMachine<'a> {
    /// Creates a machine in the program's initial state with the head on the first cell.
    ///
    /// # Arguments
    ///
    /// * `program` - The `Program` defining the Turing Machine.
    /// * `tape` - The initial tape contents. An empty tape becomes a single blank cell.
    pub fn new(program: &'a Program, mut tape: Vec<char>) -> Self {
        if tape.is_empty() {
            tape.push(BLANK_SYMBOL);
        }

        Self {
            program,
            state: &program.initial_state,
            tape,
            head: 0,
            step_count: 0,
            step_limit: DEFAULT_STEP_LIMIT,
            halt: None,
        }
    }

    /// Overrides the number of steps after which the run is presumed non-halting.
    pub fn with_step_limit(mut self, step_limit: usize) -> Self {
        self.step_limit = step_limit;
        self
    }

    /// Executes a single step of the Turing Machine's computation.
    ///
    /// The machine halts with acceptance in the accept state, and with rejection in the reject
    /// state, when no transition matches the symbol under the head, or when the step limit is
    /// exhausted. Once halted, every further call returns the same halt.
    pub fn step(&mut self) -> Step {
        if let Some(halt) = self.halt {
            return Step::Halt(halt);
        }

        match self.advance() {
            Ok(()) => Step::Continue,
            Err(halt) => {
                self.halt = Some(halt);
                Step::Halt(halt)
            }
        }
    }

    fn advance(&mut self) -> Result<(), Halt> {
        if self.step_count > self.step_limit {
            return Err(Halt::Reject(Rejection::StepLimit));
        }
        if self.program.is_accept(self.state) {
            return Err(Halt::Accept);
        }
        if self.program.is_reject(self.state) {
            return Err(Halt::Reject(Rejection::RejectState));
        }

        if self.head == self.tape.len() {
            self.tape.push(BLANK_SYMBOL);
        }

        let program = self.program;
        let transition = program
            .transitions(self.state, self.tape[self.head])
            .and_then(<[_]>::first)
            .ok_or(Halt::Reject(Rejection::UndefinedTransition))?;

        self.tape[self.head] = transition.write;
        self.head = transition.direction.apply(self.head);
        self.state = &transition.next_state;
        self.step_count += 1;

        Ok(())
    }

    /// Runs the Turing Machine until it halts and returns the terminal report.
    pub fn run(&mut self) -> Report {
        loop {
            if let Step::Halt(halt) = self.step() {
                return Report::new(halt, reported_steps(halt, self.step_count), &self.tape);
            }
        }
    }

    /// Returns the current state of the Turing Machine.
    pub fn state(&self) -> &str {
        self.state
    }

    /// Returns the tape cells materialized so far.
    pub fn tape(&self) -> &[char] {
        &self.tape
    }

    pub fn head(&self) -> usize {
        self.head
    }

    /// Returns the number of transitions applied so far.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Returns the halt reached by the machine, if any.
    pub fn halt(&self) -> Option<Halt> {
        self.halt
    }

    pub fn is_halted(&self) -> bool {
        self.halt.is_some()
    }
}
