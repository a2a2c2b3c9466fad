//! Breadth-first execution of non-deterministic programs.
//!
//! Every legal transition sequence is explored as a [`Branch`]. Branches advance in
//! synchronous rounds: each round reads a snapshot of the live branches and builds the next
//! generation from it. Branches never copy the tape; they share the immutable base tape and
//! hold a [`TapeHistory`] with the writes made along their own path.

use crate::machine::reported_steps;
use crate::tape::TapeHistory;
use crate::types::{
    Halt, Program, Rejection, Report, Step, Transition, BLANK_SYMBOL, DEFAULT_STEP_LIMIT,
};
use std::cmp::Ordering;

/// One candidate execution path.
#[derive(Debug, Clone)]
pub struct Branch<'a> {
    state: &'a str,
    head: usize,
    history: TapeHistory,
}

impl<'a> Branch<'a> {
    pub fn state(&self) -> &'a str {
        self.state
    }

    pub fn head(&self) -> usize {
        self.head
    }

    #[cfg(test)]
    fn history(&self) -> &TapeHistory {
        &self.history
    }

    /// Follows `transition` after reading `read` under the head. Writing the symbol that is
    /// already there shares the parent's history instead of recording an edit.
    fn follow(&self, transition: &'a Transition, read: char) -> Branch<'a> {
        let history = if transition.write == read {
            self.history.clone()
        } else {
            self.history.write(self.head, transition.write)
        };

        Branch {
            state: &transition.next_state,
            head: transition.direction.apply(self.head),
            history,
        }
    }

    fn order(&self, other: &Branch) -> Ordering {
        self.state
            .cmp(other.state)
            .then(self.head.cmp(&other.head))
    }
}

/// A halted run: the outcome, the reported step count and the branch whose tape is reported.
#[derive(Debug, Clone)]
struct Finished<'a> {
    halt: Halt,
    steps: usize,
    branch: Branch<'a>,
}

/// A non-deterministic single-tape Turing Machine.
pub struct NonDeterministicMachine<'a> {
    program: &'a Program,
    tape: Vec<char>,
    branches: Vec<Branch<'a>>,
    round: usize,
    step_limit: usize,
    finished: Option<Finished<'a>>,
}

impl<'a> NonDeterministicMachine<'a> {
    /// Creates a machine with a single branch in the initial state at the first cell.
    /// An empty tape becomes a single blank cell.
    pub fn new(program: &'a Program, mut tape: Vec<char>) -> Self {
        if tape.is_empty() {
            tape.push(BLANK_SYMBOL);
        }

        Self {
            program,
            tape,
            branches: vec![Branch {
                state: &program.initial_state,
                head: 0,
                history: TapeHistory::new(),
            }],
            round: 0,
            step_limit: DEFAULT_STEP_LIMIT,
            finished: None,
        }
    }

    /// Overrides the number of rounds after which the run is presumed non-halting.
    pub fn with_step_limit(mut self, step_limit: usize) -> Self {
        self.step_limit = step_limit;
        self
    }

    /// Executes one synchronous round over all live branches.
    ///
    /// Any branch in the accept state ends the run with acceptance before the others are
    /// considered. Branches in the reject state, or with no transition for the symbol under
    /// their head, are pruned; every other branch is replaced by one child per matching
    /// transition, in declaration order. The run is rejected once no branch survives.
    pub fn step(&mut self) -> Step {
        if let Some(finished) = &self.finished {
            return Step::Halt(finished.halt);
        }

        match self.advance() {
            Ok(()) => Step::Continue,
            Err(finished) => {
                let halt = finished.halt;
                self.finished = Some(finished);
                Step::Halt(halt)
            }
        }
    }

    fn advance(&mut self) -> Result<(), Finished<'a>> {
        if self.round > self.step_limit {
            return Err(self.finish(Halt::Reject(Rejection::StepLimit), self.representative()));
        }

        let program = self.program;

        if let Some(accepted) = self.branches.iter().find(|b| program.is_accept(b.state)) {
            return Err(self.finish(Halt::Accept, accepted.clone()));
        }

        let mut next = Vec::with_capacity(self.branches.len());
        let mut last_stuck = false;

        for branch in &self.branches {
            if program.is_reject(branch.state) {
                last_stuck = false;
                continue;
            }

            let read = branch.history.read(branch.head, &self.tape);
            let Some(transitions) = program.transitions(branch.state, read) else {
                last_stuck = true;
                continue;
            };

            next.extend(transitions.iter().map(|t| branch.follow(t, read)));
        }

        if next.is_empty() {
            // The step count follows whatever pruned the last branch of the round.
            let cause = if last_stuck {
                Rejection::UndefinedTransition
            } else {
                Rejection::RejectState
            };
            return Err(Finished {
                halt: Halt::Reject(Rejection::NoBranches),
                steps: reported_steps(Halt::Reject(cause), self.round),
                branch: self.representative(),
            });
        }

        self.branches = next;
        self.round += 1;

        Ok(())
    }

    /// Records the step count for `halt` at the current round.
    fn finish(&self, halt: Halt, branch: Branch<'a>) -> Finished<'a> {
        Finished {
            halt,
            steps: reported_steps(halt, self.round),
            branch,
        }
    }

    /// The branch reported when no single branch decided the outcome: the first live branch
    /// ordered by state name, then head position.
    fn representative(&self) -> Branch<'a> {
        self.branches
            .iter()
            .min_by(|a, b| a.order(b))
            .cloned()
            .unwrap_or_else(|| Branch {
                state: &self.program.initial_state,
                head: 0,
                history: TapeHistory::new(),
            })
    }

    /// Runs rounds until the machine halts and returns the terminal report.
    pub fn run(&mut self) -> Report {
        loop {
            if let Some(report) = self.report() {
                return report;
            }
            self.step();
        }
    }

    /// Returns the terminal report once the machine has halted. The reported tape belongs to
    /// the accepting branch, or to the first branch by state name and head position otherwise.
    pub fn report(&self) -> Option<Report> {
        self.finished.as_ref().map(|finished| {
            Report::new(
                finished.halt,
                finished.steps,
                &finished.branch.history.resolve(&self.tape),
            )
        })
    }

    /// Returns the live branches of the current round.
    pub fn branches(&self) -> &[Branch<'a>] {
        &self.branches
    }

    /// Materializes the tape as seen by `branch`.
    pub fn tape_of(&self, branch: &Branch) -> Vec<char> {
        branch.history.resolve(&self.tape)
    }

    /// Returns the number of completed rounds.
    pub fn step_count(&self) -> usize {
        self.round
    }

    pub fn halt(&self) -> Option<Halt> {
        self.finished.as_ref().map(|finished| finished.halt)
    }

    pub fn is_halted(&self) -> bool {
        self.finished.is_some()
    }
}
