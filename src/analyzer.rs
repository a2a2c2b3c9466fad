//! This module provides functions for analyzing parsed Turing Machine programs for likely
//! mistakes that are still legal descriptions: states that can never be entered, an accept
//! state that cannot be reached, and dead ends that silently reject.
//!
//! Findings are warnings. They never make a program invalid.

use crate::types::Program;
use std::collections::HashSet;
use std::fmt;

/// Represents a suspicious construct found in a program.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisWarning {
    /// States that cannot be reached from the initial state through any transition.
    UnreachableStates(Vec<String>),
    /// The accept state is declared but no transition sequence leads to it.
    UnreachableAcceptState(String),
    /// Reachable states that are neither accept nor reject and have no outgoing transitions.
    /// Entering one of them always rejects.
    DeadEndStates(Vec<String>),
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisWarning::UnreachableStates(states) => {
                write!(f, "Unreachable states detected: {}", states.join(", "))
            }
            AnalysisWarning::UnreachableAcceptState(state) => {
                write!(f, "Accept state '{state}' cannot be reached")
            }
            AnalysisWarning::DeadEndStates(states) => write!(
                f,
                "States without outgoing transitions always reject: {}",
                states.join(", ")
            ),
        }
    }
}

/// Analyzes a `Program` and returns every warning found, in a stable order.
pub fn analyze(program: &Program) -> Vec<AnalysisWarning> {
    let reachable = reachable_states(program);

    [
        check_unreachable_states,
        check_accept_reachable,
        check_dead_ends,
    ]
    .iter()
    .filter_map(|check| check(program, &reachable))
    .collect()
}

/// Collects the states reachable from the initial state with a depth-first traversal of the
/// transition graph. Halting states are not expanded.
fn reachable_states(program: &Program) -> HashSet<&str> {
    let mut visited = HashSet::new();
    let mut queue = vec![program.initial_state.as_str()];

    while let Some(state) = queue.pop() {
        if !visited.insert(state) {
            continue;
        }

        if program.is_accept(state) || program.is_reject(state) {
            continue;
        }

        if let Some(by_symbol) = program.rules.get(state) {
            for transition in by_symbol.values().flatten() {
                if !visited.contains(transition.next_state.as_str()) {
                    queue.push(&transition.next_state);
                }
            }
        }
    }

    visited
}

/// Reports declared states that are not reachable, in declaration order.
fn check_unreachable_states(
    program: &Program,
    reachable: &HashSet<&str>,
) -> Option<AnalysisWarning> {
    let unreachable: Vec<String> = program
        .states
        .iter()
        .filter(|state| !reachable.contains(state.as_str()))
        .cloned()
        .collect();

    (!unreachable.is_empty()).then_some(AnalysisWarning::UnreachableStates(unreachable))
}

fn check_accept_reachable(program: &Program, reachable: &HashSet<&str>) -> Option<AnalysisWarning> {
    program
        .accept_state
        .as_ref()
        .filter(|state| !reachable.contains(state.as_str()))
        .map(|state| AnalysisWarning::UnreachableAcceptState(state.clone()))
}

/// Reports reachable, non-halting states that have no transitions at all.
fn check_dead_ends(program: &Program, reachable: &HashSet<&str>) -> Option<AnalysisWarning> {
    let dead_ends: Vec<String> = program
        .states
        .iter()
        .filter(|state| reachable.contains(state.as_str()))
        .filter(|state| !program.is_accept(state) && !program.is_reject(state))
        .filter(|state| !program.rules.contains_key(state.as_str()))
        .cloned()
        .collect();

    (!dead_ends.is_empty()).then_some(AnalysisWarning::DeadEndStates(dead_ends))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::types::Mode;

    fn analyze_text(input: &str) -> Vec<AnalysisWarning> {
        analyze(&parse(input, Mode::NonDeterministic).unwrap())
    }

    #[test]
    fn test_valid_program() {
        let warnings = analyze_text("states 3\nq0\nqa +\nqr -\nalphabet 1 a\nq0 a qa a R\nq0 _ qr _ R\n");

        assert!(warnings.is_empty());
    }

    #[test]
    fn test_unreachable_states() {
        let warnings = analyze_text(
            "states 4\nq0\nq1\nq2\nqa +\nalphabet 1 a\nq0 a qa a R\nq1 a q2 a R\nq2 a q1 a R\n",
        );

        assert_eq!(
            warnings,
            vec![AnalysisWarning::UnreachableStates(vec![
                "q1".to_string(),
                "q2".to_string()
            ])]
        );
    }

    #[test]
    fn test_unreachable_accept_state() {
        let warnings = analyze_text("states 2\nq0\nqa +\nalphabet 1 a\nq0 a q0 a R\n");

        assert!(warnings.contains(&AnalysisWarning::UnreachableAcceptState("qa".to_string())));
        assert!(warnings.contains(&AnalysisWarning::UnreachableStates(vec!["qa".to_string()])));
    }

    #[test]
    fn test_transitions_out_of_halting_states_are_not_followed() {
        let warnings = analyze_text(
            "states 3\nq0\nqr -\nq1\nalphabet 1 a\nq0 a qr a R\nqr a q1 a R\nq1 a q0 a R\n",
        );

        assert_eq!(
            warnings,
            vec![AnalysisWarning::UnreachableStates(vec!["q1".to_string()])]
        );
    }

    #[test]
    fn test_dead_end_states() {
        let warnings = analyze_text("states 3\nq0\nq1\nqa +\nalphabet 1 a\nq0 a q1 a R\nq0 _ qa _ R\n");

        assert_eq!(
            warnings,
            vec![AnalysisWarning::DeadEndStates(vec!["q1".to_string()])]
        );
    }

    #[test]
    fn test_warning_display() {
        let warning = AnalysisWarning::UnreachableStates(vec!["q1".into(), "q2".into()]);
        assert_eq!(warning.to_string(), "Unreachable states detected: q1, q2");
    }
}
