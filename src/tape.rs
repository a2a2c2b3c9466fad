//! Tape representations shared by the execution engines.
//!
//! The deterministic engine owns a plain `Vec<char>`. The non-deterministic engine keeps one
//! immutable base tape and gives every branch a [`TapeHistory`]: a persistent chain of point
//! edits that siblings share up to the round where they diverged.

use crate::types::BLANK_SYMBOL;
use std::fmt;
use std::iter;
use std::rc::Rc;

/// Renders a tape for reporting: leading and trailing blanks are removed and an all-blank
/// tape renders as a single blank symbol.
pub fn render(tape: &[char]) -> String {
    let is_symbol = |c: &char| *c != BLANK_SYMBOL;

    match (tape.iter().position(is_symbol), tape.iter().rposition(is_symbol)) {
        (Some(start), Some(end)) => tape[start..=end].iter().collect(),
        _ => BLANK_SYMBOL.to_string(),
    }
}

/// A persistent view of the edits a branch has made on top of the base tape.
///
/// Cloning a history is cheap and never copies tape contents. Writing returns a new handle
/// and leaves the original untouched, so a parent and all of its children stay valid.
#[derive(Clone, Default)]
pub struct TapeHistory {
    last: Option<Rc<Edit>>,
}

struct Edit {
    index: usize,
    symbol: char,
    parent: Option<Rc<Edit>>,
}

// Unlinks the chain iteratively; the default recursive drop overflows the stack on
// histories that are millions of edits deep.
impl Drop for Edit {
    fn drop(&mut self) {
        let mut parent = self.parent.take();
        while let Some(edit) = parent {
            match Rc::try_unwrap(edit) {
                Ok(mut edit) => parent = edit.parent.take(),
                Err(_) => break,
            }
        }
    }
}

// Summarizes the chain instead of printing it; a derived impl recurses once per edit.
impl fmt::Debug for TapeHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last = self.last.as_deref().map(|edit| (edit.index, edit.symbol));
        f.debug_struct("TapeHistory")
            .field("depth", &self.depth())
            .field("last", &last)
            .finish()
    }
}

impl TapeHistory {
    /// Creates an empty history that reads straight through to the base tape.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a history whose view equals this one except that `index` reads `symbol`.
    pub fn write(&self, index: usize, symbol: char) -> Self {
        Self {
            last: Some(Rc::new(Edit {
                index,
                symbol,
                parent: self.last.clone(),
            })),
        }
    }

    /// Reads the symbol at `index`: the most recent edit to that cell wins, otherwise the
    /// base tape is consulted, and cells past its end are blank.
    pub fn read(&self, index: usize, base: &[char]) -> char {
        self.edits()
            .find(|edit| edit.index == index)
            .map(|edit| edit.symbol)
            .or_else(|| base.get(index).copied())
            .unwrap_or(BLANK_SYMBOL)
    }

    /// Materializes the full tape seen through this history.
    pub fn resolve(&self, base: &[char]) -> Vec<char> {
        let len = self
            .edits()
            .map(|edit| edit.index + 1)
            .fold(base.len(), usize::max);

        let mut tape = base.to_vec();
        tape.resize(len, BLANK_SYMBOL);

        let mut resolved = vec![false; len];
        for edit in self.edits() {
            if !resolved[edit.index] {
                resolved[edit.index] = true;
                tape[edit.index] = edit.symbol;
            }
        }

        tape
    }

    /// Number of edits in the chain, i.e. the cost of a worst-case [`read`](Self::read).
    pub fn depth(&self) -> usize {
        self.edits().count()
    }

    /// Checks whether two handles point at the same edit node.
    #[cfg(test)]
    fn shares(&self, other: &TapeHistory) -> bool {
        match (&self.last, &other.last) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    fn edits(&self) -> impl Iterator<Item = &Edit> {
        iter::successors(self.last.as_deref(), |edit| edit.parent.as_deref())
    }
}
