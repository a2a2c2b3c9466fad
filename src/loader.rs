//! This module provides the `ProgramLoader` struct, responsible for loading Turing Machine
//! descriptions and tapes from files and strings.

use crate::parser::{parse, parse_tape};
use crate::types::{Mode, Program, TuringMachineError};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// `ProgramLoader` is a utility struct for loading Turing Machine programs and their tapes.
///
/// Failures to read a file are reported as `TuringMachineError::FileError`, separately from
/// `TuringMachineError::FormatError` for content that does not parse.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a machine description from the specified file path.
    ///
    /// # Arguments
    ///
    /// * `path` - The path of the description file.
    /// * `mode` - The execution mode the description is validated for.
    ///
    /// # Returns
    ///
    /// * `Ok(Program)` if the file is successfully read and parsed.
    /// * `Err(TuringMachineError::FileError)` if the file cannot be read.
    /// * `Err(TuringMachineError::FormatError)` if the file content is not a valid description.
    pub fn load_program(path: &Path, mode: Mode) -> Result<Program, TuringMachineError> {
        let content = read(path)?;
        parse(&content, mode).map_err(|e| with_path(e, path))
    }

    /// Loads a machine description from the provided string content.
    pub fn load_program_from_string(
        content: &str,
        mode: Mode,
    ) -> Result<Program, TuringMachineError> {
        parse(content, mode)
    }

    /// Loads a tape from the specified file path, validating every symbol against `alphabet`.
    pub fn load_tape(
        path: &Path,
        alphabet: &BTreeSet<char>,
    ) -> Result<Vec<char>, TuringMachineError> {
        let content = read(path)?;
        parse_tape(&content, alphabet).map_err(|e| with_path(e, path))
    }

    /// Loads a tape from the provided string content.
    pub fn load_tape_from_string(
        content: &str,
        alphabet: &BTreeSet<char>,
    ) -> Result<Vec<char>, TuringMachineError> {
        parse_tape(content, alphabet)
    }
}

fn read(path: &Path) -> Result<String, TuringMachineError> {
    fs::read_to_string(path).map_err(|e| {
        TuringMachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
    })
}

/// Attaches the source file to format errors so their location reads `path:line:column`.
fn with_path(error: TuringMachineError, path: &Path) -> TuringMachineError {
    match error {
        TuringMachineError::FormatError(e) => {
            TuringMachineError::FormatError(Box::new((*e).with_path(&path.display().to_string())))
        }
        other => other,
    }
}
