//! This module provides the parser for Turing Machine descriptions and tapes, utilizing the
//! `pest` crate. The grammar in `grammar.pest` splits the input into sections, lines and
//! tokens; the functions here walk that tree in document order and enforce every structural
//! rule, failing on the first violation.

use crate::types::{Direction, Mode, Program, Transition, TuringMachineError, BLANK_SYMBOL};
use pest::{
    error::{Error, ErrorVariant},
    iterators::Pair,
    Parser as PestParser, Position, Span,
};
use pest_derive::Parser as PestParser;
use std::collections::{hash_map::Entry, BTreeSet, HashMap, HashSet};

/// Derives a `PestParser` for the description and tape grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct TuringMachineParser;

/// Parses a machine description into a validated `Program`.
///
/// The description consists of a `states <count>` header, one state per line (optionally
/// followed by `+` for accept or `-` for reject), an `alphabet <count> <symbols>...` line and
/// one `from read to write L|R` transition per line. Blank lines are ignored.
///
/// # Arguments
///
/// * `input` - The machine description text.
/// * `mode` - Whether repeated `(state, symbol)` transitions are rejected
///   ([`Mode::Deterministic`]) or kept as alternative branches ([`Mode::NonDeterministic`]).
///
/// # Returns
///
/// * `Ok(Program)` if the description is well formed.
/// * `Err(TuringMachineError::FormatError)` describing the first violation otherwise.
pub fn parse(input: &str, mode: Mode) -> Result<Program, TuringMachineError> {
    let mut sections = TuringMachineParser::parse(Rule::description, input)
        .map_err(Box::new)?
        .flat_map(Pair::into_inner)
        .peekable();

    let header = sections.next_if(|s| s.as_rule() == Rule::header);
    let block = sections.next_if(|s| s.as_rule() == Rule::states);
    let alphabet = sections.next_if(|s| s.as_rule() == Rule::alphabet);
    let transitions = sections.next_if(|s| s.as_rule() == Rule::transitions);

    let (header, block) = match (header, block) {
        (Some(header), Some(block)) => (header, block),
        (None, Some(block)) => return Err(missing("states header", block.as_span().start_pos())),
        _ => return Err(missing("states header", Position::from_start(input))),
    };

    let header_span = header.as_span();
    let count = parse_header(header)?;
    let block_end = block.as_span().end_pos();
    let states = parse_states(block, count, header_span)?;

    let alphabet = match alphabet {
        Some(alphabet) => parse_alphabet(alphabet)?,
        None => return Err(missing("alphabet line", block_end)),
    };

    let rules = match transitions {
        Some(transitions) => parse_transitions(transitions, &states, &alphabet, mode)?,
        None => HashMap::new(),
    };

    Ok(Program {
        initial_state: states.names[0].clone(),
        states: states.names,
        alphabet,
        accept_state: states.accept,
        reject_state: states.reject,
        mode,
        rules,
    })
}

/// Parses tape text into a flat symbol sequence.
///
/// Whitespace only separates runs of symbols and is not preserved. Every symbol must belong to
/// `alphabet`, which for a parsed program includes the blank symbol.
pub fn parse_tape(input: &str, alphabet: &BTreeSet<char>) -> Result<Vec<char>, TuringMachineError> {
    let tokens = TuringMachineParser::parse(Rule::tape, input)
        .map_err(Box::new)?
        .flat_map(Pair::into_inner)
        .filter(|pair| pair.as_rule() == Rule::token);

    let mut tape = Vec::new();
    for token in tokens {
        for symbol in token.as_str().chars() {
            if !alphabet.contains(&symbol) {
                return Err(parse_error(
                    &format!("Tape symbol '{symbol}' is not in the machine's alphabet"),
                    token.as_span(),
                ));
            }
            tape.push(symbol);
        }
    }

    Ok(tape)
}

/// State names collected from the states block.
struct DeclaredStates {
    names: Vec<String>,
    accept: Option<String>,
    reject: Option<String>,
}

/// Parses the `states <count>` header and returns the declared count.
fn parse_header(pair: Pair<Rule>) -> Result<usize, TuringMachineError> {
    let span = pair.as_span();
    let mut tokens = tokens(pair).into_iter();
    let count = parse_count(tokens.next(), "states", span)?;

    if let Some(extra) = tokens.next() {
        return Err(parse_error(
            &format!("Unexpected token '{}' after number of states", extra.as_str()),
            extra.as_span(),
        ));
    }

    Ok(count)
}

/// Parses the state declaration block.
///
/// The first declared state becomes the initial state. `+` marks the accept state and `-`
/// the reject state; each marker may be used once.
fn parse_states(
    pair: Pair<Rule>,
    declared: usize,
    header: Span,
) -> Result<DeclaredStates, TuringMachineError> {
    let mut names = Vec::new();
    let mut seen = HashSet::new();
    let mut accept = None;
    let mut reject = None;

    for line in pair.into_inner() {
        let span = line.as_span();
        let tokens = tokens(line);
        let Some(name) = tokens.first().map(|t| t.as_str().to_string()) else {
            continue;
        };

        if tokens.len() > 2 {
            return Err(parse_error("Too many tokens in state declaration", span));
        }

        if let Some(marker) = tokens.get(1) {
            let slot = match marker.as_str() {
                "+" => &mut accept,
                "-" => &mut reject,
                other => {
                    return Err(parse_error(
                        &format!("Unknown state marker '{other}', expected '+' or '-'"),
                        marker.as_span(),
                    ))
                }
            };

            if slot.is_some() {
                let kind = if marker.as_str() == "+" { "accept" } else { "reject" };
                return Err(parse_error(
                    &format!("More than one {kind} state declared"),
                    span,
                ));
            }
            *slot = Some(name.clone());
        }

        if !seen.insert(name.clone()) {
            return Err(parse_error(&format!("Duplicate state '{name}'"), span));
        }
        names.push(name);
    }

    if names.is_empty() {
        return Err(parse_error("No states declared", header));
    }

    if names.len() != declared {
        return Err(parse_error(
            &format!(
                "Declared {declared} states but {} were provided",
                names.len()
            ),
            header,
        ));
    }

    Ok(DeclaredStates {
        names,
        accept,
        reject,
    })
}

/// Parses the `alphabet <count> <symbols>...` line. The blank symbol is added after the
/// declared symbols have been validated and never counts against the declared length.
fn parse_alphabet(pair: Pair<Rule>) -> Result<BTreeSet<char>, TuringMachineError> {
    let span = pair.as_span();
    let mut tokens = tokens(pair).into_iter();
    let declared = parse_count(tokens.next(), "alphabet symbols", span)?;

    let mut alphabet = BTreeSet::new();
    let mut remaining = declared;

    for token in tokens {
        let text = token.as_str();

        if remaining == 0 {
            return Err(parse_error(
                &format!("Alphabet declares more symbols than its stated length of {declared}"),
                token.as_span(),
            ));
        }
        remaining -= 1;

        let Some(symbol) = single_char(text) else {
            return Err(parse_error(
                &format!("Alphabet symbol '{text}' is longer than one character"),
                token.as_span(),
            ));
        };

        if symbol == BLANK_SYMBOL {
            return Err(parse_error(
                &format!("Alphabet cannot declare the blank symbol '{BLANK_SYMBOL}'"),
                token.as_span(),
            ));
        }

        if !alphabet.insert(symbol) {
            return Err(parse_error(
                &format!("Duplicate alphabet symbol '{symbol}'"),
                token.as_span(),
            ));
        }
    }

    if remaining > 0 {
        return Err(parse_error(
            &format!(
                "Alphabet declares {} symbols but its stated length is {declared}",
                declared - remaining
            ),
            span,
        ));
    }

    alphabet.insert(BLANK_SYMBOL);

    Ok(alphabet)
}

/// Parses the transition lines.
///
/// In deterministic mode a repeated `(state, symbol)` key is an error. Otherwise the new
/// transition is appended to the existing sequence, preserving declaration order.
fn parse_transitions(
    pair: Pair<Rule>,
    states: &DeclaredStates,
    alphabet: &BTreeSet<char>,
    mode: Mode,
) -> Result<HashMap<String, HashMap<char, Vec<Transition>>>, TuringMachineError> {
    let declared: HashSet<&str> = states.names.iter().map(String::as_str).collect();
    let mut rules: HashMap<String, HashMap<char, Vec<Transition>>> = HashMap::new();

    for line in pair.into_inner() {
        let span = line.as_span();
        let tokens = tokens(line);
        if tokens.is_empty() {
            continue;
        }

        let [from, read, to, write, direction] = tokens.as_slice() else {
            return Err(parse_error(
                &format!(
                    "Transition must have 5 fields (state, read, next state, write, direction), found {}",
                    tokens.len()
                ),
                span,
            ));
        };

        if !declared.contains(from.as_str()) {
            return Err(parse_error(
                &format!("Transition starts from undeclared state '{}'", from.as_str()),
                from.as_span(),
            ));
        }
        if !declared.contains(to.as_str()) {
            return Err(parse_error(
                &format!("Transition leads to undeclared state '{}'", to.as_str()),
                to.as_span(),
            ));
        }

        let read_symbol = parse_symbol(read, "Input")?;
        let write_symbol = parse_symbol(write, "Output")?;

        for (token, symbol, kind) in [(read, read_symbol, "Input"), (write, write_symbol, "Output")] {
            if !alphabet.contains(&symbol) {
                return Err(parse_error(
                    &format!("{kind} symbol '{symbol}' is not in the alphabet"),
                    token.as_span(),
                ));
            }
        }

        let direction = parse_direction(direction)?;

        let transition = Transition {
            next_state: to.as_str().to_string(),
            write: write_symbol,
            direction,
        };

        match rules
            .entry(from.as_str().to_string())
            .or_default()
            .entry(read_symbol)
        {
            Entry::Vacant(entry) => {
                entry.insert(vec![transition]);
            }
            Entry::Occupied(mut entry) => match mode {
                Mode::Deterministic => {
                    return Err(parse_error(
                        &format!(
                            "Duplicate transition for state '{}' and symbol '{read_symbol}'",
                            from.as_str()
                        ),
                        span,
                    ))
                }
                Mode::NonDeterministic => entry.get_mut().push(transition),
            },
        }
    }

    Ok(rules)
}

/// Parses a positive count token such as the number of states or alphabet symbols.
fn parse_count(
    token: Option<Pair<Rule>>,
    what: &str,
    span: Span,
) -> Result<usize, TuringMachineError> {
    let Some(token) = token else {
        return Err(parse_error(&format!("Missing number of {what}"), span));
    };

    let count = token.as_str().parse::<i64>().map_err(|_| {
        parse_error(
            &format!("Number of {what} is not a valid number: '{}'", token.as_str()),
            token.as_span(),
        )
    })?;

    usize::try_from(count)
        .ok()
        .filter(|&count| count > 0)
        .ok_or_else(|| {
            parse_error(
                &format!("Number of {what} must be greater than 0"),
                token.as_span(),
            )
        })
}

/// Parses a transition symbol token, which must be exactly one character.
fn parse_symbol(pair: &Pair<Rule>, kind: &str) -> Result<char, TuringMachineError> {
    single_char(pair.as_str()).ok_or_else(|| {
        parse_error(
            &format!("{kind} symbol '{}' is not a single character", pair.as_str()),
            pair.as_span(),
        )
    })
}

/// Parses a direction token. Only `L` and `R` are supported.
fn parse_direction(pair: &Pair<Rule>) -> Result<Direction, TuringMachineError> {
    match pair.as_str() {
        "L" => Ok(Direction::Left),
        "R" => Ok(Direction::Right),
        other => Err(parse_error(
            &format!("Unsupported direction '{other}', expected 'L' or 'R'"),
            pair.as_span(),
        )),
    }
}

/// Collects the tokens of a section or line pair.
fn tokens(pair: Pair<Rule>) -> Vec<Pair<Rule>> {
    pair.into_inner()
        .flatten()
        .filter(|p| p.as_rule() == Rule::token)
        .collect()
}

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Creates a `TuringMachineError::FormatError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> TuringMachineError {
    TuringMachineError::FormatError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

/// Reports a required section that is absent, at the point where it was expected.
fn missing(section: &str, pos: Position) -> TuringMachineError {
    TuringMachineError::FormatError(Box::new(Error::new_from_pos(
        ErrorVariant::CustomError {
            message: format!("Missing {section}"),
        },
        pos,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCEPT_ZERO: &str = "states 3
q0
qa +
qr -
alphabet 2 0 1
q0 0 qa 0 R
";

    fn format_error(input: &str, mode: Mode) -> String {
        let error = parse(input, mode).unwrap_err();
        assert!(matches!(error, TuringMachineError::FormatError(_)));
        error.to_string()
    }

    #[test]
    fn test_parse_simple_machine() {
        let program = parse(ACCEPT_ZERO, Mode::Deterministic).unwrap();

        assert_eq!(program.states, vec!["q0", "qa", "qr"]);
        assert_eq!(program.initial_state, "q0");
        assert_eq!(program.accept_state.as_deref(), Some("qa"));
        assert_eq!(program.reject_state.as_deref(), Some("qr"));
        assert_eq!(program.alphabet, BTreeSet::from(['0', '1', '_']));
        assert_eq!(
            program.transitions("q0", '0'),
            Some(
                &[Transition {
                    next_state: "qa".into(),
                    write: '0',
                    direction: Direction::Right,
                }][..]
            )
        );
        assert_eq!(program.transitions("q0", '1'), None);
    }

    #[test]
    fn test_parse_ignores_blank_lines() {
        let input = "\nstates 2\n\nq0\n\n  \nq1 +\n\nalphabet 1 a\n\nq0 a q1 a L\n\n";
        let program = parse(input, Mode::Deterministic).unwrap();

        assert_eq!(program.states, vec!["q0", "q1"]);
        assert_eq!(program.transitions("q0", 'a').map(<[_]>::len), Some(1));
    }

    #[test]
    fn test_parse_crlf_and_tabs() {
        let input = "states 2\r\nq0\r\nq1\t+\r\nalphabet 2\ta b\r\nq0 a q1 b R\r\n";
        let program = parse(input, Mode::Deterministic).unwrap();

        assert_eq!(program.accept_state.as_deref(), Some("q1"));
        assert_eq!(program.alphabet.len(), 3);
    }

    #[test]
    fn test_parse_without_transitions_or_markers() {
        let program = parse("states 1\nq0\nalphabet 1 a", Mode::Deterministic).unwrap();

        assert_eq!(program.accept_state, None);
        assert_eq!(program.reject_state, None);
        assert!(program.rules.is_empty());
    }

    #[test]
    fn test_parse_is_deterministic() {
        let first = parse(ACCEPT_ZERO, Mode::Deterministic).unwrap();
        let second = parse(ACCEPT_ZERO, Mode::Deterministic).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_invalid_state_count() {
        let error = format_error("states x\nq0\nalphabet 1 a\n", Mode::Deterministic);
        assert!(error.contains("Number of states is not a valid number"));

        let error = format_error("states 0\nq0\nalphabet 1 a\n", Mode::Deterministic);
        assert!(error.contains("Number of states must be greater than 0"));

        let error = format_error("states -2\nq0\nalphabet 1 a\n", Mode::Deterministic);
        assert!(error.contains("Number of states must be greater than 0"));

        let error = format_error("states\nq0\nalphabet 1 a\n", Mode::Deterministic);
        assert!(error.contains("Missing number of states"));
    }

    #[test]
    fn test_parse_state_count_mismatch() {
        let error = format_error("states 3\nq0\nq1\nalphabet 1 a\n", Mode::Deterministic);
        assert!(error.contains("Declared 3 states but 2 were provided"));
    }

    #[test]
    fn test_parse_no_states() {
        let error = format_error("states 1\nalphabet 1 a\n", Mode::Deterministic);
        assert!(error.contains("No states declared"));
    }

    #[test]
    fn test_parse_duplicate_state() {
        let error = format_error("states 2\nq0\nq0\nalphabet 1 a\n", Mode::Deterministic);
        assert!(error.contains("Duplicate state 'q0'"));
    }

    #[test]
    fn test_parse_state_markers() {
        let error = format_error(
            "states 2\nq0 +\nq1 +\nalphabet 1 a\n",
            Mode::Deterministic,
        );
        assert!(error.contains("More than one accept state declared"));

        let error = format_error(
            "states 2\nq0 -\nq1 -\nalphabet 1 a\n",
            Mode::Deterministic,
        );
        assert!(error.contains("More than one reject state declared"));

        let error = format_error("states 1\nq0 *\nalphabet 1 a\n", Mode::Deterministic);
        assert!(error.contains("Unknown state marker '*'"));

        let error = format_error("states 1\nq0 + x\nalphabet 1 a\n", Mode::Deterministic);
        assert!(error.contains("Too many tokens in state declaration"));
    }

    #[test]
    fn test_parse_alphabet_rejects_blank() {
        let error = format_error("states 1\nq0\nalphabet 2 a _\n", Mode::Deterministic);
        assert!(error.contains("Alphabet cannot declare the blank symbol '_'"));
    }

    #[test]
    fn test_parse_alphabet_count_mismatch() {
        let error = format_error("states 1\nq0\nalphabet 1 a b\n", Mode::Deterministic);
        assert!(error.contains("more symbols than its stated length of 1"));

        let error = format_error("states 1\nq0\nalphabet 3 a b\n", Mode::Deterministic);
        assert!(error.contains("Alphabet declares 2 symbols but its stated length is 3"));

        let error = format_error("states 1\nq0\nalphabet 0\n", Mode::Deterministic);
        assert!(error.contains("Number of alphabet symbols must be greater than 0"));
    }

    #[test]
    fn test_parse_alphabet_symbol_shape() {
        let error = format_error("states 1\nq0\nalphabet 2 a bc\n", Mode::Deterministic);
        assert!(error.contains("'bc' is longer than one character"));

        let error = format_error("states 1\nq0\nalphabet 2 a a\n", Mode::Deterministic);
        assert!(error.contains("Duplicate alphabet symbol 'a'"));
    }

    #[test]
    fn test_parse_missing_alphabet() {
        let error = format_error("states 1\nq0\n", Mode::Deterministic);
        assert!(error.contains("Missing alphabet line"));
        assert!(error.contains("3:1"));

        let error = format_error("states 1\nq0\nq0 a q0 a R", Mode::Deterministic);
        assert!(error.contains("Missing alphabet line"));
    }

    #[test]
    fn test_parse_missing_header() {
        let error = format_error("foo 1\nq0\nalphabet 1 a\n", Mode::Deterministic);
        assert!(error.contains("Missing states header"));
        assert!(error.contains("1:1"));

        let error = format_error("\n\nq0\nalphabet 1 a\n", Mode::Deterministic);
        assert!(error.contains("Missing states header"));
        assert!(error.contains("3:1"));

        let error = format_error("", Mode::Deterministic);
        assert!(error.contains("Missing states header"));
    }

    #[test]
    fn test_parse_state_errors_precede_missing_alphabet() {
        let error = format_error("states 2\nq0\nq0\n", Mode::Deterministic);
        assert!(error.contains("Duplicate state 'q0'"));
    }

    #[test]
    fn test_parse_transition_field_count() {
        let error = format_error(
            "states 1\nq0\nalphabet 1 a\nq0 a q0 a\n",
            Mode::Deterministic,
        );
        assert!(error.contains("Transition must have 5 fields"));
        assert!(error.contains("found 4"));
    }

    #[test]
    fn test_parse_transition_undeclared_states() {
        let error = format_error(
            "states 1\nq0\nalphabet 1 a\nq9 a q0 a R\n",
            Mode::Deterministic,
        );
        assert!(error.contains("undeclared state 'q9'"));

        let error = format_error(
            "states 1\nq0\nalphabet 1 a\nq0 a q9 a R\n",
            Mode::Deterministic,
        );
        assert!(error.contains("leads to undeclared state 'q9'"));
    }

    #[test]
    fn test_parse_transition_symbols() {
        let error = format_error(
            "states 1\nq0\nalphabet 1 a\nq0 ab q0 a R\n",
            Mode::Deterministic,
        );
        assert!(error.contains("Input symbol 'ab' is not a single character"));

        let error = format_error(
            "states 1\nq0\nalphabet 1 a\nq0 a q0 b R\n",
            Mode::Deterministic,
        );
        assert!(error.contains("Output symbol 'b' is not in the alphabet"));
    }

    #[test]
    fn test_parse_transition_may_use_blank() {
        let program = parse(
            "states 1\nq0\nalphabet 1 a\nq0 _ q0 _ L\n",
            Mode::Deterministic,
        )
        .unwrap();

        assert!(program.transitions("q0", BLANK_SYMBOL).is_some());
    }

    #[test]
    fn test_parse_unsupported_direction() {
        let error = format_error(
            "states 1\nq0\nalphabet 1 a\nq0 a q0 a S\n",
            Mode::Deterministic,
        );
        assert!(error.contains("Unsupported direction 'S'"));

        let error = format_error(
            "states 1\nq0\nalphabet 1 a\nq0 a q0 a Left\n",
            Mode::Deterministic,
        );
        assert!(error.contains("Unsupported direction 'Left'"));
    }

    #[test]
    fn test_parse_duplicate_transition_by_mode() {
        let input = "states 2\nq0\nq1 +\nalphabet 1 a\nq0 a q0 a R\nq0 a q1 a L\n";

        let error = format_error(input, Mode::Deterministic);
        assert!(error.contains("Duplicate transition for state 'q0' and symbol 'a'"));

        let program = parse(input, Mode::NonDeterministic).unwrap();
        let transitions = program.transitions("q0", 'a').unwrap();
        assert_eq!(transitions.len(), 2);
        assert_eq!(transitions[0].next_state, "q0");
        assert_eq!(transitions[1].next_state, "q1");
        assert_eq!(program.mode, Mode::NonDeterministic);
    }

    #[test]
    fn test_error_reports_location() {
        let error = format_error("states 1\nq0\nalphabet 1 a\nq0 a q0 a X\n", Mode::Deterministic);
        assert!(error.contains("4:11"));
    }

    #[test]
    fn test_parse_tape() {
        let alphabet = BTreeSet::from(['0', '1', '_']);

        assert_eq!(
            parse_tape("01 1\n_0\n", &alphabet).unwrap(),
            vec!['0', '1', '1', '_', '0']
        );
        assert_eq!(parse_tape("", &alphabet).unwrap(), Vec::<char>::new());
        assert_eq!(parse_tape("  \n\t", &alphabet).unwrap(), Vec::<char>::new());
    }

    #[test]
    fn test_parse_tape_rejects_unknown_symbol() {
        let alphabet = BTreeSet::from(['0', '1', '_']);
        let error = parse_tape("01 2", &alphabet).unwrap_err();

        assert!(matches!(error, TuringMachineError::FormatError(_)));
        assert!(error
            .to_string()
            .contains("Tape symbol '2' is not in the machine's alphabet"));
    }
}
