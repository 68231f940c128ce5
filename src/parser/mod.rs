//! Parsers for the mapping language and the solver wire format.
//!
//! The language is parsed by a hand-written lexer and recursive-descent
//! grammar. Entry points cover the two statement kinds on their own
//! ([`parse_input_spec`], [`parse_output_spec`]), a whole specification with
//! both statements in any order ([`parse_spec`]), specifications embedded in
//! ASP code behind `%!` markers ([`parse_embedded_spec`]), and single
//! answer-set lines received from the solver ([`parse_answer_set`]).

mod answer;
mod cursor;
mod embedded;
mod input;
mod lexer;
mod output;

use crate::asp::RawAnswerSet;
use crate::error::{ParseError, SeshResult, SpecError};
use crate::input::InputSpec;
use crate::output::OutputSpec;
use crate::parser::cursor::Cursor;

/// A parsed specification: at most one INPUT and one OUTPUT statement.
#[derive(Debug, Default)]
pub struct ParsedSpec {
    pub input: Option<InputSpec>,
    pub output: Option<OutputSpec>,
}

/// Parse a specification consisting of INPUT and OUTPUT statements, each
/// appearing at most once, in any order.
pub fn parse_spec(text: &str) -> SeshResult<ParsedSpec> {
    let mut cur = Cursor::new(text)?;
    let mut spec = ParsedSpec::default();
    while !cur.at_end() {
        if cur.is_keyword("INPUT") {
            let parsed = input::statement(&mut cur)?;
            if spec.input.replace(parsed).is_some() {
                return Err(SpecError::DuplicateStatement { statement: "INPUT" }.into());
            }
        } else if cur.is_keyword("OUTPUT") {
            let parsed = output::statement(&mut cur)?;
            if spec.output.replace(parsed).is_some() {
                return Err(SpecError::DuplicateStatement { statement: "OUTPUT" }.into());
            }
        } else {
            return Err(cur.error("expected an INPUT or OUTPUT statement").into());
        }
    }
    Ok(spec)
}

/// Parse exactly one INPUT statement.
pub fn parse_input_spec(text: &str) -> SeshResult<InputSpec> {
    let mut cur = Cursor::new(text)?;
    let spec = input::statement(&mut cur)?;
    if !cur.at_end() {
        return Err(cur.error("trailing input after INPUT statement").into());
    }
    Ok(spec)
}

/// Parse exactly one OUTPUT statement.
pub fn parse_output_spec(text: &str) -> SeshResult<OutputSpec> {
    let mut cur = Cursor::new(text)?;
    let spec = output::statement(&mut cur)?;
    if !cur.at_end() {
        return Err(cur.error("trailing input after OUTPUT statement").into());
    }
    Ok(spec)
}

/// Extract and parse the specification embedded in ASP code behind `%!`
/// markers. ASP code without markers yields an empty specification.
pub fn parse_embedded_spec(code: &str) -> SeshResult<ParsedSpec> {
    parse_spec(&embedded::extract(code))
}

/// Parse one answer-set line of the solver's output.
pub fn parse_answer_set(line: &str) -> Result<RawAnswerSet, ParseError> {
    answer::answer_set(line)
}
