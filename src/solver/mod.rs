//! Solver abstraction and the dlvhex2 driver.
//!
//! A [`Solver`] turns a generated program into a stream of raw answer sets.
//! The stream is pull-based: the driver asks the solver for the next answer
//! set only when the consumer requests it, so enumeration of a large answer
//! space costs nothing until it is actually walked.

mod capture;
mod dlvhex2;
mod ipc;

use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;

use crate::asp::RawAnswerSet;
use crate::error::SeshResult;

pub use dlvhex2::Dlvhex2Solver;

/// Writes the generated program (facts, capture rules, code) to the solver's
/// input channel.
pub type WriteInput<'a> = Box<dyn FnOnce(&mut dyn Write) -> SeshResult<()> + 'a>;

/// Per-call solver options.
#[derive(Debug, Clone, Default)]
pub struct SolverOptions {
    /// Stop after this many answer sets (`0` means all).
    pub max_answer_sets: Option<u64>,
    /// Upper bound for integer arithmetic inside the solver.
    pub max_int: Option<u64>,
    /// Additional predicates to keep in the solver output.
    pub capture: Vec<String>,
    /// Extra command-line arguments passed through verbatim.
    pub custom: Vec<String>,
}

/// A stream of raw answer sets produced by a running solver.
///
/// Dropping the stream terminates the solver; [`AnswerStream::close`] does
/// the same but surfaces an abnormal solver exit as an error. Errors are
/// reported at most once per stream.
pub trait AnswerStream: Iterator<Item = SeshResult<RawAnswerSet>> {
    fn close(&mut self) -> SeshResult<()>;
}

/// An ASP solver capable of enumerating answer sets one at a time.
pub trait Solver: std::fmt::Debug {
    /// Start the solver on the program produced by `write_input`.
    ///
    /// `capture_predicates` lists the predicates the driver must retain in
    /// the output; `file_args` are additional program files passed to the
    /// solver by path.
    fn run(
        &self,
        write_input: WriteInput<'_>,
        capture_predicates: &BTreeSet<String>,
        file_args: &[PathBuf],
        options: Option<&SolverOptions>,
    ) -> SeshResult<Box<dyn AnswerStream>>;
}
