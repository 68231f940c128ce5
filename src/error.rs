//! Rich diagnostic error types for the sesh mapping layer.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so users know exactly what went wrong
//! and how to fix it. Nothing in this crate is silently retried; every failure
//! carries enough context (offending name, return code, stderr, line) to
//! diagnose without re-running.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the sesh mapping layer.
///
/// Each variant wraps a subsystem-specific error, preserving the full
/// diagnostic chain (error codes, help text) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum SeshError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Output(#[from] OutputError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Solver(#[from] SolverError),
}

/// Convenience alias for functions returning sesh results.
pub type SeshResult<T> = std::result::Result<T, SeshError>;

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Malformed mapping-language text or a malformed answer-set wire line.
///
/// Always fatal; positions are 1-based.
#[derive(Debug, Error, Diagnostic)]
#[error("parse error at line {line}, column {column}: {message}")]
#[diagnostic(
    code(sesh::parse::syntax),
    help(
        "Check the mapping specification against the grammar: \
         INPUT (params) {{ pred(accessors) for target in accessor; }} and \
         OUTPUT {{ name = expr; }}. Comments start with '%' and run to the \
         end of the line."
    )
)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

// ---------------------------------------------------------------------------
// Spec (construction-time scoping) errors
// ---------------------------------------------------------------------------

/// Name-scoping errors raised eagerly while constructing a specification.
#[derive(Debug, Error, Diagnostic)]
pub enum SpecError {
    #[error("name {name:?} is bound more than once")]
    #[diagnostic(
        code(sesh::spec::redefined_name),
        help(
            "Input parameters, iteration targets, and OUTPUT top-level names \
             must be pairwise distinct within their scope. Rename one of the \
             conflicting bindings."
        )
    )]
    RedefinedName { name: String },

    #[error("undefined name {name:?} is referenced")]
    #[diagnostic(
        code(sesh::spec::undefined_name),
        help(
            "Every name used by an accessor, an iteration source, or an ASP \
             variable expression must be bound by a parameter, an enclosing \
             iteration, or an enclosing query. Check the spelling and the \
             nesting order."
        )
    )]
    UndefinedName { name: String },

    #[error("only one {statement} statement per program is allowed")]
    #[diagnostic(
        code(sesh::spec::duplicate_statement),
        help(
            "A program may carry at most one INPUT and one OUTPUT statement. \
             Merge the statements, or append the code with spec extraction \
             disabled."
        )
    )]
    DuplicateStatement { statement: &'static str },
}

// ---------------------------------------------------------------------------
// Input-mapping errors
// ---------------------------------------------------------------------------

/// Data errors detected while `perform_mapping` runs, never at parse time.
#[derive(Debug, Error, Diagnostic)]
pub enum MapError {
    #[error("wrong number of arguments: expecting {expected}, got {actual}")]
    #[diagnostic(
        code(sesh::map::argument_count),
        help("Pass exactly one argument per declared INPUT parameter, in order.")
    )]
    ArgumentCount { expected: usize, actual: usize },

    #[error("unable to access field {field:?} on {on} during input mapping")]
    #[diagnostic(
        code(sesh::map::field),
        help(
            "Field access requires a record value carrying that field. \
             Check the accessor path against the shape of the argument."
        )
    )]
    Field { field: String, on: String },

    #[error("unable to access subscript [{key}] on {on} during input mapping")]
    #[diagnostic(
        code(sesh::map::index),
        help(
            "Integer subscripts apply to sequences and tuples (in bounds), \
             string and integer subscripts to maps (existing keys)."
        )
    )]
    Index { key: String, on: String },

    #[error("during iteration over {accessor}: {kind} value is not iterable")]
    #[diagnostic(
        code(sesh::map::not_iterable),
        help(
            "An iteration source must be a set (plain elements), a sequence \
             or tuple ((index, element) pairs), or a map ((key, value) pairs)."
        )
    )]
    NotIterable { accessor: String, kind: &'static str },

    #[error("cannot destructure {value} into pattern {pattern}")]
    #[diagnostic(
        code(sesh::map::destructure),
        help(
            "A tuple target matches only tuple or sequence values of exactly \
             the same length; use '_' to discard positions."
        )
    )]
    Destructure { pattern: String, value: String },

    #[error("I/O error while writing facts: {source}")]
    #[diagnostic(
        code(sesh::map::io),
        help("The fact sink could not be written to. Check the underlying stream.")
    )]
    Io {
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Output-mapping errors
// ---------------------------------------------------------------------------

/// Errors raised lazily, the first time an implicated output name is
/// dereferenced. Other names in the same answer set remain resolvable.
#[derive(Debug, Error, Diagnostic)]
pub enum OutputError {
    #[error("circular reference detected while trying to resolve name {name:?}")]
    #[diagnostic(
        code(sesh::output::circular_reference),
        help(
            "Top-level OUTPUT names may reference each other with '&name', \
             but the reference graph must be acyclic along any resolution path."
        )
    )]
    CircularReference { name: String },

    #[error("no top-level name {name:?}")]
    #[diagnostic(
        code(sesh::output::undefined_name),
        help("Only names declared in the OUTPUT statement can be dereferenced.")
    )]
    UndefinedName { name: String },

    #[error("invalid sequence indices: {detail}")]
    #[diagnostic(
        code(sesh::output::invalid_indices),
        help(
            "The index values of a sequence expression must be exactly the \
             integers 0..n-1, with no duplicates, gaps, or non-integer values."
        )
    )]
    InvalidIndices { detail: String },

    #[error("duplicate key: {key}")]
    #[diagnostic(
        code(sesh::output::duplicate_key),
        help(
            "Every key evaluated by a dictionary expression must be distinct. \
             Check the key expression and the underlying query."
        )
    )]
    DuplicateKey { key: String },

    #[error("constructor {name:?} is not registered")]
    #[diagnostic(
        code(sesh::output::unknown_constructor),
        help(
            "Register the constructor on the program's local registry (or the \
             process-wide default registry) before solving."
        )
    )]
    UnknownConstructor { name: String },

    #[error("constructor {name:?} failed: {message}")]
    #[diagnostic(
        code(sesh::output::constructor),
        help("The registered constructor closure returned an error for the evaluated arguments.")
    )]
    Constructor { name: String, message: String },
}

// ---------------------------------------------------------------------------
// Solver errors
// ---------------------------------------------------------------------------

/// Subprocess and wire-protocol failures.
#[derive(Debug, Error, Diagnostic)]
pub enum SolverError {
    #[error("the ASP solver terminated with return code {code}.\nOutput on stderr:\n{stderr}")]
    #[diagnostic(
        code(sesh::solver::subprocess),
        help(
            "The solver exited abnormally. Negative codes are signal numbers. \
             The captured stderr text usually contains the solver's own \
             diagnostic; check the generated program for solver-level errors."
        )
    )]
    Subprocess { code: i32, stderr: String },

    #[error("unable to parse answer set received from solver: {line:?}")]
    #[diagnostic(
        code(sesh::solver::wire),
        help(
            "The solver emitted a line that is not a valid answer set. This \
             indicates a solver/protocol mismatch; check that the solver was \
             invoked with answer-sets-only output."
        )
    )]
    Wire { line: String },

    #[error("failed to spawn solver executable {executable:?}: {source}")]
    #[diagnostic(
        code(sesh::solver::spawn),
        help(
            "Check that the solver executable exists and is on $PATH, or \
             configure an explicit path on the solver instance."
        )
    )]
    Spawn {
        executable: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to set up the solver IPC channel: {message}")]
    #[diagnostic(
        code(sesh::solver::ipc),
        help(
            "The temporary named pipe or file for solver input could not be \
             created. Check permissions on the system temp directory."
        )
    )]
    Ipc { message: String },

    #[error("I/O error while talking to the solver: {source}")]
    #[diagnostic(
        code(sesh::solver::io),
        help("A read or write on one of the solver's standard streams failed.")
    )]
    Io {
        #[source]
        source: std::io::Error,
    },
}
