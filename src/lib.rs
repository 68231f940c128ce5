//! # sesh
//!
//! Declarative I/O mapping between structured host data and answer set
//! programming (ASP) solvers.
//!
//! An ASP program is extended with a mapping specification, written in `%!`
//! comments inside the ASP code or supplied separately. The INPUT statement
//! describes how host values become solver facts; the OUTPUT statement
//! describes how answer sets become host values again, by capturing query
//! variables through generated auxiliary rules.
//!
//! ## Architecture
//!
//! - **Values** (`value`): the closed host-side data model
//! - **ASP model** (`asp`): terms, literals, queries, raw answer sets
//! - **Parser** (`parser`): the mapping language and the solver wire format
//! - **Input mapping** (`input`): fact generation from host arguments
//! - **Output mapping** (`output`): lazy, memoized answer-set interpretation
//! - **Solver** (`solver`): the dlvhex2 subprocess driver
//! - **Program** (`program`): the user-facing façade tying it all together
//!
//! ## Library usage
//!
//! ```no_run
//! use sesh::{Program, Value};
//!
//! let program = Program::from_code(
//!     r#"
//!     %! INPUT (edges) { edge(e[0], e[1]) for (_, e) in edges; }
//!     reach(X, Y) :- edge(X, Y).
//!     reach(X, Z) :- reach(X, Y), edge(Y, Z).
//!     %! OUTPUT { reachable = set { reach/2 }; }
//!     "#,
//! )?;
//!
//! let edges = Value::Seq(vec![
//!     Value::from([Value::Sym("a".into()), Value::Sym("b".into())]),
//!     Value::from([Value::Sym("b".into()), Value::Sym("c".into())]),
//! ]);
//! if let Some(model) = program.solve_one(&[edges], None)? {
//!     println!("{}", model.get("reachable")?);
//! }
//! # Ok::<(), sesh::SeshError>(())
//! ```

pub mod asp;
pub mod error;
pub mod input;
pub mod output;
pub mod parser;
pub mod program;
pub mod registry;
pub mod solver;
pub mod value;

pub use error::{
    MapError, OutputError, ParseError, SeshError, SeshResult, SolverError, SpecError,
};
pub use input::{FactSink, InputSpec, StreamSink};
pub use output::{Model, OutputSpec};
pub use program::{Program, Results};
pub use registry::{register_default, Registry};
pub use solver::{AnswerStream, Dlvhex2Solver, Solver, SolverOptions};
pub use value::Value;
