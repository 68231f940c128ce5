//! Program façade: ASP code plus its I/O mapping, solved on demand.
//!
//! A [`Program`] collects code parts and file parts, extracts embedded
//! mapping specifications from them, and on [`Program::solve`] generates the
//! solver input (input facts, capture rules, inline code), starts the solver,
//! and wraps the answer-set stream in [`Results`].

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use tracing::debug;

use crate::error::{MapError, OutputError, SeshResult, SolverError, SpecError};
use crate::input::{InputSpec, StreamSink};
use crate::output::{Model, OutputSpec};
use crate::parser::{parse_embedded_spec, ParsedSpec};
use crate::registry::Registry;
use crate::solver::{AnswerStream, Dlvhex2Solver, Solver, SolverOptions, WriteInput};
use crate::value::Value;

/// An answer set program together with its I/O mapping.
pub struct Program {
    file_parts: Vec<PathBuf>,
    code_parts: Vec<String>,
    input_spec: Option<InputSpec>,
    output_spec: Option<Arc<OutputSpec>>,
    solver: Option<Box<dyn Solver>>,
    registry: Registry,
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

impl Program {
    /// An empty program. The constructor registry starts as a copy of the
    /// process-wide default registry.
    pub fn new() -> Self {
        Self {
            file_parts: Vec::new(),
            code_parts: Vec::new(),
            input_spec: None,
            output_spec: None,
            solver: None,
            registry: Registry::default_snapshot(),
        }
    }

    /// A program initialized from inline ASP code, with embedded
    /// specifications extracted.
    pub fn from_code(code: &str) -> SeshResult<Self> {
        let mut program = Self::new();
        program.append_code(code)?;
        Ok(program)
    }

    /// A program initialized from an ASP file, with embedded specifications
    /// extracted.
    pub fn from_file(path: impl AsRef<Path>) -> SeshResult<Self> {
        let mut program = Self::new();
        program.append_file(path)?;
        Ok(program)
    }

    /// Append inline ASP code and extract any embedded specification from it.
    pub fn append_code(&mut self, code: &str) -> SeshResult<()> {
        let spec = parse_embedded_spec(code)?;
        self.absorb_spec(spec)?;
        self.code_parts.push(code.to_string());
        Ok(())
    }

    /// Append inline ASP code without extracting embedded specifications.
    pub fn append_code_raw(&mut self, code: &str) {
        self.code_parts.push(code.to_string());
    }

    /// Append an ASP file. The file is read immediately to extract embedded
    /// specifications; its path is handed to the solver at solve time.
    pub fn append_file(&mut self, path: impl AsRef<Path>) -> SeshResult<()> {
        let path = path.as_ref();
        let code = std::fs::read_to_string(path)
            .map_err(|source| MapError::Io { source })?;
        let spec = parse_embedded_spec(&code)?;
        self.absorb_spec(spec)?;
        self.file_parts.push(path.to_path_buf());
        Ok(())
    }

    /// Append an ASP file without extracting embedded specifications. The
    /// file is not opened until solve time.
    pub fn append_file_raw(&mut self, path: impl AsRef<Path>) {
        self.file_parts.push(path.as_ref().to_path_buf());
    }

    fn absorb_spec(&mut self, spec: ParsedSpec) -> Result<(), SpecError> {
        if let Some(input) = spec.input {
            if self.input_spec.replace(input).is_some() {
                return Err(SpecError::DuplicateStatement { statement: "INPUT" });
            }
        }
        if let Some(output) = spec.output {
            if self.output_spec.replace(Arc::new(output)).is_some() {
                return Err(SpecError::DuplicateStatement { statement: "OUTPUT" });
            }
        }
        Ok(())
    }

    /// Set the input specification explicitly.
    pub fn set_input_spec(&mut self, spec: InputSpec) -> Result<(), SpecError> {
        if self.input_spec.replace(spec).is_some() {
            return Err(SpecError::DuplicateStatement { statement: "INPUT" });
        }
        Ok(())
    }

    /// Set the output specification explicitly.
    pub fn set_output_spec(&mut self, spec: OutputSpec) -> Result<(), SpecError> {
        if self.output_spec.replace(Arc::new(spec)).is_some() {
            return Err(SpecError::DuplicateStatement { statement: "OUTPUT" });
        }
        Ok(())
    }

    pub fn has_input_spec(&self) -> bool {
        self.input_spec.is_some()
    }

    pub fn has_output_spec(&self) -> bool {
        self.output_spec.is_some()
    }

    /// Use this solver instead of the default dlvhex2 driver.
    pub fn set_solver(&mut self, solver: impl Solver + 'static) {
        self.solver = Some(Box::new(solver));
    }

    /// Register a constructor on this program's local registry.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(Vec<Value>) -> Result<Value, OutputError> + Send + Sync + 'static,
    {
        self.registry.register(name, constructor);
    }

    /// This program's local constructor registry.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Solve the program with the given input arguments.
    ///
    /// With `cache` enabled the returned [`Results`] can be iterated
    /// repeatedly; without it, exactly once. Call [`Results::close`] (or drop
    /// the results) for deterministic solver cleanup.
    pub fn solve(
        &self,
        arguments: &[Value],
        options: Option<&SolverOptions>,
        cache: bool,
    ) -> SeshResult<Results> {
        let output_spec = self
            .output_spec
            .clone()
            .unwrap_or_else(|| Arc::new(OutputSpec::empty()));
        let empty_input;
        let input_spec = match &self.input_spec {
            Some(spec) => spec,
            None => {
                empty_input = InputSpec::empty();
                &empty_input
            }
        };

        let write_spec = output_spec.clone();
        let write_input: WriteInput<'_> = Box::new(move |stream: &mut dyn Write| {
            // Input facts first, then the capture rules, then inline code.
            // Files are handed to the solver separately by path.
            input_spec.perform_mapping(arguments, &mut StreamSink::new(&mut *stream))?;
            for rule in write_spec.additional_rules() {
                debug!(rule, "adding capture rule");
                writeln!(stream, "{rule}").map_err(|source| SolverError::Io { source })?;
            }
            for code in &self.code_parts {
                stream
                    .write_all(code.as_bytes())
                    .and_then(|()| stream.write_all(b"\n"))
                    .map_err(|source| SolverError::Io { source })?;
            }
            Ok(())
        });

        let default_solver;
        let solver: &dyn Solver = match &self.solver {
            Some(solver) => solver.as_ref(),
            None => {
                default_solver = Dlvhex2Solver::new();
                &default_solver
            }
        };
        let stream = solver.run(
            write_input,
            output_spec.captured_predicates(),
            &self.file_parts,
            options,
        )?;
        Ok(Results::new(stream, output_spec, self.registry.clone(), cache))
    }

    /// Solve the program and return one computed model, or `None` if no
    /// answer set exists. The solver is limited to one answer set and cleaned
    /// up before returning.
    pub fn solve_one(
        &self,
        arguments: &[Value],
        options: Option<&SolverOptions>,
    ) -> SeshResult<Option<Rc<Model>>> {
        let mut options = options.cloned().unwrap_or_default();
        options.max_answer_sets = Some(1);
        let mut results = self.solve(arguments, Some(&options), false)?;
        let first = results.iter().next();
        let closed = results.close();
        match first {
            Some(Err(e)) => Err(e),
            Some(Ok(model)) => {
                closed?;
                Ok(Some(model))
            }
            None => {
                closed?;
                Ok(None)
            }
        }
    }

    /// The capture predicates the solver output must retain; empty without an
    /// output specification.
    pub fn captured_predicates(&self) -> BTreeSet<String> {
        self.output_spec
            .as_ref()
            .map(|spec| spec.captured_predicates().clone())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("code_parts", &self.code_parts.len())
            .field("file_parts", &self.file_parts.len())
            .field("has_input_spec", &self.has_input_spec())
            .field("has_output_spec", &self.has_output_spec())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// The answer sets of one solver invocation, viewed as [`Model`]s.
///
/// With caching enabled, models survive the first pass and later iterations
/// replay them without touching the solver. A stream error ends the results;
/// it is yielded once and not cached.
pub struct Results {
    stream: Box<dyn AnswerStream>,
    spec: Arc<OutputSpec>,
    registry: Registry,
    caching: bool,
    cache: Vec<Rc<Model>>,
    done: bool,
    iterated: bool,
}

impl Results {
    fn new(
        stream: Box<dyn AnswerStream>,
        spec: Arc<OutputSpec>,
        registry: Registry,
        caching: bool,
    ) -> Self {
        Self {
            stream,
            spec,
            registry,
            caching,
            cache: Vec::new(),
            done: false,
            iterated: false,
        }
    }

    /// Iterate over the models.
    ///
    /// # Panics
    ///
    /// Panics on a second call when caching is disabled; iterating twice
    /// without a cache is a programming error.
    pub fn iter(&mut self) -> ResultsIter<'_> {
        if !self.caching {
            assert!(
                !self.iterated,
                "results without caching can be iterated only once; solve with cache enabled to iterate repeatedly"
            );
        }
        self.iterated = true;
        ResultsIter {
            results: self,
            pos: 0,
        }
    }

    /// Terminate the solver. Surfaces an abnormal solver exit, at most once.
    pub fn close(&mut self) -> SeshResult<()> {
        self.stream.close()
    }

    fn advance(&mut self) -> Option<SeshResult<Rc<Model>>> {
        if self.done {
            return None;
        }
        match self.stream.next() {
            None => {
                self.done = true;
                None
            }
            Some(Ok(raw)) => {
                let model = Rc::new(Model::new(raw, self.spec.clone(), self.registry.clone()));
                if self.caching {
                    self.cache.push(model.clone());
                }
                Some(Ok(model))
            }
            Some(Err(e)) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl Drop for Results {
    fn drop(&mut self) {
        let _ = self.stream.close();
    }
}

impl std::fmt::Debug for Results {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Results")
            .field("cached", &self.cache.len())
            .field("done", &self.done)
            .finish()
    }
}

/// Iterator over the models of a [`Results`].
pub struct ResultsIter<'a> {
    results: &'a mut Results,
    pos: usize,
}

impl Iterator for ResultsIter<'_> {
    type Item = SeshResult<Rc<Model>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos < self.results.cache.len() {
            let model = self.results.cache[self.pos].clone();
            self.pos += 1;
            return Some(Ok(model));
        }
        match self.results.advance() {
            Some(Ok(model)) => {
                self.pos += 1;
                Some(Ok(model))
            }
            other => other,
        }
    }
}
