//! INPUT specifications and the fact-generation engine.
//!
//! An [`InputSpec`] describes how host argument values become solver facts:
//! each predicate rule evaluates a list of accessors once per combination of
//! its nested iteration bindings. Name scoping is checked eagerly at
//! construction; data errors (bad accessor steps, non-iterable sources) are
//! detected only when [`InputSpec::perform_mapping`] runs.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::Write;

use tracing::debug;

use crate::error::{MapError, SeshResult, SpecError};
use crate::value::{SubscriptKey, Value};

/// The binding context during fact generation: name → host value.
pub(crate) type Context = HashMap<String, Value>;

/// Receives one fact per generated argument tuple.
pub trait FactSink {
    fn add_fact(&mut self, predicate: &str, args: Vec<Value>) -> SeshResult<()>;
}

/// A [`FactSink`] that serializes each fact as `predicate(arg1,...,argN).`
/// on its own line: integers unquoted, symbols bare, everything else quoted
/// with `\` and `"` escaped.
pub struct StreamSink<W: Write> {
    writer: W,
}

impl<W: Write> StreamSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> FactSink for StreamSink<W> {
    fn add_fact(&mut self, predicate: &str, args: Vec<Value>) -> SeshResult<()> {
        let io = |source| MapError::Io { source };
        self.writer.write_all(predicate.as_bytes()).map_err(io)?;
        self.writer.write_all(b"(").map_err(io)?;
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.writer.write_all(b",").map_err(io)?;
            }
            self.writer.write_all(arg.fact_term().as_bytes()).map_err(io)?;
        }
        self.writer.write_all(b").\n").map_err(io)?;
        debug!(predicate, ?args, "generated fact");
        Ok(())
    }
}

/// The target of an iteration binding: a plain name, `_` to discard, or a
/// tuple pattern destructured recursively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Anon,
    Name(String),
    Tuple(Vec<Target>),
}

impl Target {
    /// Add the names bound by this target to `bound`, rejecting rebinds.
    fn check(&self, bound: &mut HashSet<String>) -> Result<(), SpecError> {
        match self {
            Target::Anon => Ok(()),
            Target::Name(name) => {
                if !bound.insert(name.clone()) {
                    return Err(SpecError::RedefinedName { name: name.clone() });
                }
                Ok(())
            }
            Target::Tuple(targets) => {
                for t in targets {
                    t.check(bound)?;
                }
                Ok(())
            }
        }
    }

    /// Assign a value into the context according to this pattern.
    fn assign(&self, value: Value, context: &mut Context) -> Result<(), MapError> {
        match self {
            Target::Anon => Ok(()),
            Target::Name(name) => {
                context.insert(name.clone(), value);
                Ok(())
            }
            Target::Tuple(targets) => {
                let items = match value {
                    Value::Tuple(items) | Value::Seq(items) if items.len() == targets.len() => {
                        items
                    }
                    other => {
                        return Err(MapError::Destructure {
                            pattern: self.to_string(),
                            value: other.to_string(),
                        });
                    }
                };
                for (t, v) in targets.iter().zip(items) {
                    t.assign(v, context)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Anon => f.write_str("_"),
            Target::Name(name) => f.write_str(name),
            Target::Tuple(targets) => {
                f.write_str("(")?;
                for (i, t) in targets.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{t}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// One step of an accessor path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Field(String),
    Index(SubscriptKey),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Field(name) => write!(f, ".{name}"),
            Step::Index(key) => write!(f, "[{key}]"),
        }
    }
}

/// A base name plus an ordered path of field/subscript steps, resolved
/// against the binding context at fact-generation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    pub base: String,
    pub path: Vec<Step>,
}

impl Accessor {
    pub fn new(base: impl Into<String>, path: Vec<Step>) -> Self {
        Self {
            base: base.into(),
            path,
        }
    }

    fn check(&self, bound: &HashSet<String>) -> Result<(), SpecError> {
        if !bound.contains(&self.base) {
            return Err(SpecError::UndefinedName {
                name: self.base.clone(),
            });
        }
        Ok(())
    }

    /// Perform the represented object access relative to the given context.
    fn resolve(&self, context: &Context) -> Result<Value, MapError> {
        // The base name is bound by construction-time scope checks.
        let mut current = context
            .get(&self.base)
            .expect("accessor base bound by construction-time scope check");
        for step in &self.path {
            current = match step {
                Step::Field(name) => current.field(name)?,
                Step::Index(key) => current.index(key)?,
            };
        }
        Ok(current.clone())
    }
}

impl fmt::Display for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)?;
        for step in &self.path {
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

/// A `for target in accessor` loop binding new names before a rule's
/// arguments are evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Iteration {
    pub target: Target,
    pub source: Accessor,
}

impl Iteration {
    fn check(&self, bound: &mut HashSet<String>) -> Result<(), SpecError> {
        // The source is checked against the current scope before the target's
        // names are added to it.
        self.source.check(bound)?;
        self.target.check(bound)
    }

    /// Materialize the iteration items of the source collection.
    fn items(&self, context: &Context) -> Result<Vec<Value>, MapError> {
        let collection = self.source.resolve(context)?;
        collection
            .iteration_items()
            .ok_or_else(|| MapError::NotIterable {
                accessor: self.source.to_string(),
                kind: collection.kind(),
            })
    }
}

/// A single input mapping producing facts of one predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateRule {
    pub predicate: String,
    pub arguments: Vec<Accessor>,
    pub iterations: Vec<Iteration>,
}

impl PredicateRule {
    fn check(&self, parameters: &[String]) -> Result<(), SpecError> {
        let mut bound: HashSet<String> = parameters.iter().cloned().collect();
        for iteration in &self.iterations {
            iteration.check(&mut bound)?;
        }
        for argument in &self.arguments {
            argument.check(&bound)?;
        }
        Ok(())
    }

    /// Emit one fact per combination of iteration bindings (a nested
    /// cross-product), including exactly once when there are no iterations.
    fn perform_mapping(
        &self,
        mut context: Context,
        sink: &mut dyn FactSink,
    ) -> SeshResult<()> {
        let mut stack: Vec<std::vec::IntoIter<Value>> = Vec::new();
        loop {
            // Advance the innermost open iteration.
            if let Some(iterator) = stack.last_mut() {
                match iterator.next() {
                    Some(item) => {
                        let iteration = &self.iterations[stack.len() - 1];
                        iteration.target.assign(item, &mut context)?;
                    }
                    None => {
                        stack.pop();
                        if stack.is_empty() {
                            break;
                        }
                        continue;
                    }
                }
            }

            if stack.len() == self.iterations.len() {
                // All iterations bound: generate a fact.
                let mut args = Vec::with_capacity(self.arguments.len());
                for accessor in &self.arguments {
                    args.push(accessor.resolve(&context)?);
                }
                sink.add_fact(&self.predicate, args)?;
                if self.iterations.is_empty() {
                    break;
                }
            } else {
                // Open the next inner iteration.
                let iteration = &self.iterations[stack.len()];
                stack.push(iteration.items(&context)?.into_iter());
            }
        }
        Ok(())
    }
}

/// An INPUT statement: the complete input-mapping description for a program.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InputSpec {
    parameters: Vec<String>,
    rules: Vec<PredicateRule>,
}

impl InputSpec {
    /// Build an input spec, eagerly checking all name scoping: parameter
    /// names must be pairwise distinct, every accessor base must be bound,
    /// and no name may be bound twice within a rule.
    pub fn new(parameters: Vec<String>, rules: Vec<PredicateRule>) -> Result<Self, SpecError> {
        let mut seen = HashSet::new();
        for name in &parameters {
            if !seen.insert(name.clone()) {
                return Err(SpecError::RedefinedName { name: name.clone() });
            }
        }
        for rule in &rules {
            rule.check(&parameters)?;
        }
        Ok(Self { parameters, rules })
    }

    /// The empty input spec: no parameters, no rules.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse an INPUT statement from mapping-language source text.
    pub fn parse(text: &str) -> SeshResult<Self> {
        crate::parser::parse_input_spec(text)
    }

    /// The declared parameter names, in order.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Transform the arguments to facts according to this spec, passing each
    /// generated fact to the sink.
    pub fn perform_mapping(&self, arguments: &[Value], sink: &mut dyn FactSink) -> SeshResult<()> {
        if arguments.len() != self.parameters.len() {
            return Err(MapError::ArgumentCount {
                expected: self.parameters.len(),
                actual: arguments.len(),
            }
            .into());
        }
        for rule in &self.rules {
            let context: Context = self
                .parameters
                .iter()
                .cloned()
                .zip(arguments.iter().cloned())
                .collect();
            rule.perform_mapping(context, sink)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SeshError;
    use std::collections::BTreeMap;

    /// Collects facts into predicate → set-of-tuples, like a solver would see.
    #[derive(Default)]
    struct CollectingSink {
        facts: HashMap<String, HashSet<Vec<Value>>>,
    }

    impl FactSink for CollectingSink {
        fn add_fact(&mut self, predicate: &str, args: Vec<Value>) -> SeshResult<()> {
            self.facts.entry(predicate.to_string()).or_default().insert(args);
            Ok(())
        }
    }

    fn int(n: i64) -> Value {
        Value::Int(n)
    }

    fn s(text: &str) -> Value {
        Value::Str(text.into())
    }

    fn pair(a: Value, b: Value) -> Value {
        Value::Tuple(vec![a, b])
    }

    #[test]
    fn input_mapping_cross_product() {
        // Mirrors the canonical nested-iteration scenario: a sequence of
        // pairs, a map, and a set built from the same pairs.
        let pairs = vec![
            pair(int(0), int(0)),
            pair(int(1), int(2)),
            pair(s("abc"), s("def")),
            pair(int(7), s("x")),
        ];
        let xs = Value::Seq(pairs.clone());
        let mut map = BTreeMap::new();
        map.insert(int(0), int(1));
        map.insert(s("abc"), s("xyz"));
        map.insert(int(3), s("zzz"));
        let ys = Value::Map(map);
        let zs = Value::Set(pairs.iter().cloned().collect());

        let spec = InputSpec::parse(
            r#"
            INPUT (xs, ys, zs) {
                p(x[0], x[1]) for x in zs;      % subscript access
                p2(a, b) for (a, b) in zs;      % tuple unpacking
                q(y) for x in zs for (_,y) in x;
                r(xs[2][1]);
                empty();
                seq(i, x[0]) for (i, x) in xs;
                seq2(i, a) for (i, (a, _)) in xs;
                dict(value, key) for (key, value) in ys;
                str(ys["abc"]);
                -neg(xs[0][0], xs[0][1]);
            } % comment at the end"#,
        )
        .unwrap();

        let mut sink = CollectingSink::default();
        spec.perform_mapping(&[xs, ys, zs], &mut sink).unwrap();

        let expect = |pred: &str, tuples: Vec<Vec<Value>>| {
            let got = sink.facts.get(pred).unwrap_or_else(|| panic!("missing {pred}"));
            let want: HashSet<Vec<Value>> = tuples.into_iter().collect();
            assert_eq!(got, &want, "for predicate {pred}");
        };

        expect(
            "p",
            pairs.iter().map(|p| match p {
                Value::Tuple(items) => items.clone(),
                _ => unreachable!(),
            }).collect(),
        );
        expect(
            "p2",
            pairs.iter().map(|p| match p {
                Value::Tuple(items) => items.clone(),
                _ => unreachable!(),
            }).collect(),
        );
        expect(
            "q",
            vec![
                vec![int(0)],
                vec![int(1)],
                vec![int(2)],
                vec![s("abc")],
                vec![s("def")],
                vec![int(7)],
                vec![s("x")],
            ],
        );
        expect("r", vec![vec![s("def")]]);
        expect("empty", vec![vec![]]);
        expect(
            "seq",
            vec![
                vec![int(0), int(0)],
                vec![int(1), int(1)],
                vec![int(2), s("abc")],
                vec![int(3), int(7)],
            ],
        );
        expect(
            "seq2",
            vec![
                vec![int(0), int(0)],
                vec![int(1), int(1)],
                vec![int(2), s("abc")],
                vec![int(3), int(7)],
            ],
        );
        expect(
            "dict",
            vec![
                vec![int(1), int(0)],
                vec![s("xyz"), s("abc")],
                vec![s("zzz"), int(3)],
            ],
        );
        expect("str", vec![vec![s("xyz")]]);
        expect("-neg", vec![vec![int(0), int(0)]]);
        assert_eq!(sink.facts.len(), 10);
    }

    #[test]
    fn argument_count_mismatch() {
        let spec = InputSpec::parse("INPUT (x, y) { }").unwrap();
        let mut sink = CollectingSink::default();
        let err = spec.perform_mapping(&[int(1)], &mut sink).unwrap_err();
        assert!(matches!(
            err,
            SeshError::Map(MapError::ArgumentCount { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn duplicate_parameter_rejected() {
        let err = InputSpec::parse("INPUT (x, x) { }").unwrap_err();
        assert!(matches!(err, SeshError::Spec(SpecError::RedefinedName { .. })));
    }

    #[test]
    fn rebinding_iteration_target_rejected() {
        let err = InputSpec::parse("INPUT (xs) { p(x) for x in xs for x in xs; }").unwrap_err();
        assert!(matches!(err, SeshError::Spec(SpecError::RedefinedName { .. })));
    }

    #[test]
    fn unbound_accessor_rejected() {
        let err = InputSpec::parse("INPUT (xs) { p(y); }").unwrap_err();
        assert!(matches!(err, SeshError::Spec(SpecError::UndefinedName { .. })));
    }

    #[test]
    fn iteration_source_checked_before_target_binds() {
        // `y` is only bound by the iteration that also wants to read it.
        let err = InputSpec::parse("INPUT (xs) { p(y) for y in y; }").unwrap_err();
        assert!(matches!(err, SeshError::Spec(SpecError::UndefinedName { .. })));
    }

    #[test]
    fn accessor_data_errors_surface_at_mapping_time() {
        let spec = InputSpec::parse("INPUT (x) { p(x.label); }").unwrap();
        let mut sink = CollectingSink::default();
        let err = spec.perform_mapping(&[int(1)], &mut sink).unwrap_err();
        assert!(matches!(err, SeshError::Map(MapError::Field { .. })));
    }

    #[test]
    fn non_iterable_source_is_a_mapping_error() {
        let spec = InputSpec::parse("INPUT (x) { p(y) for y in x; }").unwrap();
        let mut sink = CollectingSink::default();
        let err = spec.perform_mapping(&[int(1)], &mut sink).unwrap_err();
        assert!(matches!(err, SeshError::Map(MapError::NotIterable { .. })));
    }

    #[test]
    fn stream_sink_serialization() {
        let render = |pred: &str, args: Vec<Value>| {
            let mut buf = Vec::new();
            StreamSink::new(&mut buf).add_fact(pred, args).unwrap();
            String::from_utf8(buf).unwrap().trim_end().to_string()
        };
        assert_eq!(render("pred", vec![]), "pred().");
        assert_eq!(render("p", vec![s("abc")]), r#"p("abc")."#);
        assert_eq!(
            render("p", vec![int(1), int(2), s(r#"xy"z"#), int(3)]),
            r#"p(1,2,"xy\"z",3)."#
        );
    }
}
