//! OUTPUT specifications and answer-set to host-value mapping.
//!
//! An [`OutputSpec`] binds top-level names to expressions over captured ASP
//! variables. Construction eagerly checks all name scoping and assigns each
//! collection expression an auxiliary capture predicate; the generated capture
//! rules are appended to the solver input so the answer sets carry exactly
//! the variable bindings the expressions need.
//!
//! A [`Model`] wraps one raw answer set and resolves top-level names lazily,
//! memoizing results. Data errors (circular references, invalid sequence
//! indices, duplicate dictionary keys) surface on first dereference of an
//! implicated name; other names stay resolvable.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tracing::trace;

use crate::asp::{GroundTerm, Query, RawAnswerSet};
use crate::error::{OutputError, SeshError, SeshResult, SpecError};
use crate::registry::Registry;
use crate::value::Value;

/// Prefix of the generated auxiliary capture predicates. Reserved: user
/// programs must not define predicates starting with it.
pub const AUX_PREFIX: &str = "sesh__";

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// Capture information for one collection expression, computed when the
/// enclosing [`OutputSpec`] is constructed.
///
/// `captured` lists the ASP variables the auxiliary predicate carries, fixed
/// variables first. Fixed variables are already bound by an enclosing query;
/// answer-set tuples are filtered on them before the remaining variables are
/// bound.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Captures {
    pub aux_predicate: String,
    pub fixed: Vec<String>,
    pub captured: Vec<String>,
}

/// A set expression: one element per distinct evaluation of the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetExpr {
    pub query: Query,
    pub content: Box<Expr>,
    pub captures: Option<Captures>,
}

/// A sequence expression: elements ordered by a captured integer index
/// variable, which must cover exactly `0..n-1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceExpr {
    pub query: Query,
    pub content: Box<Expr>,
    pub index: String,
    pub captures: Option<Captures>,
}

/// A dictionary expression: one entry per query match, keys must be distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryExpr {
    pub query: Query,
    pub content: Box<Expr>,
    pub key: Box<Expr>,
    pub captures: Option<Captures>,
}

/// An output expression, evaluated against one answer set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A literal constant.
    Constant(Value),
    /// A reference to another top-level name, `&name`.
    Reference(String),
    /// A captured ASP variable.
    Variable(String),
    /// A constructor application; `None` builds a plain tuple.
    Object {
        constructor: Option<String>,
        args: Vec<Expr>,
    },
    Set(SetExpr),
    Sequence(SequenceExpr),
    Dictionary(DictionaryExpr),
}

impl Expr {
    /// Collect every ASP variable name mentioned at or below this expression,
    /// including nested collections' query variables. Enclosing collections
    /// capture the intersection of this set with their own query variables.
    fn collect_variables(&self, out: &mut HashSet<String>) {
        match self {
            Expr::Constant(_) | Expr::Reference(_) => {}
            Expr::Variable(name) => {
                out.insert(name.clone());
            }
            Expr::Object { args, .. } => {
                for arg in args {
                    arg.collect_variables(out);
                }
            }
            Expr::Set(e) => {
                out.extend(e.query.variables().map(str::to_string));
                e.content.collect_variables(out);
            }
            Expr::Sequence(e) => {
                out.extend(e.query.variables().map(str::to_string));
                out.insert(e.index.clone());
                e.content.collect_variables(out);
            }
            Expr::Dictionary(e) => {
                out.extend(e.query.variables().map(str::to_string));
                e.key.collect_variables(out);
                e.content.collect_variables(out);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Specification
// ---------------------------------------------------------------------------

/// An OUTPUT statement: top-level name bindings plus the capture rules they
/// induce.
#[derive(Debug, Clone, Default)]
pub struct OutputSpec {
    bindings: Vec<(String, Expr)>,
    rules: Vec<String>,
    predicates: BTreeSet<String>,
}

impl OutputSpec {
    /// Build an output spec, eagerly checking all name scoping: top-level
    /// names must be pairwise distinct, references must target declared
    /// names, every ASP variable must be bound by an enclosing query, and a
    /// sequence index variable must be captured by its own collection.
    ///
    /// Assigns auxiliary predicate names `sesh__0`, `sesh__1`, ... in
    /// left-to-right expression order.
    pub fn new(mut bindings: Vec<(String, Expr)>) -> Result<Self, SpecError> {
        let mut toplevel = HashSet::new();
        for (name, _) in &bindings {
            if !toplevel.insert(name.clone()) {
                return Err(SpecError::RedefinedName { name: name.clone() });
            }
        }

        let mut rules = Vec::new();
        let mut predicates = BTreeSet::new();
        let mut counter = 0usize;
        for (_, expr) in &mut bindings {
            check(expr, &[], &toplevel, &mut counter, &mut rules, &mut predicates)?;
        }

        Ok(Self {
            bindings,
            rules,
            predicates,
        })
    }

    /// The empty output spec: no names, no capture rules.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse an OUTPUT statement from mapping-language source text.
    pub fn parse(text: &str) -> SeshResult<Self> {
        crate::parser::parse_output_spec(text)
    }

    /// The declared top-level names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|(name, _)| name.as_str())
    }

    fn expr(&self, name: &str) -> Option<&Expr> {
        self.bindings
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, e)| e)
    }

    /// The capture rules to append to the solver input, one `aux(...) :- q.`
    /// rule per collection expression.
    pub fn additional_rules(&self) -> &[String] {
        &self.rules
    }

    /// The auxiliary predicate names the solver output must retain.
    pub fn captured_predicates(&self) -> &BTreeSet<String> {
        &self.predicates
    }
}

/// Recursive scope check; assigns capture information to collections.
fn check(
    expr: &mut Expr,
    bound: &[String],
    toplevel: &HashSet<String>,
    counter: &mut usize,
    rules: &mut Vec<String>,
    predicates: &mut BTreeSet<String>,
) -> Result<(), SpecError> {
    match expr {
        Expr::Constant(_) => Ok(()),
        Expr::Reference(name) => {
            if !toplevel.contains(name.as_str()) {
                return Err(SpecError::UndefinedName { name: name.clone() });
            }
            Ok(())
        }
        Expr::Variable(name) => {
            if !bound.contains(name) {
                return Err(SpecError::UndefinedName { name: name.clone() });
            }
            Ok(())
        }
        Expr::Object { args, .. } => {
            for arg in args {
                check(arg, bound, toplevel, counter, rules, predicates)?;
            }
            Ok(())
        }
        Expr::Set(e) => {
            let mut subvars = HashSet::new();
            e.content.collect_variables(&mut subvars);
            let (captures, inner) =
                capture(&e.query, bound, &subvars, counter, rules, predicates);
            e.captures = Some(captures);
            check(&mut e.content, &inner, toplevel, counter, rules, predicates)
        }
        Expr::Sequence(e) => {
            let mut subvars = HashSet::new();
            subvars.insert(e.index.clone());
            e.content.collect_variables(&mut subvars);
            let (captures, inner) =
                capture(&e.query, bound, &subvars, counter, rules, predicates);
            if !captures.captured.contains(&e.index) {
                return Err(SpecError::UndefinedName {
                    name: e.index.clone(),
                });
            }
            e.captures = Some(captures);
            check(&mut e.content, &inner, toplevel, counter, rules, predicates)
        }
        Expr::Dictionary(e) => {
            let mut subvars = HashSet::new();
            e.key.collect_variables(&mut subvars);
            e.content.collect_variables(&mut subvars);
            let (captures, inner) =
                capture(&e.query, bound, &subvars, counter, rules, predicates);
            e.captures = Some(captures);
            check(&mut e.key, &inner, toplevel, counter, rules, predicates)?;
            check(&mut e.content, &inner, toplevel, counter, rules, predicates)
        }
    }
}

/// Compute capture information for one collection and record its rule.
/// Returns the captures and the variable scope for the collection's subexpressions.
fn capture(
    query: &Query,
    bound: &[String],
    subvars: &HashSet<String>,
    counter: &mut usize,
    rules: &mut Vec<String>,
    predicates: &mut BTreeSet<String>,
) -> (Captures, Vec<String>) {
    // Query variables, unique, in order of first appearance.
    let mut query_vars: Vec<String> = Vec::new();
    for var in query.variables() {
        if !query_vars.iter().any(|v| v == var) {
            query_vars.push(var.to_string());
        }
    }

    let fixed: Vec<String> = query_vars
        .iter()
        .filter(|v| bound.contains(v))
        .cloned()
        .collect();
    let varying: Vec<String> = query_vars
        .iter()
        .filter(|v| subvars.contains(v.as_str()) && !fixed.contains(v))
        .cloned()
        .collect();
    let mut captured = fixed.clone();
    captured.extend(varying);

    let aux_predicate = format!("{AUX_PREFIX}{counter}");
    *counter += 1;
    rules.push(format!(
        "{aux_predicate}({}) :- {query}.",
        captured.join(",")
    ));
    predicates.insert(aux_predicate.clone());

    let mut inner: Vec<String> = bound.to_vec();
    for var in &query_vars {
        if !inner.contains(var) {
            inner.push(var.clone());
        }
    }

    (
        Captures {
            aux_predicate,
            fixed,
            captured,
        },
        inner,
    )
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// The binding of captured ASP variables to ground terms during collection
/// evaluation.
#[derive(Debug, Default)]
struct LocalContext {
    bindings: HashMap<String, GroundTerm>,
}

impl LocalContext {
    fn get(&self, name: &str) -> Option<&GroundTerm> {
        self.bindings.get(name)
    }

    fn bind(&mut self, name: &str, term: GroundTerm) {
        self.bindings.insert(name.to_string(), term);
    }

    fn unbind(&mut self, name: &str) {
        self.bindings.remove(name);
    }
}

enum Memo {
    /// Resolution started but has not completed. Seeing this on lookup means
    /// the reference graph loops back, or a previous attempt failed.
    InProgress,
    Resolved(Value),
}

struct ModelState {
    /// Dropped once every top-level name has been resolved.
    raw: Option<RawAnswerSet>,
    memo: HashMap<String, Memo>,
}

/// One answer set viewed through an [`OutputSpec`]: top-level names resolve
/// to host values on demand, memoized per model.
pub struct Model {
    spec: Arc<OutputSpec>,
    registry: Registry,
    state: RefCell<ModelState>,
}

impl Model {
    pub(crate) fn new(raw: RawAnswerSet, spec: Arc<OutputSpec>, registry: Registry) -> Self {
        Self {
            spec,
            registry,
            state: RefCell::new(ModelState {
                raw: Some(raw),
                memo: HashMap::new(),
            }),
        }
    }

    /// The top-level names this model can resolve.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.spec.names()
    }

    /// Resolve a top-level name to its host value.
    ///
    /// The first successful resolution is memoized. A resolution error leaves
    /// the name poisoned; later lookups report a circular reference rather
    /// than re-running the failed evaluation.
    pub fn get(&self, name: &str) -> SeshResult<Value> {
        {
            let mut state = self.state.borrow_mut();
            match state.memo.get(name) {
                Some(Memo::Resolved(value)) => return Ok(value.clone()),
                Some(Memo::InProgress) => {
                    return Err(OutputError::CircularReference {
                        name: name.to_string(),
                    }
                    .into());
                }
                None => {}
            }
            if self.spec.expr(name).is_none() {
                return Err(OutputError::UndefinedName {
                    name: name.to_string(),
                }
                .into());
            }
            state.memo.insert(name.to_string(), Memo::InProgress);
        }

        // No state borrow held across evaluation: references and collection
        // tuple reads take their own short borrows.
        let expr = self
            .spec
            .expr(name)
            .expect("presence checked above")
            .clone();
        let value = self.eval(&expr, &mut LocalContext::default())?;
        trace!(name, "resolved output name");

        let mut state = self.state.borrow_mut();
        state.memo.insert(name.to_string(), Memo::Resolved(value.clone()));
        let all_resolved = self
            .spec
            .names()
            .all(|n| matches!(state.memo.get(n), Some(Memo::Resolved(_))));
        if all_resolved {
            state.raw = None;
        }
        Ok(value)
    }

    /// Clone the tuples of an auxiliary predicate out of the raw answer set.
    fn aux_tuples(&self, predicate: &str) -> Vec<Vec<GroundTerm>> {
        let state = self.state.borrow();
        match &state.raw {
            Some(raw) => raw.get(predicate).to_vec(),
            // Collections read the raw answer set exactly once, before their
            // enclosing top-level name resolves.
            None => Vec::new(),
        }
    }

    fn eval(&self, expr: &Expr, ctx: &mut LocalContext) -> SeshResult<Value> {
        match expr {
            Expr::Constant(value) => Ok(value.clone()),
            Expr::Reference(name) => self.get(name),
            Expr::Variable(name) => {
                let term = ctx
                    .get(name)
                    .expect("variable bound by construction-time scope check");
                Ok(term.clone().into())
            }
            Expr::Object { constructor, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg, ctx)?);
                }
                match constructor {
                    None => Ok(Value::Tuple(values)),
                    Some(name) => {
                        let ctor = self.registry.resolve(name).ok_or_else(|| {
                            OutputError::UnknownConstructor { name: name.clone() }
                        })?;
                        ctor(values).map_err(Into::into)
                    }
                }
            }
            Expr::Set(e) => {
                let mut items = BTreeSet::new();
                self.matches(e.captures.as_ref(), ctx, |model, ctx| {
                    items.insert(model.eval(&e.content, ctx)?);
                    Ok(())
                })?;
                Ok(Value::Set(items))
            }
            Expr::Sequence(e) => {
                let caps = e
                    .captures
                    .as_ref()
                    .expect("captures computed at construction");
                let index_pos = caps
                    .captured
                    .iter()
                    .position(|v| v == &e.index)
                    .expect("index variable captured by construction-time check");
                let mut entries: Vec<(i64, Value)> = Vec::new();
                self.matches(Some(caps), ctx, |model, ctx| {
                    let index = match ctx.get(&caps.captured[index_pos]) {
                        Some(GroundTerm::Int(n)) => *n,
                        _ => {
                            return Err(OutputError::InvalidIndices {
                                detail: "index variable is not bound to an integer".into(),
                            }
                            .into());
                        }
                    };
                    entries.push((index, model.eval(&e.content, ctx)?));
                    Ok(())
                })?;
                entries.sort_by_key(|(i, _)| *i);
                for (expected, (index, _)) in entries.iter().enumerate() {
                    if *index != expected as i64 {
                        return Err(OutputError::InvalidIndices {
                            detail: format!(
                                "index values do not form the range 0..{}",
                                entries.len()
                            ),
                        }
                        .into());
                    }
                }
                Ok(Value::Seq(entries.into_iter().map(|(_, v)| v).collect()))
            }
            Expr::Dictionary(e) => {
                let mut map = BTreeMap::new();
                self.matches(e.captures.as_ref(), ctx, |model, ctx| {
                    let key = model.eval(&e.key, ctx)?;
                    let value = model.eval(&e.content, ctx)?;
                    if map.contains_key(&key) {
                        return Err(OutputError::DuplicateKey {
                            key: key.to_string(),
                        }
                        .into());
                    }
                    map.insert(key, value);
                    Ok(())
                })?;
                Ok(Value::Map(map))
            }
        }
    }

    /// Run `body` once per answer-set tuple of the collection's auxiliary
    /// predicate whose fixed prefix agrees with the current context, with the
    /// remaining captured variables bound.
    fn matches(
        &self,
        captures: Option<&Captures>,
        ctx: &mut LocalContext,
        mut body: impl FnMut(&Model, &mut LocalContext) -> SeshResult<()>,
    ) -> SeshResult<()> {
        let caps = captures.expect("captures computed at construction");
        'tuples: for tuple in self.aux_tuples(&caps.aux_predicate) {
            debug_assert_eq!(tuple.len(), caps.captured.len());
            for (i, fixed) in caps.fixed.iter().enumerate() {
                if ctx.get(fixed) != Some(&tuple[i]) {
                    continue 'tuples;
                }
            }
            for (name, term) in caps.captured[caps.fixed.len()..]
                .iter()
                .zip(&tuple[caps.fixed.len()..])
            {
                ctx.bind(name, term.clone());
            }
            let result = body(self, ctx);
            for name in &caps.captured[caps.fixed.len()..] {
                ctx.unbind(name);
            }
            result?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Model")
            .field("names", &self.spec.names().count())
            .field("resolved", &state.memo.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(spec: OutputSpec, facts: Vec<(&str, Vec<GroundTerm>)>) -> Model {
        let raw = RawAnswerSet::from_facts(
            facts.into_iter().map(|(p, args)| (p.to_string(), args)),
        );
        Model::new(raw, Arc::new(spec), Registry::new())
    }

    fn int(n: i64) -> GroundTerm {
        GroundTerm::Int(n)
    }

    fn sym(s: &str) -> GroundTerm {
        GroundTerm::Sym(s.into())
    }

    #[test]
    fn capture_rules_and_predicates() {
        let spec = OutputSpec::parse(
            "OUTPUT { xs = sequence { query: p(X, I); content: X; index: I; }; }",
        )
        .unwrap();
        assert_eq!(spec.additional_rules(), ["sesh__0(X,I) :- p(X,I)."]);
        assert!(spec.captured_predicates().contains("sesh__0"));
    }

    #[test]
    fn sequence_orders_by_index() {
        let spec = OutputSpec::parse(
            "OUTPUT { xs = sequence { query: p(X, I); content: X; index: I; }; }",
        )
        .unwrap();
        let m = model(
            spec,
            vec![
                ("sesh__0", vec![sym("abc"), int(1)]),
                ("sesh__0", vec![sym("def"), int(0)]),
                ("sesh__0", vec![sym("xyz"), int(2)]),
            ],
        );
        assert_eq!(
            m.get("xs").unwrap(),
            Value::Seq(vec![
                Value::Sym("def".into()),
                Value::Sym("abc".into()),
                Value::Sym("xyz".into()),
            ])
        );
    }

    #[test]
    fn sequence_rejects_gaps_and_duplicates() {
        let parse = || {
            OutputSpec::parse(
                "OUTPUT { xs = sequence { query: p(X, I); content: X; index: I; }; }",
            )
            .unwrap()
        };
        let gap = model(
            parse(),
            vec![
                ("sesh__0", vec![sym("a"), int(0)]),
                ("sesh__0", vec![sym("b"), int(2)]),
            ],
        );
        assert!(matches!(
            gap.get("xs").unwrap_err(),
            SeshError::Output(OutputError::InvalidIndices { .. })
        ));

        let dup = model(
            parse(),
            vec![
                ("sesh__0", vec![sym("a"), int(0)]),
                ("sesh__0", vec![sym("b"), int(0)]),
            ],
        );
        assert!(matches!(
            dup.get("xs").unwrap_err(),
            SeshError::Output(OutputError::InvalidIndices { .. })
        ));
    }

    #[test]
    fn dictionary_rejects_duplicate_keys() {
        let spec = OutputSpec::parse(
            "OUTPUT { d = dictionary { query: p(K, V); content: V; key: K; }; }",
        )
        .unwrap();
        let m = model(
            spec,
            vec![
                ("sesh__0", vec![sym("k"), int(1)]),
                ("sesh__0", vec![sym("k"), int(2)]),
            ],
        );
        assert!(matches!(
            m.get("d").unwrap_err(),
            SeshError::Output(OutputError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn references_resolve_through_other_names() {
        let spec = OutputSpec::parse(
            "OUTPUT { n = set { query: p(X); content: X; }; m = (&n, 7); }",
        )
        .unwrap();
        let m = model(spec, vec![("sesh__0", vec![sym("a")])]);
        let expected_set = Value::Set([Value::Sym("a".into())].into_iter().collect());
        assert_eq!(
            m.get("m").unwrap(),
            Value::Tuple(vec![expected_set, Value::Int(7)])
        );
    }

    #[test]
    fn circular_references_poison_both_names() {
        let spec = OutputSpec::parse("OUTPUT { x = &y; y = &x; }").unwrap();
        let m = model(spec, vec![]);
        for _ in 0..2 {
            for name in ["x", "y"] {
                assert!(matches!(
                    m.get(name).unwrap_err(),
                    SeshError::Output(OutputError::CircularReference { .. })
                ));
            }
        }
    }

    #[test]
    fn undefined_toplevel_name() {
        let spec = OutputSpec::parse("OUTPUT { x = 1; }").unwrap();
        let m = model(spec, vec![]);
        assert_eq!(m.get("x").unwrap(), Value::Int(1));
        assert!(matches!(
            m.get("missing").unwrap_err(),
            SeshError::Output(OutputError::UndefinedName { .. })
        ));
    }

    #[test]
    fn nested_collections_filter_on_fixed_variables() {
        // One set per outer node, keyed by the shared variable N.
        let spec = OutputSpec::parse(
            "OUTPUT { d = dictionary { query: node(N); key: N; \
             content: set { query: edge(N, M); content: M; }; }; }",
        )
        .unwrap();
        assert_eq!(
            spec.additional_rules(),
            [
                "sesh__0(N) :- node(N).",
                "sesh__1(N,M) :- edge(N,M).",
            ]
        );
        let m = model(
            spec,
            vec![
                ("sesh__0", vec![sym("a")]),
                ("sesh__0", vec![sym("b")]),
                ("sesh__1", vec![sym("a"), sym("b")]),
                ("sesh__1", vec![sym("a"), sym("c")]),
                ("sesh__1", vec![sym("b"), sym("c")]),
            ],
        );
        let d = m.get("d").unwrap();
        let Value::Map(map) = d else { panic!("expected map, got {d:?}") };
        assert_eq!(
            map[&Value::Sym("a".into())],
            Value::Set(
                [Value::Sym("b".into()), Value::Sym("c".into())]
                    .into_iter()
                    .collect()
            )
        );
        assert_eq!(
            map[&Value::Sym("b".into())],
            Value::Set([Value::Sym("c".into())].into_iter().collect())
        );
    }

    #[test]
    fn rejects_unbound_variable() {
        let err = OutputSpec::parse("OUTPUT { x = X; }").unwrap_err();
        assert!(matches!(
            err,
            SeshError::Spec(SpecError::UndefinedName { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_toplevel_name() {
        let err = OutputSpec::parse("OUTPUT { x = 1; x = 2; }").unwrap_err();
        assert!(matches!(
            err,
            SeshError::Spec(SpecError::RedefinedName { .. })
        ));
    }

    #[test]
    fn rejects_reference_to_undeclared_name() {
        let err = OutputSpec::parse("OUTPUT { x = &nope; }").unwrap_err();
        assert!(matches!(
            err,
            SeshError::Spec(SpecError::UndefinedName { .. })
        ));
    }

    #[test]
    fn rejects_uncaptured_sequence_index() {
        let err = OutputSpec::parse(
            "OUTPUT { xs = sequence { query: p(X); content: X; index: I; }; }",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SeshError::Spec(SpecError::UndefinedName { .. })
        ));
    }

    #[test]
    fn simple_set_shorthand() {
        let spec = OutputSpec::parse("OUTPUT { ps = set { p/2 }; q = set { q/1 }; }").unwrap();
        assert_eq!(
            spec.additional_rules(),
            ["sesh__0(X0,X1) :- p(X0,X1).", "sesh__1(X0) :- q(X0)."]
        );
        let m = model(
            spec,
            vec![
                ("sesh__0", vec![sym("a"), int(1)]),
                ("sesh__1", vec![int(9)]),
            ],
        );
        assert_eq!(
            m.get("ps").unwrap(),
            Value::Set(
                [Value::Tuple(vec![Value::Sym("a".into()), Value::Int(1)])]
                    .into_iter()
                    .collect()
            )
        );
        assert_eq!(
            m.get("q").unwrap(),
            Value::Set([Value::Int(9)].into_iter().collect())
        );
    }

    #[test]
    fn query_constants_round_trip_through_rules() {
        let spec = OutputSpec::parse(
            r#"OUTPUT { xs = set { query: p(X, "a b", abc, 3), not q(X); content: X; }; }"#,
        )
        .unwrap();
        assert_eq!(
            spec.additional_rules(),
            [r#"sesh__0(X) :- p(X,"a b",abc,3),not q(X)."#]
        );
    }
}
