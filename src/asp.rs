//! ASP-side data model: terms, literals, queries, and raw answer sets.
//!
//! Query-side terms ([`Term`]) may contain variables; wire-side terms
//! ([`GroundTerm`]) are ground constants received from the solver. The solver
//! distinguishes unquoted constant symbols from quoted strings (`abc` and
//! `"abc"` are different constants), so both sides keep them as separate
//! variants and round-trip them losslessly.

use std::collections::HashMap;
use std::fmt;

/// Enclose the given text in double quotes, escaping contained quotes and
/// backslashes with a backslash.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if c == '\\' || c == '"' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// A term as it appears in a (possibly non-ground) query literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// A nonnegative integer constant.
    Int(i64),
    /// An unquoted constant symbol, e.g. `abc`.
    Sym(String),
    /// A quoted string constant, e.g. `"abc"`. Distinct from [`Term::Sym`].
    Str(String),
    /// An ASP variable, e.g. `X`.
    Var(String),
    /// The anonymous variable `_`.
    Anon,
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Int(n) => write!(f, "{n}"),
            Term::Sym(s) => f.write_str(s),
            Term::Str(s) => f.write_str(&quote(s)),
            Term::Var(v) => f.write_str(v),
            Term::Anon => f.write_str("_"),
        }
    }
}

/// A literal, not necessarily ground, possibly default-negated.
///
/// The predicate name carries a `-` prefix for strongly negated literals;
/// binary builtins are stored with the operator as the predicate name and
/// serialized in prefix form, the way the solver accepts them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub predicate: String,
    pub args: Vec<Term>,
    /// Whether the literal is default-negated (`not p(X)`).
    pub negated: bool,
}

impl Literal {
    pub fn new(predicate: impl Into<String>, args: Vec<Term>, negated: bool) -> Self {
        Self {
            predicate: predicate.into(),
            args,
            negated,
        }
    }

    /// The variable names appearing in this literal's arguments, in order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.args.iter().filter_map(|t| match t {
            Term::Var(v) => Some(v.as_str()),
            _ => None,
        })
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("not ")?;
        }
        f.write_str(&self.predicate)?;
        f.write_str("(")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

/// An ordered conjunction of literals; defines the free variables available
/// to an output expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub literals: Vec<Literal>,
}

impl Query {
    pub fn new(literals: Vec<Literal>) -> Self {
        Self { literals }
    }

    /// The variable names appearing in the query, in order of appearance
    /// (duplicates included).
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.literals.iter().flat_map(|l| l.variables())
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, lit) in self.literals.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{lit}")?;
        }
        Ok(())
    }
}

/// A ground constant received from the solver on the answer-set wire.
///
/// Bare symbols and quoted strings of the same text are distinct constants
/// and must not be conflated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroundTerm {
    Int(i64),
    Sym(String),
    Str(String),
}

impl fmt::Display for GroundTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroundTerm::Int(n) => write!(f, "{n}"),
            GroundTerm::Sym(s) => f.write_str(s),
            GroundTerm::Str(s) => f.write_str(&quote(s)),
        }
    }
}

/// One solution computed by the solver: a mapping from predicate name to the
/// argument tuples derived for it. Immutable once received.
///
/// Tuples are kept in the order the solver emitted them; the solver already
/// deduplicates, so no set semantics are enforced here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAnswerSet {
    facts: HashMap<String, Vec<Vec<GroundTerm>>>,
}

impl RawAnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an answer set from `(predicate, argument-tuple)` pairs.
    pub fn from_facts(facts: impl IntoIterator<Item = (String, Vec<GroundTerm>)>) -> Self {
        let mut set = Self::new();
        for (pred, args) in facts {
            set.push(pred, args);
        }
        set
    }

    pub(crate) fn push(&mut self, predicate: String, args: Vec<GroundTerm>) {
        self.facts.entry(predicate).or_default().push(args);
    }

    /// The argument tuples derived for `predicate`, or an empty slice.
    pub fn get(&self, predicate: &str) -> &[Vec<GroundTerm>] {
        self.facts.get(predicate).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The predicate names present in this answer set.
    pub fn predicates(&self) -> impl Iterator<Item = &str> {
        self.facts.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_escapes_backslashes_and_quotes() {
        assert_eq!(quote("abc"), r#""abc""#);
        assert_eq!(quote(r#"a"bc"#), r#""a\"bc""#);
        assert_eq!(quote(r"a\bc"), r#""a\\bc""#);
        assert_eq!(quote(r#"a\"bc"#), r#""a\\\"bc""#);
    }

    #[test]
    fn literal_display_prefix_form() {
        let lit = Literal::new(
            "edge",
            vec![Term::Var("X".into()), Term::Sym("a".into()), Term::Int(3)],
            false,
        );
        assert_eq!(lit.to_string(), "edge(X,a,3)");

        let neg = Literal::new("p", vec![Term::Str("a b".into())], true);
        assert_eq!(neg.to_string(), r#"not p("a b")"#);
    }

    #[test]
    fn query_variables_in_order() {
        let q = Query::new(vec![
            Literal::new("p", vec![Term::Var("X".into()), Term::Var("I".into())], false),
            Literal::new("q", vec![Term::Var("X".into())], false),
        ]);
        let vars: Vec<&str> = q.variables().collect();
        assert_eq!(vars, ["X", "I", "X"]);
    }

    #[test]
    fn ground_terms_keep_symbols_and_strings_distinct() {
        assert_ne!(GroundTerm::Sym("abc".into()), GroundTerm::Str("abc".into()));
        assert_eq!(GroundTerm::Sym("abc".into()).to_string(), "abc");
        assert_eq!(GroundTerm::Str("abc".into()).to_string(), r#""abc""#);
    }

    #[test]
    fn raw_answer_set_preserves_tuple_order() {
        let set = RawAnswerSet::from_facts([
            ("p".to_string(), vec![GroundTerm::Sym("abc".into()), GroundTerm::Int(1)]),
            ("p".to_string(), vec![GroundTerm::Sym("def".into()), GroundTerm::Int(0)]),
        ]);
        let tuples = set.get("p");
        assert_eq!(tuples.len(), 2);
        assert_eq!(tuples[0][0], GroundTerm::Sym("abc".into()));
        assert_eq!(tuples[1][0], GroundTerm::Sym("def".into()));
        assert!(set.get("q").is_empty());
    }
}
