//! Host-side value model.
//!
//! The mapping layer exchanges structured host data with the solver through
//! the closed [`Value`] enum. Field and subscript access implement the
//! accessor capability used by INPUT mappings, with a uniform translation to
//! [`MapError`] at the boundary; collection classification drives iteration
//! semantics (sets yield elements, sequences yield `(index, element)` pairs,
//! maps yield `(key, value)` pairs).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::asp::{quote, GroundTerm};
use crate::error::MapError;

/// A structured host value.
///
/// `Sym` is an unquoted constant symbol, distinct from `Str`: the two
/// serialize differently and never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    Int(i64),
    Str(String),
    Sym(String),
    Tuple(Vec<Value>),
    Seq(Vec<Value>),
    Set(BTreeSet<Value>),
    Map(BTreeMap<Value, Value>),
    Record(BTreeMap<String, Value>),
}

/// A single subscript step in an accessor path, fixed at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptKey {
    Int(i64),
    Str(String),
}

impl fmt::Display for SubscriptKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptKey::Int(n) => write!(f, "{n}"),
            SubscriptKey::Str(s) => f.write_str(&quote(s)),
        }
    }
}

impl Value {
    /// Short kind name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
            Value::Sym(_) => "symbol",
            Value::Tuple(_) => "tuple",
            Value::Seq(_) => "sequence",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
        }
    }

    /// Resolve a named field, as in `node.label`.
    pub fn field(&self, name: &str) -> Result<&Value, MapError> {
        if let Value::Record(fields) = self {
            if let Some(v) = fields.get(name) {
                return Ok(v);
            }
        }
        Err(MapError::Field {
            field: name.to_string(),
            on: self.to_string(),
        })
    }

    /// Resolve a subscript, as in `xs[2]` or `ys["abc"]`.
    pub fn index(&self, key: &SubscriptKey) -> Result<&Value, MapError> {
        let missing = || MapError::Index {
            key: key.to_string(),
            on: self.to_string(),
        };
        match (self, key) {
            (Value::Seq(items), SubscriptKey::Int(i)) | (Value::Tuple(items), SubscriptKey::Int(i)) => {
                usize::try_from(*i)
                    .ok()
                    .and_then(|i| items.get(i))
                    .ok_or_else(missing)
            }
            (Value::Map(map), SubscriptKey::Int(i)) => map.get(&Value::Int(*i)).ok_or_else(missing),
            (Value::Map(map), SubscriptKey::Str(s)) => {
                map.get(&Value::Str(s.clone())).ok_or_else(missing)
            }
            _ => Err(missing()),
        }
    }

    /// Classify this value as an iteration source and materialize its items.
    ///
    /// Returns `None` for values that are not set-, sequence-, or map-like.
    pub fn iteration_items(&self) -> Option<Vec<Value>> {
        match self {
            Value::Set(items) => Some(items.iter().cloned().collect()),
            Value::Seq(items) | Value::Tuple(items) => Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| Value::Tuple(vec![Value::Int(i as i64), v.clone()]))
                    .collect(),
            ),
            Value::Map(map) => Some(
                map.iter()
                    .map(|(k, v)| Value::Tuple(vec![k.clone(), v.clone()]))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Render this value as a fact argument: integers unquoted, symbols bare,
    /// everything else quoted with `\` and `"` escaped.
    pub fn fact_term(&self) -> String {
        match self {
            Value::Int(n) => n.to_string(),
            Value::Sym(s) => s.clone(),
            other => quote(&other.to_string()),
        }
    }

    /// Convenience constructor for a record value.
    pub fn record(fields: impl IntoIterator<Item = (&'static str, Value)>) -> Value {
        Value::Record(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => f.write_str(s),
            Value::Sym(s) => f.write_str(s),
            Value::Tuple(items) => {
                f.write_str("(")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str(")")
            }
            Value::Seq(items) => {
                f.write_str("[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            Value::Set(items) => {
                f.write_str("{")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("}")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Value::Record(fields) => {
                f.write_str("{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<GroundTerm> for Value {
    fn from(term: GroundTerm) -> Self {
        match term {
            GroundTerm::Int(n) => Value::Int(n),
            GroundTerm::Sym(s) => Value::Sym(s),
            GroundTerm::Str(s) => Value::Str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<const N: usize> From<[Value; N]> for Value {
    fn from(items: [Value; N]) -> Self {
        Value::Tuple(items.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(items: impl IntoIterator<Item = i64>) -> Value {
        Value::Seq(items.into_iter().map(Value::Int).collect())
    }

    #[test]
    fn field_access_on_records() {
        let node = Value::record([("label", Value::Str("a".into()))]);
        assert_eq!(node.field("label").unwrap(), &Value::Str("a".into()));
        let err = node.field("weight").unwrap_err();
        assert!(format!("{err}").contains("weight"));
    }

    #[test]
    fn subscript_access() {
        let xs = seq([10, 20, 30]);
        assert_eq!(xs.index(&SubscriptKey::Int(2)).unwrap(), &Value::Int(30));
        assert!(xs.index(&SubscriptKey::Int(3)).is_err());
        assert!(xs.index(&SubscriptKey::Int(-1)).is_err());

        let mut map = BTreeMap::new();
        map.insert(Value::Str("abc".into()), Value::Str("xyz".into()));
        map.insert(Value::Int(0), Value::Int(1));
        let ys = Value::Map(map);
        assert_eq!(
            ys.index(&SubscriptKey::Str("abc".into())).unwrap(),
            &Value::Str("xyz".into())
        );
        assert_eq!(ys.index(&SubscriptKey::Int(0)).unwrap(), &Value::Int(1));
    }

    #[test]
    fn iteration_items_per_collection_kind() {
        let set = Value::Set([Value::Int(1), Value::Int(2)].into_iter().collect());
        assert_eq!(set.iteration_items().unwrap().len(), 2);

        let xs = seq([7, 8]);
        let items = xs.iteration_items().unwrap();
        assert_eq!(
            items[0],
            Value::Tuple(vec![Value::Int(0), Value::Int(7)])
        );
        assert_eq!(
            items[1],
            Value::Tuple(vec![Value::Int(1), Value::Int(8)])
        );

        let mut map = BTreeMap::new();
        map.insert(Value::Str("k".into()), Value::Int(9));
        let items = Value::Map(map).iteration_items().unwrap();
        assert_eq!(
            items[0],
            Value::Tuple(vec![Value::Str("k".into()), Value::Int(9)])
        );

        assert!(Value::Int(5).iteration_items().is_none());
    }

    #[test]
    fn fact_term_rendering() {
        assert_eq!(Value::Int(-3).fact_term(), "-3");
        assert_eq!(Value::Sym("abc".into()).fact_term(), "abc");
        assert_eq!(Value::Str("abc".into()).fact_term(), r#""abc""#);
        assert_eq!(Value::Str(r#"xy"z"#.into()).fact_term(), r#""xy\"z""#);
    }
}
