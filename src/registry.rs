//! Constructor registry: name → constructor closure mapping.
//!
//! The [`Registry`] is an explicit, clonable value rather than ambient global
//! state: every [`Program`](crate::program::Program) derives its own local
//! copy from the process-wide default registry, so registrations on one
//! program never leak into another.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};

use crate::error::OutputError;
use crate::value::Value;

/// A constructor applied to the evaluated arguments of an OUTPUT object
/// expression.
pub type Constructor = Arc<dyn Fn(Vec<Value>) -> Result<Value, OutputError> + Send + Sync>;

/// Maps (possibly dotted) constructor names to constructor closures.
#[derive(Clone, Default)]
pub struct Registry {
    constructors: HashMap<String, Constructor>,
}

impl Registry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the process-wide default registry.
    pub fn default_snapshot() -> Self {
        default_registry()
            .read()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Register a constructor closure under the given name, replacing any
    /// previous registration.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(Vec<Value>) -> Result<Value, OutputError> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Arc::new(constructor));
    }

    /// Look up a constructor by its registered (possibly dotted) name.
    pub fn resolve(&self, name: &str) -> Option<Constructor> {
        self.constructors.get(name).cloned()
    }

    /// Number of registered constructors.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("count", &self.len())
            .finish()
    }
}

fn default_registry() -> &'static RwLock<Registry> {
    static DEFAULT: LazyLock<RwLock<Registry>> = LazyLock::new(|| RwLock::new(Registry::new()));
    &DEFAULT
}

/// Register a constructor on the process-wide default registry.
///
/// Programs created afterwards see the registration through their local copy;
/// existing programs are unaffected.
pub fn register_default<F>(name: impl Into<String>, constructor: F)
where
    F: Fn(Vec<Value>) -> Result<Value, OutputError> + Send + Sync + 'static,
{
    if let Ok(mut registry) = default_registry().write() {
        registry.register(name, constructor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_resolve() {
        let mut reg = Registry::new();
        reg.register("pair", |args| Ok(Value::Tuple(args)));

        let ctor = reg.resolve("pair").unwrap();
        let value = ctor(vec![Value::Int(1), Value::Int(2)]).unwrap();
        assert_eq!(value, Value::Tuple(vec![Value::Int(1), Value::Int(2)]));

        assert!(reg.resolve("missing").is_none());
    }

    #[test]
    fn clones_are_independent() {
        let mut reg = Registry::new();
        reg.register("a", |args| Ok(Value::Tuple(args)));

        let mut copy = reg.clone();
        copy.register("b", |args| Ok(Value::Tuple(args)));

        assert_eq!(reg.len(), 1);
        assert_eq!(copy.len(), 2);
        assert!(reg.resolve("b").is_none());
    }

    #[test]
    fn default_snapshot_sees_default_registrations() {
        register_default("sesh_test_ctor", |args| Ok(Value::Tuple(args)));
        let snapshot = Registry::default_snapshot();
        assert!(snapshot.resolve("sesh_test_ctor").is_some());
    }

    #[test]
    fn debug_prints_count_only() {
        let mut reg = Registry::new();
        reg.register("a", |args| Ok(Value::Tuple(args)));
        assert_eq!(format!("{reg:?}"), "Registry { count: 1 }");
    }
}
