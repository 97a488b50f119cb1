use log::{debug, trace};

use crate::primitives;
use crate::source::Span;
use crate::types::{PrimitiveFunc, Procedure, Value};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnvError {
    #[error("Unbound symbol: '{0}'")]
    UnboundSymbol(String, Span), // Symbol name, span where lookup happened
}

/// A scope of bindings with an optional enclosing scope.
///
/// Enclosing scopes are shared read-only through `Rc`, so `define` can only
/// ever write the current frame. Not `Send`: an environment belongs to one
/// thread and provides no internal synchronisation.
#[derive(Debug, Default)]
pub struct Environment {
    outer: Option<Rc<Environment>>,
    bindings: HashMap<String, Value>, // Maps symbol names to values
}

impl Environment {
    /// Creates a new, empty top-level environment.
    pub fn new() -> Self {
        Environment::default()
    }

    /// Creates the root environment with every primitive bound.
    pub fn new_global_populated() -> Self {
        let mut env = Environment::new();

        // Arithmetic
        env.add_primitive("+", primitives::prim_add);
        env.add_primitive("-", primitives::prim_sub);
        env.add_primitive("*", primitives::prim_mul);
        env.add_primitive("/", primitives::prim_div);

        // Comparison
        env.add_primitive(">", primitives::prim_greater_than);
        env.add_primitive("<", primitives::prim_less_than);
        env.add_primitive(">=", primitives::prim_greater_than_or_equals);
        env.add_primitive("<=", primitives::prim_less_than_or_equals);
        env.add_primitive("eq", primitives::prim_eq);

        // Pairs
        env.add_primitive("cons", primitives::prim_cons);
        env.add_primitive("car", primitives::prim_car);
        env.add_primitive("cdr", primitives::prim_cdr);

        // Type predicates
        env.add_primitive("atom", primitives::prim_is_atom);

        env
    }

    /// Creates a child scope of `outer` holding `bindings`.
    pub fn extend(
        outer: Rc<Environment>,
        bindings: impl IntoIterator<Item = (String, Value)>,
    ) -> Self {
        Environment {
            outer: Some(outer),
            bindings: bindings.into_iter().collect(),
        }
    }

    /// Defines a symbol in the *current* environment frame.
    /// Replaces the value if the symbol already exists in this frame.
    pub fn define(&mut self, name: String, value: Value) {
        debug!("define {} = {}", name, value);
        self.bindings.insert(name, value);
    }

    /// Looks up a symbol's value.
    /// Checks the current environment first, then walks up the outer environment chain.
    /// `lookup_span` is the location where the symbol was referenced, used for error reporting.
    pub fn get(&self, name: &str, lookup_span: Span) -> Result<Value, EnvError> {
        trace!("lookup {}", name);
        let mut env = self;
        loop {
            if let Some(value) = env.bindings.get(name) {
                return Ok(value.clone());
            }
            match &env.outer {
                Some(outer) => env = outer.as_ref(),
                None => return Err(EnvError::UnboundSymbol(name.to_string(), lookup_span)),
            }
        }
    }

    /// Helper to add a primitive procedure to the environment.
    fn add_primitive(&mut self, name: &'static str, func: PrimitiveFunc) {
        self.define(
            name.to_string(),
            Value::Procedure(Procedure::Primitive(func, name)),
        );
    }

    /// Gets every identifier visible from this environment
    pub fn get_identifiers(&self) -> HashSet<String> {
        let mut identifiers: HashSet<String> = self.bindings.keys().cloned().collect();
        if let Some(outer) = &self.outer {
            identifiers.extend(outer.get_identifiers());
        }
        identifiers
    }
}
