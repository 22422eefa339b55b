//! Registry of parameter types, keyed by the type name used in schemas.

use crate::error::{CommandError, Result};
use crate::value::ParameterValue;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A function turning a literal token into a typed value.
pub type ParseFn = Arc<dyn Fn(&str) -> anyhow::Result<ParameterValue> + Send + Sync>;

/// Name-to-parser table consulted by the binder at call time.
///
/// The first registration for a name wins; later registrations with the same
/// name are ignored. Build the table up front, then share it read-only.
#[derive(Clone)]
pub struct ParameterTypes {
    parsers: HashMap<String, ParseFn>,
}

impl ParameterTypes {
    /// A table with no types at all, not even the built-ins.
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Register a parser under `name`.
    ///
    /// Returns `false` (and leaves the table untouched) when the name is taken.
    pub fn register<F>(&mut self, name: impl Into<String>, parse: F) -> bool
    where
        F: Fn(&str) -> anyhow::Result<ParameterValue> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.parsers.contains_key(&name) {
            debug!(type_name = %name, "parameter type already registered, ignoring");
            return false;
        }
        debug!(type_name = %name, "registering parameter type");
        self.parsers.insert(name, Arc::new(parse));
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parsers.contains_key(name)
    }

    /// Parse `literal` with the parser registered under `type_name`.
    ///
    /// The `name` carried by a resulting [`CommandError::ParameterTypeMismatch`]
    /// is the type name; the binder replaces it with the parameter name.
    pub fn parse(&self, type_name: &str, literal: &str) -> Result<ParameterValue> {
        let parser = self
            .parsers
            .get(type_name)
            .ok_or_else(|| CommandError::UnknownParameterType(type_name.to_string()))?;

        parser(literal).map_err(|e| CommandError::ParameterTypeMismatch {
            name: type_name.to_string(),
            literal: literal.to_string(),
            detail: e.to_string(),
        })
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ParameterTypes {
    /// A table with the built-in `int`, `float` and `string` types.
    fn default() -> Self {
        let mut types = Self::empty();
        types.register("int", parse_int);
        types.register("float", parse_float);
        types.register("string", parse_string);
        types
    }
}

impl fmt::Debug for ParameterTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterTypes")
            .field("names", &self.names())
            .finish()
    }
}

fn parse_int(literal: &str) -> anyhow::Result<ParameterValue> {
    let v = literal
        .parse::<i64>()
        .map_err(|e| anyhow::anyhow!("invalid int value: {}", e))?;
    Ok(ParameterValue::Integer(v))
}

fn parse_float(literal: &str) -> anyhow::Result<ParameterValue> {
    let v = literal
        .parse::<f64>()
        .map_err(|e| anyhow::anyhow!("invalid float value: {}", e))?;
    Ok(ParameterValue::Float(v))
}

fn parse_string(literal: &str) -> anyhow::Result<ParameterValue> {
    Ok(ParameterValue::Text(literal.to_string()))
}
