use crate::error::{CommandError, Result};
use crate::schema::Schema;
use crate::types::ParameterTypes;
use crate::value::ParameterValue;
use std::fmt;

/// A parameter slot that received a token.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter {
    pub name: String,
    /// Type name as declared in the schema, which may be a registered kind.
    pub type_name: String,
    pub value: ParameterValue,
}

impl fmt::Display for BoundParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.type_name, self.value)
    }
}

/// Everything a command action gets to see about one invocation.
///
/// `params` holds one entry per schema slot that had a token, in schema
/// order; optional slots without a token are simply absent. `tokens` and `raw`
/// are kept untouched so actions can look at surplus arguments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Invocation {
    params: Vec<BoundParameter>,
    tokens: Vec<String>,
    raw: String,
}

impl Invocation {
    pub fn params(&self) -> &[BoundParameter] {
        &self.params
    }

    /// Bound values in schema order.
    pub fn values(&self) -> impl Iterator<Item = &ParameterValue> {
        self.params.iter().map(|p| &p.value)
    }

    pub fn get(&self, index: usize) -> Option<&ParameterValue> {
        self.params.get(index).map(|p| &p.value)
    }

    pub fn get_named(&self, name: &str) -> Option<&ParameterValue> {
        self.params.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get_named(name).and_then(ParameterValue::as_int)
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.get_named(name).and_then(ParameterValue::as_float)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get_named(name).and_then(ParameterValue::as_text)
    }

    /// All scanned tokens, including the ones past the end of the schema.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// The line with the command name cut off, before tokenization.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Match `tokens` positionally against `schema`.
///
/// Every type is looked up by name in `types` on each call, so the outcome
/// follows whatever the table holds right now.
pub fn bind(
    schema: &Schema,
    types: &ParameterTypes,
    tokens: Vec<String>,
    raw: impl Into<String>,
) -> Result<Invocation> {
    let mut params = Vec::with_capacity(schema.len());

    for (i, spec) in schema.specs().iter().enumerate() {
        let Some(token) = tokens.get(i) else {
            if spec.optional {
                continue;
            }
            return Err(CommandError::MissingParameter(spec.name.clone()));
        };

        let value = types
            .parse(&spec.type_name, token)
            .map_err(|e| match e {
                CommandError::ParameterTypeMismatch {
                    literal, detail, ..
                } => CommandError::ParameterTypeMismatch {
                    name: spec.name.clone(),
                    literal,
                    detail,
                },
                other => other,
            })?;

        params.push(BoundParameter {
            name: spec.name.clone(),
            type_name: spec.type_name.clone(),
            value,
        });
    }

    Ok(Invocation {
        params,
        tokens,
        raw: raw.into(),
    })
}
