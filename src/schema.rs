use crate::error::{CommandError, Result};
use std::fmt;

/// Declaration of one positional parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    /// Name of the type in [`crate::types::ParameterTypes`], resolved at call time.
    pub type_name: String,
    pub name: String,
    pub description: String,
    pub optional: bool,
}

impl ParameterSpec {
    pub fn required(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
            description: String::new(),
            optional: false,
        }
    }

    pub fn optional(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            optional: true,
            ..Self::required(type_name, name)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl fmt::Display for ParameterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.optional {
            write!(f, "[{} - {}]", self.type_name, self.name)
        } else {
            write!(f, "{} - {}", self.type_name, self.name)
        }
    }
}

/// Ordered parameter declarations in which every required parameter
/// precedes every optional one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    specs: Vec<ParameterSpec>,
}

impl Schema {
    /// Validate ordering and build the schema.
    pub fn new(specs: Vec<ParameterSpec>) -> Result<Self> {
        let mut seen_optional: Option<&str> = None;
        for spec in &specs {
            match (spec.optional, seen_optional) {
                (true, None) => seen_optional = Some(spec.name.as_str()),
                (false, Some(optional)) => {
                    return Err(CommandError::ConstructionInvalid(format!(
                        "optional parameter `{}` precedes required parameter `{}`",
                        optional, spec.name
                    )));
                }
                _ => {}
            }
        }
        Ok(Self { specs })
    }

    pub fn specs(&self) -> &[ParameterSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn required_count(&self) -> usize {
        self.specs.iter().filter(|s| !s.optional).count()
    }

    pub fn optional_count(&self) -> usize {
        self.specs.iter().filter(|s| s.optional).count()
    }
}
