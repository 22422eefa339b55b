use std::fmt;

/// A typed parameter value produced by a registered parse function.
///
/// Adding a new kind means extending this enum and registering a parser
/// for it in [`crate::types::ParameterTypes`] together.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ParameterValue {
    /// Built-in kind of the payload.
    ///
    /// A value parsed by a registered type reports the kind it is stored as,
    /// not the registered name; [`crate::BoundParameter`] keeps that.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParameterValue::Integer(_) => "int",
            ParameterValue::Float(_) => "float",
            ParameterValue::Text(_) => "string",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParameterValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Floats and integers both widen to `f64`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParameterValue::Float(v) => Some(*v),
            ParameterValue::Integer(v) => Some(*v as f64),
            ParameterValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParameterValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Integer(v) => write!(f, "{}", v),
            ParameterValue::Float(v) => write!(f, "{}", v),
            ParameterValue::Text(v) => f.write_str(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_match_variant() {
        let i = ParameterValue::Integer(7);
        assert_eq!(i.as_int(), Some(7));
        assert_eq!(i.as_float(), Some(7.0));
        assert_eq!(i.as_text(), None);

        let t = ParameterValue::Text("hi".to_string());
        assert_eq!(t.as_text(), Some("hi"));
        assert_eq!(t.as_int(), None);
        assert_eq!(t.as_float(), None);
    }

    #[test]
    fn test_display_is_bare_payload() {
        assert_eq!(ParameterValue::Integer(3).to_string(), "3");
        assert_eq!(ParameterValue::Float(0.5).to_string(), "0.5");
        assert_eq!(ParameterValue::Text("a b".into()).to_string(), "a b");
        assert_eq!(ParameterValue::Text("a b".into()).type_name(), "string");
    }
}
