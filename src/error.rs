use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Everything that can go wrong while building, registering or running a command.
///
/// Variants carry the offending command or parameter name so callers can
/// render their own messages; the `Display` impl is a reasonable default.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The line was empty or consisted of whitespace only.
    #[error("cannot execute an empty command line")]
    EmptyCommand,

    /// The leading word of the line does not name this command.
    #[error("command name mismatch: expected `{expected}`, found `{found}`")]
    WrongCommandName { expected: String, found: String },

    /// A required schema slot had no token.
    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    /// A token could not be converted to the declared parameter type.
    #[error("parameter type mismatch for {name}: `{literal}` ({detail})")]
    ParameterTypeMismatch {
        name: String,
        literal: String,
        detail: String,
    },

    /// The schema refers to a type name nobody registered.
    #[error("unknown parameter type: {0}")]
    UnknownParameterType(String),

    /// Brace nesting went past the command's configured depth.
    #[error("command nesting level exceeded the allowed limit of {limit}")]
    NestingLimitExceeded { limit: usize },

    #[error("command with name `{0}` already exists")]
    DuplicateCommandName(String),

    #[error("command with name `{0}` not found")]
    CommandNotFound(String),

    /// The command definition itself is malformed.
    #[error("invalid command definition: {0}")]
    ConstructionInvalid(String),

    /// The command's action reported a failure.
    #[error(transparent)]
    Action(#[from] anyhow::Error),
}

impl CommandError {
    /// True for failures raised while binding tokens to the schema.
    ///
    /// These are the only kinds routed through a command's parameter-error hook.
    pub fn is_parameter_error(&self) -> bool {
        matches!(
            self,
            CommandError::MissingParameter(_)
                | CommandError::ParameterTypeMismatch { .. }
                | CommandError::UnknownParameterType(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_errors_are_classified() {
        assert!(CommandError::MissingParameter("x".into()).is_parameter_error());
        assert!(CommandError::UnknownParameterType("vec".into()).is_parameter_error());
        assert!(
            CommandError::ParameterTypeMismatch {
                name: "x".into(),
                literal: "abc".into(),
                detail: "invalid digit".into(),
            }
            .is_parameter_error()
        );

        assert!(!CommandError::EmptyCommand.is_parameter_error());
        assert!(!CommandError::NestingLimitExceeded { limit: 1 }.is_parameter_error());
        assert!(!CommandError::CommandNotFound("foo".into()).is_parameter_error());
    }

    #[test]
    fn test_messages_carry_names() {
        let err = CommandError::MissingParameter("y".into());
        assert_eq!(err.to_string(), "missing required parameter: y");

        let err = CommandError::CommandNotFound("echo".into());
        assert!(err.to_string().contains("echo"));
    }
}
