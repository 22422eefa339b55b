use crate::binder::{self, Invocation};
use crate::error::{CommandError, Result};
use crate::lexer;
use crate::schema::{ParameterSpec, Schema};
use crate::types::ParameterTypes;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Brace nesting allowed when a command does not say otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Body of a command: gets the bound invocation, returns the textual result.
pub type Action = Arc<dyn Fn(&Invocation) -> anyhow::Result<String> + Send + Sync>;

/// Handler for parameter-stage failures; may turn them into a result string.
pub type ParameterErrorHook = Arc<dyn Fn(CommandError) -> Result<String> + Send + Sync>;

/// Executes a full command line on behalf of a brace substitution.
///
/// Implementations report an unknown command with
/// [`CommandError::CommandNotFound`]; the substitution then keeps the braced
/// text as is. Any other error aborts the enclosing command.
pub trait NestedExecutor: Send + Sync {
    fn execute(&self, line: &str) -> Result<String>;
}

/// A named command with a parameter schema and an action.
///
/// Running a command does not mutate it, so a single instance (or any of its
/// cheap clones) can serve concurrent callers.
#[derive(Clone)]
pub struct Command {
    name: String,
    description: String,
    schema: Schema,
    action: Action,
    nested: Option<Arc<dyn NestedExecutor>>,
    max_depth: usize,
    on_parameter_error: Option<ParameterErrorHook>,
}

impl Command {
    /// Shorthand for a command without description or nested execution.
    pub fn new<F>(name: impl Into<String>, schema: Vec<ParameterSpec>, action: F) -> Result<Self>
    where
        F: Fn(&Invocation) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        let mut builder = Command::builder(name).action(action);
        builder.specs = schema;
        builder.build()
    }

    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder {
            name: name.into(),
            description: String::new(),
            specs: Vec::new(),
            action: None,
            nested: None,
            max_depth: DEFAULT_MAX_DEPTH,
            on_parameter_error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// One-line usage, e.g. `move <x> <y> [label]`.
    pub fn usage(&self) -> String {
        let mut usage = self.name.clone();
        for spec in self.schema.specs() {
            if spec.optional {
                usage.push_str(&format!(" [{}]", spec.name));
            } else {
                usage.push_str(&format!(" <{}>", spec.name));
            }
        }
        usage
    }

    /// Whether the leading word of `line` is this command's name.
    pub fn can_execute(&self, line: &str) -> bool {
        split_name(line).0 == self.name
    }

    /// Scan, bind and execute `line`.
    ///
    /// The line must start with this command's name. Parameter-stage failures
    /// go through the parameter-error hook when one is set; all other
    /// failures are returned as they are.
    pub fn run(&self, types: &ParameterTypes, line: &str) -> Result<String> {
        if line.trim().is_empty() {
            return Err(CommandError::EmptyCommand);
        }

        let (word, raw) = split_name(line);
        if word != self.name {
            return Err(CommandError::WrongCommandName {
                expected: self.name.clone(),
                found: word.to_string(),
            });
        }
        debug!(command = %self.name, params = %raw, "running command");

        let tokens = lexer::split_into_tokens(raw, self.max_depth, |inner| {
            self.resolve_nested(inner)
        })?;

        let invocation = match binder::bind(&self.schema, types, tokens, raw) {
            Ok(invocation) => invocation,
            Err(e) => return self.parameter_error(e),
        };

        (self.action)(&invocation).map_err(CommandError::Action)
    }

    fn resolve_nested(&self, inner: &str) -> Result<String> {
        let Some(nested) = &self.nested else {
            return Ok(format!("{{{}}}", inner));
        };

        match nested.execute(inner) {
            Err(CommandError::CommandNotFound(name)) => {
                debug!(command = %name, "nested command not found, keeping literal text");
                Ok(format!("{{{}}}", inner))
            }
            other => other,
        }
    }

    fn parameter_error(&self, e: CommandError) -> Result<String> {
        match &self.on_parameter_error {
            Some(hook) if e.is_parameter_error() => hook(e),
            _ => Err(e),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("schema", &self.schema)
            .field("nested", &self.nested.is_some())
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Command`]; validation happens in [`CommandBuilder::build`].
pub struct CommandBuilder {
    name: String,
    description: String,
    specs: Vec<ParameterSpec>,
    action: Option<Action>,
    nested: Option<Arc<dyn NestedExecutor>>,
    max_depth: usize,
    on_parameter_error: Option<ParameterErrorHook>,
}

impl CommandBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append a required parameter.
    pub fn param(mut self, type_name: &str, name: &str) -> Self {
        self.specs.push(ParameterSpec::required(type_name, name));
        self
    }

    /// Append an optional parameter.
    pub fn optional_param(mut self, type_name: &str, name: &str) -> Self {
        self.specs.push(ParameterSpec::optional(type_name, name));
        self
    }

    pub fn spec(mut self, spec: ParameterSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&Invocation) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    /// Let brace substitutions execute through `executor`.
    pub fn nested(mut self, executor: Arc<dyn NestedExecutor>) -> Self {
        self.nested = Some(executor);
        self
    }

    /// Maximum brace nesting; 0 disables the limit.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn on_parameter_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(CommandError) -> Result<String> + Send + Sync + 'static,
    {
        self.on_parameter_error = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Result<Command> {
        if self.name.is_empty() {
            return Err(CommandError::ConstructionInvalid(
                "command name is empty".to_string(),
            ));
        }
        if self.name.contains(char::is_whitespace) {
            return Err(CommandError::ConstructionInvalid(format!(
                "command name `{}` contains whitespace",
                self.name
            )));
        }
        let Some(action) = self.action else {
            return Err(CommandError::ConstructionInvalid(format!(
                "command `{}` has no action",
                self.name
            )));
        };

        Ok(Command {
            schema: Schema::new(self.specs)?,
            name: self.name,
            description: self.description,
            action,
            nested: self.nested,
            max_depth: self.max_depth,
            on_parameter_error: self.on_parameter_error,
        })
    }
}

/// Split off the leading word. The remainder keeps its leading separator.
pub(crate) fn split_name(line: &str) -> (&str, &str) {
    let line = line.trim_start();
    match line.find(char::is_whitespace) {
        Some(pos) => line.split_at(pos),
        None => (line, ""),
    }
}
