use crate::command::{self, Command, CommandBuilder, NestedExecutor};
use crate::error::{CommandError, Result};
use crate::types::ParameterTypes;
use crate::value::ParameterValue;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tracing::debug;

struct Shared {
    commands: RwLock<BTreeMap<String, Command>>,
    types: RwLock<Arc<ParameterTypes>>,
}

/// Name-keyed store of commands that executes whole lines.
///
/// The registry is a cheap handle: clones share the same commands and
/// parameter types. It is also the usual [`NestedExecutor`] for brace
/// substitutions, see [`CommandRegistry::builder`].
///
/// Example
/// ```
/// use inline_commands::CommandRegistry;
///
/// let registry = CommandRegistry::new();
/// let add = registry
///     .builder("add")
///     .param("int", "a")
///     .param("int", "b")
///     .action(|inv| Ok((inv.int("a").unwrap_or(0) + inv.int("b").unwrap_or(0)).to_string()))
///     .build()
///     .unwrap();
/// registry.add(add).unwrap();
///
/// assert_eq!(registry.execute("add {add 1 2} 4").unwrap(), "7");
/// ```
#[derive(Clone)]
pub struct CommandRegistry {
    inner: Arc<Shared>,
}

impl CommandRegistry {
    /// An empty registry with the built-in parameter types.
    pub fn new() -> Self {
        Self::with_types(ParameterTypes::default())
    }

    pub fn with_types(types: ParameterTypes) -> Self {
        Self {
            inner: Arc::new(Shared {
                commands: RwLock::new(BTreeMap::new()),
                types: RwLock::new(Arc::new(types)),
            }),
        }
    }

    /// Start a command whose brace substitutions execute through this registry.
    pub fn builder(&self, name: impl Into<String>) -> CommandBuilder {
        Command::builder(name).nested(self.nested_executor())
    }

    /// Executor handle for commands stored in this registry.
    ///
    /// Holds the registry weakly, so commands registered here do not keep it
    /// alive.
    pub fn nested_executor(&self) -> Arc<dyn NestedExecutor> {
        Arc::new(self.downgrade())
    }

    /// A handle that does not keep the registry alive.
    pub fn downgrade(&self) -> WeakCommandRegistry {
        WeakCommandRegistry(Arc::downgrade(&self.inner))
    }

    pub fn add(&self, command: Command) -> Result<()> {
        let mut commands = self
            .inner
            .commands
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if commands.contains_key(command.name()) {
            return Err(CommandError::DuplicateCommandName(command.name().to_string()));
        }
        debug!(command = %command.name(), "adding command");
        commands.insert(command.name().to_string(), command);
        Ok(())
    }

    pub fn remove(&self, name: &str) -> Result<Command> {
        let mut commands = self
            .inner
            .commands
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let removed = commands
            .remove(name)
            .ok_or_else(|| CommandError::CommandNotFound(name.to_string()))?;
        debug!(command = %name, "removed command");
        Ok(removed)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner
            .commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner
            .commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the registered commands, ordered by name.
    pub fn list(&self) -> Vec<Command> {
        self.inner
            .commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Register a parameter type; the first registration of a name wins.
    ///
    /// Commands already in the registry pick the type up on their next run.
    pub fn register_type<F>(&self, name: impl Into<String>, parse: F) -> bool
    where
        F: Fn(&str) -> anyhow::Result<ParameterValue> + Send + Sync + 'static,
    {
        let mut types = self
            .inner
            .types
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::make_mut(&mut *types).register(name, parse)
    }

    /// Current parameter type table.
    pub fn types(&self) -> Arc<ParameterTypes> {
        self.inner
            .types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Look up the command named by the first word of `line` and run it.
    pub fn execute(&self, line: &str) -> Result<String> {
        execute_shared(&self.inner, line)
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NestedExecutor for CommandRegistry {
    fn execute(&self, line: &str) -> Result<String> {
        execute_shared(&self.inner, line)
    }
}

/// Weak counterpart of [`CommandRegistry`], for commands that need to reach
/// the registry they live in.
#[derive(Clone)]
pub struct WeakCommandRegistry(Weak<Shared>);

impl WeakCommandRegistry {
    pub fn upgrade(&self) -> Option<CommandRegistry> {
        self.0.upgrade().map(|inner| CommandRegistry { inner })
    }
}

impl NestedExecutor for WeakCommandRegistry {
    fn execute(&self, line: &str) -> Result<String> {
        match self.0.upgrade() {
            Some(shared) => execute_shared(&shared, line),
            None => Err(CommandError::CommandNotFound(
                command::split_name(line).0.to_string(),
            )),
        }
    }
}

fn execute_shared(shared: &Shared, line: &str) -> Result<String> {
    if line.trim().is_empty() {
        return Err(CommandError::EmptyCommand);
    }
    let (name, _) = command::split_name(line);

    // Take private copies so no lock is held while the command runs; nested
    // substitutions re-enter this function.
    let command = shared
        .commands
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
        .cloned()
        .ok_or_else(|| CommandError::CommandNotFound(name.to_string()))?;
    let types = shared
        .types
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();

    debug!(command = %name, "executing");
    command.run(&types, line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn sum_command(registry: &CommandRegistry) -> Command {
        registry
            .builder("sum")
            .param("int", "a")
            .param("int", "b")
            .action(|inv| {
                Ok((inv.int("a").unwrap_or_default() + inv.int("b").unwrap_or_default()).to_string())
            })
            .build()
            .unwrap()
    }

    fn echo_command(registry: &CommandRegistry) -> Command {
        registry
            .builder("echo")
            .action(|inv| Ok(inv.tokens().join(" ")))
            .build()
            .unwrap()
    }

    #[test]
    fn test_add_rejects_duplicate_names() {
        let registry = CommandRegistry::new();
        registry.add(sum_command(&registry)).unwrap();

        let res = registry.add(sum_command(&registry));
        assert!(matches!(res, Err(CommandError::DuplicateCommandName(n)) if n == "sum"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove() {
        let registry = CommandRegistry::new();
        registry.add(sum_command(&registry)).unwrap();

        let removed = registry.remove("sum").unwrap();
        assert_eq!(removed.name(), "sum");
        assert!(registry.is_empty());

        assert!(matches!(
            registry.remove("sum"),
            Err(CommandError::CommandNotFound(n)) if n == "sum"
        ));
    }

    #[test]
    fn test_execute_unknown_and_empty() {
        let registry = CommandRegistry::new();

        assert!(matches!(
            registry.execute("nope 1 2"),
            Err(CommandError::CommandNotFound(n)) if n == "nope"
        ));
        assert!(matches!(registry.execute(" "), Err(CommandError::EmptyCommand)));
    }

    #[test]
    fn test_execute_with_nested_substitution() {
        let registry = CommandRegistry::new();
        registry.add(sum_command(&registry)).unwrap();
        registry.add(echo_command(&registry)).unwrap();

        assert_eq!(registry.execute("sum 3 4").unwrap(), "7");
        assert_eq!(registry.execute("sum {sum 1 2} {sum 3 {sum 4 5}}").unwrap(), "15");
        assert_eq!(
            registry.execute("echo a {echo b \"c d\"} e").unwrap(),
            "a b c d e"
        );
    }

    #[test]
    fn test_unregistered_nested_command_stays_literal() {
        let registry = CommandRegistry::new();
        registry.add(echo_command(&registry)).unwrap();

        assert_eq!(registry.execute("echo {shout hi}").unwrap(), "{shout hi}");
    }

    #[test]
    fn test_nested_parameter_error_aborts() {
        let registry = CommandRegistry::new();
        registry.add(sum_command(&registry)).unwrap();
        registry.add(echo_command(&registry)).unwrap();

        assert!(matches!(
            registry.execute("echo {sum 1}"),
            Err(CommandError::MissingParameter(n)) if n == "b"
        ));
    }

    #[test]
    fn test_list_is_sorted_snapshot() {
        let registry = CommandRegistry::new();
        registry.add(sum_command(&registry)).unwrap();
        registry.add(echo_command(&registry)).unwrap();

        let names: Vec<String> = registry.list().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["echo", "sum"]);

        registry.remove("echo").unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn test_register_type_applies_to_existing_commands() {
        let registry = CommandRegistry::new();
        let paint = registry
            .builder("paint")
            .param("color", "c")
            .action(|inv| Ok(inv.text("c").unwrap_or_default().to_string()))
            .build()
            .unwrap();
        registry.add(paint).unwrap();

        assert!(matches!(
            registry.execute("paint red"),
            Err(CommandError::UnknownParameterType(_))
        ));

        assert!(registry.register_type("color", |s| Ok(ParameterValue::Text(s.to_uppercase()))));
        assert!(!registry.register_type("color", |s| Ok(ParameterValue::Text(s.to_string()))));
        assert_eq!(registry.execute("paint red").unwrap(), "RED");
    }

    #[test]
    fn test_weak_executor_after_registry_dropped() {
        let registry = CommandRegistry::new();
        let executor = registry.nested_executor();
        drop(registry);

        assert!(matches!(
            executor.execute("sum 1 2"),
            Err(CommandError::CommandNotFound(n)) if n == "sum"
        ));
    }

    #[test]
    fn test_concurrent_executions_are_isolated() {
        let registry = CommandRegistry::new();
        let show = registry
            .builder("show")
            .param("int", "n")
            .optional_param("string", "tag")
            .action(|inv| {
                Ok(format!(
                    "{}:{}:{}",
                    inv.int("n").unwrap_or_default(),
                    inv.text("tag").unwrap_or("-"),
                    inv.raw().trim()
                ))
            })
            .build()
            .unwrap();
        registry.add(show).unwrap();
        registry.add(sum_command(&registry)).unwrap();

        thread::scope(|s| {
            for t in 0..8 {
                let registry = registry.clone();
                s.spawn(move || {
                    for i in 0..100 {
                        let n = t * 1000 + i;
                        let line = format!("show {{sum {} 0}} t{}", n, t);
                        let expected = format!("{}:t{}:{{sum {} 0}} t{}", n, t, n, t);
                        assert_eq!(registry.execute(&line).unwrap(), expected);
                    }
                });
            }
        });
    }
}
