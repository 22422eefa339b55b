use crate::builtin;
use crate::error::Result;
use crate::registry::CommandRegistry;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

/// Line-oriented front end over a [`CommandRegistry`].
///
/// Example
/// ```
/// use inline_commands::{DEFAULT_MAX_DEPTH, Interpreter};
/// let sh = Interpreter::with_builtins(DEFAULT_MAX_DEPTH).unwrap();
/// assert_eq!(sh.run("upper {echo hello world}").unwrap(), "HELLO WORLD");
/// ```
pub struct Interpreter {
    registry: CommandRegistry,
}

impl Interpreter {
    /// Wrap an existing registry.
    pub fn new(registry: CommandRegistry) -> Self {
        Self { registry }
    }

    /// A registry populated with the built-in commands, each allowing
    /// `max_depth` levels of brace nesting.
    pub fn with_builtins(max_depth: usize) -> Result<Self> {
        let registry = CommandRegistry::new();
        builtin::install(&registry, max_depth)?;
        Ok(Self::new(registry))
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Execute one line and return its result.
    pub fn run(&self, line: &str) -> Result<String> {
        self.registry.execute(line)
    }

    /// Read-eval-print loop on the terminal until EOF or Ctrl-C.
    pub fn repl(&self) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;

        loop {
            match rl.readline("> ") {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line.as_str())?;
                    match self.run(&line) {
                        Ok(output) => println!("{}", output),
                        Err(e) => println!("error: {}", e),
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::DEFAULT_MAX_DEPTH;
    use crate::error::CommandError;

    #[test]
    fn test_with_builtins_installs_commands() {
        let sh = Interpreter::with_builtins(DEFAULT_MAX_DEPTH).unwrap();
        assert!(sh.registry().contains("echo"));
        assert!(sh.registry().contains("help"));
        assert_eq!(sh.run("sum 2 {sum 3 4}").unwrap(), "9");
    }

    #[test]
    fn test_depth_is_configurable() {
        let sh = Interpreter::with_builtins(1).unwrap();
        assert_eq!(sh.run("upper {echo a}").unwrap(), "A");
        assert!(matches!(
            sh.run("upper {echo {echo a}}"),
            Err(CommandError::NestingLimitExceeded { limit: 1 })
        ));

        let sh = Interpreter::with_builtins(0).unwrap();
        assert_eq!(sh.run("upper {echo {echo {echo {echo a}}}}").unwrap(), "A");
    }

    #[test]
    fn test_unknown_command() {
        let sh = Interpreter::with_builtins(DEFAULT_MAX_DEPTH).unwrap();
        assert!(matches!(
            sh.run("frobnicate 1"),
            Err(CommandError::CommandNotFound(n)) if n == "frobnicate"
        ));
    }
}
