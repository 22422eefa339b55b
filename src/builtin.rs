use crate::binder::Invocation;
use crate::command::CommandBuilder;
use crate::error::Result;
use crate::registry::{CommandRegistry, WeakCommandRegistry};
use crate::value::ParameterValue;
use anyhow::Context;
use regex::{Regex, RegexBuilder};

/// Commands shipped with the interpreter binary.
///
/// Each one declares its parameters on a builder and maps the bound
/// invocation to a string.
pub(crate) trait BuiltinCommand: 'static {
    /// Canonical name of the command, e.g. "echo" or "sum".
    fn name() -> &'static str;

    fn description() -> &'static str;

    /// Add the command's parameters to `builder`.
    fn declare(builder: CommandBuilder) -> CommandBuilder {
        builder
    }

    fn execute(inv: &Invocation) -> anyhow::Result<String>;
}

fn install_one<T: BuiltinCommand>(registry: &CommandRegistry, max_depth: usize) -> Result<()> {
    let builder = registry
        .builder(T::name())
        .description(T::description())
        .max_depth(max_depth);
    let command = T::declare(builder).action(T::execute).build()?;
    registry.add(command)
}

/// Register the `ident` parameter type and every built-in command.
pub fn install(registry: &CommandRegistry, max_depth: usize) -> Result<()> {
    let ident = Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").context("building ident pattern")?;
    registry.register_type("ident", move |s| {
        if ident.is_match(s) {
            Ok(ParameterValue::Text(s.to_string()))
        } else {
            Err(anyhow::anyhow!("not an identifier: {}", s))
        }
    });

    install_one::<Echo>(registry, max_depth)?;
    install_one::<Sum>(registry, max_depth)?;
    install_one::<Upper>(registry, max_depth)?;
    install_one::<Repeat>(registry, max_depth)?;
    install_one::<Grep>(registry, max_depth)?;

    let weak = registry.downgrade();
    let help = registry
        .builder("help")
        .description("list commands, or describe one")
        .optional_param("ident", "command")
        .max_depth(max_depth)
        .action(move |inv| describe_commands(&weak, inv.text("command")))
        .build()?;
    registry.add(help)
}

/// Write the arguments back, separated by spaces.
pub(crate) struct Echo;

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn description() -> &'static str {
        "print the arguments separated by spaces"
    }

    fn execute(inv: &Invocation) -> anyhow::Result<String> {
        Ok(inv.tokens().join(" "))
    }
}

/// Add two numbers.
pub(crate) struct Sum;

impl BuiltinCommand for Sum {
    fn name() -> &'static str {
        "sum"
    }

    fn description() -> &'static str {
        "add two numbers"
    }

    fn declare(builder: CommandBuilder) -> CommandBuilder {
        builder.param("float", "a").param("float", "b")
    }

    fn execute(inv: &Invocation) -> anyhow::Result<String> {
        let a = inv.float("a").context("sum: missing a")?;
        let b = inv.float("b").context("sum: missing b")?;
        Ok((a + b).to_string())
    }
}

pub(crate) struct Upper;

impl BuiltinCommand for Upper {
    fn name() -> &'static str {
        "upper"
    }

    fn description() -> &'static str {
        "convert text to upper case"
    }

    fn declare(builder: CommandBuilder) -> CommandBuilder {
        builder.param("string", "text")
    }

    fn execute(inv: &Invocation) -> anyhow::Result<String> {
        Ok(inv.text("text").unwrap_or_default().to_uppercase())
    }
}

/// Upper bound on the output of `repeat`, in bytes.
const MAX_REPEAT_BYTES: usize = 1 << 20;

/// Repeat a piece of text, joined by an optional separator (a space by default).
pub(crate) struct Repeat;

impl BuiltinCommand for Repeat {
    fn name() -> &'static str {
        "repeat"
    }

    fn description() -> &'static str {
        "repeat text a number of times"
    }

    fn declare(builder: CommandBuilder) -> CommandBuilder {
        builder
            .param("int", "count")
            .param("string", "text")
            .optional_param("string", "separator")
    }

    fn execute(inv: &Invocation) -> anyhow::Result<String> {
        let count = inv.int("count").context("repeat: missing count")?;
        let count = usize::try_from(count)
            .map_err(|_| anyhow::anyhow!("repeat: count must not be negative, got {}", count))?;
        let text = inv.text("text").unwrap_or_default();
        let separator = inv.text("separator").unwrap_or(" ");

        let size = text
            .len()
            .checked_mul(count)
            .zip(separator.len().checked_mul(count.saturating_sub(1)))
            .and_then(|(body, gaps)| body.checked_add(gaps))
            .filter(|size| *size <= MAX_REPEAT_BYTES);
        if size.is_none() {
            anyhow::bail!("repeat: output would exceed {} bytes", MAX_REPEAT_BYTES);
        }

        Ok(vec![text; count].join(separator))
    }
}

/// Print the parts of a text matching a regular expression.
pub(crate) struct Grep;

impl BuiltinCommand for Grep {
    fn name() -> &'static str {
        "grep"
    }

    fn description() -> &'static str {
        "print the matches of a pattern in a text; flags: i (ignore case), w (whole words)"
    }

    fn declare(builder: CommandBuilder) -> CommandBuilder {
        builder
            .param("string", "pattern")
            .param("string", "text")
            .optional_param("string", "flags")
    }

    fn execute(inv: &Invocation) -> anyhow::Result<String> {
        let user_pattern = inv.text("pattern").unwrap_or_default();
        let flags = inv.text("flags").unwrap_or_default();

        let pattern = if flags.contains('w') {
            format!(r"\b({})\b", user_pattern)
        } else {
            user_pattern.to_string()
        };

        let re = RegexBuilder::new(&pattern)
            .case_insensitive(flags.contains('i'))
            .build()
            .with_context(|| format!("Invalid regex pattern: {}", pattern))?;

        let text = inv.text("text").unwrap_or_default();
        let matches: Vec<&str> = re.find_iter(text).map(|m| m.as_str()).collect();
        Ok(matches.join(" "))
    }
}

fn describe_commands(registry: &WeakCommandRegistry, name: Option<&str>) -> anyhow::Result<String> {
    let registry = registry
        .upgrade()
        .context("help: command registry is gone")?;

    match name {
        Some(name) => {
            let command = registry
                .list()
                .into_iter()
                .find(|c| c.name() == name)
                .with_context(|| format!("help: no command named {}", name))?;
            Ok(format!("{} - {}", command.usage(), command.description()))
        }
        None => {
            let lines: Vec<String> = registry
                .list()
                .iter()
                .map(|c| format!("{} - {}", c.usage(), c.description()))
                .collect();
            Ok(lines.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CommandError;

    fn registry() -> CommandRegistry {
        let registry = CommandRegistry::new();
        install(&registry, 3).unwrap();
        registry
    }

    #[test]
    fn test_echo_and_upper() {
        let registry = registry();

        assert_eq!(registry.execute("echo hello   world").unwrap(), "hello world");
        assert_eq!(
            registry.execute("upper \"mixed Case\"").unwrap(),
            "MIXED CASE"
        );
    }

    #[test]
    fn test_sum_accepts_ints_and_floats() {
        let registry = registry();

        assert_eq!(registry.execute("sum 3 4").unwrap(), "7");
        assert_eq!(registry.execute("sum 1.5 -0.25").unwrap(), "1.25");
        assert!(matches!(
            registry.execute("sum one 2"),
            Err(CommandError::ParameterTypeMismatch { name, .. }) if name == "a"
        ));
    }

    #[test]
    fn test_repeat() {
        let registry = registry();

        assert_eq!(registry.execute("repeat 3 ab").unwrap(), "ab ab ab");
        assert_eq!(registry.execute("repeat 2 x -").unwrap(), "x-x");
        assert_eq!(registry.execute("repeat 0 x").unwrap(), "");
        assert!(matches!(
            registry.execute("repeat -1 x"),
            Err(CommandError::Action(_))
        ));
    }

    #[test]
    fn test_repeat_rejects_oversized_output() {
        let registry = registry();

        assert!(matches!(
            registry.execute("repeat 9223372036854775807 x"),
            Err(CommandError::Action(_))
        ));
        assert!(matches!(
            registry.execute("repeat 1000000000 x"),
            Err(CommandError::Action(_))
        ));
        // Empty text still costs one separator byte per gap.
        assert!(matches!(
            registry.execute("repeat 2000000 \"\""),
            Err(CommandError::Action(_))
        ));
        assert_eq!(registry.execute("repeat 4 \"\" ,").unwrap(), ",,,");
    }

    #[test]
    fn test_grep() {
        let registry = registry();

        assert_eq!(
            registry.execute("grep \"[0-9]+\" \"a1 b22 c333\"").unwrap(),
            "1 22 333"
        );
        assert_eq!(registry.execute("grep cat \"Cat cat\" i").unwrap(), "Cat cat");
        assert_eq!(
            registry.execute("grep cat \"cat concat\" w").unwrap(),
            "cat"
        );
        assert!(matches!(
            registry.execute("grep \"(\" text"),
            Err(CommandError::Action(_))
        ));
    }

    #[test]
    fn test_builtins_compose_through_braces() {
        let registry = registry();

        assert_eq!(
            registry.execute("upper {repeat 2 {echo ha}}").unwrap(),
            "HA HA"
        );
        assert_eq!(registry.execute("sum {sum 1 2} {sum 3 4}").unwrap(), "10");
    }

    #[test]
    fn test_help() {
        let registry = registry();

        let all = registry.execute("help").unwrap();
        assert!(all.lines().any(|l| l.starts_with("sum <a> <b>")));
        assert!(all.lines().any(|l| l.starts_with("help [command]")));

        assert_eq!(
            registry.execute("help upper").unwrap(),
            "upper <text> - convert text to upper case"
        );
        assert!(matches!(
            registry.execute("help 9lives"),
            Err(CommandError::ParameterTypeMismatch { name, .. }) if name == "command"
        ));
        assert!(matches!(
            registry.execute("help missing"),
            Err(CommandError::Action(_))
        ));
    }

    #[test]
    fn test_install_twice_fails() {
        let registry = registry();
        assert!(matches!(
            install(&registry, 3),
            Err(CommandError::DuplicateCommandName(n)) if n == "echo"
        ));
    }
}
