use anyhow::Context;
use argh::FromArgs;
use inline_commands::{DEFAULT_MAX_DEPTH, Interpreter, logging};

#[derive(FromArgs)]
/// Execute single-line commands with `{nested}` substitution.
/// Starts an interactive prompt unless `--exec` is given.
struct Args {
    #[argh(option, default = "DEFAULT_MAX_DEPTH")]
    /// maximum brace nesting per command; 0 disables the limit
    max_depth: usize,

    #[argh(option, short = 'e')]
    /// line to execute instead of starting the prompt; may be repeated
    exec: Vec<String>,

    #[argh(switch, short = 'v')]
    /// log debug output to stderr
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();
    logging::init(args.verbose);

    let sh = Interpreter::with_builtins(args.max_depth).context("installing built-in commands")?;

    if args.exec.is_empty() {
        sh.repl().context("interactive prompt failed")?;
        return Ok(());
    }

    for line in &args.exec {
        let output = sh
            .run(line)
            .with_context(|| format!("failed to execute `{}`", line))?;
        println!("{}", output);
    }
    Ok(())
}
