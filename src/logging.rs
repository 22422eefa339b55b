//! One-shot initialisation of the `tracing` subscriber used by the binary.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT_ONCE: Once = Once::new();

/// Install a human-readable subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence; otherwise only warnings are shown, or
/// everything down to `debug` when `verbose` is set. Later calls are no-ops.
pub fn init(verbose: bool) {
    INIT_ONCE.call_once(|| {
        let default = if verbose {
            "inline_commands=debug"
        } else {
            "inline_commands=warn"
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

        // Another subscriber may already be installed (e.g. by an embedding application).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_idempotent() {
        init(false);
        init(true);
        tracing::debug!("logging initialised twice without panicking");
    }
}
