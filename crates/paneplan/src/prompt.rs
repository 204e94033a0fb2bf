use std::io::{self, BufRead, Write};

use paneplan_core::ConfirmPrompt;
use tracing::warn;

/// Asks on stderr and reads the answer from stdin. Anything but `y`/`yes` declines.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct StdinPrompt;

impl ConfirmPrompt for StdinPrompt {
    fn confirm(&self, message: &str) -> bool {
        eprint!("{} [y/N] ", message);
        if let Err(e) = io::stderr().flush() {
            warn!(event = "cli.prompt.flush_failed", error = %e);
        }

        let mut input = String::new();
        match io::stdin().lock().read_line(&mut input) {
            Ok(_) => is_confirmation_accepted(&input),
            Err(e) => {
                warn!(event = "cli.prompt.read_failed", error = %e);
                false
            }
        }
    }
}

pub(crate) fn is_confirmation_accepted(input: &str) -> bool {
    let normalized = input.trim().to_lowercase();
    normalized == "y" || normalized == "yes"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_confirmation_accepted() {
        assert!(is_confirmation_accepted("y\n"));
        assert!(is_confirmation_accepted("  YES "));
        assert!(!is_confirmation_accepted(""));
        assert!(!is_confirmation_accepted("n"));
        assert!(!is_confirmation_accepted("yep"));
    }
}
