use std::time::Duration;

use anyhow::{Context, Result};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;

/// Operator checkpoint between scrape phases.
pub trait Gate {
    /// `true` to scrape `provider`, `false` to stop the run.
    fn confirm(&mut self, provider: &str) -> Result<bool>;
}

/// Blocks on a terminal prompt. The prompt itself has no timeout, but the
/// browser shuts down once idle for `idle_limit`.
pub struct TerminalGate {
    pub idle_limit: Duration,
}

impl TerminalGate {
    fn prompt(&self, provider: &str) -> String {
        format!(
            "Ready to scrape {provider}? Finish any login in the browser first \
             (browser closes after {} min idle)",
            self.idle_limit.as_secs() / 60
        )
    }
}

impl Gate for TerminalGate {
    fn confirm(&mut self, provider: &str) -> Result<bool> {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(self.prompt(provider))
            .default(true)
            .interact()
            .context("gate prompt failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_provider_and_idle_limit() {
        let gate = TerminalGate {
            idle_limit: Duration::from_secs(90 * 60),
        };
        let prompt = gate.prompt("simplyhired");
        assert!(prompt.starts_with("Ready to scrape simplyhired?"));
        assert!(prompt.ends_with("(browser closes after 90 min idle)"));
    }
}
