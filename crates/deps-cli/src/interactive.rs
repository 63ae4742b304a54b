//! Terminal user interface for dependency requests
//!
//! Uses dialoguer for confirmations and colored for status output. All
//! output goes to stderr so that `--json` stdout stays machine readable.

use std::io::IsTerminal;

use async_trait::async_trait;
use colored::Colorize;
use deps_core::UserInterface;
use dialoguer::Confirm;

pub struct TerminalInterface {
    assume_yes: bool,
    interactive: bool,
}

impl TerminalInterface {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            interactive: std::io::stdin().is_terminal() && std::io::stderr().is_terminal(),
        }
    }
}

#[async_trait]
impl UserInterface for TerminalInterface {
    async fn confirm(&self, title: &str, message: &str) -> bool {
        eprintln!();
        eprintln!("{}", title.bold());
        eprintln!("{}", message);

        if self.assume_yes {
            eprintln!("{}", "Proceeding (--yes)".dimmed());
            return true;
        }
        if !self.interactive {
            eprintln!(
                "{}",
                "Not a terminal; re-run with --yes to install.".yellow()
            );
            return false;
        }

        let answer = tokio::task::spawn_blocking(|| {
            Confirm::new()
                .with_prompt("Install now?")
                .default(true)
                .interact()
        })
        .await;

        match answer {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Confirmation prompt failed");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Confirmation prompt task failed");
                false
            }
        }
    }

    fn report_error(&self, title: &str, message: &str) {
        eprintln!();
        eprintln!("{} {}", "error:".red().bold(), title.bold());
        for line in message.lines() {
            eprintln!("  {}", line);
        }
    }

    fn progress_started(&self, label: &str) {
        eprintln!("{}", label.dimmed());
    }

    fn install_started(&self, process_id: &str) {
        let heading = format!("Installing ({})", process_id);
        eprintln!("{} {}", "==>".cyan().bold(), heading.bold());
    }

    fn install_output(&self, line: &str) {
        eprintln!("    {}", line);
    }

    fn install_finished(&self, _process_id: &str) {
        eprintln!("{} {}", "==>".cyan().bold(), "Installer finished".bold());
    }
}
