//! `deps ensure <feature>`

use colored::Colorize;
use deps_core::Outcome;

use super::Context;
use crate::error::{CliError, Result};

pub async fn run_ensure(ctx: &Context, feature: &str, action: Option<&str>) -> Result<()> {
    let gate = ctx.gate();
    match gate.ensure(feature, action).await? {
        Outcome::Satisfied { installed, .. } => {
            if installed > 0 {
                println!(
                    "{} installed {} package(s) for {}",
                    "ok".green().bold(),
                    installed,
                    feature.bold()
                );
            } else {
                println!("{} {} is ready", "ok".green().bold(), feature.bold());
            }
            for capability in gate.capabilities().snapshot() {
                println!("   enabled {}", capability.cyan());
            }
            Ok(())
        }
        Outcome::Failed(failure) => Err(CliError::Failed(failure)),
    }
}
