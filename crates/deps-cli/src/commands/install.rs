//! `deps install <package>...`

use colored::Colorize;
use deps_core::{Dependency, Outcome};

use super::Context;
use crate::error::{CliError, Result};

pub async fn run_install(ctx: &Context, packages: &[String]) -> Result<()> {
    for package in packages {
        Dependency::remote(package.as_str(), "").validate()?;
    }

    let outcome = ctx
        .manager
        .install_packages(packages.iter().cloned(), |_| {})
        .await;

    match outcome {
        Outcome::Satisfied { installed, .. } => {
            println!("{} installed {} package(s)", "ok".green().bold(), installed);
            Ok(())
        }
        Outcome::Failed(failure) => Err(CliError::Failed(failure)),
    }
}
