//! `deps check <feature>`

use colored::Colorize;

use super::Context;
use crate::error::{CliError, Result};

pub async fn run_check(ctx: &Context, feature: &str, json: bool) -> Result<()> {
    let total = ctx.catalog.dependencies(feature)?.len();
    let unsatisfied = ctx.gate().check(feature).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&unsatisfied)?);
    } else if unsatisfied.is_empty() {
        println!(
            "{} all {} packages for {} are installed",
            "ok".green().bold(),
            total,
            feature.bold()
        );
    } else {
        for dep in &unsatisfied {
            let available = match dep.available_version.as_deref() {
                Some(version) if !version.is_empty() => format!("{} available", version),
                _ => "not available".to_string(),
            };
            let marker = if dep.is_version_conflict() {
                format!("{:<9}", "conflict").red().bold()
            } else {
                format!("{:<9}", "missing").yellow().bold()
            };
            println!("{} {} ({})", marker, dep, available.dimmed());
        }
    }

    if unsatisfied.is_empty() {
        Ok(())
    } else {
        Err(CliError::user(format!(
            "{} of {} packages for {} are not satisfied",
            unsatisfied.len(),
            total,
            feature
        )))
    }
}
