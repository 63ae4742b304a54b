//! `deps features`

use colored::Colorize;
use serde::Serialize;

use super::Context;
use crate::error::Result;

#[derive(Serialize)]
struct FeatureSummary<'a> {
    id: &'a str,
    label: &'a str,
    packages: Vec<String>,
    enables: &'a [String],
}

pub fn run_features(ctx: &Context, json: bool) -> Result<()> {
    let mut summaries = Vec::new();
    for feature in ctx.catalog.list() {
        let packages = ctx
            .catalog
            .dependencies(&feature.id)?
            .into_iter()
            .map(|d| d.name)
            .collect();
        summaries.push(FeatureSummary {
            id: &feature.id,
            label: &feature.label,
            packages,
            enables: &feature.enables,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    for summary in &summaries {
        println!(
            "{} {} {}",
            format!("{:<22}", summary.id).green().bold(),
            summary.label,
            format!("({} packages)", summary.packages.len()).dimmed()
        );
    }
    Ok(())
}
