//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// deps - make sure the packages a feature needs are installed
#[derive(Parser, Debug)]
#[command(name = "deps")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to ./deps.toml, then the user config dir)
    #[arg(long, global = true, env = "DEPS_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List catalog features
    Features {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show which of a feature's packages are missing or outdated
    Check {
        /// Feature id
        feature: String,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Install whatever a feature is missing, asking first
    ///
    /// Examples:
    ///   deps ensure import-csv
    ///   deps ensure rmarkdown --yes
    ///   deps ensure shiny --action "Running app.R"
    Ensure {
        /// Feature id
        feature: String,

        /// Answer yes to the installation prompt
        #[arg(short, long)]
        yes: bool,

        /// What the user is trying to do, shown in the prompt
        #[arg(short, long)]
        action: Option<String>,
    },

    /// Install packages from the public repository without checking first
    Install {
        /// Package names
        #[arg(required = true)]
        packages: Vec<String>,
    },
}
