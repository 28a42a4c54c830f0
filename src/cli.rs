use std::path::PathBuf;

use clap::{Parser, Subcommand};

use license_expr::logging::LogFormat;

#[derive(Parser, Debug)]
#[command(
    name = "license-expr",
    about = "Parse, compare and evaluate SPDX license expressions",
    version
)]
pub struct Cli {
    /// Config file [default: ./.license-expr/config.toml, fallback ~/.config/license-expr/config.toml]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(long, global = true, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Accept license ids missing from the catalog instead of rejecting them
    #[arg(long, global = true)]
    pub lenient: bool,

    /// Log filter, e.g. `debug` (overrides the config file; RUST_LOG overrides both)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_name = "FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Only print summary lines
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse an expression and show its canonical form and leaves
    Parse {
        expression: String,
        /// Rewrite deprecated identifiers to their current form
        #[arg(long)]
        normalize: bool,
    },
    /// Remove duplicate operands and redundant nesting
    Simplify { expression: String },
    /// List the license choices an expression offers
    Decompose { expression: String },
    /// Compare two expressions, ignoring operand order (exit 1 if they differ)
    Equals { left: String, right: String },
    /// Show the categories and risk of every license in an expression
    Classify { expression: String },
    /// Evaluate expressions against the policy (exit 1 on any error verdict)
    Check {
        #[arg(required = true)]
        expressions: Vec<String>,
        /// Treat inputs as free-text declared licenses (e.g. "MIT/Apache 2.0")
        #[arg(long)]
        declared: bool,
        /// Show passing expressions too
        #[arg(short, long)]
        verbose: bool,
    },
    /// Look up a license or exception in the catalog by id or name
    Lookup { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}
