//! `license-expr` — parse, compare and evaluate SPDX license expressions.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]).
//! 2. Load config ([`license_expr::config::load_config`]) and set up logging.
//! 3. Parse the given expressions against the catalog.
//! 4. Run the requested operation and render it ([`report`]).
//! 5. Exit `0`, or `1` on a parse failure, a non-equivalent `equals`, or an
//!    `error` verdict from `check`.

mod cli;
mod report;

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;

use cli::{Cli, Command, ReportFormat};
use license_expr::config::{load_config, Config};
use license_expr::license::classifier::{classify, expression_risk, license_risk};
use license_expr::license::declared::normalize_declared;
use license_expr::logging::init_tracing;
use license_expr::models::{CheckResult, LicenseRisk, PolicyVerdict};
use license_expr::policy::{choice_to_string, evaluate};
use license_expr::{parse_with, Catalog, Expression, ParseOptions};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(Path::new("."), cli.config.as_deref())?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    init_tracing(&config.logging)?;

    let mut options = config.parser.clone();
    if cli.lenient {
        options.strict = false;
    }

    let custom_catalog = config.catalog.load()?;
    let catalog = custom_catalog.as_ref().unwrap_or_else(|| Catalog::builtin());

    let ok = run(&cli, &config, catalog, &options)?;
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

/// Execute the subcommand; `Ok(false)` maps to exit code 1.
fn run(cli: &Cli, config: &Config, catalog: &Catalog, options: &ParseOptions) -> Result<bool> {
    let parse = |text: &str| -> Result<Expression> {
        parse_with(text, catalog, options).map_err(|err| {
            if cli.report == ReportFormat::Terminal {
                report::terminal::render_syntax_error(text, &err);
            }
            anyhow::Error::new(err).context(format!("failed to parse '{}'", text))
        })
    };

    match &cli.command {
        Command::Parse {
            expression,
            normalize,
        } => {
            let mut expr = parse(expression)?;
            if *normalize {
                expr = expr.normalize_deprecated(catalog);
            }
            match cli.report {
                ReportFormat::Terminal => report::terminal::render_parse(&expr, catalog, cli.quiet),
                ReportFormat::Json => print_json(&json!({
                    "canonical": expr.to_canonical_string(),
                    "tree": &expr,
                    "unrecognized": expr.unrecognized_licenses(),
                }))?,
            }
            Ok(true)
        }
        Command::Simplify { expression } => {
            let simplified = parse(expression)?.simplify();
            match cli.report {
                ReportFormat::Terminal => println!("{}", simplified),
                ReportFormat::Json => print_json(&json!({
                    "canonical": simplified.to_canonical_string(),
                    "tree": &simplified,
                }))?,
            }
            Ok(true)
        }
        Command::Decompose { expression } => {
            let expr = parse(expression)?;
            let choices = expr.decompose();
            match cli.report {
                ReportFormat::Terminal => {
                    report::terminal::render_choices(&expr, &choices, cli.quiet)
                }
                ReportFormat::Json => print_json(&json!({
                    "expression": expr.to_canonical_string(),
                    "choices": choices,
                }))?,
            }
            Ok(true)
        }
        Command::Equals { left, right } => {
            let left = parse(left)?;
            let right = parse(right)?;
            let equivalent = left.equivalent(&right);
            match cli.report {
                ReportFormat::Terminal => {
                    report::terminal::render_equivalence(&left, &right, equivalent)
                }
                ReportFormat::Json => print_json(&json!({
                    "left": left.to_canonical_string(),
                    "right": right.to_canonical_string(),
                    "equivalent": equivalent,
                }))?,
            }
            Ok(equivalent)
        }
        Command::Classify { expression } => {
            let expr = parse(expression)?;
            let table = config.classification_table();
            let classified = classify(&expr, &table);
            let risks: BTreeMap<_, LicenseRisk> = classified
                .keys()
                .map(|id| (id.clone(), license_risk(&table, id.as_str())))
                .collect();
            let overall = expression_risk(&expr, &table);
            match cli.report {
                ReportFormat::Terminal => report::terminal::render_classification(
                    &classified,
                    &risks,
                    overall,
                    cli.quiet,
                ),
                ReportFormat::Json => {
                    let licenses: Vec<_> = classified
                        .iter()
                        .map(|(id, categories)| {
                            json!({
                                "license": id,
                                "categories": categories,
                                "risk": risks.get(id),
                            })
                        })
                        .collect();
                    print_json(&json!({
                        "expression": expr.to_canonical_string(),
                        "licenses": licenses,
                        "risk": overall,
                    }))?
                }
            }
            Ok(true)
        }
        Command::Check {
            expressions,
            declared,
            verbose,
        } => {
            let table = config.classification_table();
            let results: Vec<CheckResult> = expressions
                .iter()
                .map(|input| check_one(input, *declared, config, &table, catalog, options))
                .collect();

            match cli.report {
                ReportFormat::Terminal => {
                    report::terminal::render_check(&results, *verbose, cli.quiet)
                }
                ReportFormat::Json => print_json(&results)?,
            }

            Ok(!results.iter().any(|r| r.verdict == PolicyVerdict::Error))
        }
        Command::Lookup { id } => {
            let (entry, kind) = match catalog.lookup_license(id) {
                Some(entry) => (entry, "license"),
                None => (
                    catalog
                        .lookup_exception(id)
                        .with_context(|| format!("'{}' is not in the license catalog", id))?,
                    "exception",
                ),
            };
            match cli.report {
                ReportFormat::Terminal => report::terminal::render_lookup(entry, kind),
                ReportFormat::Json => print_json(&json!({ "kind": kind, "entry": entry }))?,
            }
            Ok(true)
        }
    }
}

/// Parse and evaluate one `check` input; parse failures become error verdicts.
fn check_one(
    input: &str,
    declared: bool,
    config: &Config,
    table: &license_expr::ClassificationTable,
    catalog: &Catalog,
    options: &ParseOptions,
) -> CheckResult {
    let text = if declared {
        normalize_declared(input)
    } else {
        Some(input.trim().to_string())
    };

    let Some(text) = text else {
        return CheckResult {
            input: input.to_string(),
            expression: None,
            risk: LicenseRisk::Unknown,
            verdict: config.policy.default.to_verdict(),
            best_choice: None,
            error: None,
        };
    };

    match parse_with(&text, catalog, options) {
        Ok(expr) => {
            let evaluation = evaluate(&expr, &config.policy, table);
            CheckResult {
                input: input.to_string(),
                expression: Some(expr.to_canonical_string()),
                risk: expression_risk(&expr, table),
                verdict: evaluation.verdict,
                best_choice: evaluation.best_choice.as_ref().map(choice_to_string),
                error: None,
            }
        }
        Err(err) => {
            tracing::warn!(input, error = %err, "expression failed to parse");
            CheckResult {
                input: input.to_string(),
                expression: None,
                risk: LicenseRisk::Unknown,
                verdict: PolicyVerdict::Error,
                best_choice: None,
                error: Some(err.to_string()),
            }
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
