use std::collections::{BTreeMap, BTreeSet};

use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use license_expr::license::algebra::LicenseChoice;
use license_expr::license::catalog::{Catalog, CatalogEntry};
use license_expr::license::classifier::Category;
use license_expr::license::expression::{Expression, LicenseId, LicenseKind};
use license_expr::models::{CheckResult, LicenseRisk, PolicyVerdict};
use license_expr::policy::choice_to_string;
use license_expr::SyntaxError;

fn header_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| header_cell(h)).collect::<Vec<_>>());
    table
}

fn risk_color(risk: LicenseRisk) -> Color {
    match risk {
        LicenseRisk::Permissive => Color::Green,
        LicenseRisk::WeakCopyleft => Color::Yellow,
        LicenseRisk::StrongCopyleft => Color::Red,
        LicenseRisk::Proprietary => Color::Magenta,
        LicenseRisk::Unknown => Color::DarkGrey,
    }
}

fn verdict_cell(verdict: PolicyVerdict) -> Cell {
    let (text, color) = match verdict {
        PolicyVerdict::Pass => ("✓ pass", Color::Green),
        PolicyVerdict::Warn => ("⚠ warn", Color::Yellow),
        PolicyVerdict::Error => ("✗ error", Color::Red),
    };
    Cell::new(text).fg(color).set_alignment(CellAlignment::Center)
}

/// Print a parse failure with a caret under the offending position.
pub fn render_syntax_error(input: &str, err: &SyntaxError) {
    let column = input
        .char_indices()
        .take_while(|(i, _)| *i < err.position)
        .count();
    eprintln!("{} {}", "error:".red().bold(), err.message());
    eprintln!("  {}", input);
    eprintln!("  {}{}", " ".repeat(column), "^".red().bold());
}

/// Canonical form plus one row per leaf license.
pub fn render_parse(expr: &Expression, catalog: &Catalog, quiet: bool) {
    println!("{}", expr.to_canonical_string().bold());
    if quiet {
        return;
    }

    let mut table = new_table(&["License", "Kind", "Or later", "Exception", "Deprecated"]);
    let exceptions = leaf_exceptions(expr);
    for (simple, exception) in expr.simple_licenses().into_iter().zip(exceptions) {
        let kind = match simple.license.kind() {
            LicenseKind::Listed => Cell::new("listed").fg(Color::Green),
            LicenseKind::Reference => Cell::new("reference").fg(Color::Cyan),
            LicenseKind::Unrecognized => Cell::new("unrecognized").fg(Color::Yellow),
        };
        let deprecated = catalog
            .lookup_license(simple.license.as_str())
            .map(|entry| entry.deprecated)
            .unwrap_or(false);
        table.add_row(vec![
            Cell::new(simple.license.as_str()),
            kind,
            Cell::new(if simple.or_later { "yes" } else { "" }),
            Cell::new(exception.unwrap_or_default()),
            if deprecated {
                Cell::new("deprecated").fg(Color::Yellow)
            } else {
                Cell::new("")
            },
        ]);
    }
    println!("{}", table);

    let unknown = expr.unrecognized_licenses();
    if !unknown.is_empty() {
        let names: Vec<&str> = unknown.into_iter().map(|id| id.as_str()).collect();
        println!(
            " {} unrecognized license ids: {}",
            "[WARN]".yellow().bold(),
            names.join(", ")
        );
    }
}

/// Exceptions aligned with `Expression::simple_licenses` order.
fn leaf_exceptions(expr: &Expression) -> Vec<Option<String>> {
    match expr {
        Expression::License(_) => vec![None],
        Expression::With(with) => vec![Some(with.exception.to_string())],
        Expression::And(_) | Expression::Or(_) => {
            expr.operands().iter().flat_map(leaf_exceptions).collect()
        }
    }
}

pub fn render_choices(expr: &Expression, choices: &[LicenseChoice], quiet: bool) {
    if quiet {
        println!("{} choice(s)", choices.len());
        return;
    }
    println!(" {}\n", expr.to_canonical_string().bold());
    let mut table = new_table(&["#", "Licenses to honor"]);
    for (i, choice) in choices.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1).set_alignment(CellAlignment::Right),
            Cell::new(choice_to_string(choice)),
        ]);
    }
    println!("{}", table);
}

pub fn render_equivalence(left: &Expression, right: &Expression, equivalent: bool) {
    if equivalent {
        println!("{} {} ≡ {}", "✓".green(), left, right);
    } else {
        println!("{} {} ≢ {}", "✗".red(), left, right);
    }
}

pub fn render_classification(
    classified: &BTreeMap<LicenseId, BTreeSet<Category>>,
    risks: &BTreeMap<LicenseId, LicenseRisk>,
    overall: LicenseRisk,
    quiet: bool,
) {
    if !quiet {
        let mut table = new_table(&["License", "Categories", "Risk"]);
        for (id, categories) in classified {
            let risk = risks.get(id).copied().unwrap_or(LicenseRisk::Unknown);
            let labels: Vec<&str> = categories.iter().map(Category::as_str).collect();
            table.add_row(vec![
                Cell::new(id.as_str()),
                Cell::new(labels.join(", ")),
                Cell::new(risk.to_string()).fg(risk_color(risk)),
            ]);
        }
        println!("{}", table);
    }
    println!("Overall risk: {}", overall.to_string().bold());
}

pub fn render_lookup(entry: &CatalogEntry, kind: &str) {
    let mut table = new_table(&["Field", "Value"]);
    table.add_row(vec![Cell::new("Kind"), Cell::new(kind)]);
    table.add_row(vec![Cell::new("Id"), Cell::new(&entry.id)]);
    table.add_row(vec![Cell::new("Name"), Cell::new(&entry.full_name)]);
    table.add_row(vec![
        Cell::new("Deprecated"),
        Cell::new(if entry.deprecated { "yes" } else { "no" }),
    ]);
    table.add_row(vec![
        Cell::new("Or-later (+)"),
        Cell::new(if entry.supports_or_later { "allowed" } else { "not allowed" }),
    ]);
    println!("{}", table);
}

/// Render policy results for `check`.
pub fn render_check(results: &[CheckResult], verbose: bool, quiet: bool) {
    let total = results.len();
    let pass_count = results.iter().filter(|r| r.verdict == PolicyVerdict::Pass).count();
    let warn_count = results.iter().filter(|r| r.verdict == PolicyVerdict::Warn).count();
    let error_count = results.iter().filter(|r| r.verdict == PolicyVerdict::Error).count();

    if quiet {
        println!(
            "Total: {}  Pass: {}  Warn: {}  Error: {}",
            total,
            pass_count.to_string().green(),
            warn_count.to_string().yellow(),
            error_count.to_string().red(),
        );
        return;
    }

    println!(
        "\n {} v{}\n",
        "license-expr".bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(" │  {:<48} │", format!("Total expressions  : {}", total));
    println!(
        " │  {:<48} │",
        format!("{}  Pass            : {:>4}", "✓".green(), pass_count)
    );
    println!(
        " │  {:<48} │",
        format!("{}  Warn            : {:>4}", "⚠".yellow(), warn_count)
    );
    println!(
        " │  {:<48} │",
        format!("{}  Error           : {:>4}", "✗".red(), error_count)
    );
    println!(" └────────────────────────────────────────────────────┘\n");

    if error_count > 0 {
        println!(" {} Expressions requiring attention:\n", "[ERROR]".red().bold());
        render_check_table(results, PolicyVerdict::Error);
        println!();
    }

    if warn_count > 0 {
        println!(" {} Expressions with warnings:\n", "[WARN]".yellow().bold());
        render_check_table(results, PolicyVerdict::Warn);
        println!();
    }

    if verbose && pass_count > 0 {
        println!(" {} All passing expressions:\n", "[PASS]".green().bold());
        render_check_table(results, PolicyVerdict::Pass);
        println!();
    }
}

fn render_check_table(results: &[CheckResult], verdict_filter: PolicyVerdict) {
    let mut table = new_table(&["Input", "Expression", "Best choice", "Risk", "Verdict"]);
    for result in results.iter().filter(|r| r.verdict == verdict_filter) {
        let expression = match (&result.expression, &result.error) {
            (Some(expr), _) => Cell::new(expr),
            (None, Some(err)) => Cell::new(err).fg(Color::Red),
            (None, None) => Cell::new(""),
        };
        table.add_row(vec![
            Cell::new(&result.input),
            expression,
            Cell::new(result.best_choice.as_deref().unwrap_or("")),
            Cell::new(result.risk.to_string()).fg(risk_color(result.risk)),
            verdict_cell(result.verdict),
        ]);
    }
    println!("{}", table);
}
