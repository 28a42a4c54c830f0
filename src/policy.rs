//! Policy verdicts over the choices an expression offers.
//!
//! A choice is as bad as its worst license (`AND`); an expression is as good as
//! its best choice (`OR`). With the default policy `MIT OR GPL-3.0-only` passes
//! while `MIT AND GPL-3.0-only` is an error.

use serde::Serialize;

use crate::config::PolicyConfig;
use crate::license::algebra::{LicenseChoice, LicenseTerm};
use crate::license::classifier::ClassificationTable;
use crate::license::expression::Expression;
use crate::models::PolicyVerdict;

#[derive(Debug, Clone, Serialize)]
pub struct ChoiceVerdict {
    pub choice: LicenseChoice,
    pub verdict: PolicyVerdict,
}

#[derive(Debug, Clone, Serialize)]
pub struct PolicyEvaluation {
    pub verdict: PolicyVerdict,
    /// The first choice with the best verdict.
    pub best_choice: Option<LicenseChoice>,
    pub choices: Vec<ChoiceVerdict>,
}

/// Evaluate `expr` against `policy`, resolving categories through `table`.
pub fn evaluate(
    expr: &Expression,
    policy: &PolicyConfig,
    table: &ClassificationTable,
) -> PolicyEvaluation {
    let choices: Vec<ChoiceVerdict> = expr
        .decompose()
        .into_iter()
        .map(|choice| {
            let verdict = choice
                .iter()
                .map(|term| term_verdict(term, policy, table))
                .max()
                .unwrap_or_else(|| policy.default.to_verdict());
            ChoiceVerdict { choice, verdict }
        })
        .collect();

    let best = choices.iter().min_by_key(|c| c.verdict);
    let verdict = best
        .map(|c| c.verdict)
        .unwrap_or_else(|| policy.default.to_verdict());
    let best_choice = best.map(|c| c.choice.clone());

    tracing::debug!(expression = %expr, %verdict, choices = choices.len(), "evaluated policy");
    PolicyEvaluation {
        verdict,
        best_choice,
        choices,
    }
}

/// Verdict for a single license term.
///
/// Precedence: a rule for the exact `WITH` term, then a rule for the license id,
/// then the worst verdict among the license's categories, then the default.
pub fn term_verdict(
    term: &LicenseTerm,
    policy: &PolicyConfig,
    table: &ClassificationTable,
) -> PolicyVerdict {
    if term.exception.is_some() {
        if let Some(action) = policy.license_action(&term.to_string()) {
            return action.to_verdict();
        }
    }
    if let Some(action) = policy.license_action(term.license.as_str()) {
        return action.to_verdict();
    }

    table
        .categories(term.license.as_str())
        .iter()
        .filter_map(|category| policy.category_action(category))
        .map(|action| action.to_verdict())
        .max()
        .unwrap_or_else(|| policy.default.to_verdict())
}

/// Render a choice as SPDX text, e.g. `Apache-2.0 AND MIT`.
pub fn choice_to_string(choice: &LicenseChoice) -> String {
    choice
        .iter()
        .map(LicenseTerm::to_string)
        .collect::<Vec<_>>()
        .join(" AND ")
}
