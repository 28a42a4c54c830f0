//! Pure operations over [`Expression`] trees.
//!
//! Nothing here mutates its input; every operation returns a new value.
//! Operand order inside `AND` / `OR` never changes the result of
//! [`Expression::equivalent`] or [`Expression::decompose`].

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::error::ChoiceError;
use crate::license::catalog::Catalog;
use crate::license::expression::{
    ExceptionId, Expression, LicenseId, LicenseKind, Operator, SimpleLicense, WithException,
};

/// One license that must be honored, with its exception if any.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LicenseTerm {
    pub license: LicenseId,
    pub exception: Option<ExceptionId>,
}

impl fmt::Display for LicenseTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.exception {
            Some(exception) => write!(f, "{} WITH {}", self.license, exception),
            None => write!(f, "{}", self.license),
        }
    }
}

/// The terms that must all be honored when this choice is taken.
pub type LicenseChoice = BTreeSet<LicenseTerm>;

// Deprecated ids that fold an exception into the license id.
const DEPRECATED_WITH_EXCEPTION: &[(&str, &str, &str)] = &[
    ("GPL-2.0-with-classpath-exception", "GPL-2.0-only", "Classpath-exception-2.0"),
    ("GPL-2.0-with-GCC-exception", "GPL-2.0-only", "GCC-exception-2.0"),
    ("GPL-3.0-with-GCC-exception", "GPL-3.0-only", "GCC-exception-3.1"),
    ("wxWindows", "LGPL-2.0-or-later", "WxWindows-exception-3.1"),
];

impl Expression {
    /// Flatten nested same-operator nodes, drop duplicate operands (compared
    /// without regard to operand order) and collapse single-operand nodes.
    ///
    /// The first occurrence of a duplicate keeps its position.
    pub fn simplify(&self) -> Expression {
        match self {
            Expression::License(_) | Expression::With(_) => self.clone(),
            Expression::And(ops) => simplify_operands(self, Operator::And, ops.as_slice()),
            Expression::Or(ops) => simplify_operands(self, Operator::Or, ops.as_slice()),
        }
    }

    /// Syntactic equivalence: equal after [`simplify`](Self::simplify), ignoring
    /// operand order. `GPL-2.0` and `GPL-2.0+` are different licenses here.
    pub fn equivalent(&self, other: &Expression) -> bool {
        self.simplify().sorted() == other.simplify().sorted()
    }

    /// Recursively sort operands so order-insensitive trees compare equal.
    fn sorted(&self) -> Expression {
        match self {
            Expression::License(_) | Expression::With(_) => self.clone(),
            Expression::And(ops) | Expression::Or(ops) => {
                let mut children: Vec<Expression> = ops.iter().map(Expression::sorted).collect();
                children.sort();
                rebuild(self, children)
            }
        }
    }

    /// Disjunctive normal form as a sorted, de-duplicated list of choices.
    ///
    /// Terms carry no `+` marker: `GPL-2.0` and `GPL-2.0+` yield the same term.
    /// Choices are the literal product of the `AND` operands, so a repeated
    /// operand can leave a choice that is a superset of another. The number of
    /// choices doubles with every `(A OR B)` conjunct.
    pub fn decompose(&self) -> Vec<LicenseChoice> {
        self.choice_set().into_iter().collect()
    }

    fn choice_set(&self) -> BTreeSet<LicenseChoice> {
        match self {
            Expression::License(simple) => single_choice(LicenseTerm {
                license: simple.license.clone(),
                exception: None,
            }),
            Expression::With(with) => single_choice(LicenseTerm {
                license: with.license.license.clone(),
                exception: Some(with.exception.clone()),
            }),
            Expression::Or(ops) => ops.iter().flat_map(Expression::choice_set).collect(),
            Expression::And(ops) => {
                let mut acc: BTreeSet<LicenseChoice> = BTreeSet::from([LicenseChoice::new()]);
                for op in ops {
                    let rhs = op.choice_set();
                    acc = acc
                        .iter()
                        .flat_map(|left| {
                            rhs.iter()
                                .map(move |right| left.union(right).cloned().collect())
                        })
                        .collect();
                }
                acc
            }
        }
    }

    /// True if the expression decomposes into more than one choice.
    pub fn offers_choice(&self) -> bool {
        self.choice_set().len() > 1
    }

    /// Select one of the choices this expression offers.
    ///
    /// `choice` must decompose into exactly one choice, and that choice must be
    /// among this expression's choices. Returns the simplified choice.
    pub fn apply_choice(&self, choice: &Expression) -> Result<Expression, ChoiceError> {
        let selected = choice.choice_set();
        let valid = self.choice_set();
        if selected.len() == 1 && selected.iter().all(|c| valid.contains(c)) {
            return Ok(choice.simplify());
        }
        Err(ChoiceError::NotAChoice {
            choice: choice.to_string(),
            expression: self.to_string(),
        })
    }

    /// True if `id` names a license leaf anywhere in the tree, ignoring case
    /// and exceptions.
    pub fn contains_license(&self, id: &str) -> bool {
        self.simple_licenses()
            .iter()
            .any(|simple| simple.license.matches(id))
    }

    /// Distinct license ids, sorted.
    pub fn licenses(&self) -> BTreeSet<&LicenseId> {
        self.simple_licenses()
            .into_iter()
            .map(|simple| &simple.license)
            .collect()
    }

    /// Distinct exception ids, sorted.
    pub fn exceptions(&self) -> BTreeSet<&ExceptionId> {
        let mut out = BTreeSet::new();
        self.collect_exceptions(&mut out);
        out
    }

    fn collect_exceptions<'a>(&'a self, out: &mut BTreeSet<&'a ExceptionId>) {
        match self {
            Expression::License(_) => {}
            Expression::With(with) => {
                out.insert(&with.exception);
            }
            Expression::And(ops) | Expression::Or(ops) => {
                for op in ops {
                    op.collect_exceptions(out);
                }
            }
        }
    }

    /// License ids accepted by non-strict parsing that the catalog does not know.
    pub fn unrecognized_licenses(&self) -> BTreeSet<&LicenseId> {
        self.licenses()
            .into_iter()
            .filter(|id| id.kind() == LicenseKind::Unrecognized)
            .collect()
    }

    /// Rewrite deprecated ids to their current spelling: `X` becomes `X-only`
    /// and `X+` becomes `X-or-later` where the catalog lists those, and ids that
    /// embed an exception become an explicit `WITH`.
    pub fn normalize_deprecated(&self, catalog: &Catalog) -> Expression {
        match self {
            Expression::License(simple) => normalize_simple(simple, catalog)
                .unwrap_or_else(|| self.clone()),
            Expression::With(with) => {
                match normalize_simple(&with.license, catalog) {
                    Some(Expression::License(license)) => Expression::With(WithException {
                        license,
                        exception: with.exception.clone(),
                    }),
                    // An id that already embeds an exception cannot take another.
                    _ => self.clone(),
                }
            }
            Expression::And(_) | Expression::Or(_) => {
                let children = self
                    .operands()
                    .iter()
                    .map(|op| op.normalize_deprecated(catalog))
                    .collect();
                rebuild(self, children)
            }
        }
    }
}

fn single_choice(term: LicenseTerm) -> BTreeSet<LicenseChoice> {
    BTreeSet::from([LicenseChoice::from([term])])
}

/// Rebuild a compound node of the same operator from new children.
fn rebuild(node: &Expression, children: Vec<Expression>) -> Expression {
    match node.operator() {
        Some(op) => Expression::combine(op, children).unwrap_or_else(|| node.clone()),
        None => node.clone(),
    }
}

fn simplify_operands(node: &Expression, op: Operator, operands: &[Expression]) -> Expression {
    let mut kept: Vec<Expression> = Vec::new();
    let mut seen: Vec<Expression> = Vec::new();

    for operand in operands {
        let simplified = operand.simplify();
        let parts = match simplified.operator() {
            Some(inner) if inner == op => simplified.operands().to_vec(),
            _ => vec![simplified],
        };
        for part in parts {
            let key = part.sorted();
            if !seen.contains(&key) {
                seen.push(key);
                kept.push(part);
            }
        }
    }

    Expression::combine(op, kept).unwrap_or_else(|| node.clone())
}

fn normalize_simple(simple: &SimpleLicense, catalog: &Catalog) -> Option<Expression> {
    if !simple.license.is_listed() {
        return None;
    }
    let entry = catalog.lookup_license(simple.license.as_str())?;
    if !entry.deprecated {
        return None;
    }

    if !simple.or_later {
        if let Some((_, license, exception)) = DEPRECATED_WITH_EXCEPTION
            .iter()
            .find(|(old, _, _)| simple.license.matches(old))
        {
            let license = catalog.lookup_license(license)?;
            let exception = catalog.lookup_exception(exception)?;
            return Some(Expression::with_exception(
                SimpleLicense::new(LicenseId::from_catalog(license), false),
                ExceptionId::from_catalog(exception),
            ));
        }
    }

    let suffix = if simple.or_later { "-or-later" } else { "-only" };
    let replacement = catalog.lookup_license(&format!("{}{}", entry.id, suffix))?;
    Some(Expression::simple(LicenseId::from_catalog(replacement), false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::license::parser::parse;

    fn p(text: &str) -> Expression {
        parse(text, true).unwrap()
    }

    fn choice(ids: &[&str]) -> Vec<String> {
        let mut out: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
        out.sort_by_key(|s| s.to_ascii_lowercase());
        out
    }

    fn rendered(choices: &[LicenseChoice]) -> Vec<Vec<String>> {
        choices
            .iter()
            .map(|c| c.iter().map(|t| t.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_simplify_removes_duplicates() {
        assert_eq!(p("MIT AND MIT").simplify(), p("MIT"));
        assert_eq!(p("MIT OR ISC OR MIT").simplify().to_string(), "MIT OR ISC");
    }

    #[test]
    fn test_simplify_duplicates_are_order_insensitive() {
        let expr = p("(MIT AND ISC) OR (ISC AND MIT)");
        assert_eq!(expr.simplify().to_string(), "MIT AND ISC");
    }

    #[test]
    fn test_simplify_flattens_after_collapse() {
        let expr = p("Zlib AND ((MIT AND ISC) OR (MIT AND ISC))");
        let simplified = expr.simplify();
        assert_eq!(simplified.operands().len(), 3);
        assert_eq!(simplified.to_string(), "Zlib AND MIT AND ISC");
    }

    #[test]
    fn test_simplify_is_idempotent() {
        for text in [
            "MIT",
            "MIT OR MIT AND ISC",
            "(MIT OR ISC) AND (ISC OR MIT) AND Zlib",
            "GPL-2.0+ WITH Classpath-exception-2.0 OR GPL-2.0+ WITH Classpath-exception-2.0",
        ] {
            let once = p(text).simplify();
            assert_eq!(once.simplify(), once, "input: {}", text);
        }
    }

    #[test]
    fn test_or_later_is_distinct() {
        assert_eq!(p("GPL-2.0 OR GPL-2.0+").simplify().operands().len(), 2);
        assert!(!p("GPL-2.0").equivalent(&p("GPL-2.0+")));
    }

    #[test]
    fn test_equivalence_ignores_operand_order() {
        assert!(p("MIT AND Apache-2.0").equivalent(&p("Apache-2.0 AND MIT")));
        assert!(p("(MIT OR ISC) AND Zlib").equivalent(&p("Zlib AND (ISC OR MIT)")));
        assert!(p("MIT AND MIT AND ISC").equivalent(&p("ISC AND MIT")));
        assert!(p("mit").equivalent(&p("MIT")));
    }

    #[test]
    fn test_equivalence_respects_operators() {
        assert!(!p("MIT AND Apache-2.0").equivalent(&p("MIT OR Apache-2.0")));
        assert!(!p("MIT").equivalent(&p("MIT WITH LLVM-exception")));
    }

    #[test]
    fn test_decompose_distributes_and_over_or() {
        let choices = p("(MIT OR Apache-2.0) AND GPL-2.0-only").decompose();
        assert_eq!(
            rendered(&choices),
            vec![
                choice(&["Apache-2.0", "GPL-2.0-only"]),
                choice(&["GPL-2.0-only", "MIT"]),
            ]
        );
    }

    #[test]
    fn test_decompose_keeps_exceptions() {
        let choices = p("GPL-2.0-only WITH Classpath-exception-2.0 OR MIT").decompose();
        assert_eq!(
            rendered(&choices),
            vec![
                vec!["GPL-2.0-only WITH Classpath-exception-2.0".to_string()],
                vec!["MIT".to_string()],
            ]
        );
    }

    #[test]
    fn test_decompose_cartesian_product() {
        let choices = p("(MIT OR ISC) AND (Zlib OR 0BSD)").decompose();
        assert_eq!(choices.len(), 4);
        assert!(choices.iter().all(|c| c.len() == 2));
    }

    #[test]
    fn test_decompose_ignores_operand_order() {
        let a = p("(MIT OR Apache-2.0) AND GPL-2.0-only").decompose();
        let b = p("GPL-2.0-only AND (Apache-2.0 OR MIT)").decompose();
        assert_eq!(a, b);
    }

    #[test]
    fn test_decompose_merges_duplicate_terms() {
        let choices = p("MIT AND (MIT OR ISC)").decompose();
        assert_eq!(
            rendered(&choices),
            vec![choice(&["ISC", "MIT"]), vec!["MIT".to_string()]]
        );
    }

    #[test]
    fn test_decompose_after_simplify_drops_superset_choices() {
        let expr = p("(MIT OR ISC) AND (MIT OR ISC)");
        assert_eq!(
            rendered(&expr.decompose()),
            vec![choice(&["ISC"]), choice(&["ISC", "MIT"]), choice(&["MIT"])]
        );

        let simplified = expr.simplify();
        assert_eq!(simplified.to_string(), "MIT OR ISC");
        let reduced = simplified.decompose();
        assert_eq!(rendered(&reduced), vec![choice(&["ISC"]), choice(&["MIT"])]);
        let original = expr.decompose();
        assert!(reduced.iter().all(|c| original.contains(c)));
    }

    #[test]
    fn test_decompose_erases_or_later_marker() {
        let expr = p("GPL-2.0 OR GPL-2.0+");
        assert_eq!(rendered(&expr.decompose()), vec![choice(&["GPL-2.0"])]);
        assert!(!expr.offers_choice());
    }

    #[test]
    fn test_offers_choice() {
        assert!(p("MIT OR ISC").offers_choice());
        assert!(!p("MIT AND ISC").offers_choice());
        assert!(!p("MIT OR MIT").offers_choice());
    }

    #[test]
    fn test_apply_choice() {
        let expr = p("(MIT OR Apache-2.0) AND GPL-2.0-only");
        let chosen = expr.apply_choice(&p("GPL-2.0-only AND MIT")).unwrap();
        assert_eq!(chosen.to_string(), "GPL-2.0-only AND MIT");

        let err = expr.apply_choice(&p("MIT")).unwrap_err();
        assert!(matches!(err, ChoiceError::NotAChoice { .. }));
        assert!(expr.apply_choice(&p("MIT OR Apache-2.0")).is_err());
    }

    #[test]
    fn test_contains_license() {
        let expr = p("(MIT OR Apache-2.0) AND GPL-2.0+ WITH Classpath-exception-2.0");
        assert!(expr.contains_license("mit"));
        assert!(expr.contains_license("GPL-2.0"));
        assert!(!expr.contains_license("Classpath-exception-2.0"));
        assert!(!expr.contains_license("ISC"));
    }

    #[test]
    fn test_licenses_and_exceptions() {
        let expr = p("MIT OR (MIT AND Apache-2.0 WITH LLVM-exception)");
        let licenses: Vec<&str> = expr.licenses().into_iter().map(|l| l.as_str()).collect();
        assert_eq!(licenses, vec!["Apache-2.0", "MIT"]);
        let exceptions: Vec<&str> = expr.exceptions().into_iter().map(|e| e.as_str()).collect();
        assert_eq!(exceptions, vec!["LLVM-exception"]);
    }

    #[test]
    fn test_unrecognized_licenses() {
        let expr = parse("MIT OR Foo-1.0 OR LicenseRef-bar", false).unwrap();
        let unknown: Vec<&str> = expr
            .unrecognized_licenses()
            .into_iter()
            .map(|l| l.as_str())
            .collect();
        assert_eq!(unknown, vec!["Foo-1.0"]);
    }

    #[test]
    fn test_normalize_deprecated() {
        let catalog = Catalog::builtin();
        assert_eq!(
            p("GPL-2.0 OR GPL-2.0+").normalize_deprecated(catalog).to_string(),
            "GPL-2.0-only OR GPL-2.0-or-later"
        );
        assert_eq!(
            p("LGPL-2.1+ WITH Classpath-exception-2.0")
                .normalize_deprecated(catalog)
                .to_string(),
            "LGPL-2.1-or-later WITH Classpath-exception-2.0"
        );
        assert_eq!(
            p("GPL-2.0-with-classpath-exception AND MIT")
                .normalize_deprecated(catalog)
                .to_string(),
            "GPL-2.0-only WITH Classpath-exception-2.0 AND MIT"
        );
        assert_eq!(
            p("Apache-2.0+").normalize_deprecated(catalog),
            p("Apache-2.0+")
        );
    }

    #[test]
    fn test_algebra_does_not_mutate_input() {
        let expr = p("MIT OR MIT");
        let before = expr.clone();
        let _ = expr.simplify();
        let _ = expr.decompose();
        assert_eq!(expr, before);
    }
}
