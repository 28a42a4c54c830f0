//! The license expression tree.
//!
//! Trees are immutable once built. The constructors uphold two invariants the
//! rest of the engine relies on:
//! - `And` / `Or` always hold at least two operands (a single operand collapses
//!   into itself, an empty list is rejected);
//! - an `And` never directly contains an `And`, and likewise for `Or`.
//!
//! A `WITH` clause can only wrap a [`SimpleLicense`], so the left operand of an
//! exception is a plain license by construction.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::ModelError;
use crate::license::catalog::CatalogEntry;

/// How a license id relates to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LicenseKind {
    /// A catalog entry; the text carries the catalog's canonical casing.
    Listed,
    /// A free-form `LicenseRef-*` id.
    Reference,
    /// Not in the catalog, accepted by non-strict parsing.
    Unrecognized,
}

/// A license identifier. Equality, ordering and hashing ignore ASCII case.
#[derive(Debug, Clone)]
pub struct LicenseId {
    text: String,
    key: String,
    kind: LicenseKind,
}

fn license_ref_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)^LicenseRef-[A-Za-z0-9.\-]+$").ok())
        .as_ref()
}

impl LicenseId {
    pub(crate) fn new_unchecked(text: &str, kind: LicenseKind) -> Self {
        Self {
            text: text.to_string(),
            key: text.to_ascii_lowercase(),
            kind,
        }
    }

    pub fn from_catalog(entry: &CatalogEntry) -> Self {
        Self::new_unchecked(&entry.id, LicenseKind::Listed)
    }

    /// A `LicenseRef-<idstring>` id; the idstring must be non-empty and use only
    /// letters, digits, `.` and `-`.
    pub fn license_ref(text: &str) -> Result<Self, ModelError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ModelError::BlankField("license id"));
        }
        match license_ref_pattern() {
            Some(re) if re.is_match(text) => Ok(Self::new_unchecked(text, LicenseKind::Reference)),
            _ => Err(ModelError::InvalidLicenseRef(text.to_string())),
        }
    }

    pub fn unrecognized(text: &str) -> Result<Self, ModelError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ModelError::BlankField("license id"));
        }
        Ok(Self::new_unchecked(text, LicenseKind::Unrecognized))
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> LicenseKind {
        self.kind
    }

    pub fn is_listed(&self) -> bool {
        self.kind == LicenseKind::Listed
    }

    /// Case-insensitive comparison against raw text.
    pub fn matches(&self, text: &str) -> bool {
        self.text.eq_ignore_ascii_case(text.trim())
    }
}

impl PartialEq for LicenseId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for LicenseId {}

impl PartialOrd for LicenseId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LicenseId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl Hash for LicenseId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for LicenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for LicenseId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

/// An exception identifier. Equality, ordering and hashing ignore ASCII case.
#[derive(Debug, Clone)]
pub struct ExceptionId {
    text: String,
    key: String,
    listed: bool,
}

impl ExceptionId {
    pub fn from_catalog(entry: &CatalogEntry) -> Self {
        Self {
            text: entry.id.clone(),
            key: entry.id.to_ascii_lowercase(),
            listed: true,
        }
    }

    /// An exception the catalog does not know; only produced when the caller
    /// opted into unknown exceptions.
    pub fn unrecognized(text: &str) -> Result<Self, ModelError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ModelError::BlankField("exception id"));
        }
        Ok(Self {
            text: text.to_string(),
            key: text.to_ascii_lowercase(),
            listed: false,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_listed(&self) -> bool {
        self.listed
    }
}

impl PartialEq for ExceptionId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ExceptionId {}

impl PartialOrd for ExceptionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ExceptionId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl Hash for ExceptionId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for ExceptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for ExceptionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

/// A leaf license reference, optionally marked "or any later version".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleLicense {
    pub license: LicenseId,
    pub or_later: bool,
}

impl SimpleLicense {
    pub fn new(license: LicenseId, or_later: bool) -> Self {
        Self { license, or_later }
    }
}

impl fmt::Display for SimpleLicense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.or_later {
            write!(f, "{}+", self.license)
        } else {
            write!(f, "{}", self.license)
        }
    }
}

/// A license qualified by an exception.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct WithException {
    pub license: SimpleLicense,
    pub exception: ExceptionId,
}

impl fmt::Display for WithException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} WITH {}", self.license, self.exception)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operator {
    And,
    Or,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::And => write!(f, "AND"),
            Operator::Or => write!(f, "OR"),
        }
    }
}

/// Two or more operands of a single operator, none of which uses that same
/// operator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Operands(Vec<Expression>);

impl Operands {
    pub fn as_slice(&self) -> &[Expression] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Expression> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Operands {
    type Item = &'a Expression;
    type IntoIter = std::slice::Iter<'a, Expression>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A parsed SPDX license expression.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Expression {
    License(SimpleLicense),
    With(WithException),
    And(Operands),
    Or(Operands),
}

impl Expression {
    pub fn simple(license: LicenseId, or_later: bool) -> Self {
        Expression::License(SimpleLicense::new(license, or_later))
    }

    pub fn with_exception(license: SimpleLicense, exception: ExceptionId) -> Self {
        Expression::With(WithException { license, exception })
    }

    /// Conjunction of `operands`; `None` if there are none.
    pub fn and(operands: impl IntoIterator<Item = Expression>) -> Option<Self> {
        Self::combine(Operator::And, operands)
    }

    /// Disjunction of `operands`; `None` if there are none.
    pub fn or(operands: impl IntoIterator<Item = Expression>) -> Option<Self> {
        Self::combine(Operator::Or, operands)
    }

    pub fn combine(op: Operator, operands: impl IntoIterator<Item = Expression>) -> Option<Self> {
        let mut operands = operands.into_iter();
        let first = operands.next()?;
        Some(Self::combine_nonempty(op, first, operands))
    }

    /// Flattens same-operator operands and collapses a lone operand.
    pub(crate) fn combine_nonempty(
        op: Operator,
        first: Expression,
        rest: impl IntoIterator<Item = Expression>,
    ) -> Self {
        let mut flat = Vec::new();
        for operand in std::iter::once(first).chain(rest) {
            match operand {
                Expression::And(inner) if op == Operator::And => flat.extend(inner.0),
                Expression::Or(inner) if op == Operator::Or => flat.extend(inner.0),
                other => flat.push(other),
            }
        }

        match <[Expression; 1]>::try_from(flat) {
            Ok([only]) => only,
            Err(flat) => match op {
                Operator::And => Expression::And(Operands(flat)),
                Operator::Or => Expression::Or(Operands(flat)),
            },
        }
    }

    pub fn operator(&self) -> Option<Operator> {
        match self {
            Expression::And(_) => Some(Operator::And),
            Expression::Or(_) => Some(Operator::Or),
            _ => None,
        }
    }

    /// Direct children of an `And` / `Or`; empty for leaves.
    pub fn operands(&self) -> &[Expression] {
        match self {
            Expression::And(ops) | Expression::Or(ops) => ops.as_slice(),
            _ => &[],
        }
    }

    /// Leaf licenses in left-to-right order, including those under `WITH`.
    pub fn simple_licenses(&self) -> Vec<&SimpleLicense> {
        let mut out = Vec::new();
        self.collect_simple(&mut out);
        out
    }

    fn collect_simple<'a>(&'a self, out: &mut Vec<&'a SimpleLicense>) {
        match self {
            Expression::License(simple) => out.push(simple),
            Expression::With(with) => out.push(&with.license),
            Expression::And(ops) | Expression::Or(ops) => {
                for op in ops {
                    op.collect_simple(out);
                }
            }
        }
    }

    /// SPDX text with parentheses only where precedence requires them.
    pub fn to_canonical_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::License(simple) => write!(f, "{}", simple),
            Expression::With(with) => write!(f, "{}", with),
            Expression::And(ops) => {
                for (i, op) in ops.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" AND ")?;
                    }
                    match op {
                        Expression::Or(_) => write!(f, "({})", op)?,
                        _ => write!(f, "{}", op)?,
                    }
                }
                Ok(())
            }
            Expression::Or(ops) => {
                for (i, op) in ops.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" OR ")?;
                    }
                    write!(f, "{}", op)?;
                }
                Ok(())
            }
        }
    }
}
