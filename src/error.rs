//! Error types surfaced by the expression engine.
//!
//! - [`SyntaxError`] — anything wrong with expression text, always carrying the
//!   byte offset of the offending token.
//! - [`ModelError`] — a value object rejected a blank or malformed field.
//! - [`CatalogError`] — a license-list document could not be loaded.
//! - [`ChoiceError`] — a requested license choice is not offered by an expression.

use thiserror::Error;

/// A malformed expression, located at a 0-based byte offset into the input.
///
/// End of input is reported as `text.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at position {position}")]
pub struct SyntaxError {
    pub position: usize,
    pub kind: SyntaxErrorKind,
}

impl SyntaxError {
    pub fn new(position: usize, kind: SyntaxErrorKind) -> Self {
        Self { position, kind }
    }

    /// Human-readable message without the position suffix.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),

    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("expected {0}, found end of input")]
    UnexpectedEnd(String),

    #[error("unbalanced parenthesis")]
    UnbalancedParenthesis,

    #[error("unexpected {0} after complete expression")]
    TrailingInput(String),

    #[error("empty expression")]
    EmptyExpression,

    #[error("unknown license identifier '{0}'")]
    UnknownLicense(String),

    #[error("unknown license exception '{0}'")]
    UnknownException(String),

    #[error("license '{0}' does not allow the or-later marker")]
    OrLaterNotSupported(String),

    #[error("malformed license reference '{0}'")]
    MalformedLicenseRef(String),

    #[error("expression nested deeper than {0} levels")]
    NestingTooDeep(usize),
}

/// Rejected value-object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("{0} must not be blank")]
    BlankField(&'static str),

    #[error("'{0}' is not a valid LicenseRef identifier")]
    InvalidLicenseRef(String),
}

/// Failure loading an identifier catalog from license-list JSON.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("license list is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("catalog entry has a blank {0}")]
    BlankField(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChoiceError {
    #[error("'{choice}' is not a valid choice for '{expression}'")]
    NotAChoice { choice: String, expression: String },
}
