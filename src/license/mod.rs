//! The SPDX license-expression engine.
//!
//! - [`catalog`] — known license and exception identifiers.
//! - [`lexer`] / [`parser`] — expression text to [`Expression`](expression::Expression).
//! - [`expression`] — the immutable tree and its canonical rendering.
//! - [`algebra`] — simplification, equivalence and choice decomposition.
//! - [`classifier`] — maps the licenses of an expression to category labels.
//! - [`declared`] — rewrites free-text declared licenses into SPDX text.

pub mod algebra;
pub mod catalog;
pub mod classifier;
pub mod declared;
pub mod expression;
pub mod lexer;
pub mod parser;
