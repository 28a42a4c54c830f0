//! `license-expr` — an SPDX license-expression engine.
//!
//! # Flow
//! 1. Tokenize and parse expression text against the identifier catalog
//!    ([`license::lexer`], [`license::parser`], [`license::catalog`]).
//! 2. Work with the immutable tree ([`license::expression`]): render it,
//!    simplify it, compare it, decompose it into license choices
//!    ([`license::algebra`]).
//! 3. Attach caller-supplied categories to its licenses ([`license::classifier`])
//!    and evaluate policy verdicts over its choices ([`policy`]).
//!
//! ```
//! use license_expr::parse;
//!
//! let expr = parse("(MIT OR Apache-2.0) AND GPL-2.0-only", true).unwrap();
//! assert_eq!(expr.decompose().len(), 2);
//! assert!(expr.equivalent(&parse("GPL-2.0-only AND (Apache-2.0 OR MIT)", true).unwrap()));
//! ```

pub mod config;
pub mod error;
pub mod license;
pub mod logging;
pub mod models;
pub mod policy;

pub use error::{SyntaxError, SyntaxErrorKind};
pub use license::algebra::{LicenseChoice, LicenseTerm};
pub use license::catalog::{Catalog, CatalogEntry};
pub use license::classifier::{classify, Category, ClassificationTable};
pub use license::expression::{Expression, LicenseId, LicenseKind, SimpleLicense};
pub use license::parser::{parse, parse_with, ParseOptions};
