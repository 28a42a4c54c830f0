//! Report renderers for CLI results.
//!
//! - [`terminal`] — colored, tabular output; respects `--verbose` / `--quiet`.
//!   JSON output is produced directly with `serde_json` in `main`.

pub mod terminal;
