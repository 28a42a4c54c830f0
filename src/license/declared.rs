//! Normalization of free-text declared licenses into SPDX expression text.
//!
//! Package metadata often carries strings such as `"Apache License 2.0"`,
//! `"GPLv3"` or `"MIT/Apache-2.0"`. These are rewritten into text the parser
//! accepts; anything unrecognised is passed through for the parser to judge.

/// Rewrite a declared license string into SPDX expression text.
///
/// Returns `None` for blank or explicitly unknown declarations.
pub fn normalize_declared(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("unknown") {
        return None;
    }

    let lower = trimmed.to_lowercase();
    if lower.contains("proprietary") || lower.contains("commercial") {
        return Some("LicenseRef-proprietary".to_string());
    }

    if let Some(id) = alias(trimmed) {
        return Some(id.to_string());
    }

    // Some ecosystems use "/" as an OR shorthand (e.g. "MIT/Apache-2.0").
    if trimmed.contains('/') {
        let parts: Vec<String> = trimmed
            .split('/')
            .map(|part| {
                let part = part.trim();
                alias(part).unwrap_or(part).to_string()
            })
            .collect();
        return Some(parts.join(" OR "));
    }

    Some(trimmed.to_string())
}

/// Map a common non-SPDX spelling to its SPDX id.
fn alias(raw: &str) -> Option<&'static str> {
    let id = match raw.trim() {
        "Apache 2.0" | "Apache License 2.0" | "Apache License, Version 2.0" | "Apache2" => {
            "Apache-2.0"
        }
        "MIT License" | "The MIT License" => "MIT",
        "BSD" | "BSD License" => "BSD-3-Clause",
        "BSD 2-Clause" | "Simplified BSD" => "BSD-2-Clause",
        "BSD 3-Clause" | "New BSD" | "Modified BSD" => "BSD-3-Clause",
        "GNU GPL v2" | "GNU General Public License v2" | "GPL v2" | "GPLv2" => "GPL-2.0-only",
        "GPLv2+" | "GPL v2 or later" => "GPL-2.0-or-later",
        "GNU GPL v3" | "GNU General Public License v3" | "GPL v3" | "GPLv3" => "GPL-3.0-only",
        "GPLv3+" | "GPL v3 or later" => "GPL-3.0-or-later",
        "GNU LGPL v2.1" | "LGPL v2.1" | "LGPLv2.1" => "LGPL-2.1-only",
        "GNU LGPL v3" | "LGPL v3" | "LGPLv3" => "LGPL-3.0-only",
        "Mozilla Public License 2.0" | "MPL 2.0" | "MPLv2" => "MPL-2.0",
        "ISC License" => "ISC",
        "CC0" | "Public Domain" => "CC0-1.0",
        "AGPL v3" | "AGPLv3" | "GNU AGPL v3" => "AGPL-3.0-only",
        "Eclipse Public License 2.0" | "EPL 2.0" => "EPL-2.0",
        _ => return None,
    };
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!(normalize_declared("MIT License").as_deref(), Some("MIT"));
        assert_eq!(
            normalize_declared("Apache License 2.0").as_deref(),
            Some("Apache-2.0")
        );
        assert_eq!(normalize_declared("GPLv3").as_deref(), Some("GPL-3.0-only"));
    }

    #[test]
    fn test_slash_separator() {
        assert_eq!(
            normalize_declared("MIT/Apache-2.0").as_deref(),
            Some("MIT OR Apache-2.0")
        );
        assert_eq!(
            normalize_declared("MIT License / Apache 2.0").as_deref(),
            Some("MIT OR Apache-2.0")
        );
    }

    #[test]
    fn test_proprietary() {
        assert_eq!(
            normalize_declared("Commercial license").as_deref(),
            Some("LicenseRef-proprietary")
        );
    }

    #[test]
    fn test_unknown_and_blank() {
        assert_eq!(normalize_declared(""), None);
        assert_eq!(normalize_declared("  unknown "), None);
    }

    #[test]
    fn test_spdx_text_passes_through() {
        assert_eq!(
            normalize_declared(" (MIT OR ISC) AND Zlib ").as_deref(),
            Some("(MIT OR ISC) AND Zlib")
        );
    }
}
