use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Outcome of checking one expression, as rendered by the reports.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    /// Text as supplied by the caller.
    pub input: String,
    /// Canonical form; `None` when the input did not parse.
    pub expression: Option<String>,
    pub risk: LicenseRisk,
    pub verdict: PolicyVerdict,
    /// The least restrictive choice that produced `verdict`, in SPDX text.
    pub best_choice: Option<String>,
    pub error: Option<String>,
}

/// Ordered from least to most restrictive; `Unknown` ranks last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LicenseRisk {
    Permissive,
    WeakCopyleft,
    StrongCopyleft,
    Proprietary,
    Unknown,
}

impl std::fmt::Display for LicenseRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseRisk::Permissive => write!(f, "Permissive"),
            LicenseRisk::WeakCopyleft => write!(f, "Weak Copyleft"),
            LicenseRisk::StrongCopyleft => write!(f, "Strong Copyleft"),
            LicenseRisk::Proprietary => write!(f, "Proprietary"),
            LicenseRisk::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Ordered from best to worst: `Pass < Warn < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyVerdict {
    Pass,
    Warn,
    Error,
}

impl std::fmt::Display for PolicyVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyVerdict::Pass => write!(f, "pass"),
            PolicyVerdict::Warn => write!(f, "warn"),
            PolicyVerdict::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum ReferenceCategory {
    Security,
    PackageManager,
    PersistentId,
    Other,
}

impl std::fmt::Display for ReferenceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceCategory::Security => write!(f, "SECURITY"),
            ReferenceCategory::PackageManager => write!(f, "PACKAGE-MANAGER"),
            ReferenceCategory::PersistentId => write!(f, "PERSISTENT-ID"),
            ReferenceCategory::Other => write!(f, "OTHER"),
        }
    }
}

/// Where more information about a package can be found, e.g. a purl.
///
/// `locator` and `reference_type` are never blank; deserialization goes
/// through the same check as [`ExternalReference::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawExternalReference")]
pub struct ExternalReference {
    reference_category: ReferenceCategory,
    reference_locator: String,
    reference_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

impl ExternalReference {
    pub fn new(
        category: ReferenceCategory,
        locator: &str,
        reference_type: &str,
        comment: Option<&str>,
    ) -> Result<Self, ModelError> {
        if locator.trim().is_empty() {
            return Err(ModelError::BlankField("referenceLocator"));
        }
        if reference_type.trim().is_empty() {
            return Err(ModelError::BlankField("referenceType"));
        }
        Ok(Self {
            reference_category: category,
            reference_locator: locator.trim().to_string(),
            reference_type: reference_type.trim().to_string(),
            comment: comment
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        })
    }

    pub fn category(&self) -> ReferenceCategory {
        self.reference_category
    }

    pub fn locator(&self) -> &str {
        &self.reference_locator
    }

    pub fn reference_type(&self) -> &str {
        &self.reference_type
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExternalReference {
    reference_category: ReferenceCategory,
    reference_locator: String,
    reference_type: String,
    #[serde(default)]
    comment: Option<String>,
}

impl TryFrom<RawExternalReference> for ExternalReference {
    type Error = ModelError;

    fn try_from(raw: RawExternalReference) -> Result<Self, Self::Error> {
        ExternalReference::new(
            raw.reference_category,
            &raw.reference_locator,
            &raw.reference_type,
            raw.comment.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_ordering() {
        assert!(PolicyVerdict::Pass < PolicyVerdict::Warn);
        assert!(PolicyVerdict::Warn < PolicyVerdict::Error);
    }

    #[test]
    fn test_risk_ordering() {
        assert!(LicenseRisk::Permissive < LicenseRisk::WeakCopyleft);
        assert!(LicenseRisk::StrongCopyleft < LicenseRisk::Proprietary);
        assert!(LicenseRisk::Proprietary < LicenseRisk::Unknown);
    }

    #[test]
    fn test_external_reference_requires_locator_and_type() {
        assert_eq!(
            ExternalReference::new(ReferenceCategory::PackageManager, " ", "purl", None)
                .unwrap_err(),
            ModelError::BlankField("referenceLocator")
        );
        assert_eq!(
            ExternalReference::new(ReferenceCategory::PackageManager, "pkg:cargo/serde@1.0.0", "", None)
                .unwrap_err(),
            ModelError::BlankField("referenceType")
        );
    }

    #[test]
    fn test_external_reference_blank_comment_is_dropped() {
        let reference = ExternalReference::new(
            ReferenceCategory::Security,
            "cpe:2.3:a:apache:log4j:2.14.1:*:*:*:*:*:*:*",
            "cpe23Type",
            Some("  "),
        )
        .unwrap();
        assert_eq!(reference.comment(), None);
        assert_eq!(reference.category(), ReferenceCategory::Security);
    }

    #[test]
    fn test_external_reference_json() {
        let reference = ExternalReference::new(
            ReferenceCategory::PackageManager,
            "pkg:cargo/serde@1.0.0",
            "purl",
            Some("from Cargo.lock"),
        )
        .unwrap();
        let json = serde_json::to_value(&reference).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "referenceCategory": "PACKAGE-MANAGER",
                "referenceLocator": "pkg:cargo/serde@1.0.0",
                "referenceType": "purl",
                "comment": "from Cargo.lock"
            })
        );

        let back: ExternalReference = serde_json::from_value(json).unwrap();
        assert_eq!(back, reference);
    }

    #[test]
    fn test_external_reference_json_rejects_blank_type() {
        let json = serde_json::json!({
            "referenceCategory": "OTHER",
            "referenceLocator": "https://example.com",
            "referenceType": "  "
        });
        assert!(serde_json::from_value::<ExternalReference>(json).is_err());
    }
}
