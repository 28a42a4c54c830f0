use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};

use crate::license::catalog::Catalog;
use crate::license::classifier::{
    Category, Classification, ClassificationTable, PERMISSIVE, PROPRIETARY, STRONG_COPYLEFT,
    WEAK_COPYLEFT,
};
use crate::license::parser::ParseOptions;
use crate::logging::LoggingConfig;
use crate::models::PolicyVerdict;

/// Root configuration structure, deserialized from `.license-expr/config.toml`.
///
/// Every section is optional and falls back to its default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub parser: ParseOptions,
    pub policy: PolicyConfig,
    /// Extra or replacement entries for the built-in classification table.
    pub classifications: Vec<ClassificationOverride>,
    pub logging: LoggingConfig,
    pub catalog: CatalogConfig,
}

/// Optional SPDX license-list snapshot replacing the built-in catalog.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Path to the license list's `licenses.json`.
    pub licenses: Option<PathBuf>,
    /// Path to the license list's `exceptions.json`.
    pub exceptions: Option<PathBuf>,
}

impl CatalogConfig {
    /// The configured catalog, or `None` to use [`Catalog::builtin`].
    pub fn load(&self) -> Result<Option<Catalog>> {
        match (&self.licenses, &self.exceptions) {
            (None, None) => Ok(None),
            (Some(licenses), Some(exceptions)) => {
                let licenses_json = std::fs::read_to_string(licenses)
                    .with_context(|| format!("failed to read {}", licenses.display()))?;
                let exceptions_json = std::fs::read_to_string(exceptions)
                    .with_context(|| format!("failed to read {}", exceptions.display()))?;
                let catalog = Catalog::from_license_list_json(&licenses_json, &exceptions_json)
                    .with_context(|| format!("invalid license list {}", licenses.display()))?;
                Ok(Some(catalog))
            }
            _ => anyhow::bail!("[catalog] needs both `licenses` and `exceptions` paths"),
        }
    }
}

/// Defines how licenses are evaluated.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// Verdict applied to any license no rule covers. Defaults to `warn`.
    #[serde(default = "default_policy_action")]
    pub default: PolicyAction,
    /// Per-license overrides keyed by SPDX identifier (e.g. `"MIT"`), or by a
    /// full `"<license> WITH <exception>"` term. Keys are stored lowercased;
    /// use [`PolicyConfig::set_license_action`] to add one.
    #[serde(default, deserialize_with = "deserialize_license_rules")]
    pub licenses: BTreeMap<String, PolicyAction>,
    /// Verdicts per classification category (e.g. `"strong-copyleft"`).
    #[serde(default)]
    pub categories: HashMap<String, PolicyAction>,
}

fn default_policy_action() -> PolicyAction {
    PolicyAction::Warn
}

fn license_rule_key(id: &str) -> String {
    id.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

/// Lowercase every key; keys that differ only in case must agree.
fn deserialize_license_rules<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, PolicyAction>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = HashMap::<String, PolicyAction>::deserialize(deserializer)?;
    let mut rules = BTreeMap::new();
    for (id, action) in raw {
        let key = license_rule_key(&id);
        match rules.insert(key.clone(), action) {
            Some(previous) if previous != action => {
                return Err(serde::de::Error::custom(format!(
                    "conflicting policy rules for license '{}'",
                    key
                )));
            }
            _ => {}
        }
    }
    Ok(rules)
}

/// The action to take when a license matches a policy rule.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PolicyAction {
    /// Compliant; no action needed.
    Pass,
    /// Warrants review but does not fail the check.
    Warn,
    /// Violates policy; the CLI exits with code 1.
    Error,
}

impl PolicyAction {
    pub fn to_verdict(self) -> PolicyVerdict {
        match self {
            PolicyAction::Pass => PolicyVerdict::Pass,
            PolicyAction::Warn => PolicyVerdict::Warn,
            PolicyAction::Error => PolicyVerdict::Error,
        }
    }
}

impl PolicyConfig {
    /// Case-insensitive lookup of a per-license rule.
    pub fn license_action(&self, id: &str) -> Option<PolicyAction> {
        self.licenses.get(&license_rule_key(id)).copied()
    }

    pub fn set_license_action(&mut self, id: &str, action: PolicyAction) {
        self.licenses.insert(license_rule_key(id), action);
    }

    pub fn category_action(&self, category: &Category) -> Option<PolicyAction> {
        self.categories
            .iter()
            .find(|(key, _)| key.trim() == category.as_str())
            .map(|(_, action)| *action)
    }
}

impl Default for PolicyConfig {
    /// Built-in default policy used when no config file is found.
    ///
    /// Permissive licenses pass, weak-copyleft licenses warn, and strong-copyleft
    /// or proprietary licenses produce an error.
    fn default() -> Self {
        let mut categories = HashMap::new();
        categories.insert(PERMISSIVE.to_string(), PolicyAction::Pass);
        categories.insert(WEAK_COPYLEFT.to_string(), PolicyAction::Warn);
        categories.insert(STRONG_COPYLEFT.to_string(), PolicyAction::Error);
        categories.insert(PROPRIETARY.to_string(), PolicyAction::Error);

        PolicyConfig {
            default: PolicyAction::Warn,
            licenses: BTreeMap::new(),
            categories,
        }
    }
}

/// A `[[classifications]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassificationOverride {
    pub id: String,
    #[serde(default)]
    pub categories: BTreeSet<Category>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Config {
    /// The built-in classification table with this config's entries applied.
    pub fn classification_table(&self) -> ClassificationTable {
        let mut table = ClassificationTable::builtin();
        for entry in &self.classifications {
            table.insert(
                &entry.id,
                Classification {
                    categories: entry.categories.clone(),
                    description: entry.description.clone(),
                },
            );
        }
        table
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<project_path>/.license-expr/config.toml`
/// 3. `~/.config/license-expr/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = project_path.join(".license-expr").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".config").join("license-expr").join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    tracing::debug!("no config file found, using built-in defaults");
    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("invalid config file {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::license::parser::{LicenseRefPolicy, DEFAULT_MAX_DEPTH};
    use crate::logging::LogFormat;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.parser.strict);
        assert_eq!(config.parser.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.policy.default, PolicyAction::Warn);
        assert_eq!(
            config.policy.category_action(&Category::new(STRONG_COPYLEFT)),
            Some(PolicyAction::Error)
        );
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_parse_full_config() {
        let content = r#"
[parser]
strict = false
allow_unknown_exceptions = true
license_ref = "accept-any"

[policy]
default = "error"

[policy.licenses]
"MIT" = "pass"

[policy.categories]
"weak-copyleft" = "pass"

[[classifications]]
id = "LicenseRef-internal"
categories = ["permissive"]
description = "Internal code"

[logging]
level = "debug"
format = "json"
"#;
        let config: Config = toml::from_str(content).unwrap();
        assert!(!config.parser.strict);
        assert!(config.parser.allow_unknown_exceptions);
        assert_eq!(config.parser.license_ref, LicenseRefPolicy::AcceptAny);
        assert_eq!(config.parser.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.policy.default, PolicyAction::Error);
        assert_eq!(config.policy.license_action("mit"), Some(PolicyAction::Pass));
        assert_eq!(config.logging.format, LogFormat::Json);

        let table = config.classification_table();
        assert!(table
            .categories("licenseref-internal")
            .contains(&Category::new(PERMISSIVE)));
        assert!(table.categories("MIT").contains(&Category::new(PERMISSIVE)));
    }

    #[test]
    fn test_classification_override_replaces_builtin() {
        let content = r#"
[[classifications]]
id = "MPL-2.0"
categories = ["permissive"]
"#;
        let config: Config = toml::from_str(content).unwrap();
        let table = config.classification_table();
        assert_eq!(
            table.categories("MPL-2.0"),
            BTreeSet::from([Category::new(PERMISSIVE)])
        );
    }

    #[test]
    fn test_load_config_override_path() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "[policy]\ndefault = \"pass\"\n").unwrap();
        let config = load_config(Path::new("."), Some(f.path())).unwrap();
        assert_eq!(config.policy.default, PolicyAction::Pass);
    }

    #[test]
    fn test_load_config_from_project_dir() {
        let dir = TempDir::new().unwrap();
        let config_dir = dir.path().join(".license-expr");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(config_dir.join("config.toml"), "[parser]\nstrict = false\n").unwrap();

        let config = load_config(dir.path(), None).unwrap();
        assert!(!config.parser.strict);
    }

    #[test]
    fn test_catalog_config_loads_license_list() {
        let dir = TempDir::new().unwrap();
        let licenses = dir.path().join("licenses.json");
        let exceptions = dir.path().join("exceptions.json");
        std::fs::write(
            &licenses,
            r#"{ "licenses": [ { "licenseId": "MIT", "name": "MIT License" } ] }"#,
        )
        .unwrap();
        std::fs::write(&exceptions, r#"{ "exceptions": [] }"#).unwrap();

        let config = CatalogConfig {
            licenses: Some(licenses),
            exceptions: Some(exceptions),
        };
        let catalog = config.load().unwrap().unwrap();
        assert_eq!(catalog.licenses().len(), 1);
        assert!(CatalogConfig::default().load().unwrap().is_none());
    }

    #[test]
    fn test_catalog_config_requires_both_paths() {
        let config = CatalogConfig {
            licenses: Some(PathBuf::from("licenses.json")),
            exceptions: None,
        };
        assert!(config.load().is_err());
    }

    #[test]
    fn test_license_rules_are_case_insensitive() {
        let content = r#"
[policy.licenses]
"MIT" = "pass"
"mit" = "pass"
"GPL-2.0-only  WITH Classpath-exception-2.0" = "warn"
"#;
        let config: Config = toml::from_str(content).unwrap();
        assert_eq!(config.policy.licenses.len(), 2);
        assert_eq!(config.policy.license_action("Mit"), Some(PolicyAction::Pass));
        assert_eq!(
            config
                .policy
                .license_action("gpl-2.0-only WITH classpath-exception-2.0"),
            Some(PolicyAction::Warn)
        );
    }

    #[test]
    fn test_conflicting_license_rules_are_rejected() {
        let content = r#"
[policy.licenses]
"MIT" = "pass"
"mit" = "error"
"#;
        let err = toml::from_str::<Config>(content).unwrap_err();
        assert!(err.to_string().contains("conflicting policy rules for license 'mit'"));
    }

    #[test]
    fn test_load_config_reports_invalid_toml() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "[policy\n").unwrap();
        let err = load_config(Path::new("."), Some(f.path())).unwrap_err();
        assert!(err.to_string().contains("invalid config file"));
    }
}
