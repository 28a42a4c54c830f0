use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::license::expression::{Expression, LicenseId};
use crate::models::LicenseRisk;

pub const PERMISSIVE: &str = "permissive";
pub const WEAK_COPYLEFT: &str = "weak-copyleft";
pub const STRONG_COPYLEFT: &str = "strong-copyleft";
pub const PROPRIETARY: &str = "proprietary";

/// A caller-defined category label such as `"permissive"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(label: &str) -> Self {
        Self(label.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(label: &str) -> Self {
        Category::new(label)
    }
}

/// Categories and a free-text description attached to one license id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(default)]
    pub categories: BTreeSet<Category>,
    #[serde(default)]
    pub description: Option<String>,
}

/// License id → classification, looked up case-insensitively.
///
/// Loaded once per evaluation run and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct ClassificationTable {
    entries: HashMap<String, (String, Classification)>,
}

impl ClassificationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Risk categories for well-known licenses.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for (ids, category) in [
            (BUILTIN_PERMISSIVE, PERMISSIVE),
            (BUILTIN_WEAK_COPYLEFT, WEAK_COPYLEFT),
            (BUILTIN_STRONG_COPYLEFT, STRONG_COPYLEFT),
            (BUILTIN_PROPRIETARY, PROPRIETARY),
        ] {
            for id in ids {
                table.add_category(id, Category::new(category));
            }
        }
        table
    }

    /// Replace the classification of `id`.
    pub fn insert(&mut self, id: &str, classification: Classification) {
        let id = id.trim();
        self.entries
            .insert(id.to_ascii_lowercase(), (id.to_string(), classification));
    }

    pub fn add_category(&mut self, id: &str, category: Category) {
        let id = id.trim();
        self.entries
            .entry(id.to_ascii_lowercase())
            .or_insert_with(|| (id.to_string(), Classification::default()))
            .1
            .categories
            .insert(category);
    }

    pub fn get(&self, id: &str) -> Option<&Classification> {
        self.entries
            .get(&id.trim().to_ascii_lowercase())
            .map(|(_, classification)| classification)
    }

    /// Categories of `id`; empty if unclassified.
    pub fn categories(&self, id: &str) -> BTreeSet<Category> {
        self.get(id)
            .map(|c| c.categories.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Categories for every distinct license leaf of `expr`.
///
/// Unclassified licenses map to an empty set. Neither argument is modified.
pub fn classify(
    expr: &Expression,
    table: &ClassificationTable,
) -> BTreeMap<LicenseId, BTreeSet<Category>> {
    expr.licenses()
        .into_iter()
        .map(|id| (id.clone(), table.categories(id.as_str())))
        .collect()
}

/// True if at least one choice of `expr` uses only licenses carrying one of
/// the `allowed` categories.
pub fn has_choice_within(
    expr: &Expression,
    table: &ClassificationTable,
    allowed: &BTreeSet<Category>,
) -> bool {
    expr.decompose().iter().any(|choice| {
        choice.iter().all(|term| {
            table
                .categories(term.license.as_str())
                .iter()
                .any(|category| allowed.contains(category))
        })
    })
}

/// Risk implied by the built-in category labels of a single license.
pub fn license_risk(table: &ClassificationTable, id: &str) -> LicenseRisk {
    let categories = table.categories(id);
    let has = |label: &str| categories.iter().any(|c| c.as_str() == label);
    if has(PROPRIETARY) {
        LicenseRisk::Proprietary
    } else if has(STRONG_COPYLEFT) {
        LicenseRisk::StrongCopyleft
    } else if has(WEAK_COPYLEFT) {
        LicenseRisk::WeakCopyleft
    } else if has(PERMISSIVE) {
        LicenseRisk::Permissive
    } else {
        LicenseRisk::Unknown
    }
}

/// Overall risk of an expression.
///
/// Within a choice the most restrictive license wins (`AND`); across choices the
/// most permissive choice wins (`OR`).
pub fn expression_risk(expr: &Expression, table: &ClassificationTable) -> LicenseRisk {
    expr.decompose()
        .iter()
        .map(|choice| {
            choice
                .iter()
                .map(|term| license_risk(table, term.license.as_str()))
                .max()
                .unwrap_or(LicenseRisk::Unknown)
        })
        .min()
        .unwrap_or(LicenseRisk::Unknown)
}

const BUILTIN_PERMISSIVE: &[&str] = &[
    "0BSD",
    "AFL-3.0",
    "Apache-1.1",
    "Apache-2.0",
    "Artistic-2.0",
    "BlueOak-1.0.0",
    "BSD-1-Clause",
    "BSD-2-Clause",
    "BSD-2-Clause-Patent",
    "BSD-3-Clause",
    "BSD-3-Clause-Clear",
    "BSD-4-Clause",
    "BSL-1.0",
    "CC-BY-3.0",
    "CC-BY-4.0",
    "CC0-1.0",
    "ISC",
    "MIT",
    "MIT-0",
    "MulanPSL-2.0",
    "NCSA",
    "PostgreSQL",
    "PSF-2.0",
    "Python-2.0",
    "Unicode-3.0",
    "Unicode-DFS-2016",
    "Unlicense",
    "UPL-1.0",
    "WTFPL",
    "X11",
    "Zlib",
];

const BUILTIN_WEAK_COPYLEFT: &[&str] = &[
    "APSL-2.0",
    "CDDL-1.0",
    "CDDL-1.1",
    "EPL-1.0",
    "EPL-2.0",
    "EUPL-1.2",
    "LGPL-2.0",
    "LGPL-2.0-only",
    "LGPL-2.0-or-later",
    "LGPL-2.1",
    "LGPL-2.1-only",
    "LGPL-2.1-or-later",
    "LGPL-3.0",
    "LGPL-3.0-only",
    "LGPL-3.0-or-later",
    "MPL-1.1",
    "MPL-2.0",
    "MS-RL",
    "OSL-3.0",
];

const BUILTIN_STRONG_COPYLEFT: &[&str] = &[
    "AGPL-3.0",
    "AGPL-3.0-only",
    "AGPL-3.0-or-later",
    "CC-BY-SA-4.0",
    "EUPL-1.1",
    "GPL-2.0",
    "GPL-2.0-only",
    "GPL-2.0-or-later",
    "GPL-3.0",
    "GPL-3.0-only",
    "GPL-3.0-or-later",
    "SSPL-1.0",
];

const BUILTIN_PROPRIETARY: &[&str] = &["LicenseRef-proprietary", "BUSL-1.1"];
