//! Read-only registry of known SPDX license and exception identifiers.
//!
//! The built-in table is a snapshot of the SPDX license list. A different
//! snapshot can be loaded from the published license-list JSON documents with
//! [`Catalog::from_license_list_json`]; producing those documents is an offline
//! step and not this crate's concern.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// One known license or exception.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub full_name: String,
    pub deprecated: bool,
    /// Whether the `+` marker ("this version or any later one") is meaningful.
    pub supports_or_later: bool,
}

impl CatalogEntry {
    fn license(id: &str, full_name: &str, deprecated: bool) -> Self {
        Self {
            id: id.to_string(),
            full_name: full_name.to_string(),
            deprecated,
            supports_or_later: derive_supports_or_later(id),
        }
    }

    fn exception(id: &str, full_name: &str, deprecated: bool) -> Self {
        Self {
            id: id.to_string(),
            full_name: full_name.to_string(),
            deprecated,
            supports_or_later: false,
        }
    }
}

/// Versioned ids accept `+`, unless the version range is already pinned by an
/// `-only` / `-or-later` suffix.
fn derive_supports_or_later(id: &str) -> bool {
    static VERSIONED: OnceLock<Option<Regex>> = OnceLock::new();
    let versioned = VERSIONED.get_or_init(|| Regex::new(r"-v?\d+(\.\d+)+[a-z]?$").ok());
    !id.ends_with("-only")
        && !id.ends_with("-or-later")
        && versioned.as_ref().is_some_and(|re| re.is_match(id))
}

/// Case-insensitive index over license and exception entries.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    licenses: Vec<CatalogEntry>,
    exceptions: Vec<CatalogEntry>,
    license_index: HashMap<String, usize>,
    exception_index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(licenses: Vec<CatalogEntry>, exceptions: Vec<CatalogEntry>) -> Self {
        let license_index = build_index(&licenses);
        let exception_index = build_index(&exceptions);
        Self {
            licenses,
            exceptions,
            license_index,
            exception_index,
        }
    }

    /// The process-wide built-in catalog, built on first use.
    pub fn builtin() -> &'static Catalog {
        static BUILTIN: OnceLock<Catalog> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            let licenses = LICENSES
                .iter()
                .map(|(id, name, deprecated)| CatalogEntry::license(id, name, *deprecated))
                .collect();
            let exceptions = EXCEPTIONS
                .iter()
                .map(|(id, name, deprecated)| CatalogEntry::exception(id, name, *deprecated))
                .collect();
            let catalog = Catalog::new(licenses, exceptions);
            tracing::debug!(
                licenses = catalog.licenses.len(),
                exceptions = catalog.exceptions.len(),
                "built-in license catalog loaded"
            );
            catalog
        })
    }

    /// Load a catalog from the SPDX `licenses.json` and `exceptions.json` documents.
    pub fn from_license_list_json(
        licenses_json: &str,
        exceptions_json: &str,
    ) -> Result<Self, CatalogError> {
        let licenses: LicenseList = serde_json::from_str(licenses_json)?;
        let exceptions: ExceptionList = serde_json::from_str(exceptions_json)?;

        let licenses = licenses
            .licenses
            .into_iter()
            .map(|l| {
                require_non_blank(&l.license_id, "licenseId")?;
                require_non_blank(&l.name, "name")?;
                Ok(CatalogEntry::license(
                    l.license_id.trim(),
                    l.name.trim(),
                    l.is_deprecated_license_id,
                ))
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        let exceptions = exceptions
            .exceptions
            .into_iter()
            .map(|e| {
                require_non_blank(&e.license_exception_id, "licenseExceptionId")?;
                require_non_blank(&e.name, "name")?;
                Ok(CatalogEntry::exception(
                    e.license_exception_id.trim(),
                    e.name.trim(),
                    e.is_deprecated_license_id,
                ))
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        tracing::debug!(
            licenses = licenses.len(),
            exceptions = exceptions.len(),
            "license catalog loaded from license-list JSON"
        );
        Ok(Self::new(licenses, exceptions))
    }

    /// Find a license by canonical id or full name, ignoring case.
    pub fn lookup_license(&self, id_or_name: &str) -> Option<&CatalogEntry> {
        self.license_index
            .get(&id_or_name.trim().to_ascii_lowercase())
            .and_then(|&i| self.licenses.get(i))
    }

    /// Find an exception by canonical id or full name, ignoring case.
    pub fn lookup_exception(&self, id_or_name: &str) -> Option<&CatalogEntry> {
        self.exception_index
            .get(&id_or_name.trim().to_ascii_lowercase())
            .and_then(|&i| self.exceptions.get(i))
    }

    pub fn licenses(&self) -> &[CatalogEntry] {
        &self.licenses
    }

    pub fn exceptions(&self) -> &[CatalogEntry] {
        &self.exceptions
    }
}

fn build_index(entries: &[CatalogEntry]) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(entries.len() * 2);
    // Ids take precedence over names that happen to collide with them.
    for (i, entry) in entries.iter().enumerate() {
        index.insert(entry.id.to_ascii_lowercase(), i);
    }
    for (i, entry) in entries.iter().enumerate() {
        index.entry(entry.full_name.to_ascii_lowercase()).or_insert(i);
    }
    index
}

fn require_non_blank(value: &str, field: &'static str) -> Result<(), CatalogError> {
    if value.trim().is_empty() {
        return Err(CatalogError::BlankField(field));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct LicenseList {
    licenses: Vec<LicenseListEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LicenseListEntry {
    license_id: String,
    name: String,
    #[serde(default)]
    is_deprecated_license_id: bool,
}

#[derive(Debug, Deserialize)]
struct ExceptionList {
    exceptions: Vec<ExceptionListEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExceptionListEntry {
    license_exception_id: String,
    name: String,
    #[serde(default)]
    is_deprecated_license_id: bool,
}

// (id, full name, deprecated)
const LICENSES: &[(&str, &str, bool)] = &[
    ("0BSD", "BSD Zero Clause License", false),
    ("AAL", "Attribution Assurance License", false),
    ("AFL-1.1", "Academic Free License v1.1", false),
    ("AFL-2.0", "Academic Free License v2.0", false),
    ("AFL-2.1", "Academic Free License v2.1", false),
    ("AFL-3.0", "Academic Free License v3.0", false),
    ("AGPL-1.0", "Affero General Public License v1.0", true),
    ("AGPL-1.0-only", "Affero General Public License v1.0 only", false),
    ("AGPL-1.0-or-later", "Affero General Public License v1.0 or later", false),
    ("AGPL-3.0", "GNU Affero General Public License v3.0", true),
    ("AGPL-3.0-only", "GNU Affero General Public License v3.0 only", false),
    ("AGPL-3.0-or-later", "GNU Affero General Public License v3.0 or later", false),
    ("Apache-1.0", "Apache License 1.0", false),
    ("Apache-1.1", "Apache License 1.1", false),
    ("Apache-2.0", "Apache License 2.0", false),
    ("APSL-1.0", "Apple Public Source License 1.0", false),
    ("APSL-2.0", "Apple Public Source License 2.0", false),
    ("Artistic-1.0", "Artistic License 1.0", false),
    ("Artistic-1.0-Perl", "Artistic License 1.0 (Perl)", false),
    ("Artistic-2.0", "Artistic License 2.0", false),
    ("Beerware", "Beerware License", false),
    ("BlueOak-1.0.0", "Blue Oak Model License 1.0.0", false),
    ("BSD-1-Clause", "BSD 1-Clause License", false),
    ("BSD-2-Clause", "BSD 2-Clause \"Simplified\" License", false),
    ("BSD-2-Clause-FreeBSD", "BSD 2-Clause FreeBSD License", true),
    ("BSD-2-Clause-NetBSD", "BSD 2-Clause NetBSD License", true),
    ("BSD-2-Clause-Patent", "BSD-2-Clause Plus Patent License", false),
    ("BSD-3-Clause", "BSD 3-Clause \"New\" or \"Revised\" License", false),
    ("BSD-3-Clause-Clear", "BSD 3-Clause Clear License", false),
    ("BSD-3-Clause-LBNL", "Lawrence Berkeley National Labs BSD variant license", false),
    ("BSD-4-Clause", "BSD 4-Clause \"Original\" or \"Old\" License", false),
    ("BSL-1.0", "Boost Software License 1.0", false),
    ("BUSL-1.1", "Business Source License 1.1", false),
    ("bzip2-1.0.6", "bzip2 and libbzip2 License v1.0.6", false),
    ("CC-BY-1.0", "Creative Commons Attribution 1.0 Generic", false),
    ("CC-BY-2.0", "Creative Commons Attribution 2.0 Generic", false),
    ("CC-BY-3.0", "Creative Commons Attribution 3.0 Unported", false),
    ("CC-BY-4.0", "Creative Commons Attribution 4.0 International", false),
    ("CC-BY-NC-4.0", "Creative Commons Attribution Non Commercial 4.0 International", false),
    ("CC-BY-ND-4.0", "Creative Commons Attribution No Derivatives 4.0 International", false),
    ("CC-BY-SA-3.0", "Creative Commons Attribution Share Alike 3.0 Unported", false),
    ("CC-BY-SA-4.0", "Creative Commons Attribution Share Alike 4.0 International", false),
    ("CC0-1.0", "Creative Commons Zero v1.0 Universal", false),
    ("CDDL-1.0", "Common Development and Distribution License 1.0", false),
    ("CDDL-1.1", "Common Development and Distribution License 1.1", false),
    ("CECILL-2.1", "CeCILL Free Software License Agreement v2.1", false),
    ("CPAL-1.0", "Common Public Attribution License 1.0", false),
    ("CPL-1.0", "Common Public License 1.0", false),
    ("ECL-2.0", "Educational Community License v2.0", false),
    ("EFL-2.0", "Eiffel Forum License v2.0", false),
    ("EPL-1.0", "Eclipse Public License 1.0", false),
    ("EPL-2.0", "Eclipse Public License 2.0", false),
    ("EUPL-1.0", "European Union Public License 1.0", false),
    ("EUPL-1.1", "European Union Public License 1.1", false),
    ("EUPL-1.2", "European Union Public License 1.2", false),
    ("FSFAP", "FSF All Permissive License", false),
    ("FTL", "Freetype Project License", false),
    ("GFDL-1.1", "GNU Free Documentation License v1.1", true),
    ("GFDL-1.1-only", "GNU Free Documentation License v1.1 only", false),
    ("GFDL-1.1-or-later", "GNU Free Documentation License v1.1 or later", false),
    ("GFDL-1.2", "GNU Free Documentation License v1.2", true),
    ("GFDL-1.2-only", "GNU Free Documentation License v1.2 only", false),
    ("GFDL-1.2-or-later", "GNU Free Documentation License v1.2 or later", false),
    ("GFDL-1.3", "GNU Free Documentation License v1.3", true),
    ("GFDL-1.3-only", "GNU Free Documentation License v1.3 only", false),
    ("GFDL-1.3-or-later", "GNU Free Documentation License v1.3 or later", false),
    ("GPL-1.0", "GNU General Public License v1.0 only", true),
    ("GPL-1.0-only", "GNU General Public License v1.0 only", false),
    ("GPL-1.0-or-later", "GNU General Public License v1.0 or later", false),
    ("GPL-2.0", "GNU General Public License v2.0 only", true),
    ("GPL-2.0-only", "GNU General Public License v2.0 only", false),
    ("GPL-2.0-or-later", "GNU General Public License v2.0 or later", false),
    ("GPL-2.0-with-classpath-exception", "GNU General Public License v2.0 w/Classpath exception", true),
    ("GPL-2.0-with-GCC-exception", "GNU General Public License v2.0 w/GCC Runtime Library exception", true),
    ("GPL-3.0", "GNU General Public License v3.0 only", true),
    ("GPL-3.0-only", "GNU General Public License v3.0 only", false),
    ("GPL-3.0-or-later", "GNU General Public License v3.0 or later", false),
    ("GPL-3.0-with-GCC-exception", "GNU General Public License v3.0 w/GCC Runtime Library exception", true),
    ("HPND", "Historical Permission Notice and Disclaimer", false),
    ("ICU", "ICU License", false),
    ("IJG", "Independent JPEG Group License", false),
    ("Imlib2", "Imlib2 License", false),
    ("Info-ZIP", "Info-ZIP License", false),
    ("IPL-1.0", "IBM Public License v1.0", false),
    ("ISC", "ISC License", false),
    ("JSON", "JSON License", false),
    ("LGPL-2.0", "GNU Library General Public License v2 only", true),
    ("LGPL-2.0-only", "GNU Library General Public License v2 only", false),
    ("LGPL-2.0-or-later", "GNU Library General Public License v2 or later", false),
    ("LGPL-2.1", "GNU Lesser General Public License v2.1 only", true),
    ("LGPL-2.1-only", "GNU Lesser General Public License v2.1 only", false),
    ("LGPL-2.1-or-later", "GNU Lesser General Public License v2.1 or later", false),
    ("LGPL-3.0", "GNU Lesser General Public License v3.0 only", true),
    ("LGPL-3.0-only", "GNU Lesser General Public License v3.0 only", false),
    ("LGPL-3.0-or-later", "GNU Lesser General Public License v3.0 or later", false),
    ("libpng-2.0", "PNG Reference Library version 2", false),
    ("Libpng", "libpng License", false),
    ("LPL-1.02", "Lucent Public License v1.02", false),
    ("LPPL-1.3c", "LaTeX Project Public License v1.3c", false),
    ("MirOS", "The MirOS Licence", false),
    ("MIT", "MIT License", false),
    ("MIT-0", "MIT No Attribution", false),
    ("MIT-CMU", "CMU License", false),
    ("MIT-Modern-Variant", "MIT License Modern Variant", false),
    ("MPL-1.0", "Mozilla Public License 1.0", false),
    ("MPL-1.1", "Mozilla Public License 1.1", false),
    ("MPL-2.0", "Mozilla Public License 2.0", false),
    ("MPL-2.0-no-copyleft-exception", "Mozilla Public License 2.0 (no copyleft exception)", false),
    ("MS-PL", "Microsoft Public License", false),
    ("MS-RL", "Microsoft Reciprocal License", false),
    ("MulanPSL-2.0", "Mulan Permissive Software License, Version 2", false),
    ("NCSA", "University of Illinois/NCSA Open Source License", false),
    ("Nokia", "Nokia Open Source License", false),
    ("NTP", "NTP License", false),
    ("ODbL-1.0", "Open Data Commons Open Database License v1.0", false),
    ("OFL-1.0", "SIL Open Font License 1.0", false),
    ("OFL-1.1", "SIL Open Font License 1.1", false),
    ("OLDAP-2.8", "Open LDAP Public License v2.8", false),
    ("OpenSSL", "OpenSSL License", false),
    ("OSL-1.0", "Open Software License 1.0", false),
    ("OSL-2.0", "Open Software License 2.0", false),
    ("OSL-2.1", "Open Software License 2.1", false),
    ("OSL-3.0", "Open Software License 3.0", false),
    ("PHP-3.0", "PHP License v3.0", false),
    ("PHP-3.01", "PHP License v3.01", false),
    ("PostgreSQL", "PostgreSQL License", false),
    ("PSF-2.0", "Python Software Foundation License 2.0", false),
    ("Python-2.0", "Python License 2.0", false),
    ("QPL-1.0", "Q Public License 1.0", false),
    ("Ruby", "Ruby License", false),
    ("SGI-B-2.0", "SGI Free Software License B v2.0", false),
    ("SISSL", "Sun Industry Standards Source License v1.1", false),
    ("Sleepycat", "Sleepycat License", false),
    ("SSPL-1.0", "Server Side Public License, v 1", false),
    ("StandardML-NJ", "Standard ML of New Jersey License", true),
    ("TCL", "TCL/TK License", false),
    ("Unicode-3.0", "Unicode License v3", false),
    ("Unicode-DFS-2016", "Unicode License Agreement - Data Files and Software (2016)", false),
    ("Unlicense", "The Unlicense", false),
    ("UPL-1.0", "Universal Permissive License v1.0", false),
    ("Vim", "Vim License", false),
    ("W3C", "W3C Software Notice and License (2002-12-31)", false),
    ("WTFPL", "Do What The F*ck You Want To Public License", false),
    ("wxWindows", "wxWindows Library License", true),
    ("X11", "X11 License", false),
    ("Xnet", "X.Net License", false),
    ("Zend-2.0", "Zend License v2.0", false),
    ("Zlib", "zlib License", false),
    ("zlib-acknowledgement", "zlib/libpng License with Acknowledgement", false),
    ("ZPL-2.0", "Zope Public License 2.0", false),
    ("ZPL-2.1", "Zope Public License 2.1", false),
];

const EXCEPTIONS: &[(&str, &str, bool)] = &[
    ("389-exception", "389 Directory Server Exception", false),
    ("Autoconf-exception-2.0", "Autoconf exception 2.0", false),
    ("Autoconf-exception-3.0", "Autoconf exception 3.0", false),
    ("Bison-exception-2.2", "Bison exception 2.2", false),
    ("Bootloader-exception", "Bootloader Distribution Exception", false),
    ("Classpath-exception-2.0", "Classpath exception 2.0", false),
    ("CLISP-exception-2.0", "CLISP exception 2.0", false),
    ("DigiRule-FOSS-exception", "DigiRule FOSS License Exception", false),
    ("eCos-exception-2.0", "eCos exception 2.0", false),
    ("FLTK-exception", "FLTK exception", false),
    ("Font-exception-2.0", "Font exception 2.0", false),
    ("freertos-exception-2.0", "FreeRTOS Exception 2.0", false),
    ("GCC-exception-2.0", "GCC Runtime Library exception 2.0", false),
    ("GCC-exception-3.1", "GCC Runtime Library exception 3.1", false),
    ("gnu-javamail-exception", "GNU JavaMail exception", false),
    ("GPL-3.0-linking-exception", "GPL-3.0 Linking Exception", false),
    ("GPL-3.0-linking-source-exception", "GPL-3.0 Linking Exception (with Corresponding Source)", false),
    ("GPL-CC-1.0", "GPL Cooperation Commitment 1.0", false),
    ("i2p-gpl-java-exception", "i2p GPL+Java Exception", false),
    ("KiCad-libraries-exception", "KiCad Libraries Exception", false),
    ("LGPL-3.0-linking-exception", "LGPL-3.0 Linking Exception", false),
    ("Libtool-exception", "Libtool Exception", false),
    ("Linux-syscall-note", "Linux Syscall Note", false),
    ("LLVM-exception", "LLVM Exception", false),
    ("LZMA-exception", "LZMA exception", false),
    ("mif-exception", "Macros and Inline Functions Exception", false),
    ("Nokia-Qt-exception-1.1", "Nokia Qt LGPL exception 1.1", true),
    ("OCaml-LGPL-linking-exception", "OCaml LGPL Linking Exception", false),
    ("OpenJDK-assembly-exception-1.0", "OpenJDK Assembly exception 1.0", false),
    ("openvpn-openssl-exception", "OpenVPN OpenSSL Exception", false),
    ("PS-or-PDF-font-exception-20170817", "PS/PDF font exception (2017-08-17)", false),
    ("Qt-GPL-exception-1.0", "Qt GPL exception 1.0", false),
    ("Qt-LGPL-exception-1.1", "Qt LGPL exception 1.1", false),
    ("SHL-2.0", "Solderpad Hardware License v2.0", false),
    ("SHL-2.1", "Solderpad Hardware License v2.1", false),
    ("Swift-exception", "Swift Exception", false),
    ("u-boot-exception-2.0", "U-Boot exception 2.0", false),
    ("Universal-FOSS-exception-1.0", "Universal FOSS Exception, Version 1.0", false),
    ("vsftpd-openssl-exception", "vsftpd OpenSSL exception", false),
    ("WxWindows-exception-3.1", "WxWindows Library Exception 3.1", false),
];
