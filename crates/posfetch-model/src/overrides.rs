// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

#[derive(Debug)]
pub struct OverridesLoadError(pub String);

impl Display for OverridesLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot load attribute overrides: {}", self.0)
    }
}

impl std::error::Error for OverridesLoadError {}

/// Explicit exceptions to the mechanical external-name → column-name
/// transform, keyed by the external (wire) attribute name.
///
/// Loaded once at pipeline construction and treated as immutable for the
/// rest of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeOverrides(BTreeMap<String, String>);

impl AttributeOverrides {
    #[must_use]
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Reads overrides from a JSON object of `{"externalName": "COLUMN"}`.
    pub fn from_json_file(path: &Path) -> Result<Self, OverridesLoadError> {
        let raw = fs::read_to_string(path).map_err(|e| OverridesLoadError(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| OverridesLoadError(e.to_string()))
    }

    #[must_use]
    pub fn get(&self, external_name: &str) -> Option<&str> {
        self.0.get(external_name).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for AttributeOverrides {
    /// Built-in exception list for the destination schema shipped by the
    /// upstream import tool, where the mechanical rename does not match the
    /// real column name.
    fn default() -> Self {
        let entries = [
            ("partnerBsm1", "ID_JE_1_PARTNER_BSM"),
            ("partnerBsm2", "ID_JE_2_PARTNER_BSM"),
            ("charOsType", "CHAROS_KOD"),
            ("kodAdresnihoMista", "KOD_ADRM"),
            ("idNadrizenePravnickeOsoby", "ID_NADRIZENE_PO"),
        ];
        Self(
            entries
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::AttributeOverrides;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn default_table_resolves_known_exceptions() {
        let overrides = AttributeOverrides::default();
        assert_eq!(overrides.get("charOsType"), Some("CHAROS_KOD"));
        assert_eq!(overrides.get("partnerBsm1"), Some("ID_JE_1_PARTNER_BSM"));
        assert_eq!(overrides.get("stavDat"), None);
    }

    #[test]
    fn loads_overrides_from_json() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("overrides.json");
        fs::write(&path, r#"{"kodAdresnihoMista": "KOD_ADRM"}"#).expect("write");
        let overrides = AttributeOverrides::from_json_file(&path).expect("load");
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides.get("kodAdresnihoMista"), Some("KOD_ADRM"));
    }

    #[test]
    fn malformed_json_fails_loudly() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("overrides.json");
        fs::write(&path, "not json").expect("write");
        assert!(AttributeOverrides::from_json_file(&path).is_err());
    }
}
