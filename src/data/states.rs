//! State abbreviation <-> full name table.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::EngineError;

/// Bidirectional lookup over `{ "SP": "São Paulo", ... }`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateNames {
    by_abbreviation: BTreeMap<String, String>,
    by_name: BTreeMap<String, String>,
}

impl StateNames {
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let text = fs::read_to_string(path).map_err(|e| EngineError::dataset("state names", path, e))?;
        let raw: BTreeMap<String, String> =
            serde_json::from_str(&text).map_err(|e| EngineError::dataset("state names", path, e))?;
        if raw.is_empty() {
            return Err(EngineError::dataset("state names", path, "no entries"));
        }
        let names = Self::from_pairs(raw);
        tracing::debug!(path = %path.display(), states = names.len(), "loaded state names");
        Ok(names)
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut names = Self::default();
        for (abbr, name) in pairs {
            let abbr = abbr.as_ref().trim().to_uppercase();
            let name = name.as_ref().trim().to_string();
            names.by_name.insert(name.clone(), abbr.clone());
            names.by_abbreviation.insert(abbr, name);
        }
        names
    }

    /// Full name for an abbreviation (case-insensitive).
    pub fn name_of(&self, abbreviation: &str) -> Option<&str> {
        self.by_abbreviation
            .get(&abbreviation.trim().to_uppercase())
            .map(String::as_str)
    }

    pub fn abbreviation_of(&self, name: &str) -> Option<&str> {
        self.by_name.get(name.trim()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_abbreviation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_abbreviation.is_empty()
    }
}
