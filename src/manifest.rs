//! Manifest - Normalized Country Records
//!
//! One entry per input record, keyed by the original country code and
//! serialized in insertion order.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

/// Placeholder coordinates carried by every entry.
pub const PLACEHOLDER_LOCATION: [i32; 2] = [0, 0];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryEntry {
    pub name: String,
    pub code: String,
    pub location: [i32; 2],
    pub index: u32,
    pub image: String,
}

impl CountryEntry {
    pub fn new(country_code: &str, name: &str, index: u32) -> Self {
        Self {
            name: name.to_string(),
            code: country_code.to_lowercase(),
            location: PLACEHOLDER_LOCATION,
            index,
            image: image_file_name(index),
        }
    }
}

/// File name an entry's image is stored under.
pub fn image_file_name(index: u32) -> String {
    format!("{}.png", index)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<(String, CountryEntry)>,
    positions: HashMap<String, usize>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, country_code: impl Into<String>, entry: CountryEntry) {
        let country_code = country_code.into();
        match self.positions.get(&country_code) {
            Some(&slot) => self.entries[slot].1 = entry,
            None => {
                self.positions.insert(country_code.clone(), self.entries.len());
                self.entries.push((country_code, entry));
            }
        }
    }

    pub fn get(&self, country_code: &str) -> Option<&CountryEntry> {
        self.positions
            .get(country_code)
            .map(|&slot| &self.entries[slot].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CountryEntry)> {
        self.entries.iter().map(|(c, e)| (c.as_str(), e))
    }

    /// Pretty JSON with 2-space indentation.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

}

/// Write rendered manifest text to `path`, creating the parent directory and
/// replacing any existing file.
pub fn write_manifest_file(path: &Path, json: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)
}

impl Serialize for Manifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (code, entry) in &self.entries {
            map.serialize_entry(code, entry)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_derivation() {
        let entry = CountryEntry::new("GB", "United Kingdom", 7);
        assert_eq!(entry.code, "gb");
        assert_eq!(entry.image, "7.png");
        assert_eq!(entry.location, [0, 0]);
        assert_eq!(entry.name, "United Kingdom");
    }

    #[test]
    fn test_serialization_keeps_insertion_order() {
        let mut manifest = Manifest::new();
        manifest.insert("US", CountryEntry::new("US", "United States", 1));
        manifest.insert("FR", CountryEntry::new("FR", "France", 2));

        let json = manifest.to_json_pretty().unwrap();
        let us = json.find("\"US\"").unwrap();
        let fr = json.find("\"FR\"").unwrap();
        assert!(us < fr);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            json!({
                "US": {"name": "United States", "code": "us", "location": [0, 0], "index": 1, "image": "1.png"},
                "FR": {"name": "France", "code": "fr", "location": [0, 0], "index": 2, "image": "2.png"}
            })
        );
    }

    #[test]
    fn test_reinsert_replaces_in_place() {
        let mut manifest = Manifest::new();
        manifest.insert("US", CountryEntry::new("US", "USA", 1));
        manifest.insert("FR", CountryEntry::new("FR", "France", 2));
        manifest.insert("US", CountryEntry::new("US", "United States", 1));

        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.get("US").unwrap().name, "United States");
        let codes: Vec<_> = manifest.iter().map(|(c, _)| c).collect();
        assert_eq!(codes, vec!["US", "FR"]);
        assert!(manifest.get("us").is_none());
    }

    #[test]
    fn test_two_space_indentation() {
        let mut manifest = Manifest::new();
        manifest.insert("AD", CountryEntry::new("AD", "Andorra", 1));
        let json = manifest.to_json_pretty().unwrap();
        assert!(json.starts_with("{\n  \"AD\": {\n    \"name\": \"Andorra\","));
    }

    #[test]
    fn test_empty_manifest_is_empty_object() {
        assert_eq!(Manifest::new().to_json_pretty().unwrap(), "{}");
    }
}
