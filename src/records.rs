//! Input Loader - Country Records
//!
//! Parses the raw `code -> name` mapping, keeping the order in which codes
//! appear in the file.

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Ordered mapping from country code to display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryRecords {
    entries: Vec<(String, String)>,
    /// code -> slot in `entries`
    positions: HashMap<String, usize>,
}

impl CountryRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. A repeated code keeps its first position and takes
    /// the new name.
    pub fn insert(&mut self, code: impl Into<String>, name: impl Into<String>) {
        let code = code.into();
        let name = name.into();
        match self.positions.get(&code) {
            Some(&slot) => self.entries[slot].1 = name,
            None => {
                self.positions.insert(code.clone(), self.entries.len());
                self.entries.push((code, name));
            }
        }
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.positions
            .get(code)
            .map(|&slot| self.entries[slot].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records as `(code, name)` in file order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(c, n)| (c.as_str(), n.as_str()))
    }
}

impl<C: Into<String>, N: Into<String>> FromIterator<(C, N)> for CountryRecords {
    fn from_iter<I: IntoIterator<Item = (C, N)>>(iter: I) -> Self {
        let mut records = Self::new();
        for (code, name) in iter {
            records.insert(code, name);
        }
        records
    }
}

impl<'de> Deserialize<'de> for CountryRecords {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordsVisitor;

        impl<'de> Visitor<'de> for RecordsVisitor {
            type Value = CountryRecords;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping country codes to country names")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut records = CountryRecords::new();
                while let Some((code, name)) = map.next_entry::<String, String>()? {
                    records.insert(code, name);
                }
                Ok(records)
            }
        }

        deserializer.deserialize_map(RecordsVisitor)
    }
}

/// Parse record-file text.
///
/// Returns `None` for blank text, `null` or an empty object.
pub fn parse_country_data(text: &str) -> Result<Option<CountryRecords>, serde_json::Error> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    let records: Option<CountryRecords> = serde_json::from_str(text)?;
    Ok(records.filter(|r| !r.is_empty()))
}

/// Read the configured record file.
///
/// Read and parse failures are fatal for the run and are returned as-is.
pub fn load_country_data(config: &Config) -> Result<Option<CountryRecords>, LoadError> {
    let path = &config.source_data_file;
    debug!("Loading country data from {}", path.display());

    let text = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.clone(),
        source,
    })?;

    let records = parse_country_data(&text).map_err(|source| LoadError::Parse {
        path: path.clone(),
        source,
    })?;

    match &records {
        Some(r) => info!("Loaded {} countries from {}", r.len(), path.display()),
        None => info!("No country data in {}", path.display()),
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_order_preserved() {
        let records = parse_country_data(r#"{"ZW": "Zimbabwe", "AD": "Andorra", "MX": "Mexico"}"#)
            .unwrap()
            .unwrap();
        let codes: Vec<_> = records.iter().map(|(c, _)| c).collect();
        assert_eq!(codes, vec!["ZW", "AD", "MX"]);
        assert_eq!(records.get("AD"), Some("Andorra"));
    }

    #[test]
    fn test_no_usable_content() {
        assert!(parse_country_data("").unwrap().is_none());
        assert!(parse_country_data("  \n").unwrap().is_none());
        assert!(parse_country_data("null").unwrap().is_none());
        assert!(parse_country_data("{}").unwrap().is_none());
    }

    #[test]
    fn test_repeated_code_keeps_first_position() {
        let records = parse_country_data(r#"{"US": "USA", "FR": "France", "US": "United States"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(records.len(), 2);
        let pairs: Vec<_> = records.iter().collect();
        assert_eq!(pairs, vec![("US", "United States"), ("FR", "France")]);
    }

    #[test]
    fn test_large_mapping_lookup_and_overwrite() {
        let mut records: CountryRecords = (0..5000)
            .map(|i| (format!("C{}", i), format!("Country {}", i)))
            .collect();
        records.insert("C2500", "Renamed");

        assert_eq!(records.len(), 5000);
        assert_eq!(records.get("C4999"), Some("Country 4999"));
        assert_eq!(records.get("C2500"), Some("Renamed"));
        assert_eq!(records.iter().nth(2500), Some(("C2500", "Renamed")));
        assert_eq!(records.get("C5000"), None);
    }

    #[test]
    fn test_malformed_input_is_error() {
        assert!(parse_country_data("{\"US\": ").is_err());
        assert!(parse_country_data(r#"{"US": 1}"#).is_err());
        assert!(parse_country_data(r#"["US"]"#).is_err());
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::rooted_at(dir.path());
        let err = load_country_data(&config).unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
    }
}
