//! Manifest Builder - Single Entry Point
//!
//! Load records, copy one flag per record, write the manifest, then optimize.
//! Each step completes before the next one starts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info};

use crate::config::{Config, ConfigError};
use crate::hashing::manifest_digest;
use crate::manifest::{write_manifest_file, CountryEntry, Manifest};
use crate::optimize::{optimize_images, OptimizeReport};
use crate::records::{load_country_data, CountryRecords, LoadError};
use crate::transfer::copy_image;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Failed to write manifest {}: {source}", path.display())]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// What a run did. Recoverable failures are counted here, never raised.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub countries: usize,
    pub copied: usize,
    pub copy_failures: usize,
    /// Present unless optimization failed outright
    pub optimize: Option<OptimizeReport>,
    pub optimize_error: Option<String>,
    pub manifest_path: PathBuf,
    /// SHA-256 of the manifest file bytes as written
    pub manifest_sha256: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Derive the manifest from input records without touching the filesystem.
pub fn build_manifest(records: &CountryRecords) -> Manifest {
    let mut manifest = Manifest::new();
    for (index, (code, name)) in (1u32..).zip(records.iter()) {
        manifest.insert(code, CountryEntry::new(code, name, index));
    }
    manifest
}

/// Regenerate the country-flags dataset from scratch.
///
/// Load failures and manifest write failures abort the run. A failed image
/// copy is logged and its manifest entry is kept; an optimizer failure is
/// logged and leaves the manifest as written.
pub fn generate_country_data_json_file(config: &Config) -> Result<RunSummary, PipelineError> {
    config.validate()?;
    let started_at = Utc::now();

    let records = load_country_data(config)?.unwrap_or_default();
    let manifest = build_manifest(&records);

    let mut copied = 0;
    let mut copy_failures = 0;
    for (code, entry) in manifest.iter() {
        match copy_image(config, code, entry.index) {
            Ok(_) => copied += 1,
            Err(e) => {
                error!("{}", e);
                copy_failures += 1;
            }
        }
    }

    let manifest_path = config.country_data_file.clone();
    let manifest_json = manifest.to_json_pretty()?;
    write_manifest_file(&manifest_path, &manifest_json).map_err(|source| {
        PipelineError::ManifestWrite {
            path: manifest_path.clone(),
            source,
        }
    })?;
    let manifest_sha256 = manifest_digest(&manifest_json);
    info!(
        "Wrote {} countries to {}",
        manifest.len(),
        manifest_path.display()
    );

    let (optimize, optimize_error) = match optimize_images(config) {
        Ok(report) => (Some(report), None),
        Err(e) => {
            error!("{}", e);
            (e.partial_report().cloned(), Some(e.to_string()))
        }
    };

    info!("DONE");

    Ok(RunSummary {
        countries: manifest.len(),
        copied,
        copy_failures,
        optimize,
        optimize_error,
        manifest_path,
        manifest_sha256,
        started_at,
        finished_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_manifest_indices_follow_input_order() {
        let records: CountryRecords =
            [("SE", "Sweden"), ("AR", "Argentina"), ("JP", "Japan")].into_iter().collect();
        let manifest = build_manifest(&records);

        let keyed: Vec<_> = manifest.iter().map(|(c, e)| (c, e.index)).collect();
        assert_eq!(keyed, vec![("SE", 1), ("AR", 2), ("JP", 3)]);
        assert_eq!(manifest.get("JP").unwrap().image, "3.png");
        assert_eq!(manifest.get("AR").unwrap().code, "ar");
    }

    #[test]
    fn test_build_manifest_empty() {
        assert!(build_manifest(&CountryRecords::new()).is_empty());
    }

    #[test]
    fn test_invalid_settings_rejected_before_any_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::rooted_at(dir.path());
        config.optimize.quality_min = 95;
        std::fs::write(&config.source_data_file, r#"{"US": "United States"}"#).unwrap();

        let err = generate_country_data_json_file(&config).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert!(!config.country_data_file.exists());
    }
}
