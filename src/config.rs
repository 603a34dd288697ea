//! Run Configuration
//!
//! Four paths and the optimizer window. Built once at startup and passed
//! by reference to every stage.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_SOURCE_DATA_FILE: &str = "./countries.json";
pub const DEFAULT_SOURCE_IMAGES: &str = "./source/images/";
pub const DEFAULT_COUNTRY_DATA_FILE: &str = "./source/country-flags.json";
pub const DEFAULT_OPTIMIZED_IMAGES: &str = "./source/optimized-images/";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Quality {0} out of range, must be 0..=100")]
    QualityOutOfRange(u8),

    #[error("Quality window inverted: min {min} > max {max}")]
    InvertedQualityWindow { min: u8, max: u8 },

    #[error("Speed {0} out of range, must be 1..=10")]
    SpeedOutOfRange(u8),

    #[error("Quality fraction {0} out of range, must be 0.0..=1.0")]
    FractionOutOfRange(f32),
}

/// Lossy PNG pass settings.
///
/// Quality is on the quantizer's 0-100 scale, where 100 is visually lossless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeSettings {
    pub quality_min: u8,
    pub quality_max: u8,
    /// 1 (slowest, best) to 10 (fastest)
    pub speed: u8,
    pub enabled: bool,
}

impl Default for OptimizeSettings {
    fn default() -> Self {
        Self {
            quality_min: 60,
            quality_max: 80,
            speed: 4,
            enabled: true,
        }
    }
}

impl OptimizeSettings {
    /// Build from a `[min, max]` window on the 0.0-1.0 scale.
    pub fn from_fractions(min: f32, max: f32) -> Result<Self, ConfigError> {
        let settings = Self {
            quality_min: fraction_to_quality(min)?,
            quality_max: fraction_to_quality(max)?,
            ..Self::default()
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for q in [self.quality_min, self.quality_max] {
            if q > 100 {
                return Err(ConfigError::QualityOutOfRange(q));
            }
        }
        if self.quality_min > self.quality_max {
            return Err(ConfigError::InvertedQualityWindow {
                min: self.quality_min,
                max: self.quality_max,
            });
        }
        if !(1..=10).contains(&self.speed) {
            return Err(ConfigError::SpeedOutOfRange(self.speed));
        }
        Ok(())
    }
}

fn fraction_to_quality(fraction: f32) -> Result<u8, ConfigError> {
    if !(0.0..=1.0).contains(&fraction) {
        return Err(ConfigError::FractionOutOfRange(fraction));
    }
    Ok((fraction * 100.0).round() as u8)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Input mapping of country code to display name
    pub source_data_file: PathBuf,
    /// Directory of `<lowercased code>.png` flags
    pub source_images: PathBuf,
    /// Output manifest
    pub country_data_file: PathBuf,
    /// Directory receiving `<index>.png` files
    pub optimized_images: PathBuf,
    #[serde(default)]
    pub optimize: OptimizeSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_data_file: PathBuf::from(DEFAULT_SOURCE_DATA_FILE),
            source_images: PathBuf::from(DEFAULT_SOURCE_IMAGES),
            country_data_file: PathBuf::from(DEFAULT_COUNTRY_DATA_FILE),
            optimized_images: PathBuf::from(DEFAULT_OPTIMIZED_IMAGES),
            optimize: OptimizeSettings::default(),
        }
    }
}

impl Config {
    /// Configuration rooted at `root`, using the default relative layout.
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            source_data_file: root.join("countries.json"),
            source_images: root.join("source").join("images"),
            country_data_file: root.join("source").join("country-flags.json"),
            optimized_images: root.join("source").join("optimized-images"),
            optimize: OptimizeSettings::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.optimize.validate()
    }
}
