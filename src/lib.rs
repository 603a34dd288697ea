//! Country Flags - Normalized Flag Dataset Builder
//!
//! Turns a `code -> name` mapping and a folder of per-country flags into:
//! 1. `<index>.png` copies of every flag
//! 2. A JSON manifest keyed by country code
//! 3. Lossy-recompressed PNGs (quality window 0.6-0.8)

pub mod config;
pub mod records;
pub mod manifest;
pub mod hashing;
pub mod transfer;
pub mod optimize;
pub mod pipeline;

pub use config::{Config, ConfigError, OptimizeSettings};
pub use records::{load_country_data, parse_country_data, CountryRecords, LoadError};
pub use manifest::{CountryEntry, Manifest};
pub use hashing::{manifest_digest, sha256_hex};
pub use transfer::{copy_image, TransferError};
pub use optimize::{optimize_images, optimize_png, OptimizeError, OptimizeReport, PngOutcome};
pub use pipeline::{build_manifest, generate_country_data_json_file, PipelineError, RunSummary};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
