//! Image Transfer
//!
//! Copies `<source_images>/<code>.png` to `<optimized_images>/<index>.png`.

use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::manifest::image_file_name;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Source image not found: {}", source_path.display())]
    SourceMissing { source_path: PathBuf },

    #[error("Failed to copy {} to {}: {source}", source_path.display(), target_path.display())]
    Io {
        source_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn source_image_path(config: &Config, country_code: &str) -> PathBuf {
    config
        .source_images
        .join(format!("{}.png", country_code.to_lowercase()))
}

pub fn target_image_path(config: &Config, index: u32) -> PathBuf {
    config.optimized_images.join(image_file_name(index))
}

/// Copy one country's flag under its index name.
///
/// Creates the output directory when needed and overwrites an existing
/// target. Returns the number of bytes copied.
pub fn copy_image(config: &Config, country_code: &str, index: u32) -> Result<u64, TransferError> {
    let source_path = source_image_path(config, country_code);
    let target_path = target_image_path(config, index);

    if !source_path.is_file() {
        return Err(TransferError::SourceMissing { source_path });
    }

    let io_err = |source| TransferError::Io {
        source_path: source_path.clone(),
        target_path: target_path.clone(),
        source,
    };

    fs::create_dir_all(&config.optimized_images).map_err(io_err)?;
    let bytes = fs::copy(&source_path, &target_path).map_err(io_err)?;

    debug!(
        "Copied {} -> {} ({} bytes)",
        source_path.display(),
        target_path.display(),
        bytes
    );
    Ok(bytes)
}
