//! Image Optimizer - Lossy PNG Recompression
//!
//! Every `*.png` in the output directory is palette-quantized within the
//! configured quality window and rewritten in place as an 8-bit indexed PNG.
//!
//! Files are left untouched when the quantizer cannot reach the minimum
//! quality. Unlike a plain pngquant pass, a recompressed file that is not
//! smaller than its original is discarded and the original kept.
//!
//! A file that fails to optimize does not stop the batch; the failures are
//! reported together once every file has been visited.

use image::ImageFormat;
use imagequant::RGBA;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Config, OptimizeSettings};

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("Failed to list {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to quantize {}: {source}", path.display())]
    Quantize {
        path: PathBuf,
        #[source]
        source: imagequant::Error,
    },

    #[error("Failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: png::EncodingError,
    },

    #[error("{} of {} images failed to optimize, first: {first}", report.failed, report.total())]
    Batch {
        first: Box<OptimizeError>,
        report: OptimizeReport,
    },
}

impl OptimizeError {
    /// Work done before and around the failures, for batch errors.
    pub fn partial_report(&self) -> Option<&OptimizeReport> {
        match self {
            OptimizeError::Batch { report, .. } => Some(report),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Minimum quality not reachable with a 256-color palette
    QualityTooLow,
    /// Recompressed output was not smaller than the original
    NotSmaller,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PngOutcome {
    Optimized { bytes_before: u64, bytes_after: u64 },
    Skipped { reason: SkipReason, bytes: u64 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeReport {
    pub optimized: usize,
    pub skipped: usize,
    pub failed: usize,
    pub bytes_before: u64,
    pub bytes_after: u64,
}

impl OptimizeReport {
    pub fn total(&self) -> usize {
        self.optimized + self.skipped + self.failed
    }

    fn record(&mut self, outcome: &PngOutcome) {
        match *outcome {
            PngOutcome::Optimized { bytes_before, bytes_after } => {
                self.optimized += 1;
                self.bytes_before += bytes_before;
                self.bytes_after += bytes_after;
            }
            PngOutcome::Skipped { bytes, .. } => {
                self.skipped += 1;
                self.bytes_before += bytes;
                self.bytes_after += bytes;
            }
        }
    }
}

/// Optimize every PNG in the configured output directory.
///
/// Every file is attempted. Per-file failures leave that file as it was and
/// are returned as a single `OptimizeError::Batch` carrying the first error
/// and the report for the whole batch.
pub fn optimize_images(config: &Config) -> Result<OptimizeReport, OptimizeError> {
    let settings = &config.optimize;
    let mut report = OptimizeReport::default();

    if !settings.enabled {
        debug!("Image optimization disabled");
        return Ok(report);
    }

    let dir = &config.optimized_images;
    if !dir.is_dir() {
        debug!("No image directory at {}, nothing to optimize", dir.display());
        return Ok(report);
    }

    let mut first_error = None;
    for path in list_png_files(dir)? {
        let outcome = match optimize_png(&path, settings) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("{}", e);
                report.failed += 1;
                if first_error.is_none() {
                    first_error = Some(e);
                }
                continue;
            }
        };
        match &outcome {
            PngOutcome::Optimized { bytes_before, bytes_after } => {
                debug!("Optimized {}: {} -> {} bytes", path.display(), bytes_before, bytes_after)
            }
            PngOutcome::Skipped { reason: SkipReason::QualityTooLow, .. } => {
                warn!("Skipped {}: quality below {}", path.display(), settings.quality_min)
            }
            PngOutcome::Skipped { reason: SkipReason::NotSmaller, .. } => {
                debug!("Kept {}: already smaller than recompressed output", path.display())
            }
        }
        report.record(&outcome);
    }

    info!(
        "Optimized {} images ({} skipped, {} failed), {} -> {} bytes",
        report.optimized, report.skipped, report.failed, report.bytes_before, report.bytes_after
    );

    match first_error {
        Some(first) => Err(OptimizeError::Batch {
            first: Box::new(first),
            report,
        }),
        None => Ok(report),
    }
}

/// `*.png` files directly under `dir`, sorted by file name.
fn list_png_files(dir: &Path) -> Result<Vec<PathBuf>, OptimizeError> {
    let read_dir_err = |source| OptimizeError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = vec![];
    for entry in fs::read_dir(dir).map_err(read_dir_err)? {
        let path = entry.map_err(read_dir_err)?.path();
        let is_png = path
            .extension()
            .map_or(false, |e| e.eq_ignore_ascii_case("png"));
        if is_png && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Recompress a single PNG in place.
pub fn optimize_png(path: &Path, settings: &OptimizeSettings) -> Result<PngOutcome, OptimizeError> {
    let io_err = |source| OptimizeError::Io {
        path: path.to_path_buf(),
        source,
    };
    let quantize_err = |source| OptimizeError::Quantize {
        path: path.to_path_buf(),
        source,
    };

    let original = fs::read(path).map_err(io_err)?;
    let bytes_before = original.len() as u64;

    let decoded = image::load_from_memory_with_format(&original, ImageFormat::Png)
        .map_err(|source| OptimizeError::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    let (width, height) = decoded.dimensions();
    let pixels: Vec<RGBA> = decoded
        .pixels()
        .map(|p| {
            let [r, g, b, a] = p.0;
            RGBA::new(r, g, b, a)
        })
        .collect();

    let mut liq = imagequant::new();
    liq.set_speed(i32::from(settings.speed)).map_err(quantize_err)?;
    liq.set_quality(settings.quality_min, settings.quality_max)
        .map_err(quantize_err)?;

    let mut img = liq
        .new_image_borrowed(&pixels, width as usize, height as usize, 0.0)
        .map_err(quantize_err)?;

    let mut quantized = match liq.quantize(&mut img) {
        Ok(q) => q,
        Err(imagequant::Error::QualityTooLow) => {
            return Ok(PngOutcome::Skipped {
                reason: SkipReason::QualityTooLow,
                bytes: bytes_before,
            });
        }
        Err(source) => return Err(quantize_err(source)),
    };
    quantized.set_dithering_level(1.0).map_err(quantize_err)?;
    let (palette, indices) = quantized.remapped(&mut img).map_err(quantize_err)?;

    let encoded = encode_indexed(width, height, &palette, &indices).map_err(|source| {
        OptimizeError::Encode {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let bytes_after = encoded.len() as u64;

    if bytes_after >= bytes_before {
        return Ok(PngOutcome::Skipped {
            reason: SkipReason::NotSmaller,
            bytes: bytes_before,
        });
    }

    // Sibling temp file so a failed write never truncates the original
    let tmp = path.with_extension("png.tmp");
    fs::write(&tmp, &encoded).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;

    Ok(PngOutcome::Optimized {
        bytes_before,
        bytes_after,
    })
}

/// 8-bit indexed PNG; alpha goes to `tRNS` only when some entry is translucent.
fn encode_indexed(
    width: u32,
    height: u32,
    palette: &[RGBA],
    indices: &[u8],
) -> Result<Vec<u8>, png::EncodingError> {
    let rgb: Vec<u8> = palette.iter().flat_map(|c| [c.r, c.g, c.b]).collect();
    let alpha: Vec<u8> = palette.iter().map(|c| c.a).collect();

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Best);
        encoder.set_palette(rgb);
        if alpha.iter().any(|&a| a != u8::MAX) {
            encoder.set_trns(alpha);
        }
        let mut writer = encoder.write_header()?;
        writer.write_image_data(indices)?;
        writer.finish()?;
    }
    Ok(out)
}
