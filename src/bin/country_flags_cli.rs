//! Country Flags CLI
//!
//! Builds the flag dataset and prints a JSON run summary to stdout.
//! Logs go to stderr; verbosity via RUST_LOG.
//! Returns non-zero on a fatal load or write failure.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use country_flags::{
    config::{
        DEFAULT_COUNTRY_DATA_FILE, DEFAULT_OPTIMIZED_IMAGES, DEFAULT_SOURCE_DATA_FILE,
        DEFAULT_SOURCE_IMAGES,
    },
    generate_country_data_json_file, Config, OptimizeSettings, ENGINE_VERSION,
};

#[derive(Parser)]
#[command(name = "country-flags-cli")]
#[command(about = "Country Flags - normalized flag image dataset builder")]
#[command(version)]
struct Cli {
    /// JSON object mapping country codes to names
    #[arg(long, default_value = DEFAULT_SOURCE_DATA_FILE)]
    source_data_file: PathBuf,

    /// Directory of <lowercased code>.png flags
    #[arg(long, default_value = DEFAULT_SOURCE_IMAGES)]
    source_images: PathBuf,

    /// Output manifest path
    #[arg(long, default_value = DEFAULT_COUNTRY_DATA_FILE)]
    country_data_file: PathBuf,

    /// Output directory for <index>.png files
    #[arg(long, default_value = DEFAULT_OPTIMIZED_IMAGES)]
    optimized_images: PathBuf,

    /// Minimum acceptable quality (0-100)
    #[arg(long, default_value_t = 60)]
    quality_min: u8,

    /// Target quality (0-100)
    #[arg(long, default_value_t = 80)]
    quality_max: u8,

    /// Quantizer speed, 1 (best) to 10 (fastest)
    #[arg(long, default_value_t = 4)]
    speed: u8,

    /// Skip the lossy PNG pass
    #[arg(long)]
    no_optimize: bool,
}

impl Cli {
    fn into_config(self) -> Config {
        Config {
            source_data_file: self.source_data_file,
            source_images: self.source_images,
            country_data_file: self.country_data_file,
            optimized_images: self.optimized_images,
            optimize: OptimizeSettings {
                quality_min: self.quality_min,
                quality_max: self.quality_max,
                speed: self.speed,
                enabled: !self.no_optimize,
            },
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = Cli::parse().into_config();
    info!("country-flags {} starting", ENGINE_VERSION);

    match generate_country_data_json_file(&config) {
        Ok(summary) => match serde_json::to_string_pretty(&summary) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Failed to render run summary: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            error!("{}", e);
            let output = serde_json::json!({
                "success": false,
                "error": e.to_string(),
            });
            println!("{}", output);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_library_config() {
        let cli = Cli::parse_from(["country-flags-cli"]);
        assert_eq!(cli.into_config(), Config::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "country-flags-cli",
            "--source-data-file",
            "in.json",
            "--quality-min",
            "40",
            "--no-optimize",
        ]);
        let config = cli.into_config();
        assert_eq!(config.source_data_file, PathBuf::from("in.json"));
        assert_eq!(config.optimize.quality_min, 40);
        assert!(!config.optimize.enabled);
    }
}
