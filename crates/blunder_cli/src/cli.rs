//! Command line arguments.

use std::path::PathBuf;

use blunder_core::RenderSettings;
use blunder_renderer::DEFAULT_BUCKET_SIZE;
use clap::{Parser, ValueEnum};
use log::LevelFilter;

/// Log levels selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Render a `.blunder` scene file to an image.
#[derive(Parser, Debug)]
#[command(name = "blunder", version, about)]
pub struct Args {
    /// Scene file to render
    #[arg(value_name = "SCENE")]
    pub input: PathBuf,

    /// Output image; `.ppm` is written as plain text, other extensions via the image encoder
    #[arg(short, long, default_value = "output.png", value_name = "FILE")]
    pub output: PathBuf,

    /// Override the image width from the scene file
    #[arg(long, value_parser = valid_count, value_name = "NUM")]
    pub width: Option<u32>,

    /// Override the image height from the scene file
    #[arg(long, value_parser = valid_count, value_name = "NUM")]
    pub height: Option<u32>,

    /// Override samples per pixel
    #[arg(short = 'n', long, value_parser = valid_count, value_name = "NUM")]
    pub samples: Option<u32>,

    /// Override the maximum bounce depth
    #[arg(short, long, value_parser = valid_count, value_name = "NUM")]
    pub bounces: Option<u32>,

    /// Seed for reproducible renders; random when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Edge length of the square tiles rendered in parallel
    #[arg(long, value_parser = valid_count, default_value_t = DEFAULT_BUCKET_SIZE, value_name = "PIXELS")]
    pub bucket_size: u32,

    /// Logging level; `RUST_LOG` takes precedence when set
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

impl Args {
    /// Apply command line overrides on top of the scene file's settings.
    pub fn apply_overrides(&self, settings: &mut RenderSettings) {
        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        if let Some(samples) = self.samples {
            settings.samples = samples;
        }
        if let Some(bounces) = self.bounces {
            settings.bounces = bounces;
        }
    }
}

/// Checks that the given count is greater than 0.
fn valid_count(s: &str) -> Result<u32, String> {
    match s.parse::<u32>() {
        Ok(0) => Err("count must be greater than 0".to_string()),
        Ok(count) => Ok(count),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn check_cli() {
        Args::command().debug_assert()
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["blunder", "scene.blunder"]).unwrap();
        assert_eq!(args.input, PathBuf::from("scene.blunder"));
        assert_eq!(args.output, PathBuf::from("output.png"));
        assert_eq!(args.bucket_size, DEFAULT_BUCKET_SIZE);
        assert_eq!(args.log_level, LogLevel::Info);
        assert!(args.seed.is_none());
    }

    #[test]
    fn test_zero_count_rejected() {
        let res = Args::try_parse_from(["blunder", "scene.blunder", "--samples", "0"]);
        assert_eq!(
            res.unwrap_err().kind(),
            clap::error::ErrorKind::ValueValidation
        );
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "blunder",
            "scene.blunder",
            "--width",
            "64",
            "-n",
            "4",
        ])
        .unwrap();

        let mut settings = RenderSettings {
            width: 400,
            height: 225,
            samples: 20,
            bounces: 10,
        };
        args.apply_overrides(&mut settings);

        assert_eq!(
            settings,
            RenderSettings {
                width: 64,
                height: 225,
                samples: 4,
                bounces: 10,
            }
        );
    }
}
