use std::path::Path;
use std::time::Instant;

use anyhow::{ensure, Context, Result};
use blunder_core::load_blunder;
use blunder_renderer::{render, Camera, RenderConfig, Scene};
use clap::Parser;
use log::LevelFilter;

mod cli;

use cli::Args;

fn main() -> Result<()> {
    let args = Args::parse();

    let level: LevelFilter = args.log_level.into();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str()))
        .init();

    log::info!("Starting Blunder");
    render_file(&args)
}

/// Load the scene file, render it and save the image.
fn render_file(args: &Args) -> Result<()> {
    check_paths(&args.input, &args.output)?;

    let start = Instant::now();
    let mut description = load_blunder(&args.input)
        .with_context(|| format!("Failed to load scene {}", args.input.display()))?;
    args.apply_overrides(&mut description.settings);

    let scene = Scene::from_description(&description).context("Failed to build scene")?;
    let camera = Camera::from_description(&description.camera)
        .context("Invalid camera")?
        .with_motion_blur(description.has_motion());

    let mut config = RenderConfig::from_description(&description)
        .context("Invalid render settings")?
        .with_bucket_size(args.bucket_size);
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    log::info!("Scene ready in {:.2?}", start.elapsed());

    let image = render(&scene, &camera, &config)?;
    image
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    log::info!("Done in {:.2?}", start.elapsed());
    Ok(())
}

fn check_paths(input: &Path, output: &Path) -> Result<()> {
    ensure!(!input.as_os_str().is_empty(), "Input file name is empty");
    ensure!(!output.as_os_str().is_empty(), "Output file name is empty");
    ensure!(
        input != output,
        "Input and output are the same file: {}",
        input.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SCENE: &str = "\
#BLUNDER
#SETTINGS
screen_width 400
screen_height 300
samples 50
bounces 10
#CAMERA
position 0 0 0
look_at 0 0 -1
fov 90
up_direction 0 1 0
#COLORS
red 1 0 0
#SPHERES
0 0 -1 red 0.5
";

    #[test]
    fn test_check_paths() {
        assert!(check_paths(Path::new("a.blunder"), Path::new("a.png")).is_ok());
        assert!(check_paths(Path::new(""), Path::new("a.png")).is_err());
        assert!(check_paths(Path::new("a.blunder"), Path::new("")).is_err());
        assert!(check_paths(Path::new("a.blunder"), Path::new("a.blunder")).is_err());
    }

    #[test]
    fn test_render_file() {
        let dir = std::env::temp_dir();
        let input = dir.join("blunder_cli_render_test.blunder");
        let output = dir.join("blunder_cli_render_test.ppm");
        std::fs::write(&input, SCENE).unwrap();

        let args = Args::try_parse_from([
            PathBuf::from("blunder"),
            input.clone(),
            PathBuf::from("--output"),
            output.clone(),
            PathBuf::from("--width"),
            PathBuf::from("8"),
            PathBuf::from("--height"),
            PathBuf::from("6"),
            PathBuf::from("--samples"),
            PathBuf::from("1"),
            PathBuf::from("--seed"),
            PathBuf::from("3"),
        ])
        .unwrap();
        render_file(&args).unwrap();

        let ppm = std::fs::read_to_string(&output).unwrap();
        std::fs::remove_file(&input).ok();
        std::fs::remove_file(&output).ok();

        assert!(ppm.starts_with("P3\n8 6\n255\n"));
        assert_eq!(ppm.lines().count(), 3 + 8 * 6);
    }

    #[test]
    fn test_render_file_missing_input() {
        let args = Args::try_parse_from([
            "blunder",
            "/nonexistent/blunder_scene.blunder",
            "--output",
            "out.ppm",
        ])
        .unwrap();
        assert!(render_file(&args).is_err());
    }
}
