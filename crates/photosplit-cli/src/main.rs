// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Photosplit: split a scanned sheet of photographs into individual photos.
//
// Entry point. Initialises logging, loads the scan and configuration, runs
// detection, replays any edit commands, and writes one PNG per photo.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use photosplit_core::SplitConfig;
use photosplit_core::config::DetectionStrategy;
use photosplit_core::error::PhotosplitError;
use photosplit_core::human_errors::{HumanError, humanize_error, no_photos_found};
use photosplit_scan::{EditCommand, EditSession, ImageProcessor, RegionDetector};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Splits a scanned sheet of photographs into one upright image per photo."
)]
struct Args {
    /// Scanned sheet to split
    input: PathBuf,
    /// Directory where photo_<n>.png files are written
    #[arg(long, short)]
    out: PathBuf,
    /// JSON configuration file (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Detection strategy, overriding the configuration
    #[arg(long, value_enum)]
    strategy: Option<Strategy>,
    /// Whole-sheet rotation in clockwise degrees, applied before cropping
    #[arg(long, allow_negative_numbers = true)]
    scan_rotation: Option<f64>,
    /// JSON array of edit commands replayed after detection
    #[arg(long)]
    edits: Option<PathBuf>,
    /// Write the annotated preview to this path
    #[arg(long)]
    preview: Option<PathBuf>,
}

/// Command-line names for the detection strategies, with default tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    Saturation,
    Otsu,
    Adaptive,
    Canny,
}

impl From<Strategy> for DetectionStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Saturation => DetectionStrategy::default(),
            Strategy::Otsu => DetectionStrategy::Otsu { blur_sigma: 1.0 },
            Strategy::Adaptive => DetectionStrategy::Adaptive {
                block_radius: 7,
                c: 10,
            },
            Strategy::Canny => DetectionStrategy::Canny {
                blur_sigma: 1.4,
                low: 75.0,
                high: 200.0,
            },
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    tracing::info!(input = %args.input.display(), "Photosplit starting");

    let saved = run(&args)?;
    if saved == 0 {
        report(&no_photos_found());
    } else {
        println!("Saved {saved} photos to {}", args.out.display());
    }
    Ok(())
}

/// Run the whole pipeline and return the number of photos written.
fn run(args: &Args) -> Result<usize> {
    let mut config = match &args.config {
        Some(path) => SplitConfig::load(path)
            .map_err(explain)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => SplitConfig::default(),
    };
    if let Some(strategy) = args.strategy {
        config.detection.strategy = strategy.into();
    }

    let scan = ImageProcessor::open(&args.input)
        .map_err(explain)
        .with_context(|| format!("Could not read scan {}", args.input.display()))?
        .into_dynamic();

    let mut session = EditSession::new(scan, &config);
    if let Some(degrees) = args.scan_rotation {
        session.set_scan_rotation(degrees);
    }
    let detector = RegionDetector::new(config.detection.clone()).with_style(config.annotation);
    let result = session.detect(&detector);
    tracing::info!(regions = result.regions.len(), "Detection finished");
    if let Some(path) = &args.edits {
        let commands = read_edits(path)?;
        tracing::info!(commands = commands.len(), "Replaying edits");
        session
            .apply_all(commands)
            .map_err(explain)
            .with_context(|| format!("Edit list {} was rejected", path.display()))?;
    }

    if let Some(path) = &args.preview {
        ImageProcessor::from_dynamic(session.preview())
            .save(path)
            .map_err(explain)?;
    }

    let photos = session.rectify().map_err(explain)?;
    if photos.is_empty() {
        return Ok(0);
    }

    let count = photos.len();
    fs::create_dir_all(&args.out)
        .with_context(|| format!("Failed to create output dir {}", args.out.display()))?;
    for (index, photo) in photos.into_iter().enumerate() {
        let path = args.out.join(format!("photo_{}.png", index + 1));
        ImageProcessor::from_dynamic(photo)
            .save(&path)
            .map_err(explain)?;
        tracing::debug!(path = %path.display(), "Photo written");
    }
    Ok(count)
}

fn read_edits(path: &Path) -> Result<Vec<EditCommand>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Could not read edit list {}", path.display()))?;
    let commands = serde_json::from_str(&data)
        .with_context(|| format!("Edit list {} is not valid JSON", path.display()))?;
    Ok(commands)
}

/// Print the plain-language version of `err` and pass it on.
fn explain(err: PhotosplitError) -> anyhow::Error {
    report(&humanize_error(&err));
    anyhow::Error::new(err)
}

fn report(human: &HumanError) {
    eprintln!("{}", human.message);
    eprintln!("  {}", human.suggestion);
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GenericImageView, Rgb, RgbImage};

    /// A 600x400 sheet with two photos, saved as PNG under `dir`.
    fn write_sheet(dir: &Path) -> PathBuf {
        let mut img = RgbImage::from_pixel(600, 400, Rgb([250, 250, 250]));
        for (x0, y0, w, h) in [(30u32, 30u32, 200u32, 150u32), (320, 180, 240, 180)] {
            for y in y0..y0 + h {
                for x in x0..x0 + w {
                    img.put_pixel(x, y, Rgb([180, 40, 40]));
                }
            }
        }
        let path = dir.join("sheet.png");
        DynamicImage::ImageRgb8(img).save(&path).unwrap();
        path
    }

    fn args_for(dir: &Path, extra: &[&str]) -> Args {
        let input = write_sheet(dir);
        let out = dir.join("out");
        let mut argv = vec![
            "photosplit".to_string(),
            input.display().to_string(),
            "--out".to_string(),
            out.display().to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn strategy_and_rotation_flags_parse() {
        let args = Args::try_parse_from([
            "photosplit",
            "scan.png",
            "--out",
            "photos",
            "--strategy",
            "otsu",
            "--scan-rotation",
            "-2.5",
        ])
        .unwrap();
        assert_eq!(args.strategy, Some(Strategy::Otsu));
        assert_eq!(args.scan_rotation, Some(-2.5));
        assert!(args.edits.is_none());
        assert!(matches!(
            DetectionStrategy::from(Strategy::Otsu),
            DetectionStrategy::Otsu { .. }
        ));
    }

    #[test]
    fn missing_output_dir_is_a_usage_error() {
        assert!(Args::try_parse_from(["photosplit", "scan.png"]).is_err());
    }

    #[test]
    fn writes_one_png_per_photo() {
        let dir = tempfile::tempdir().unwrap();
        let preview = dir.path().join("preview.png").display().to_string();
        let args = args_for(dir.path(), &["--preview", &preview]);

        assert_eq!(run(&args).unwrap(), 2);
        let first = image::open(args.out.join("photo_1.png")).unwrap();
        let second = image::open(args.out.join("photo_2.png")).unwrap();
        assert!(first.width().abs_diff(200) <= 2 && first.height().abs_diff(150) <= 2);
        assert!(second.width().abs_diff(240) <= 2 && second.height().abs_diff(180) <= 2);
        assert_eq!(image::open(dir.path().join("preview.png")).unwrap().dimensions(), (600, 400));
    }

    #[test]
    fn scan_rotation_straightens_before_detection() {
        let dir = tempfile::tempdir().unwrap();
        let mut upright = RgbImage::from_pixel(600, 400, Rgb([250, 250, 250]));
        for y in 120..280 {
            for x in 200..400 {
                upright.put_pixel(x, y, Rgb([180, 40, 40]));
            }
        }
        let input = dir.path().join("crooked.png");
        ImageProcessor::from_dynamic(DynamicImage::ImageRgb8(upright))
            .rotate_within_canvas(-10.0)
            .save(&input)
            .unwrap();
        let args = Args::try_parse_from([
            "photosplit".to_string(),
            input.display().to_string(),
            "--out".to_string(),
            dir.path().join("out").display().to_string(),
            "--scan-rotation".to_string(),
            "10".to_string(),
        ])
        .unwrap();

        assert_eq!(run(&args).unwrap(), 1);
        let photo = image::open(args.out.join("photo_1.png")).unwrap().to_rgb8();
        let (w, h) = photo.dimensions();
        assert!(w.abs_diff(200) <= 4 && h.abs_diff(160) <= 4, "{w}x{h}");
        let centre = photo.get_pixel(w / 2, h / 2).0;
        assert!(centre.iter().zip([180u8, 40, 40]).all(|(&c, e)| c.abs_diff(e) <= 2), "{centre:?}");
        let background = photo.pixels().filter(|p| p.0.iter().all(|&c| c > 200)).count();
        assert!(background * 20 < (w * h) as usize, "{background} background pixels");
    }

    #[test]
    fn edits_are_replayed_before_rectifying() {
        let dir = tempfile::tempdir().unwrap();
        let edits = dir.path().join("edits.json");
        fs::write(
            &edits,
            r#"[{"command": "delete_quad", "quad": 1},
                {"command": "rotate_quad", "quad": 0, "degrees": 90}]"#,
        )
        .unwrap();
        let args = args_for(dir.path(), &["--edits", &edits.display().to_string()]);

        assert_eq!(run(&args).unwrap(), 1);
        let photo = image::open(args.out.join("photo_1.png")).unwrap();
        // Quarter turn: 200x150 becomes 150x200.
        assert!(photo.width().abs_diff(150) <= 2 && photo.height().abs_diff(200) <= 2);
        assert!(!args.out.join("photo_2.png").exists());
    }

    #[test]
    fn rejected_edit_aborts_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let edits = dir.path().join("edits.json");
        fs::write(&edits, r#"[{"command": "delete_quad", "quad": 9}]"#).unwrap();
        let args = args_for(dir.path(), &["--edits", &edits.display().to_string()]);

        assert!(run(&args).is_err());
        assert!(!args.out.exists());
    }

    #[test]
    fn blank_scan_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("blank.png");
        DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, Rgb([255, 255, 255])))
            .save(&input)
            .unwrap();
        let args = Args::try_parse_from([
            "photosplit".to_string(),
            input.display().to_string(),
            "--out".to_string(),
            dir.path().join("out").display().to_string(),
        ])
        .unwrap();

        assert_eq!(run(&args).unwrap(), 0);
        assert!(!args.out.exists());
    }
}
