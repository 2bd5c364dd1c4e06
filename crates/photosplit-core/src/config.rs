// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration: detection strategy and thresholds, rectification
// padding, annotation style. Persisted as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PhotosplitError, Result};
use crate::types::NO_ROTATION;

/// Settings for the whole split pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub detection: DetectionConfig,
    pub rectify: RectifyConfig,
    pub annotation: AnnotationStyle,
}

impl SplitConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&data)
    }

    /// Write as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.detection.validate()
    }
}

/// How the scan is reduced to a foreground mask before contour tracing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionStrategy {
    /// HSV saturation above `cutoff` (0-255). Scanner lids are colourless,
    /// photos are not.
    Saturation { cutoff: u8 },
    /// Grayscale + global Otsu threshold; darker pixels are content.
    Otsu { blur_sigma: f32 },
    /// Local-mean threshold over a `(2r+1)^2` window, offset by `c`.
    Adaptive { block_radius: u32, c: i32 },
    /// Gaussian blur then Canny edges; contours follow the edge map.
    Canny { blur_sigma: f32, low: f32, high: f32 },
}

impl Default for DetectionStrategy {
    fn default() -> Self {
        Self::Saturation { cutoff: 20 }
    }
}

/// Perimeter fractions tried, coarse to fine, when simplifying a contour.
///
/// The first fraction whose simplified polygon has more than three vertices
/// wins. This is a tunable heuristic, not an optimal fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonSchedule {
    pub coarsest: f64,
    pub finest: f64,
    pub steps: u32,
}

impl Default for EpsilonSchedule {
    fn default() -> Self {
        Self {
            coarsest: 0.1,
            finest: 0.001,
            steps: 100,
        }
    }
}

impl EpsilonSchedule {
    /// The fractions in scan order. A single step yields only `coarsest`.
    pub fn fractions(&self) -> impl Iterator<Item = f64> + '_ {
        let span = self.coarsest - self.finest;
        let last = self.steps.saturating_sub(1).max(1) as f64;
        (0..self.steps).map(move |i| self.coarsest - span * i as f64 / last)
    }
}

/// Region detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub strategy: DetectionStrategy,
    /// Minimum contour area as a fraction of the scan area. The default,
    /// 1/64, is an eighth of the scan in each dimension.
    pub min_area_fraction: f64,
    /// Morphological closing radius applied to the mask (0 = off).
    pub close_radius: u8,
    pub epsilon: EpsilonSchedule,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            strategy: DetectionStrategy::default(),
            min_area_fraction: 1.0 / 64.0,
            close_radius: 2,
            epsilon: EpsilonSchedule::default(),
        }
    }
}

impl DetectionConfig {
    pub fn with_strategy(strategy: DetectionStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.min_area_fraction) {
            return Err(PhotosplitError::InvalidConfig(format!(
                "min_area_fraction must be in [0, 1), got {}",
                self.min_area_fraction
            )));
        }
        let eps = &self.epsilon;
        if eps.steps == 0 {
            return Err(PhotosplitError::InvalidConfig(
                "epsilon schedule needs at least one step".into(),
            ));
        }
        if eps.finest <= 0.0 || eps.coarsest < eps.finest {
            return Err(PhotosplitError::InvalidConfig(format!(
                "epsilon schedule must satisfy 0 < finest <= coarsest, got {}..{}",
                eps.finest, eps.coarsest
            )));
        }
        if let DetectionStrategy::Canny { low, high, .. } = self.strategy {
            if low > high {
                return Err(PhotosplitError::InvalidConfig(format!(
                    "canny low threshold {low} exceeds high threshold {high}"
                )));
            }
        }
        Ok(())
    }
}

/// Rectification settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifyConfig {
    /// Padding used when no quad reaches into negative coordinates.
    pub min_padding: u32,
    /// Rotation value meaning "leave this crop as is".
    pub sentinel: f64,
}

impl Default for RectifyConfig {
    fn default() -> Self {
        Self {
            min_padding: 10,
            sentinel: NO_ROTATION,
        }
    }
}

/// Outline thickness for annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineWeight {
    /// Always this many pixels.
    Fixed(u32),
    /// `image width / divisor`, at least one pixel.
    Proportional { divisor: u32 },
}

impl LineWeight {
    pub fn pixels(&self, image_width: u32) -> u32 {
        match *self {
            Self::Fixed(px) => px.max(1),
            Self::Proportional { divisor } => (image_width / divisor.max(1)).max(1),
        }
    }
}

/// How quad outlines are drawn on preview images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationStyle {
    /// RGBA outline colour.
    pub color: [u8; 4],
    pub weight: LineWeight,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            color: [255, 0, 0, 255],
            weight: LineWeight::Fixed(2),
        }
    }
}

impl AnnotationStyle {
    /// Style used while editing: heavier lines that scale with the scan.
    pub fn editor() -> Self {
        Self {
            weight: LineWeight::Proportional { divisor: 160 },
            ..Self::default()
        }
    }
}
