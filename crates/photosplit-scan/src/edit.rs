// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edit session: user corrections to a detection result, applied as explicit
// commands, with previews and crops recomputed on demand.

use image::DynamicImage;
use photosplit_core::config::{AnnotationStyle, SplitConfig};
use photosplit_core::error::{PhotosplitError, Result};
use photosplit_core::{Point, Quad, effective_rotation};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::annotate::AnnotationRenderer;
use crate::detect::{RegionDetector, ScanResult};
use crate::image::processor::ImageProcessor;
use crate::rectify::Rectifier;

/// One user correction. Serialisable so a front end can record and replay
/// a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditCommand {
    /// Move one corner of one quad.
    MoveCorner {
        quad: usize,
        corner: usize,
        to: Point,
    },
    /// Add `degrees` (clockwise) to a quad's rotation.
    RotateQuad { quad: usize, degrees: f64 },
    /// Remove a quad; later quads shift down by one.
    DeleteQuad { quad: usize },
    /// Append a quad the detector missed. It starts unrotated.
    AddQuad { corners: Quad },
    /// Replace the whole-sheet rotation.
    SetScanRotation { degrees: f64 },
}

/// A scan plus the editable list of quads and per-quad rotations.
///
/// Quad coordinates refer to the scan after the scan rotation has been
/// applied, which is also what [`preview`](Self::preview) draws on.
#[derive(Debug, Clone)]
pub struct EditSession {
    scan: DynamicImage,
    scan_rotation: f64,
    quads: Vec<Quad>,
    rotations: Vec<f64>,
    sentinel: f64,
    rectifier: Rectifier,
    renderer: AnnotationRenderer,
}

impl EditSession {
    /// Start with no quads, previewing in the configured annotation style.
    pub fn new(scan: DynamicImage, config: &SplitConfig) -> Self {
        Self {
            scan,
            scan_rotation: 0.0,
            quads: Vec::new(),
            rotations: Vec::new(),
            sentinel: config.rectify.sentinel,
            rectifier: Rectifier::new(config.rectify),
            renderer: AnnotationRenderer::new(config.annotation),
        }
    }

    /// Preview in `style` instead, e.g. [`AnnotationStyle::editor`] for an
    /// interactive front end.
    pub fn with_style(mut self, style: AnnotationStyle) -> Self {
        self.renderer = AnnotationRenderer::new(style);
        self
    }

    /// Start from the regions of a detection pass, all unrotated.
    pub fn from_scan_result(scan: DynamicImage, result: &ScanResult, config: &SplitConfig) -> Self {
        let mut session = Self::new(scan, config);
        session.quads = result.quads();
        session.rotations = vec![session.sentinel; session.quads.len()];
        session
    }

    pub fn scan(&self) -> &DynamicImage {
        &self.scan
    }

    pub fn scan_rotation(&self) -> f64 {
        self.scan_rotation
    }

    pub fn quads(&self) -> &[Quad] {
        &self.quads
    }

    /// Stored rotations; entries equal to the sentinel mean "unrotated".
    pub fn rotations(&self) -> &[f64] {
        &self.rotations
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// Apply one command. A rejected command leaves the session unchanged.
    #[instrument(skip(self))]
    pub fn apply(&mut self, command: EditCommand) -> Result<()> {
        match command {
            EditCommand::MoveCorner { quad, corner, to } => self.move_corner(quad, corner, to),
            EditCommand::RotateQuad { quad, degrees } => self.rotate_quad(quad, degrees),
            EditCommand::DeleteQuad { quad } => self.delete_quad(quad).map(|_| ()),
            EditCommand::AddQuad { corners } => {
                self.add_quad(corners);
                Ok(())
            }
            EditCommand::SetScanRotation { degrees } => {
                self.set_scan_rotation(degrees);
                Ok(())
            }
        }
    }

    /// Apply commands in order, stopping at the first rejected one. Commands
    /// before it stay applied.
    pub fn apply_all(&mut self, commands: impl IntoIterator<Item = EditCommand>) -> Result<()> {
        for command in commands {
            self.apply(command)?;
        }
        Ok(())
    }

    pub fn move_corner(&mut self, quad: usize, corner: usize, to: Point) -> Result<()> {
        self.quad_mut(quad)?.set_corner(corner, to)?;
        debug!(quad, corner, %to, "Corner moved");
        Ok(())
    }

    /// Accumulate a rotation, wrapped to `[0, 360)`. An unrotated quad starts
    /// from 0.
    pub fn rotate_quad(&mut self, quad: usize, degrees: f64) -> Result<()> {
        self.check_index(quad)?;
        let current = effective_rotation(self.rotations[quad], self.sentinel);
        let updated = (current + degrees).rem_euclid(360.0);
        self.rotations[quad] = updated;
        debug!(quad, degrees, updated, "Quad rotated");
        Ok(())
    }

    /// Remove a quad and its rotation, returning the quad.
    pub fn delete_quad(&mut self, quad: usize) -> Result<Quad> {
        self.check_index(quad)?;
        self.rotations.remove(quad);
        let removed = self.quads.remove(quad);
        debug!(quad, remaining = self.quads.len(), "Quad deleted");
        Ok(removed)
    }

    /// Append a quad and return its index.
    pub fn add_quad(&mut self, corners: Quad) -> usize {
        self.quads.push(corners);
        self.rotations.push(self.sentinel);
        debug!(index = self.quads.len() - 1, "Quad added");
        self.quads.len() - 1
    }

    pub fn set_scan_rotation(&mut self, degrees: f64) {
        self.scan_rotation = degrees;
        debug!(degrees, "Scan rotation set");
    }

    /// Run `detector` on the scan as currently rotated and replace every quad
    /// with what it finds, all unrotated. The new quads are in the same
    /// frame as edits and [`rectify`](Self::rectify), so set the scan
    /// rotation first.
    #[instrument(skip(self, detector), fields(scan_rotation = self.scan_rotation))]
    pub fn detect(&mut self, detector: &RegionDetector) -> ScanResult {
        let result = detector.detect(&self.sheet());
        self.quads = result.quads();
        self.rotations = vec![self.sentinel; self.quads.len()];
        info!(quads = self.quads.len(), "Session re-detected");
        result
    }

    /// The scan, rotated by the scan rotation, with every quad outlined.
    pub fn preview(&self) -> DynamicImage {
        self.renderer.render(&self.sheet(), &self.quads)
    }

    /// Final crops, one per quad.
    pub fn rectify(&self) -> Result<Vec<DynamicImage>> {
        info!(quads = self.quads.len(), "Rectifying edited session");
        self.rectifier.rectify(
            &self.scan,
            self.scan_rotation,
            &self.quads,
            &self.rotations,
            self.sentinel,
        )
    }

    /// The scan in the frame quads refer to.
    fn sheet(&self) -> DynamicImage {
        ImageProcessor::from_dynamic(self.scan.clone())
            .rotate_within_canvas(self.scan_rotation)
            .into_dynamic()
    }

    fn check_index(&self, quad: usize) -> Result<()> {
        if quad < self.quads.len() {
            Ok(())
        } else {
            Err(PhotosplitError::IndexOutOfRange {
                what: "quad",
                index: quad,
                len: self.quads.len(),
            })
        }
    }

    fn quad_mut(&mut self, quad: usize) -> Result<&mut Quad> {
        self.check_index(quad)?;
        Ok(&mut self.quads[quad])
    }
}
