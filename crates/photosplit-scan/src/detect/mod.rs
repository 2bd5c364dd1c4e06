// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Region detection: turns a raw scan into candidate photo quadrilaterals and
// an annotated preview.

pub mod binarize;
pub mod polygon;

use image::DynamicImage;
use imageproc::contours::{BorderType, find_contours};
use photosplit_core::config::{AnnotationStyle, DetectionConfig};
use photosplit_core::{Quad, Rect};
use tracing::{debug, info, instrument};

use crate::annotate::AnnotationRenderer;
use crate::geometry::{
    bounding_rect, from_pixel_points, min_area_rect, pixel_footprint, polygon_area,
};
use crate::image::processor::is_empty;

use binarize::foreground_mask;
use polygon::approximate_quadrilateral;

/// One photo candidate found on a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedRegion {
    /// Corners of the minimum-area rectangle around the photo, clockwise
    /// from the top-left.
    pub corners: Quad,
    /// Axis-aligned box around the simplified contour.
    pub bounding_box: Rect,
    /// `bounding_box` cut from the scan, not yet rotation-corrected.
    pub cropped: DynamicImage,
}

/// Output of one detection pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanResult {
    /// The scan with every region outlined; `None` for an empty scan.
    pub annotated: Option<DynamicImage>,
    /// Regions in contour discovery order.
    pub regions: Vec<DetectedRegion>,
}

impl ScanResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when nothing was detected.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// The detected corners, ready for editing or rectification.
    pub fn quads(&self) -> Vec<Quad> {
        self.regions.iter().map(|r| r.corners).collect()
    }
}

/// Finds rectangular photos on a scanned sheet.
///
/// ## Pipeline
///
/// 1. Reduce the scan to a foreground mask (saturation, Otsu, local mean or
///    Canny, per configuration) and close small gaps
/// 2. Trace outer contours only; holes and nested contours are ignored
/// 3. Drop contours smaller than `min_area_fraction` of the scan
/// 4. Simplify each contour with the coarse-to-fine epsilon search; contours
///    that never reach four vertices are skipped
/// 5. Take the minimum-area rectangle of the polygon's pixels as the region
///    corners; each vertex pixel counts as a unit square
/// 6. Crop the axis-aligned bounding box of those pixels from the scan
/// 7. Outline every rectangle on a copy of the scan
#[derive(Debug, Clone, Default)]
pub struct RegionDetector {
    config: DetectionConfig,
    renderer: AnnotationRenderer,
}

impl RegionDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            config,
            renderer: AnnotationRenderer::default(),
        }
    }

    /// Use `style` for the annotated preview.
    pub fn with_style(mut self, style: AnnotationStyle) -> Self {
        self.renderer = AnnotationRenderer::new(style);
        self
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Run detection. Deterministic: the same scan always yields the same
    /// regions in the same order. An empty scan yields an empty result with
    /// no annotated image.
    #[instrument(skip_all, fields(width = scan.width(), height = scan.height()))]
    pub fn detect(&self, scan: &DynamicImage) -> ScanResult {
        if is_empty(scan) {
            debug!("Empty scan; nothing to detect");
            return ScanResult::empty();
        }

        let mask = foreground_mask(scan, self.config.strategy, self.config.close_radius);
        let contours = find_contours::<i32>(&mask);

        let scan_area = scan.width() as f64 * scan.height() as f64;
        let min_area = scan_area * self.config.min_area_fraction;

        let mut regions = Vec::new();
        for (index, contour) in contours.iter().enumerate() {
            if contour.parent.is_some() || contour.border_type != BorderType::Outer {
                continue;
            }

            let outline = from_pixel_points(&contour.points);
            let area = polygon_area(&outline);
            if area < min_area {
                debug!(index, area, min_area, "Contour below area threshold");
                continue;
            }

            let Some(polygon) = approximate_quadrilateral(&contour.points, &self.config.epsilon)
            else {
                debug!(index, "Contour never resolved to a quadrilateral; skipped");
                continue;
            };
            let polygon = from_pixel_points(&polygon);
            let footprint = pixel_footprint(&polygon);

            let (Some(rect), Some(bounding_box)) =
                (min_area_rect(&footprint), bounding_rect(&footprint))
            else {
                continue;
            };
            if bounding_box.is_empty() {
                continue;
            }

            let corners = rect.to_quad();
            let top_left = corners.points()[0];
            let cropped = scan.crop_imm(
                bounding_box.x.max(0) as u32,
                bounding_box.y.max(0) as u32,
                bounding_box.width,
                bounding_box.height,
            );
            debug!(
                index,
                vertices = polygon.len(),
                %top_left,
                width = bounding_box.width,
                height = bounding_box.height,
                "Region accepted"
            );
            regions.push(DetectedRegion {
                corners,
                bounding_box,
                cropped,
            });
        }

        let quads: Vec<Quad> = regions.iter().map(|r| r.corners).collect();
        let annotated = self.renderer.render(scan, &quads);

        info!(
            contours = contours.len(),
            regions = regions.len(),
            "Detection complete"
        );
        ScanResult {
            annotated: Some(annotated),
            regions,
        }
    }
}
