// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// photosplit-scan: Splits a scanned sheet of photographs into individual photos.
//
// Provides region detection (masking, contour tracing, quadrilateral fitting),
// rectification (scan rotation, padding, per-photo crop and rotation),
// preview annotation, and an edit session that applies user corrections to
// the detected quadrilaterals.

pub mod annotate;
pub mod detect;
pub mod edit;
pub mod geometry;
pub mod image;
pub mod rectify;

// Re-export the primary structs so callers can use `photosplit_scan::RegionDetector` etc.
pub use annotate::AnnotationRenderer;
pub use detect::{DetectedRegion, RegionDetector, ScanResult};
pub use edit::{EditCommand, EditSession};
pub use crate::image::processor::ImageProcessor;
pub use rectify::Rectifier;
