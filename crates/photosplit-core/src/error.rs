// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Photosplit.

use thiserror::Error;

/// Top-level error type for all Photosplit operations.
///
/// Detection misses are not represented here: a scan with no recognisable
/// photos yields an empty result, never an error.
#[derive(Debug, Error)]
pub enum PhotosplitError {
    // -- Invalid arguments --
    #[error("a quadrilateral needs exactly 4 points, got {found}")]
    QuadArity { found: usize },

    #[error("{quads} quadrilaterals but {rotations} rotation angles")]
    RotationCountMismatch { quads: usize, rotations: usize },

    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("coordinate {value} is outside the supported range")]
    CoordinateOutOfRange { value: i64 },

    #[error("a {width}x{height} canvas is larger than supported")]
    CanvasTooLarge { width: u64, height: u64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Image I/O --
    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PhotosplitError {
    /// Whether this error stems from a caller passing bad arguments, as
    /// opposed to an environmental failure (I/O, decoding).
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::QuadArity { .. }
                | Self::RotationCountMismatch { .. }
                | Self::IndexOutOfRange { .. }
                | Self::CoordinateOutOfRange { .. }
                | Self::CanvasTooLarge { .. }
                | Self::InvalidConfig(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PhotosplitError>;
