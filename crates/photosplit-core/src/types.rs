// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core geometry types for Photosplit: pixel points, quadrilaterals and
// axis-aligned rectangles.

use serde::{Deserialize, Serialize};

use crate::error::{PhotosplitError, Result};

/// Rotation value meaning "no explicit rotation chosen".
pub const NO_ROTATION: f64 = -1.0;

/// Resolve a stored rotation angle, treating `sentinel` as zero.
pub fn effective_rotation(angle: f64, sentinel: f64) -> f64 {
    if (angle - sentinel).abs() < f64::EPSILON {
        0.0
    } else {
        angle
    }
}

/// Integer pixel coordinate. May lie outside the scan after an edit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Shift the point by `(dx, dy)`, clamping at the `i32` limits.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// Shift the point by `(dx, dy)`, or `None` if either coordinate leaves
    /// the `i32` range.
    pub fn checked_offset(self, dx: i32, dy: i32) -> Option<Self> {
        Some(Self::new(self.x.checked_add(dx)?, self.y.checked_add(dy)?))
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A photo boundary: exactly four corner points.
///
/// Convexity and winding are not enforced. Quads produced by detection are
/// ordered clockwise from the top-left corner; user edits may break that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quad([Point; 4]);

impl Quad {
    pub const CORNERS: usize = 4;

    pub const fn new(corners: [Point; 4]) -> Self {
        Self(corners)
    }

    /// The axis-aligned quad covering `rect`, clockwise from top-left.
    pub fn from_rect(rect: Rect) -> Self {
        let (right, bottom) = (rect.right(), rect.bottom());
        Self([
            Point::new(rect.x, rect.y),
            Point::new(right, rect.y),
            Point::new(right, bottom),
            Point::new(rect.x, bottom),
        ])
    }

    pub fn points(&self) -> &[Point; 4] {
        &self.0
    }

    pub fn corner(&self, index: usize) -> Option<Point> {
        self.0.get(index).copied()
    }

    /// Replace one corner, rejecting indices outside `0..4`.
    pub fn set_corner(&mut self, index: usize, point: Point) -> Result<()> {
        let slot = self.0.get_mut(index).ok_or(PhotosplitError::IndexOutOfRange {
            what: "corner",
            index,
            len: Self::CORNERS,
        })?;
        *slot = point;
        Ok(())
    }

    /// The same quad shifted by `(dx, dy)`, clamping at the `i32` limits.
    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self(self.0.map(|p| p.offset(dx, dy)))
    }

    /// The same quad shifted by `(dx, dy)`.
    ///
    /// # Errors
    ///
    /// [`PhotosplitError::CoordinateOutOfRange`] if any shifted corner would
    /// leave the `i32` range.
    pub fn checked_translate(&self, dx: i32, dy: i32) -> Result<Self> {
        let mut shifted = self.0;
        for (slot, p) in shifted.iter_mut().zip(&self.0) {
            *slot = p.checked_offset(dx, dy).ok_or_else(|| {
                let (x, y) = (i64::from(p.x) + i64::from(dx), i64::from(p.y) + i64::from(dy));
                let value = if i32::try_from(x).is_err() { x } else { y };
                PhotosplitError::CoordinateOutOfRange { value }
            })?;
        }
        Ok(Self(shifted))
    }

    /// The four outline segments, corner `i` to corner `(i + 1) % 4`.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        (0..Self::CORNERS).map(move |i| (self.0[i], self.0[(i + 1) % Self::CORNERS]))
    }

    /// Smallest x or y over all corners.
    pub fn min_coordinate(&self) -> i32 {
        self.0
            .iter()
            .map(|p| p.x.min(p.y))
            .min()
            .unwrap_or_default()
    }
}

impl From<[Point; 4]> for Quad {
    fn from(corners: [Point; 4]) -> Self {
        Self(corners)
    }
}

impl TryFrom<&[Point]> for Quad {
    type Error = PhotosplitError;

    fn try_from(points: &[Point]) -> Result<Self> {
        let corners: [Point; 4] = points
            .try_into()
            .map_err(|_| PhotosplitError::QuadArity {
                found: points.len(),
            })?;
        Ok(Self(corners))
    }
}

impl TryFrom<Vec<Point>> for Quad {
    type Error = PhotosplitError;

    fn try_from(points: Vec<Point>) -> Result<Self> {
        Self::try_from(points.as_slice())
    }
}

/// Axis-aligned rectangle. `x`/`y` may be negative; the right and bottom
/// edges are exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from inclusive-min / exclusive-max edges. Inverted edges give an
    /// empty rectangle.
    pub fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(
            left,
            top,
            right.saturating_sub(left).max(0) as u32,
            bottom.saturating_sub(top).max(0) as u32,
        )
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add_unsigned(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add_unsigned(self.height)
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
