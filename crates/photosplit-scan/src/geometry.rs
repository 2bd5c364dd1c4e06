// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Point and quadrilateral helpers: centroid, bounding rectangle, minimum-area
// rotated rectangle, corner ordering, and the negative-coordinate scan used to
// size rectification padding.

use imageproc::geometry::convex_hull;
use imageproc::point::Point as PixelPoint;
use photosplit_core::{Point, Quad, Rect};

/// Decimal places kept before flooring/ceiling rectangle edges, so that
/// `399.9999999` and `400.0000001` both land on 400.
const EDGE_SNAP: f64 = 1e6;

/// Convert to `imageproc` points.
pub fn to_pixel_points(points: &[Point]) -> Vec<PixelPoint<i32>> {
    points.iter().map(|p| PixelPoint::new(p.x, p.y)).collect()
}

/// Convert from `imageproc` points.
pub fn from_pixel_points(points: &[PixelPoint<i32>]) -> Vec<Point> {
    points.iter().map(|p| Point::new(p.x, p.y)).collect()
}

/// Mean of the coordinates, or `None` for an empty set.
pub fn centroid(points: &[Point]) -> Option<(f64, f64)> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| {
        (sx + p.x as f64, sy + p.y as f64)
    });
    Some((sx / n, sy / n))
}

/// Axis-aligned rectangle spanning the points (`width = max_x - min_x`).
pub fn bounding_rect(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let (mut left, mut top, mut right, mut bottom) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        left = left.min(p.x);
        top = top.min(p.y);
        right = right.max(p.x);
        bottom = bottom.max(p.y);
    }
    Some(Rect::from_edges(left, top, right, bottom))
}

/// The four corners of every pixel in `points`.
///
/// Contour tracing reports pixel centres, inclusive on every side. Treating
/// each pixel as a unit square gives shapes whose right and bottom edges are
/// exclusive, matching [`Rect`], so a traced 300px-wide block measures 300.
pub fn pixel_footprint(points: &[Point]) -> Vec<Point> {
    points
        .iter()
        .flat_map(|p| {
            let (right, bottom) = (p.x.saturating_add(1), p.y.saturating_add(1));
            [
                *p,
                Point::new(right, p.y),
                Point::new(right, bottom),
                Point::new(p.x, bottom),
            ]
        })
        .collect()
}

/// Unsigned polygon area by the shoelace formula. Vertices may be in either
/// winding order.
pub fn polygon_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0f64;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += points[i].x as f64 * points[j].y as f64;
        twice_area -= points[j].x as f64 * points[i].y as f64;
    }
    twice_area.abs() / 2.0
}

/// The smallest x or y across all quads, if any is negative.
pub fn most_negative_coordinate(quads: &[Quad]) -> Option<i32> {
    quads
        .iter()
        .map(Quad::min_coordinate)
        .min()
        .filter(|&min| min < 0)
}

/// Order four corners clockwise (y pointing down) starting at the top-left.
///
/// "Top-left" is the corner with the smallest `x + y`; ties go to the higher
/// corner.
pub fn order_clockwise(corners: [(f64, f64); 4]) -> [(f64, f64); 4] {
    let cx = corners.iter().map(|c| c.0).sum::<f64>() / 4.0;
    let cy = corners.iter().map(|c| c.1).sum::<f64>() / 4.0;

    let mut ordered = corners;
    ordered.sort_by(|a, b| {
        let angle_a = (a.1 - cy).atan2(a.0 - cx);
        let angle_b = (b.1 - cy).atan2(b.0 - cx);
        angle_a.total_cmp(&angle_b)
    });

    let start = (0..4)
        .min_by(|&i, &j| {
            let (a, b) = (ordered[i], ordered[j]);
            (a.0 + a.1)
                .total_cmp(&(b.0 + b.1))
                .then(a.1.total_cmp(&b.1))
        })
        .unwrap_or(0);
    ordered.rotate_left(start);
    ordered
}

/// A rectangle at an arbitrary rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
    pub center: (f64, f64),
    /// Extent along the direction given by `angle`.
    pub width: f64,
    /// Extent perpendicular to `angle`.
    pub height: f64,
    /// Direction of the `width` side, in degrees.
    pub angle: f64,
}

impl RotatedRect {
    /// Corner coordinates, clockwise from the top-left.
    pub fn corners(&self) -> [(f64, f64); 4] {
        let (sin, cos) = self.angle.to_radians().sin_cos();
        let (hw, hh) = (self.width / 2.0, self.height / 2.0);
        let (cx, cy) = self.center;
        // u = (cos, sin) along the width, v = (-sin, cos) along the height.
        let corner = |su: f64, sv: f64| {
            (
                cx + su * hw * cos - sv * hh * sin,
                cy + su * hw * sin + sv * hh * cos,
            )
        };
        order_clockwise([
            corner(-1.0, -1.0),
            corner(1.0, -1.0),
            corner(1.0, 1.0),
            corner(-1.0, 1.0),
        ])
    }

    /// Corners rounded to pixel coordinates.
    pub fn to_quad(&self) -> Quad {
        Quad::new(
            self.corners()
                .map(|(x, y)| Point::new(x.round() as i32, y.round() as i32)),
        )
    }

    /// Axis-aligned rectangle enclosing the rotated one.
    pub fn bounding_rect(&self) -> Rect {
        let corners = self.corners();
        let snap = |v: f64| (v * EDGE_SNAP).round() / EDGE_SNAP;
        let fold = |pick: fn(&(f64, f64)) -> f64, init: f64, f: fn(f64, f64) -> f64| {
            corners.iter().map(pick).map(snap).fold(init, f)
        };
        let left = fold(|c| c.0, f64::INFINITY, f64::min).floor() as i32;
        let top = fold(|c| c.1, f64::INFINITY, f64::min).floor() as i32;
        let right = fold(|c| c.0, f64::NEG_INFINITY, f64::max).ceil() as i32;
        let bottom = fold(|c| c.1, f64::NEG_INFINITY, f64::max).ceil() as i32;
        Rect::from_edges(left, top, right, bottom)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Smallest-area rectangle, at any rotation, enclosing the points.
///
/// Rotating calipers over the convex hull: one side of the optimum is always
/// collinear with a hull edge. Fewer than three hull points give the
/// axis-aligned (possibly zero-width) box. `None` for an empty input.
pub fn min_area_rect(points: &[Point]) -> Option<RotatedRect> {
    if points.is_empty() {
        return None;
    }

    let hull: Vec<PixelPoint<i32>> = if points.len() < 3 {
        Vec::new()
    } else {
        convex_hull(to_pixel_points(points).as_slice())
    };
    if hull.len() < 3 {
        let rect = bounding_rect(points)?;
        return Some(RotatedRect {
            center: (
                rect.x as f64 + rect.width as f64 / 2.0,
                rect.y as f64 + rect.height as f64 / 2.0,
            ),
            width: rect.width as f64,
            height: rect.height as f64,
            angle: 0.0,
        });
    }

    let hull: Vec<(f64, f64)> = hull.iter().map(|p| (p.x as f64, p.y as f64)).collect();
    let n = hull.len();
    let mut best: Option<RotatedRect> = None;

    for i in 0..n {
        let (ax, ay) = hull[i];
        let (bx, by) = hull[(i + 1) % n];
        let (ex, ey) = (bx - ax, by - ay);
        let length = ex.hypot(ey);
        if length < f64::EPSILON {
            continue;
        }
        let (ux, uy) = (ex / length, ey / length);
        let (vx, vy) = (-uy, ux);

        let (mut min_u, mut max_u) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_v, mut max_v) = (f64::INFINITY, f64::NEG_INFINITY);
        for &(px, py) in &hull {
            let (dx, dy) = (px - ax, py - ay);
            let pu = dx * ux + dy * uy;
            let pv = dx * vx + dy * vy;
            min_u = min_u.min(pu);
            max_u = max_u.max(pu);
            min_v = min_v.min(pv);
            max_v = max_v.max(pv);
        }

        let candidate = RotatedRect {
            center: (
                ax + ux * (min_u + max_u) / 2.0 + vx * (min_v + max_v) / 2.0,
                ay + uy * (min_u + max_u) / 2.0 + vy * (min_v + max_v) / 2.0,
            ),
            width: max_u - min_u,
            height: max_v - min_v,
            angle: uy.atan2(ux).to_degrees(),
        };
        if best.is_none_or(|b| candidate.area() < b.area() - 1e-9) {
            best = Some(candidate);
        }
    }

    best
}
