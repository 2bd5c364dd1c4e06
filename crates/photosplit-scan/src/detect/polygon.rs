// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contour simplification: Douglas-Peucker on closed contours with a
// coarse-to-fine epsilon search for the first polygon with four or more
// vertices.

use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use photosplit_core::config::EpsilonSchedule;
use tracing::debug;

/// Simplify a closed contour to the coarsest polygon with more than three
/// vertices.
///
/// Epsilon is `fraction * perimeter`, with fractions taken from `schedule`
/// largest first. Torn edges and shadows make contours ragged; the search
/// finds the coarsest fit that still resolves a four-sided shape instead of
/// collapsing to a line or triangle. `None` if no fraction qualifies.
pub fn approximate_quadrilateral(
    contour: &[Point<i32>],
    schedule: &EpsilonSchedule,
) -> Option<Vec<Point<i32>>> {
    if contour.len() < 4 {
        return None;
    }
    let perimeter = arc_length(contour, true);
    if perimeter <= 0.0 {
        return None;
    }

    for fraction in schedule.fractions() {
        let epsilon = fraction * perimeter;
        if epsilon <= 0.0 {
            break;
        }
        let polygon = simplify_closed(contour, epsilon);
        if polygon.len() > 3 {
            debug!(
                fraction,
                vertices = polygon.len(),
                "Contour simplified"
            );
            return Some(polygon);
        }
    }

    debug!(points = contour.len(), "No epsilon gave more than three vertices");
    None
}

/// Douglas-Peucker on a closed curve.
///
/// The curve is split at the point farthest from its first point and each
/// half is simplified as an open chain. The first point is then dropped if it
/// turned out to lie on a straight edge.
pub fn simplify_closed(contour: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    let Some(&start) = contour.first() else {
        return Vec::new();
    };
    let far = contour
        .iter()
        .enumerate()
        .max_by_key(|(_, p)| {
            let (dx, dy) = (i64::from(p.x - start.x), i64::from(p.y - start.y));
            dx * dx + dy * dy
        })
        .map(|(i, _)| i)
        .unwrap_or(0);
    if far == 0 {
        return vec![start];
    }

    let mut polygon = approximate_polygon_dp(&contour[..=far], epsilon, false);
    let mut return_chain = contour[far..].to_vec();
    return_chain.push(start);
    let mut tail = approximate_polygon_dp(&return_chain, epsilon, false);

    // Both chains repeat their shared endpoints.
    polygon.pop();
    tail.pop();
    polygon.append(&mut tail);

    if polygon.len() > 3 {
        let (prev, next) = (polygon[polygon.len() - 1], polygon[1]);
        if distance_to_line(start, prev, next) <= epsilon {
            polygon.remove(0);
        }
    }
    polygon
}

/// Perpendicular distance from `p` to the line through `a` and `b`.
fn distance_to_line(p: Point<i32>, a: Point<i32>, b: Point<i32>) -> f64 {
    let (ax, ay) = (f64::from(a.x), f64::from(a.y));
    let (bx, by) = (f64::from(b.x), f64::from(b.y));
    let (px, py) = (f64::from(p.x), f64::from(p.y));
    let length = (bx - ax).hypot(by - ay);
    if length == 0.0 {
        return (px - ax).hypot(py - ay);
    }
    ((bx - ax) * (ay - py) - (ax - px) * (by - ay)).abs() / length
}
