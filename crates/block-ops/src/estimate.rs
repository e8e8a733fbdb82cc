//! Artwork extent estimation.
//!
//! Extents are exact: Bézier extremes come from the real roots of the
//! derivative and arc extremes from the axis-extreme angles inside the sweep.

use block_types::{BoundingBox, PathSegment, Point2, VectorPath};
use std::f64::consts::PI;
use tracing::debug;

use crate::arc::{arc_endpoint_to_center, ArcShape};
use crate::types::EstimateError;

/// Measure the combined extent of all paths.
///
/// The first non-empty path seeds the box and later ones only widen it, so
/// the result does not depend on path order. Declared document dimensions
/// are never consulted.
pub fn estimate(paths: &[VectorPath]) -> Result<BoundingBox, EstimateError> {
    let bbox = paths
        .iter()
        .filter_map(path_bounds)
        .reduce(|acc, b| acc.union(&b))
        .ok_or(EstimateError::EmptyArtwork)?;
    debug!(
        width = bbox.width(),
        height = bbox.height(),
        paths = paths.len(),
        "estimated artwork extent"
    );
    Ok(bbox)
}

/// Exact extent of one path, or `None` if it draws nothing measurable.
pub fn path_bounds(path: &VectorPath) -> Option<BoundingBox> {
    path.segments
        .iter()
        .filter_map(segment_bounds)
        .reduce(|acc, b| acc.union(&b))
}

/// Exact extent of one segment. Segments with non-finite data have none.
pub fn segment_bounds(segment: &PathSegment) -> Option<BoundingBox> {
    let points = match *segment {
        PathSegment::Line { start, end } => vec![start, end],
        PathSegment::QuadraticBezier {
            start,
            control,
            end,
        } => {
            let mut pts = vec![start, end];
            for t in quadratic_extremes(start, control, end) {
                pts.push(quadratic_at(start, control, end, t));
            }
            pts
        }
        PathSegment::CubicBezier {
            start,
            control1,
            control2,
            end,
        } => {
            let mut pts = vec![start, end];
            for t in cubic_extremes(start, control1, control2, end) {
                pts.push(cubic_at(start, control1, control2, end, t));
            }
            pts
        }
        PathSegment::EllipticalArc {
            start,
            end,
            radius,
            rotation,
            large_arc,
            sweep,
        } => {
            let mut pts = vec![start, end];
            if let ArcShape::Elliptical(arc) =
                arc_endpoint_to_center(start, end, radius, rotation, large_arc, sweep)
            {
                let (sin_phi, cos_phi) = arc.rotation.sin_cos();
                let (rx, ry) = arc.radii;
                let tx = (-ry * sin_phi).atan2(rx * cos_phi);
                let ty = (ry * cos_phi).atan2(rx * sin_phi);
                for t in [tx, tx + PI, ty, ty + PI] {
                    if arc.contains_angle(t) {
                        pts.push(arc.point_at(t));
                    }
                }
            }
            pts
        }
    };

    if points.iter().any(|p| !p.is_finite()) {
        return None;
    }
    BoundingBox::from_points(&points)
}

fn in_open_unit(t: f64) -> bool {
    t > 0.0 && t < 1.0
}

fn quadratic_at(p0: Point2, p1: Point2, p2: Point2, t: f64) -> Point2 {
    let mt = 1.0 - t;
    Point2::new(
        mt * mt * p0.x + 2.0 * mt * t * p1.x + t * t * p2.x,
        mt * mt * p0.y + 2.0 * mt * t * p1.y + t * t * p2.y,
    )
}

fn cubic_at(p0: Point2, p1: Point2, p2: Point2, p3: Point2, t: f64) -> Point2 {
    let mt = 1.0 - t;
    let (a, b, c, d) = (mt * mt * mt, 3.0 * mt * mt * t, 3.0 * mt * t * t, t * t * t);
    Point2::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

/// Parameters in (0, 1) where a quadratic Bézier's derivative vanishes on an axis.
fn quadratic_extremes(p0: Point2, p1: Point2, p2: Point2) -> Vec<f64> {
    [(p0.x, p1.x, p2.x), (p0.y, p1.y, p2.y)]
        .into_iter()
        .filter_map(|(a, b, c)| {
            let denom = a - 2.0 * b + c;
            (denom != 0.0).then(|| (a - b) / denom)
        })
        .filter(|t| in_open_unit(*t))
        .collect()
}

/// Parameters in (0, 1) where a cubic Bézier's derivative vanishes on an axis.
fn cubic_extremes(p0: Point2, p1: Point2, p2: Point2, p3: Point2) -> Vec<f64> {
    let mut roots = Vec::new();
    for (a0, a1, a2, a3) in [(p0.x, p1.x, p2.x, p3.x), (p0.y, p1.y, p2.y, p3.y)] {
        // B'(t)/3 = A t² + B t + C
        let a = -a0 + 3.0 * a1 - 3.0 * a2 + a3;
        let b = 2.0 * (a0 - 2.0 * a1 + a2);
        let c = a1 - a0;
        if a.abs() < 1e-12 {
            if b != 0.0 {
                roots.push(-c / b);
            }
            continue;
        }
        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            continue;
        }
        let sq = disc.sqrt();
        roots.push((-b + sq) / (2.0 * a));
        roots.push((-b - sq) / (2.0 * a));
    }
    roots.retain(|t| in_open_unit(*t));
    roots
}
