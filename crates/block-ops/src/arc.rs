//! SVG endpoint-parameterized arcs to center parameterization.
//!
//! Follows the W3C SVG implementation notes (F.6.5 and F.6.6): out-of-range
//! radii are scaled up, zero radii degrade to a straight line, and identical
//! endpoints draw nothing.

use block_types::Point2;
use std::f64::consts::TAU;

/// Center-parameterized elliptical arc. Angles in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterArc {
    pub center: Point2,
    /// Radii after out-of-range correction.
    pub radii: (f64, f64),
    /// Ellipse x-axis rotation.
    pub rotation: f64,
    pub start_angle: f64,
    /// Signed sweep; negative runs clockwise in the ellipse frame.
    pub sweep_angle: f64,
}

impl CenterArc {
    pub fn end_angle(&self) -> f64 {
        self.start_angle + self.sweep_angle
    }

    /// Point at parametric angle `t`.
    pub fn point_at(&self, t: f64) -> Point2 {
        let (sin_phi, cos_phi) = self.rotation.sin_cos();
        let x = self.radii.0 * t.cos();
        let y = self.radii.1 * t.sin();
        Point2::new(
            self.center.x + cos_phi * x - sin_phi * y,
            self.center.y + sin_phi * x + cos_phi * y,
        )
    }

    /// True when parametric angle `t` lies within the swept range.
    pub fn contains_angle(&self, t: f64) -> bool {
        let offset = if self.sweep_angle >= 0.0 {
            (t - self.start_angle).rem_euclid(TAU)
        } else {
            (self.start_angle - t).rem_euclid(TAU)
        };
        offset <= self.sweep_angle.abs()
    }
}

/// What an endpoint arc actually draws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArcShape {
    /// Start and end coincide: nothing is drawn.
    Empty,
    /// A zero radius: the arc is a straight line.
    Straight,
    Elliptical(CenterArc),
}

/// Signed angle from `u` to `v`: sign from the 2D cross product, magnitude
/// from the arccosine of the normalized dot product.
pub fn angle_between(u: (f64, f64), v: (f64, f64)) -> f64 {
    let cross = u.0 * v.1 - u.1 * v.0;
    let norm = (u.0.hypot(u.1)) * (v.0.hypot(v.1));
    let cos = ((u.0 * v.0 + u.1 * v.1) / norm).clamp(-1.0, 1.0);
    let magnitude = cos.acos();
    if cross < 0.0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Convert an endpoint arc (rotation in degrees) to its center form.
pub fn arc_endpoint_to_center(
    start: Point2,
    end: Point2,
    radius: (f64, f64),
    rotation_degrees: f64,
    large_arc: bool,
    sweep: bool,
) -> ArcShape {
    if start == end {
        return ArcShape::Empty;
    }
    let mut rx = radius.0.abs();
    let mut ry = radius.1.abs();
    if rx == 0.0 || ry == 0.0 {
        return ArcShape::Straight;
    }

    let phi = rotation_degrees.to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();

    // Step 1: (x1', y1')
    let dx = (start.x - end.x) / 2.0;
    let dy = (start.y - end.y) / 2.0;
    let x1p = cos_phi * dx + sin_phi * dy;
    let y1p = -sin_phi * dx + cos_phi * dy;

    let lambda = (x1p * x1p) / (rx * rx) + (y1p * y1p) / (ry * ry);
    if lambda > 1.0 {
        let s = lambda.sqrt();
        rx *= s;
        ry *= s;
    }

    // Step 2: (cx', cy')
    let (rx2, ry2) = (rx * rx, ry * ry);
    let numerator = (rx2 * ry2 - rx2 * y1p * y1p - ry2 * x1p * x1p).max(0.0);
    let denominator = rx2 * y1p * y1p + ry2 * x1p * x1p;
    let mut coef = (numerator / denominator).sqrt();
    if large_arc == sweep {
        coef = -coef;
    }
    let cxp = coef * rx * y1p / ry;
    let cyp = -coef * ry * x1p / rx;

    // Step 3: (cx, cy)
    let center = Point2::new(
        cos_phi * cxp - sin_phi * cyp + (start.x + end.x) / 2.0,
        sin_phi * cxp + cos_phi * cyp + (start.y + end.y) / 2.0,
    );

    // Step 4: θ1 and Δθ
    let u = ((x1p - cxp) / rx, (y1p - cyp) / ry);
    let v = ((-x1p - cxp) / rx, (-y1p - cyp) / ry);
    let start_angle = angle_between((1.0, 0.0), u);
    let mut sweep_angle = angle_between(u, v) % TAU;
    if !sweep && sweep_angle > 0.0 {
        sweep_angle -= TAU;
    } else if sweep && sweep_angle < 0.0 {
        sweep_angle += TAU;
    }

    ArcShape::Elliptical(CenterArc {
        center,
        radii: (rx, ry),
        rotation: phi,
        start_angle,
        sweep_angle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn elliptical(shape: ArcShape) -> CenterArc {
        match shape {
            ArcShape::Elliptical(arc) => arc,
            other => panic!("expected an elliptical arc, got {other:?}"),
        }
    }

    #[test]
    fn quarter_arc_center_and_angles() {
        let arc = elliptical(arc_endpoint_to_center(
            Point2::new(10.0, 0.0),
            Point2::new(0.0, 5.0),
            (10.0, 5.0),
            0.0,
            false,
            true,
        ));
        assert_relative_eq!(arc.center.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(arc.center.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(arc.start_angle, 0.0, epsilon = 1e-12);
        assert_relative_eq!(arc.sweep_angle, FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn endpoints_are_reproduced() {
        let start = Point2::new(3.0, 1.0);
        let end = Point2::new(7.0, 4.0);
        let arc = elliptical(arc_endpoint_to_center(start, end, (4.0, 3.0), 30.0, true, false));
        let a = arc.point_at(arc.start_angle);
        let b = arc.point_at(arc.end_angle());
        assert_relative_eq!(a.x, start.x, epsilon = 1e-9);
        assert_relative_eq!(a.y, start.y, epsilon = 1e-9);
        assert_relative_eq!(b.x, end.x, epsilon = 1e-9);
        assert_relative_eq!(b.y, end.y, epsilon = 1e-9);
    }

    #[test]
    fn matching_flags_share_a_center_and_complement() {
        let start = Point2::new(0.0, 0.0);
        let end = Point2::new(1.0, 1.0);
        let small = elliptical(arc_endpoint_to_center(start, end, (1.0, 1.0), 0.0, false, false));
        let large = elliptical(arc_endpoint_to_center(start, end, (1.0, 1.0), 0.0, true, true));

        assert_relative_eq!(small.center.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(small.center.y, 0.0, epsilon = 1e-12);
        assert_eq!(small.center, large.center);
        assert_relative_eq!(small.sweep_angle, -FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(large.sweep_angle, 3.0 * FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(
            small.sweep_angle.abs() + large.sweep_angle.abs(),
            2.0 * PI,
            epsilon = 1e-12
        );
    }

    #[test]
    fn mixed_flags_use_the_other_center() {
        let start = Point2::new(0.0, 0.0);
        let end = Point2::new(1.0, 1.0);
        let arc = elliptical(arc_endpoint_to_center(start, end, (1.0, 1.0), 0.0, false, true));
        assert_relative_eq!(arc.center.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(arc.center.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(arc.start_angle, -FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(arc.sweep_angle, FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn undersized_radius_is_scaled_up() {
        let arc = elliptical(arc_endpoint_to_center(
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            (1.0, 1.0),
            0.0,
            false,
            true,
        ));
        assert_relative_eq!(arc.radii.0, 2.0, epsilon = 1e-12);
        assert_relative_eq!(arc.radii.1, 2.0, epsilon = 1e-12);
        assert_relative_eq!(arc.center.x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(arc.sweep_angle, PI, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_arcs() {
        let p = Point2::new(1.0, 2.0);
        assert_eq!(
            arc_endpoint_to_center(p, p, (1.0, 1.0), 0.0, false, false),
            ArcShape::Empty
        );
        assert_eq!(
            arc_endpoint_to_center(p, Point2::new(3.0, 2.0), (0.0, 1.0), 0.0, false, false),
            ArcShape::Straight
        );
    }

    #[test]
    fn contains_angle_respects_direction() {
        let arc = CenterArc {
            center: Point2::new(0.0, 0.0),
            radii: (1.0, 1.0),
            rotation: 0.0,
            start_angle: 0.0,
            sweep_angle: -FRAC_PI_2,
        };
        assert!(arc.contains_angle(-0.5));
        assert!(!arc.contains_angle(0.5));
        assert!(arc.contains_angle(3.0 * FRAC_PI_2 + 0.1));
    }
}
