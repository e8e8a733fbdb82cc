use serde::{Deserialize, Serialize};

/// Coincidence tolerance for path endpoints, in source units.
/// Used both for closed-contour detection and degenerate-line elision.
pub const PATH_TOLERANCE: f64 = 1e-3;

/// A 2D point in artwork source units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True when both coordinates differ by less than `tolerance`.
    pub fn approx_eq(&self, other: &Point2, tolerance: f64) -> bool {
        (self.x - other.x).abs() < tolerance && (self.y - other.y).abs() < tolerance
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// One drawing primitive of an outline path.
///
/// The set is closed: the profile interpreter and the size estimator match
/// on it exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PathSegment {
    Line {
        start: Point2,
        end: Point2,
    },
    QuadraticBezier {
        start: Point2,
        control: Point2,
        end: Point2,
    },
    CubicBezier {
        start: Point2,
        control1: Point2,
        control2: Point2,
        end: Point2,
    },
    /// SVG endpoint-parameterized elliptical arc.
    EllipticalArc {
        start: Point2,
        end: Point2,
        /// Radii (rx, ry).
        radius: (f64, f64),
        /// x-axis rotation of the ellipse, in degrees.
        rotation: f64,
        large_arc: bool,
        sweep: bool,
    },
}

impl PathSegment {
    pub fn start(&self) -> Point2 {
        match self {
            PathSegment::Line { start, .. }
            | PathSegment::QuadraticBezier { start, .. }
            | PathSegment::CubicBezier { start, .. }
            | PathSegment::EllipticalArc { start, .. } => *start,
        }
    }

    pub fn end(&self) -> Point2 {
        match self {
            PathSegment::Line { end, .. }
            | PathSegment::QuadraticBezier { end, .. }
            | PathSegment::CubicBezier { end, .. }
            | PathSegment::EllipticalArc { end, .. } => *end,
        }
    }

    /// Short name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            PathSegment::Line { .. } => "line",
            PathSegment::QuadraticBezier { .. } => "quadratic bezier",
            PathSegment::CubicBezier { .. } => "cubic bezier",
            PathSegment::EllipticalArc { .. } => "elliptical arc",
        }
    }
}

/// An ordered sequence of segments forming one outline (possibly several
/// sub-contours, e.g. a glyph with a counter).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VectorPath {
    pub segments: Vec<PathSegment>,
}

impl VectorPath {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// A path is closed when its last end point returns to its first start
    /// point within [`PATH_TOLERANCE`].
    pub fn is_closed(&self) -> bool {
        match (self.segments.first(), self.segments.last()) {
            (Some(first), Some(last)) => last.end().approx_eq(&first.start(), PATH_TOLERANCE),
            _ => false,
        }
    }

    /// Build a closed polygon path from a list of corner points.
    pub fn polygon(corners: &[Point2]) -> Self {
        let n = corners.len();
        let segments = (0..n)
            .map(|i| PathSegment::Line {
                start: corners[i],
                end: corners[(i + 1) % n],
            })
            .collect();
        Self { segments }
    }
}

impl FromIterator<PathSegment> for VectorPath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}
