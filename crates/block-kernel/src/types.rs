use serde::{Deserialize, Serialize};

pub use block_types::Point2;

/// Opaque handle to a solid in the geometry kernel.
/// NEVER persisted. Valid only for the current kernel session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KernelSolidHandle(pub(crate) u64);

impl KernelSolidHandle {
    pub(crate) fn id(&self) -> u64 {
        self.0
    }
}

/// Transient kernel-internal entity identifier (profile, face or edge).
/// Stable within a single kernel session only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KernelId(pub u64);

/// Errors from kernel operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KernelError {
    #[error("invalid profile: {reason}")]
    InvalidProfile { reason: String },

    #[error("extrude failed: {reason}")]
    ExtrudeFailed { reason: String },

    #[error("loft failed: {reason}")]
    LoftFailed { reason: String },

    #[error("boolean operation failed: {reason}")]
    BooleanFailed { reason: String },

    #[error("fillet failed: {reason}")]
    FilletFailed { reason: String },

    #[error("tessellation failed: {reason}")]
    TessellationFailed { reason: String },

    #[error("entity not found: {id:?}")]
    EntityNotFound { id: KernelId },

    #[error("operation not supported: {operation}")]
    NotSupported { operation: String },

    #[error("kernel error: {message}")]
    Other { message: String },
}

/// Coordinate axis used by face selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit(self) -> [f64; 3] {
        let mut v = [0.0; 3];
        v[self.index()] = 1.0;
        v
    }
}

/// Face selection query, evaluated by the kernel against a solid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FaceSelector {
    /// Faces whose centroid is lowest along the axis (`<Z`).
    Min(Axis),
    /// Faces whose centroid is highest along the axis (`>X`).
    Max(Axis),
    /// Planar faces perpendicular to `axis` lying on the plane `axis = offset`.
    OnPlane { axis: Axis, offset: f64 },
}

/// How a union treats coincident geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnionMode {
    /// Plain boolean union.
    Standard,
    /// Edge-merging union: coincident faces are fused instead of leaving seams.
    Glue,
}

/// A drawing plane: origin plus an orthonormal frame.
///
/// Local `(u, v)` coordinates map to `origin + u * x_dir + v * y_dir` where
/// `y_dir = normal × x_dir`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Workplane {
    pub origin: [f64; 3],
    pub normal: [f64; 3],
    pub x_dir: [f64; 3],
}

impl Workplane {
    /// The global XY plane, normal +Z.
    pub fn xy() -> Self {
        Self {
            origin: [0.0, 0.0, 0.0],
            normal: [0.0, 0.0, 1.0],
            x_dir: [1.0, 0.0, 0.0],
        }
    }

    pub fn new(origin: [f64; 3], normal: [f64; 3], x_dir: [f64; 3]) -> Self {
        Self {
            origin,
            normal: normalize(normal),
            x_dir: normalize(x_dir),
        }
    }

    /// The same plane moved `distance` along its normal.
    pub fn offset(&self, distance: f64) -> Self {
        Self {
            origin: add(self.origin, scale(self.normal, distance)),
            ..*self
        }
    }

    /// The same frame moved to a new origin.
    pub fn with_origin(&self, origin: [f64; 3]) -> Self {
        Self { origin, ..*self }
    }

    pub fn y_dir(&self) -> [f64; 3] {
        cross(self.normal, self.x_dir)
    }

    /// Map local plane coordinates to world coordinates.
    pub fn to_world(&self, p: Point2) -> [f64; 3] {
        let y_dir = self.y_dir();
        add(
            self.origin,
            add(scale(self.x_dir, p.x), scale(y_dir, p.y)),
        )
    }
}

/// One drawing instruction for a planar profile, in workplane coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProfileCommand {
    MoveTo { to: Point2 },
    LineTo { to: Point2 },
    QuadTo { control: Point2, to: Point2 },
    CubicTo { control1: Point2, control2: Point2, to: Point2 },
    /// Center-parameterized elliptical arc. Angles are in radians; the arc
    /// runs from `start_angle` to `end_angle` (negative sweep is clockwise).
    /// `rotation` is the ellipse x-axis rotation in radians.
    EllipseArc {
        center: Point2,
        radii: (f64, f64),
        rotation: f64,
        start_angle: f64,
        end_angle: f64,
    },
    /// Close the current sub-profile back to its first point.
    Close,
}

impl ProfileCommand {
    /// The pen position after this command, if it moves the pen.
    pub fn end_point(&self) -> Option<Point2> {
        match *self {
            ProfileCommand::MoveTo { to }
            | ProfileCommand::LineTo { to }
            | ProfileCommand::QuadTo { to, .. }
            | ProfileCommand::CubicTo { to, .. } => Some(to),
            ProfileCommand::EllipseArc {
                center,
                radii,
                rotation,
                end_angle,
                ..
            } => Some(ellipse_point(center, radii, rotation, end_angle)),
            ProfileCommand::Close => None,
        }
    }
}

/// Point on a rotated ellipse at parametric angle `t`.
pub fn ellipse_point(center: Point2, radii: (f64, f64), rotation: f64, t: f64) -> Point2 {
    let (sin_phi, cos_phi) = rotation.sin_cos();
    let (sin_t, cos_t) = t.sin_cos();
    let x = radii.0 * cos_t;
    let y = radii.1 * sin_t;
    Point2::new(
        center.x + cos_phi * x - sin_phi * y,
        center.y + sin_phi * x + cos_phi * y,
    )
}

/// Axis-aligned 3D bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb3 {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Aabb3 {
    pub fn from_points<'a, I: IntoIterator<Item = &'a [f64; 3]>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bbox = Aabb3 {
            min: first,
            max: first,
        };
        for p in iter {
            for i in 0..3 {
                bbox.min[i] = bbox.min[i].min(p[i]);
                bbox.max[i] = bbox.max[i].max(p[i]);
            }
        }
        Some(bbox)
    }

    pub fn union(&self, other: &Aabb3) -> Aabb3 {
        let mut out = *self;
        for i in 0..3 {
            out.min[i] = out.min[i].min(other.min[i]);
            out.max[i] = out.max[i].max(other.max[i]);
        }
        out
    }

    pub fn xlen(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn ylen(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    pub fn zlen(&self) -> f64 {
        self.max[2] - self.min[2]
    }

    pub fn len(&self, axis: Axis) -> f64 {
        self.max[axis.index()] - self.min[axis.index()]
    }

    pub fn center(&self) -> [f64; 3] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
            (self.min[2] + self.max[2]) / 2.0,
        ]
    }

    pub fn diagonal(&self) -> f64 {
        (self.xlen().powi(2) + self.ylen().powi(2) + self.zlen().powi(2)).sqrt()
    }

    /// Closed containment of a point, with tolerance.
    pub fn contains_point(&self, p: &[f64; 3], tol: f64) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] - tol && p[i] <= self.max[i] + tol)
    }

    /// Closed containment of another box, with tolerance.
    pub fn contains(&self, other: &Aabb3, tol: f64) -> bool {
        self.contains_point(&other.min, tol) && self.contains_point(&other.max, tol)
    }

    /// Volume of the overlap with another box (zero when they only touch).
    pub fn overlap_volume(&self, other: &Aabb3) -> f64 {
        (0..3)
            .map(|i| (self.max[i].min(other.max[i]) - self.min[i].max(other.min[i])).max(0.0))
            .product()
    }
}

/// Tessellated triangle mesh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderMesh {
    /// Flat array of vertex positions [x0, y0, z0, x1, y1, z1, ...].
    pub vertices: Vec<f32>,
    /// Flat array of vertex normals [nx0, ny0, nz0, nx1, ny1, nz1, ...].
    pub normals: Vec<f32>,
    /// Triangle indices into the vertex array.
    pub indices: Vec<u32>,
    /// Mapping from triangle ranges to logical faces.
    pub face_ranges: Vec<FaceRange>,
}

impl RenderMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex(&self, index: usize) -> [f32; 3] {
        [
            self.vertices[index * 3],
            self.vertices[index * 3 + 1],
            self.vertices[index * 3 + 2],
        ]
    }
}

/// Maps a contiguous range of triangles to a logical face.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceRange {
    /// The KernelId of the face this range belongs to.
    pub face_id: KernelId,
    /// Start index in the indices array (inclusive).
    pub start_index: u32,
    /// End index in the indices array (exclusive).
    pub end_index: u32,
}

pub(crate) fn add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub(crate) fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub(crate) fn scale(a: [f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

pub(crate) fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub(crate) fn normalize(a: [f64; 3]) -> [f64; 3] {
    let len = dot(a, a).sqrt();
    if len > 1e-12 {
        scale(a, 1.0 / len)
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workplane_frame_is_right_handed() {
        let wp = Workplane::new([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        assert_eq!(wp.y_dir(), [0.0, 0.0, 1.0]);
        assert_eq!(wp.to_world(Point2::new(2.0, 3.0)), [0.0, 2.0, 3.0]);
    }

    #[test]
    fn workplane_offset_moves_along_normal() {
        let wp = Workplane::xy().offset(0.5);
        assert_eq!(wp.origin, [0.0, 0.0, 0.5]);
    }

    #[test]
    fn aabb_overlap_volume_zero_when_touching() {
        let a = Aabb3 {
            min: [0.0, 0.0, 0.0],
            max: [1.0, 1.0, 1.0],
        };
        let b = Aabb3 {
            min: [1.0, 0.0, 0.0],
            max: [2.0, 1.0, 1.0],
        };
        assert_eq!(a.overlap_volume(&b), 0.0);
        assert!(a.union(&b).contains(&b, 0.0));
    }

    #[test]
    fn arc_end_point_follows_angle() {
        let cmd = ProfileCommand::EllipseArc {
            center: Point2::new(1.0, 1.0),
            radii: (2.0, 2.0),
            rotation: 0.0,
            start_angle: 0.0,
            end_angle: std::f64::consts::FRAC_PI_2,
        };
        let end = cmd.end_point().unwrap();
        assert!((end.x - 1.0).abs() < 1e-12);
        assert!((end.y - 3.0).abs() < 1e-12);
    }
}
