//! MockKernel: deterministic test double implementing Kernel + KernelIntrospect.
//!
//! A solid is an axis-aligned envelope plus a list of planar polygon faces.
//! Profiles are approximated by the rectangle bounding their drawing, so every
//! extrusion is a box and every loft a frustum. Booleans combine face lists
//! and envelopes without computing true intersections, which is enough to
//! drive the block pipeline's selectors and measurements deterministically.

use crate::traits::{Kernel, KernelIntrospect};
use crate::types::*;
use std::collections::HashMap;

/// Samples per curved command when measuring a profile.
const CURVE_SAMPLES: usize = 16;

/// Kernel operations that can be observed or made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    MakeProfile,
    Extrude,
    Loft,
    Union,
    Subtract,
    Fillet,
    Tessellate,
}

impl MockOp {
    fn injected_error(self) -> KernelError {
        let reason = "injected failure".to_string();
        match self {
            MockOp::MakeProfile => KernelError::InvalidProfile { reason },
            MockOp::Extrude => KernelError::ExtrudeFailed { reason },
            MockOp::Loft => KernelError::LoftFailed { reason },
            MockOp::Union | MockOp::Subtract => KernelError::BooleanFailed { reason },
            MockOp::Fillet => KernelError::FilletFailed { reason },
            MockOp::Tessellate => KernelError::TessellationFailed { reason },
        }
    }
}

/// A planar polygon face.
#[derive(Debug, Clone)]
struct MockFace {
    id: KernelId,
    edges: Vec<KernelId>,
    normal: [f64; 3],
    corners: Vec<[f64; 3]>,
}

impl MockFace {
    fn centroid(&self) -> [f64; 3] {
        let n = self.corners.len().max(1) as f64;
        let sum = self
            .corners
            .iter()
            .fold([0.0; 3], |acc, c| add(acc, *c));
        scale(sum, 1.0 / n)
    }

    fn bounds(&self) -> Option<Aabb3> {
        Aabb3::from_points(self.corners.iter())
    }

    fn inside(&self, envelope: &Aabb3, tol: f64) -> bool {
        self.corners.iter().all(|c| envelope.contains_point(c, tol))
    }
}

#[derive(Debug, Clone)]
struct MockSolid {
    envelope: Aabb3,
    faces: Vec<MockFace>,
}

/// A measured profile: the rectangle bounding its drawing in plane coordinates.
#[derive(Debug, Clone)]
struct MockProfile {
    plane: Workplane,
    min: Point2,
    max: Point2,
}

impl MockProfile {
    fn world_corners(&self) -> [[f64; 3]; 4] {
        [
            self.plane.to_world(Point2::new(self.min.x, self.min.y)),
            self.plane.to_world(Point2::new(self.max.x, self.min.y)),
            self.plane.to_world(Point2::new(self.max.x, self.max.y)),
            self.plane.to_world(Point2::new(self.min.x, self.max.y)),
        ]
    }
}

/// Deterministic test double for the geometry kernel.
/// Implements both Kernel and KernelIntrospect.
pub struct MockKernel {
    next_id: u64,
    next_handle: u64,
    solids: HashMap<u64, MockSolid>,
    profiles: HashMap<u64, MockProfile>,
    calls: Vec<MockOp>,
    union_modes: Vec<UnionMode>,
    call_counts: HashMap<MockOp, usize>,
    failures: HashMap<MockOp, usize>,
}

impl MockKernel {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            next_handle: 1,
            solids: HashMap::new(),
            profiles: HashMap::new(),
            calls: Vec::new(),
            union_modes: Vec::new(),
            call_counts: HashMap::new(),
            failures: HashMap::new(),
        }
    }

    /// Make the `nth` (1-based) call of `op` fail.
    pub fn fail_on(&mut self, op: MockOp, nth: usize) {
        self.failures.insert(op, nth);
    }

    /// Every operation issued so far, in order.
    pub fn calls(&self) -> &[MockOp] {
        &self.calls
    }

    /// Number of times `op` has been issued.
    pub fn call_count(&self, op: MockOp) -> usize {
        self.call_counts.get(&op).copied().unwrap_or(0)
    }

    /// Union modes requested, in order.
    pub fn union_modes(&self) -> &[UnionMode] {
        &self.union_modes
    }

    /// Number of solids not yet released.
    pub fn live_solids(&self) -> usize {
        self.solids.len()
    }

    pub fn face_count(&self, solid: &KernelSolidHandle) -> usize {
        self.solids
            .get(&solid.id())
            .map(|s| s.faces.len())
            .unwrap_or(0)
    }

    fn record(&mut self, op: MockOp) -> Result<(), KernelError> {
        self.calls.push(op);
        let count = self.call_counts.entry(op).or_insert(0);
        *count += 1;
        if self.failures.get(&op) == Some(count) {
            return Err(op.injected_error());
        }
        Ok(())
    }

    fn alloc_id(&mut self) -> KernelId {
        let id = KernelId(self.next_id);
        self.next_id += 1;
        id
    }

    fn alloc_handle(&mut self) -> KernelSolidHandle {
        let h = KernelSolidHandle(self.next_handle);
        self.next_handle += 1;
        h
    }

    fn solid(&self, handle: &KernelSolidHandle) -> Result<&MockSolid, KernelError> {
        self.solids
            .get(&handle.id())
            .ok_or(KernelError::EntityNotFound {
                id: KernelId(handle.id()),
            })
    }

    fn take_profile(&mut self, id: KernelId) -> Result<MockProfile, KernelError> {
        self.profiles
            .remove(&id.0)
            .ok_or(KernelError::EntityNotFound { id })
    }

    fn insert_solid(&mut self, solid: MockSolid) -> KernelSolidHandle {
        let handle = self.alloc_handle();
        self.solids.insert(handle.id(), solid);
        handle
    }

    /// Planar face with fresh ids and an edge per polygon side.
    fn make_face(&mut self, corners: Vec<[f64; 3]>, normal: [f64; 3]) -> MockFace {
        let id = self.alloc_id();
        let edges = (0..corners.len()).map(|_| self.alloc_id()).collect();
        MockFace {
            id,
            edges,
            normal,
            corners,
        }
    }

    /// Copy a face under fresh ids, optionally flipping it.
    fn reissue_face(&mut self, face: &MockFace, invert: bool) -> MockFace {
        let mut corners = face.corners.clone();
        let mut normal = face.normal;
        if invert {
            corners.reverse();
            normal = scale(normal, -1.0);
        }
        self.make_face(corners, normal)
    }

    /// Six-faced solid between two corresponding quads, faces oriented outward.
    fn make_prism(&mut self, bottom: [[f64; 3]; 4], top: [[f64; 3]; 4]) -> MockSolid {
        let all: Vec<[f64; 3]> = bottom.iter().chain(top.iter()).copied().collect();
        let center = scale(all.iter().fold([0.0; 3], |acc, p| add(acc, *p)), 1.0 / 8.0);

        let mut quads: Vec<Vec<[f64; 3]>> = vec![bottom.to_vec(), top.to_vec()];
        for i in 0..4 {
            let j = (i + 1) % 4;
            quads.push(vec![bottom[i], bottom[j], top[j], top[i]]);
        }

        let faces = quads
            .into_iter()
            .map(|mut corners| {
                let mut normal = newell_normal(&corners);
                let centroid = scale(
                    corners.iter().fold([0.0; 3], |acc, p| add(acc, *p)),
                    1.0 / corners.len() as f64,
                );
                if dot(normal, sub(centroid, center)) < 0.0 {
                    normal = scale(normal, -1.0);
                    corners.reverse();
                }
                self.make_face(corners, normal)
            })
            .collect();

        let envelope = Aabb3::from_points(all.iter()).unwrap_or(Aabb3 {
            min: center,
            max: center,
        });
        MockSolid { envelope, faces }
    }

    fn find_face(&self, face: KernelId) -> Option<&MockFace> {
        self.solids
            .values()
            .flat_map(|s| s.faces.iter())
            .find(|f| f.id == face)
    }

    /// Generate a fan-triangulated mesh: one fan per planar face.
    fn tessellate_faces(solid: &MockSolid) -> RenderMesh {
        let mut vertices = Vec::new();
        let mut normals = Vec::new();
        let mut indices = Vec::new();
        let mut face_ranges = Vec::new();

        for face in &solid.faces {
            if face.corners.len() < 3 {
                continue;
            }
            let start_index = indices.len() as u32;
            let base_vertex = (vertices.len() / 3) as u32;
            let n = face.normal;

            for corner in &face.corners {
                vertices.extend_from_slice(&[corner[0] as f32, corner[1] as f32, corner[2] as f32]);
                normals.extend_from_slice(&[n[0] as f32, n[1] as f32, n[2] as f32]);
            }
            for k in 1..(face.corners.len() as u32 - 1) {
                indices.extend_from_slice(&[base_vertex, base_vertex + k, base_vertex + k + 1]);
            }

            face_ranges.push(FaceRange {
                face_id: face.id,
                start_index,
                end_index: indices.len() as u32,
            });
        }

        RenderMesh {
            vertices,
            normals,
            indices,
            face_ranges,
        }
    }
}

impl Default for MockKernel {
    fn default() -> Self {
        Self::new()
    }
}

/// Selection tolerance, relative to the solid's size.
fn selection_tolerance(envelope: &Aabb3) -> f64 {
    1e-6 * envelope.diagonal().max(1.0)
}

/// Polygon normal by Newell's method.
fn newell_normal(corners: &[[f64; 3]]) -> [f64; 3] {
    let mut n = [0.0; 3];
    for (i, a) in corners.iter().enumerate() {
        let b = corners[(i + 1) % corners.len()];
        n[0] += (a[1] - b[1]) * (a[2] + b[2]);
        n[1] += (a[2] - b[2]) * (a[0] + b[0]);
        n[2] += (a[0] - b[0]) * (a[1] + b[1]);
    }
    normalize(n)
}

fn quad_point(p0: Point2, p1: Point2, p2: Point2, t: f64) -> Point2 {
    let mt = 1.0 - t;
    Point2::new(
        mt * mt * p0.x + 2.0 * mt * t * p1.x + t * t * p2.x,
        mt * mt * p0.y + 2.0 * mt * t * p1.y + t * t * p2.y,
    )
}

fn cubic_point(p0: Point2, p1: Point2, p2: Point2, p3: Point2, t: f64) -> Point2 {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    Point2::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

fn invalid(reason: &str) -> KernelError {
    KernelError::InvalidProfile {
        reason: reason.to_string(),
    }
}

impl Kernel for MockKernel {
    fn make_profile(
        &mut self,
        plane: &Workplane,
        commands: &[ProfileCommand],
    ) -> Result<KernelId, KernelError> {
        self.record(MockOp::MakeProfile)?;

        let mut pen: Option<Point2> = None;
        let mut loop_start: Option<Point2> = None;
        let mut points: Vec<Point2> = Vec::new();
        let mut edges = 0usize;
        let mut closed_loops = 0usize;

        for command in commands {
            let current = match command {
                ProfileCommand::MoveTo { .. } | ProfileCommand::Close => pen,
                _ => Some(pen.ok_or_else(|| invalid("drawing command before move-to"))?),
            };
            match *command {
                ProfileCommand::MoveTo { to } => {
                    pen = Some(to);
                    loop_start = Some(to);
                    points.push(to);
                }
                ProfileCommand::LineTo { to } => {
                    points.push(to);
                    pen = Some(to);
                    edges += 1;
                }
                ProfileCommand::QuadTo { control, to } => {
                    let from = current.unwrap_or(to);
                    points.extend(
                        (1..=CURVE_SAMPLES)
                            .map(|i| quad_point(from, control, to, i as f64 / CURVE_SAMPLES as f64)),
                    );
                    pen = Some(to);
                    edges += 1;
                }
                ProfileCommand::CubicTo {
                    control1,
                    control2,
                    to,
                } => {
                    let from = current.unwrap_or(to);
                    points.extend((1..=CURVE_SAMPLES).map(|i| {
                        cubic_point(from, control1, control2, to, i as f64 / CURVE_SAMPLES as f64)
                    }));
                    pen = Some(to);
                    edges += 1;
                }
                ProfileCommand::EllipseArc {
                    center,
                    radii,
                    rotation,
                    start_angle,
                    end_angle,
                } => {
                    if !(radii.0 > 0.0 && radii.1 > 0.0) {
                        return Err(invalid("arc radii must be positive"));
                    }
                    points.extend((0..=CURVE_SAMPLES).map(|i| {
                        let t = start_angle
                            + (end_angle - start_angle) * i as f64 / CURVE_SAMPLES as f64;
                        ellipse_point(center, radii, rotation, t)
                    }));
                    pen = command.end_point();
                    edges += 1;
                }
                ProfileCommand::Close => {
                    if loop_start.take().is_some() {
                        closed_loops += 1;
                        pen = None;
                    }
                }
            }
        }

        if points.iter().any(|p| !p.is_finite()) {
            return Err(invalid("non-finite coordinate"));
        }
        if edges == 0 {
            return Err(invalid("profile has no edges"));
        }
        if closed_loops == 0 {
            return Err(invalid("profile has no closed loop"));
        }

        let mut min = points[0];
        let mut max = points[0];
        for p in &points[1..] {
            min = Point2::new(min.x.min(p.x), min.y.min(p.y));
            max = Point2::new(max.x.max(p.x), max.y.max(p.y));
        }
        if max.x - min.x < 1e-12 || max.y - min.y < 1e-12 {
            return Err(invalid("profile encloses no area"));
        }

        let id = self.alloc_id();
        self.profiles.insert(
            id.0,
            MockProfile {
                plane: *plane,
                min,
                max,
            },
        );
        Ok(id)
    }

    fn extrude_profile(
        &mut self,
        profile: KernelId,
        distance: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.record(MockOp::Extrude)?;
        let profile = self.take_profile(profile)?;
        if !distance.is_finite() || distance.abs() < 1e-12 {
            return Err(KernelError::ExtrudeFailed {
                reason: format!("invalid extrude distance {distance}"),
            });
        }

        let bottom = profile.world_corners();
        let offset = scale(profile.plane.normal, distance);
        let top = bottom.map(|c| add(c, offset));
        let solid = self.make_prism(bottom, top);
        Ok(self.insert_solid(solid))
    }

    fn loft_profiles(
        &mut self,
        base: KernelId,
        top: KernelId,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.record(MockOp::Loft)?;
        let base = self.take_profile(base)?;
        let top = self.take_profile(top)?;

        if dot(base.plane.normal, top.plane.normal).abs() < 1.0 - 1e-9 {
            return Err(KernelError::LoftFailed {
                reason: "profiles are not on parallel planes".to_string(),
            });
        }
        let separation = dot(sub(top.plane.origin, base.plane.origin), base.plane.normal);
        if separation.abs() < 1e-12 {
            return Err(KernelError::LoftFailed {
                reason: "profiles are coplanar".to_string(),
            });
        }

        let solid = self.make_prism(base.world_corners(), top.world_corners());
        Ok(self.insert_solid(solid))
    }

    fn boolean_union(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
        mode: UnionMode,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.record(MockOp::Union)?;
        self.union_modes.push(mode);
        let sa = self.solid(a)?.clone();
        let sb = self.solid(b)?.clone();

        let tol = selection_tolerance(&sa.envelope.union(&sb.envelope));
        let mut kept: Vec<MockFace> = sa
            .faces
            .iter()
            .filter(|f| !f.inside(&sb.envelope, tol))
            .chain(sb.faces.iter().filter(|f| !f.inside(&sa.envelope, tol)))
            .cloned()
            .collect();
        if kept.is_empty() {
            kept = sa.faces.clone();
        }

        let faces = kept.iter().map(|f| self.reissue_face(f, false)).collect();
        let solid = MockSolid {
            envelope: sa.envelope.union(&sb.envelope),
            faces,
        };
        Ok(self.insert_solid(solid))
    }

    fn boolean_subtract(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.record(MockOp::Subtract)?;
        let target = self.solid(a)?.clone();
        let tool = self.solid(b)?.clone();

        if target.envelope.overlap_volume(&tool.envelope) <= 0.0 {
            return Err(KernelError::BooleanFailed {
                reason: "tool does not intersect the solid".to_string(),
            });
        }
        if tool.envelope.contains(&target.envelope, 0.0) {
            return Err(KernelError::BooleanFailed {
                reason: "cut removes the entire solid".to_string(),
            });
        }

        let tol = selection_tolerance(&target.envelope);
        let mut faces: Vec<MockFace> = Vec::new();
        for face in target.faces.iter().filter(|f| !f.inside(&tool.envelope, 0.0)) {
            faces.push(self.reissue_face(face, false));
        }
        for face in tool
            .faces
            .iter()
            .filter(|f| target.envelope.contains_point(&f.centroid(), tol))
        {
            faces.push(self.reissue_face(face, true));
        }

        let solid = MockSolid {
            envelope: target.envelope,
            faces,
        };
        Ok(self.insert_solid(solid))
    }

    fn fillet_edges(
        &mut self,
        solid: &KernelSolidHandle,
        edges: &[KernelId],
        radius: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        self.record(MockOp::Fillet)?;
        if !radius.is_finite() || radius <= 0.0 {
            return Err(KernelError::FilletFailed {
                reason: format!("invalid fillet radius {radius}"),
            });
        }
        if edges.is_empty() {
            return Err(KernelError::FilletFailed {
                reason: "no edges selected".to_string(),
            });
        }

        let s = self.solid(solid)?.clone();
        for edge in edges {
            if !s.faces.iter().any(|f| f.edges.contains(edge)) {
                return Err(KernelError::EntityNotFound { id: *edge });
            }
        }
        let smallest = s
            .envelope
            .xlen()
            .min(s.envelope.ylen())
            .min(s.envelope.zlen());
        if 2.0 * radius >= smallest {
            return Err(KernelError::FilletFailed {
                reason: format!("radius {radius} too large for solid of thickness {smallest}"),
            });
        }

        let faces = s.faces.iter().map(|f| self.reissue_face(f, false)).collect();
        let rounded = MockSolid {
            envelope: s.envelope,
            faces,
        };
        Ok(self.insert_solid(rounded))
    }

    fn tessellate(
        &mut self,
        solid: &KernelSolidHandle,
        tolerance: f64,
    ) -> Result<RenderMesh, KernelError> {
        self.record(MockOp::Tessellate)?;
        if !(tolerance > 0.0) {
            return Err(KernelError::TessellationFailed {
                reason: format!("invalid tolerance {tolerance}"),
            });
        }
        let s = self.solid(solid)?;
        Ok(Self::tessellate_faces(s))
    }

    fn release(&mut self, solid: KernelSolidHandle) {
        self.solids.remove(&solid.id());
    }
}

impl KernelIntrospect for MockKernel {
    fn bounding_box(&self, solid: &KernelSolidHandle) -> Option<Aabb3> {
        self.solids.get(&solid.id()).map(|s| s.envelope)
    }

    fn select_faces(&self, solid: &KernelSolidHandle, selector: FaceSelector) -> Vec<KernelId> {
        let Some(s) = self.solids.get(&solid.id()) else {
            return Vec::new();
        };
        let tol = selection_tolerance(&s.envelope);

        match selector {
            FaceSelector::Min(axis) | FaceSelector::Max(axis) => {
                let i = axis.index();
                let want_max = matches!(selector, FaceSelector::Max(_));
                let centers: Vec<f64> = s.faces.iter().map(|f| f.centroid()[i]).collect();
                let extreme = centers.iter().copied().fold(None, |acc: Option<f64>, c| {
                    Some(match acc {
                        None => c,
                        Some(e) if want_max => e.max(c),
                        Some(e) => e.min(c),
                    })
                });
                let Some(extreme) = extreme else {
                    return Vec::new();
                };
                s.faces
                    .iter()
                    .zip(centers)
                    .filter(|(_, c)| (c - extreme).abs() <= tol)
                    .map(|(f, _)| f.id)
                    .collect()
            }
            FaceSelector::OnPlane { axis, offset } => {
                let i = axis.index();
                s.faces
                    .iter()
                    .filter(|f| f.normal[i].abs() > 1.0 - 1e-9)
                    .filter(|f| f.corners.iter().all(|c| (c[i] - offset).abs() <= tol))
                    .map(|f| f.id)
                    .collect()
            }
        }
    }

    fn face_bounding_box(&self, face: KernelId) -> Option<Aabb3> {
        self.find_face(face).and_then(|f| f.bounds())
    }

    fn face_edges(&self, face: KernelId) -> Vec<KernelId> {
        self.find_face(face)
            .map(|f| f.edges.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<ProfileCommand> {
        vec![
            ProfileCommand::MoveTo {
                to: Point2::new(x0, y0),
            },
            ProfileCommand::LineTo {
                to: Point2::new(x1, y0),
            },
            ProfileCommand::LineTo {
                to: Point2::new(x1, y1),
            },
            ProfileCommand::LineTo {
                to: Point2::new(x0, y1),
            },
            ProfileCommand::Close,
        ]
    }

    fn make_box(
        kernel: &mut MockKernel,
        plane: &Workplane,
        corners: (f64, f64, f64, f64),
        distance: f64,
    ) -> KernelSolidHandle {
        let profile = kernel
            .make_profile(plane, &rect(corners.0, corners.1, corners.2, corners.3))
            .unwrap();
        kernel.extrude_profile(profile, distance).unwrap()
    }

    #[test]
    fn test_extrude_rectangle_produces_box() {
        let mut kernel = MockKernel::new();
        let solid = make_box(&mut kernel, &Workplane::xy(), (0.0, 0.0, 2.0, 3.0), 5.0);

        assert_eq!(kernel.face_count(&solid), 6);
        let bbox = kernel.bounding_box(&solid).unwrap();
        assert_eq!(bbox.min, [0.0, 0.0, 0.0]);
        assert_eq!(bbox.max, [2.0, 3.0, 5.0]);
    }

    #[test]
    fn test_negative_extrude_goes_against_normal() {
        let mut kernel = MockKernel::new();
        let solid = make_box(&mut kernel, &Workplane::xy(), (0.0, 0.0, 1.0, 1.0), -4.0);
        let bbox = kernel.bounding_box(&solid).unwrap();
        assert_eq!(bbox.min[2], -4.0);
        assert_eq!(bbox.max[2], 0.0);
    }

    #[test]
    fn test_box_faces_point_outward() {
        let mut kernel = MockKernel::new();
        let solid = make_box(&mut kernel, &Workplane::xy(), (0.0, 0.0, 1.0, 1.0), 1.0);
        let bottom = kernel.select_faces(&solid, FaceSelector::Min(Axis::Z));
        assert_eq!(bottom.len(), 1);
        let face = kernel.find_face(bottom[0]).unwrap();
        assert_eq!(face.normal, [0.0, 0.0, -1.0]);
    }

    #[test]
    fn test_open_profile_is_rejected() {
        let mut kernel = MockKernel::new();
        let mut commands = rect(0.0, 0.0, 1.0, 1.0);
        commands.pop();
        let err = kernel.make_profile(&Workplane::xy(), &commands).unwrap_err();
        assert!(matches!(err, KernelError::InvalidProfile { .. }));
    }

    #[test]
    fn test_line_before_move_is_rejected() {
        let mut kernel = MockKernel::new();
        let commands = [ProfileCommand::LineTo {
            to: Point2::new(1.0, 1.0),
        }];
        assert!(kernel.make_profile(&Workplane::xy(), &commands).is_err());
    }

    #[test]
    fn test_profile_is_consumed_by_extrude() {
        let mut kernel = MockKernel::new();
        let profile = kernel
            .make_profile(&Workplane::xy(), &rect(0.0, 0.0, 1.0, 1.0))
            .unwrap();
        kernel.extrude_profile(profile, 1.0).unwrap();
        let err = kernel.extrude_profile(profile, 1.0).unwrap_err();
        assert!(matches!(err, KernelError::EntityNotFound { .. }));
    }

    #[test]
    fn test_union_culls_enclosed_faces() {
        let mut kernel = MockKernel::new();
        let big = make_box(&mut kernel, &Workplane::xy(), (0.0, 0.0, 10.0, 10.0), 10.0);
        let small = make_box(&mut kernel, &Workplane::xy(), (2.0, 2.0, 4.0, 4.0), 2.0);

        let merged = kernel
            .boolean_union(&big, &small, UnionMode::Glue)
            .unwrap();
        assert_eq!(kernel.face_count(&merged), 6);
        assert_eq!(kernel.union_modes(), &[UnionMode::Glue]);
    }

    #[test]
    fn test_union_widens_envelope() {
        let mut kernel = MockKernel::new();
        let a = make_box(&mut kernel, &Workplane::xy(), (0.0, 0.0, 1.0, 1.0), 1.0);
        let b = make_box(&mut kernel, &Workplane::xy(), (5.0, 0.0, 6.0, 1.0), 1.0);
        let merged = kernel.boolean_union(&a, &b, UnionMode::Standard).unwrap();
        assert_eq!(kernel.face_count(&merged), 12);
        assert_eq!(kernel.bounding_box(&merged).unwrap().max[0], 6.0);
    }

    #[test]
    fn test_subtract_disjoint_tool_fails() {
        let mut kernel = MockKernel::new();
        let a = make_box(&mut kernel, &Workplane::xy(), (0.0, 0.0, 1.0, 1.0), 1.0);
        let b = make_box(&mut kernel, &Workplane::xy(), (3.0, 3.0, 4.0, 4.0), 1.0);
        let err = kernel.boolean_subtract(&a, &b).unwrap_err();
        assert!(matches!(err, KernelError::BooleanFailed { .. }));
    }

    #[test]
    fn test_subtract_adds_cavity_ceiling() {
        let mut kernel = MockKernel::new();
        let body = make_box(&mut kernel, &Workplane::xy(), (0.0, 0.0, 10.0, 10.0), 10.0);
        let tool = make_box(&mut kernel, &Workplane::xy().offset(-1.0), (2.0, 2.0, 8.0, 8.0), 5.0);

        let cut = kernel.boolean_subtract(&body, &tool).unwrap();
        let ceiling = kernel.select_faces(
            &cut,
            FaceSelector::OnPlane {
                axis: Axis::Z,
                offset: 4.0,
            },
        );
        assert_eq!(ceiling.len(), 1);
        let bbox = kernel.face_bounding_box(ceiling[0]).unwrap();
        assert_eq!(bbox.xlen(), 6.0);
        assert_eq!(bbox.ylen(), 6.0);
        assert_eq!(kernel.bounding_box(&cut).unwrap().max, [10.0, 10.0, 10.0]);
    }

    #[test]
    fn test_loft_builds_frustum() {
        let mut kernel = MockKernel::new();
        let base = kernel
            .make_profile(&Workplane::xy(), &rect(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        let top = kernel
            .make_profile(&Workplane::xy().offset(3.0), &rect(4.95, 4.95, 5.05, 5.05))
            .unwrap();
        let solid = kernel.loft_profiles(base, top).unwrap();
        let bbox = kernel.bounding_box(&solid).unwrap();
        assert_eq!(bbox.zlen(), 3.0);
        assert_eq!(bbox.xlen(), 10.0);
        assert_eq!(kernel.face_count(&solid), 6);
    }

    #[test]
    fn test_loft_coplanar_profiles_fails() {
        let mut kernel = MockKernel::new();
        let base = kernel
            .make_profile(&Workplane::xy(), &rect(0.0, 0.0, 1.0, 1.0))
            .unwrap();
        let top = kernel
            .make_profile(&Workplane::xy(), &rect(0.2, 0.2, 0.8, 0.8))
            .unwrap();
        assert!(kernel.loft_profiles(base, top).is_err());
    }

    #[test]
    fn test_fillet_radius_too_large() {
        let mut kernel = MockKernel::new();
        let solid = make_box(&mut kernel, &Workplane::xy(), (0.0, 0.0, 10.0, 10.0), 1.0);
        let face = kernel.select_faces(&solid, FaceSelector::Max(Axis::Z))[0];
        let edges = kernel.face_edges(face);
        assert_eq!(edges.len(), 4);

        assert!(kernel.fillet_edges(&solid, &edges, 0.2).is_ok());
        let err = kernel.fillet_edges(&solid, &edges, 0.5).unwrap_err();
        assert!(matches!(err, KernelError::FilletFailed { .. }));
    }

    #[test]
    fn test_fillet_unknown_edge() {
        let mut kernel = MockKernel::new();
        let solid = make_box(&mut kernel, &Workplane::xy(), (0.0, 0.0, 10.0, 10.0), 10.0);
        let err = kernel
            .fillet_edges(&solid, &[KernelId(9999)], 1.0)
            .unwrap_err();
        assert!(matches!(err, KernelError::EntityNotFound { .. }));
    }

    #[test]
    fn test_tessellate_fans_quads() {
        let mut kernel = MockKernel::new();
        let solid = make_box(&mut kernel, &Workplane::xy(), (0.0, 0.0, 1.0, 1.0), 1.0);
        let mesh = kernel.tessellate(&solid, 0.01).unwrap();

        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.face_ranges.len(), 6);
        assert_eq!(mesh.normals.len(), mesh.vertices.len());
    }

    #[test]
    fn test_injected_failure_fires_on_nth_call() {
        let mut kernel = MockKernel::new();
        kernel.fail_on(MockOp::Extrude, 2);

        make_box(&mut kernel, &Workplane::xy(), (0.0, 0.0, 1.0, 1.0), 1.0);
        let profile = kernel
            .make_profile(&Workplane::xy(), &rect(0.0, 0.0, 1.0, 1.0))
            .unwrap();
        let err = kernel.extrude_profile(profile, 1.0).unwrap_err();
        assert!(matches!(err, KernelError::ExtrudeFailed { .. }));
        assert_eq!(kernel.call_count(MockOp::Extrude), 2);
    }

    #[test]
    fn test_release_drops_solid() {
        let mut kernel = MockKernel::new();
        let solid = make_box(&mut kernel, &Workplane::xy(), (0.0, 0.0, 1.0, 1.0), 1.0);
        assert_eq!(kernel.live_solids(), 1);
        kernel.release(solid);
        assert_eq!(kernel.live_solids(), 0);
    }

    #[test]
    fn test_deterministic_ids() {
        let build = || {
            let mut kernel = MockKernel::new();
            let solid = make_box(&mut kernel, &Workplane::xy(), (0.0, 0.0, 1.0, 1.0), 1.0);
            kernel.select_faces(&solid, FaceSelector::Max(Axis::X))
        };
        assert_eq!(build(), build());
    }
}
