//! TruckKernel: real geometry kernel wrapping truck's API.
//!
//! Face and edge ids are synthetic: `handle * ID_STRIDE + index` for faces and
//! `handle * ID_STRIDE + EDGE_OFFSET + index` for edges, indices following
//! truck's shell iteration order. They stay valid as long as the solid does.

use crate::tessellation;
use crate::traits::{Kernel, KernelIntrospect};
use crate::types::*;
use block_types::PATH_TOLERANCE;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use truck_modeling::builder;
use truck_modeling::geometry::Surface;
use truck_modeling::topology::{Edge, Face, Shell, Solid, Vertex, Wire};
use truck_modeling::{BoundedCurve, InnerSpace, ParameterDivision1D, Point3, Vector3};

/// Tolerance handed to truck's boolean operations.
const BOOLEAN_TOLERANCE: f64 = 0.05;
/// Chord tolerance used when sampling edges for bounds.
const SAMPLE_TOLERANCE: f64 = 0.01;
const ID_STRIDE: u64 = 1_000_000;
const EDGE_OFFSET: u64 = 500_000;

/// One drawn piece of a loop, before vertices are shared.
#[derive(Debug, Clone)]
enum LoopPiece {
    Line,
    Bezier(Vec<Point2>),
}

/// A closed loop in plane coordinates: `starts[i]` begins `pieces[i]`, which
/// ends at `starts[(i + 1) % n]`.
#[derive(Debug, Clone, Default)]
struct PlanarLoop {
    starts: Vec<Point2>,
    pieces: Vec<LoopPiece>,
}

impl PlanarLoop {
    /// Control polygon, used for orientation and nesting tests.
    fn hull_polygon(&self) -> Vec<Point2> {
        let mut out = Vec::new();
        for (start, piece) in self.starts.iter().zip(&self.pieces) {
            out.push(*start);
            if let LoopPiece::Bezier(ctrl) = piece {
                out.extend(ctrl.iter().copied());
            }
        }
        out
    }

    fn signed_area(&self) -> f64 {
        let poly = self.hull_polygon();
        let n = poly.len();
        (0..n)
            .map(|i| {
                let (a, b) = (poly[i], poly[(i + 1) % n]);
                a.x * b.y - b.x * a.y
            })
            .sum::<f64>()
            / 2.0
    }
}

/// A profile waiting to be extruded or lofted: planar faces plus the
/// frame they were drawn on.
struct TruckProfile {
    plane: Workplane,
    faces: Vec<Face>,
    corners: Option<[Point2; 4]>,
}

/// Real geometry kernel backed by the truck BREP library.
pub struct TruckKernel {
    next_handle: u64,
    next_id: u64,
    solids: HashMap<u64, Solid>,
    profiles: HashMap<u64, TruckProfile>,
}

impl TruckKernel {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            next_id: 1,
            solids: HashMap::new(),
            profiles: HashMap::new(),
        }
    }

    fn alloc_handle(&mut self) -> KernelSolidHandle {
        let h = KernelSolidHandle(self.next_handle);
        self.next_handle += 1;
        h
    }

    fn alloc_id(&mut self) -> KernelId {
        let id = KernelId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn store_solid(&mut self, solid: Solid) -> KernelSolidHandle {
        let handle = self.alloc_handle();
        self.solids.insert(handle.id(), solid);
        handle
    }

    pub(crate) fn get_solid(&self, handle: &KernelSolidHandle) -> Option<&Solid> {
        self.solids.get(&handle.id())
    }

    fn cloned_solid(&self, handle: &KernelSolidHandle) -> Result<Solid, KernelError> {
        self.get_solid(handle)
            .cloned()
            .ok_or(KernelError::EntityNotFound {
                id: KernelId(handle.id()),
            })
    }

    fn take_profile(&mut self, id: KernelId) -> Result<TruckProfile, KernelError> {
        self.profiles
            .remove(&id.0)
            .ok_or(KernelError::EntityNotFound { id })
    }

    /// Locate a face by synthetic id.
    fn face_by_id(&self, face: KernelId) -> Option<(u64, usize, Face, &Shell)> {
        let handle_id = face.0 / ID_STRIDE;
        let index = (face.0 % ID_STRIDE) as usize;
        if index as u64 >= EDGE_OFFSET {
            return None;
        }
        let solid = self.solids.get(&handle_id)?;
        let mut offset = 0;
        for shell in solid.boundaries() {
            let faces: Vec<Face> = shell.face_iter().cloned().collect();
            if index < offset + faces.len() {
                return Some((handle_id, index, faces[index - offset].clone(), shell));
            }
            offset += faces.len();
        }
        None
    }
}

impl Default for TruckKernel {
    fn default() -> Self {
        Self::new()
    }
}

fn point3(p: [f64; 3]) -> Point3 {
    Point3::new(p[0], p[1], p[2])
}

fn vector3(v: [f64; 3]) -> Vector3 {
    Vector3::new(v[0], v[1], v[2])
}

fn invalid(reason: impl Into<String>) -> KernelError {
    KernelError::InvalidProfile {
        reason: reason.into(),
    }
}

/// Split an elliptical arc into cubic pieces of at most a quarter turn.
fn arc_to_cubics(
    center: Point2,
    radii: (f64, f64),
    rotation: f64,
    start_angle: f64,
    end_angle: f64,
) -> Vec<[Point2; 3]> {
    let sweep = end_angle - start_angle;
    let pieces = ((sweep.abs() / std::f64::consts::FRAC_PI_2).ceil() as usize).max(1);
    let step = sweep / pieces as f64;
    let k = 4.0 / 3.0 * (step / 4.0).tan();
    let (sin_phi, cos_phi) = rotation.sin_cos();
    let derivative = |t: f64| {
        let dx = -radii.0 * t.sin();
        let dy = radii.1 * t.cos();
        Point2::new(cos_phi * dx - sin_phi * dy, sin_phi * dx + cos_phi * dy)
    };

    (0..pieces)
        .map(|i| {
            let a = start_angle + step * i as f64;
            let b = a + step;
            let p0 = ellipse_point(center, radii, rotation, a);
            let p3 = ellipse_point(center, radii, rotation, b);
            let (da, db) = (derivative(a), derivative(b));
            [
                Point2::new(p0.x + k * da.x, p0.y + k * da.y),
                Point2::new(p3.x - k * db.x, p3.y - k * db.y),
                p3,
            ]
        })
        .collect()
}

/// Group drawing commands into closed loops.
fn collect_loops(commands: &[ProfileCommand]) -> Result<Vec<PlanarLoop>, KernelError> {
    let mut loops = Vec::new();
    let mut current = PlanarLoop::default();
    let mut pen: Option<Point2> = None;

    let push = |current: &mut PlanarLoop, from: Point2, piece: LoopPiece| {
        current.starts.push(from);
        current.pieces.push(piece);
    };

    for command in commands {
        match *command {
            ProfileCommand::MoveTo { to } => {
                if !current.pieces.is_empty() {
                    // Gaps below the path tolerance continue the open loop.
                    match pen {
                        Some(at) if at.approx_eq(&to, PATH_TOLERANCE) => {}
                        _ => return Err(invalid("move-to inside an open loop")),
                    }
                } else {
                    current = PlanarLoop::default();
                }
                pen = Some(to);
            }
            ProfileCommand::LineTo { to } => {
                let from = pen.ok_or_else(|| invalid("drawing command before move-to"))?;
                push(&mut current, from, LoopPiece::Line);
                pen = Some(to);
            }
            ProfileCommand::QuadTo { control, to } => {
                let from = pen.ok_or_else(|| invalid("drawing command before move-to"))?;
                push(&mut current, from, LoopPiece::Bezier(vec![control]));
                pen = Some(to);
            }
            ProfileCommand::CubicTo {
                control1,
                control2,
                to,
            } => {
                let from = pen.ok_or_else(|| invalid("drawing command before move-to"))?;
                push(&mut current, from, LoopPiece::Bezier(vec![control1, control2]));
                pen = Some(to);
            }
            ProfileCommand::EllipseArc {
                center,
                radii,
                rotation,
                start_angle,
                end_angle,
            } => {
                let mut from = pen.ok_or_else(|| invalid("drawing command before move-to"))?;
                for [c1, c2, end] in arc_to_cubics(center, radii, rotation, start_angle, end_angle)
                {
                    push(&mut current, from, LoopPiece::Bezier(vec![c1, c2]));
                    from = end;
                }
                pen = Some(from);
            }
            ProfileCommand::Close => {
                let (Some(end), Some(first)) = (pen, current.starts.first().copied()) else {
                    continue;
                };
                if !end.approx_eq(&first, PATH_TOLERANCE) {
                    push(&mut current, end, LoopPiece::Line);
                }
                loops.push(std::mem::take(&mut current));
                pen = None;
            }
        }
    }

    if !current.pieces.is_empty() {
        return Err(invalid("profile has an unclosed loop"));
    }
    if loops.is_empty() {
        return Err(invalid("profile has no closed loop"));
    }
    Ok(loops)
}

/// Build a truck wire for a loop, sharing vertices between pieces.
fn build_wire(plane: &Workplane, lp: &PlanarLoop) -> Wire {
    let vertices: Vec<Vertex> = lp
        .starts
        .iter()
        .map(|p| builder::vertex(point3(plane.to_world(*p))))
        .collect();
    let n = vertices.len();
    lp.pieces
        .iter()
        .enumerate()
        .map(|(i, piece)| {
            let (v0, v1) = (&vertices[i], &vertices[(i + 1) % n]);
            match piece {
                LoopPiece::Line => builder::line(v0, v1),
                LoopPiece::Bezier(ctrl) => builder::bezier(
                    v0,
                    v1,
                    ctrl.iter().map(|c| point3(plane.to_world(*c))).collect(),
                ),
            }
        })
        .collect()
}

fn point_in_polygon(p: Point2, poly: &[Point2]) -> bool {
    let mut inside = false;
    let n = poly.len();
    for i in 0..n {
        let (a, b) = (poly[i], poly[(i + 1) % n]);
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

/// Classify loops by nesting depth and attach planar faces: even depth is an
/// outer boundary (counter-clockwise), odd depth a hole of its nearest parent.
fn build_faces(plane: &Workplane, loops: &[PlanarLoop]) -> Result<Vec<Face>, KernelError> {
    let polygons: Vec<Vec<Point2>> = loops.iter().map(PlanarLoop::hull_polygon).collect();
    let containers: Vec<Vec<usize>> = (0..loops.len())
        .map(|i| {
            (0..loops.len())
                .filter(|&j| j != i && point_in_polygon(loops[i].starts[0], &polygons[j]))
                .collect()
        })
        .collect();

    let mut faces = Vec::new();
    for (i, lp) in loops.iter().enumerate() {
        if containers[i].len() % 2 == 1 {
            continue;
        }
        let mut outer = build_wire(plane, lp);
        if lp.signed_area() < 0.0 {
            outer = outer.inverse();
        }
        let mut wires = vec![outer];
        for (j, hole) in loops.iter().enumerate() {
            let direct_child =
                containers[j].contains(&i) && containers[j].len() == containers[i].len() + 1;
            if direct_child {
                let mut wire = build_wire(plane, hole);
                if hole.signed_area() > 0.0 {
                    wire = wire.inverse();
                }
                wires.push(wire);
            }
        }
        let face = builder::try_attach_plane(&wires)
            .map_err(|e| invalid(format!("failed to create planar face: {e}")))?;
        faces.push(face);
    }
    Ok(faces)
}

fn loft_error<E: std::fmt::Display>(e: E) -> KernelError {
    KernelError::LoftFailed {
        reason: e.to_string(),
    }
}

/// Closed six-faced solid between two corresponding quads. `bottom` must be
/// counter-clockwise seen from the side `top` lies on.
fn frustum(bottom: [Point3; 4], top: [Point3; 4]) -> Result<Solid, KernelError> {
    let vb: Vec<Vertex> = bottom.iter().map(|p| builder::vertex(*p)).collect();
    let vt: Vec<Vertex> = top.iter().map(|p| builder::vertex(*p)).collect();
    let eb: Vec<Edge> = (0..4).map(|i| builder::line(&vb[i], &vb[(i + 1) % 4])).collect();
    let et: Vec<Edge> = (0..4).map(|i| builder::line(&vt[i], &vt[(i + 1) % 4])).collect();
    let ev: Vec<Edge> = (0..4).map(|i| builder::line(&vb[i], &vt[i])).collect();

    let mut faces = Vec::with_capacity(6);
    let bottom_wire: Wire = eb.iter().rev().map(Edge::inverse).collect();
    faces.push(builder::try_attach_plane(&[bottom_wire]).map_err(loft_error)?);
    let top_wire: Wire = et.iter().cloned().collect();
    faces.push(builder::try_attach_plane(&[top_wire]).map_err(loft_error)?);
    for i in 0..4 {
        let j = (i + 1) % 4;
        let side: Wire = vec![
            eb[i].clone(),
            ev[j].clone(),
            et[i].inverse(),
            ev[i].inverse(),
        ]
        .into_iter()
        .collect();
        faces.push(builder::try_attach_plane(&[side]).map_err(loft_error)?);
    }

    let shell: Shell = faces.into_iter().collect();
    Solid::try_new(vec![shell]).map_err(loft_error)
}

/// Sampled boundary points of a face.
fn face_points(face: &Face) -> Vec<Point3> {
    let mut points = Vec::new();
    for wire in face.boundaries() {
        for edge in wire.edge_iter() {
            let curve = edge.oriented_curve();
            let (_, sampled) = curve.parameter_division(curve.range_tuple(), SAMPLE_TOLERANCE);
            points.extend(sampled);
        }
    }
    points
}

fn aabb_of(points: &[Point3]) -> Option<Aabb3> {
    let arrays: Vec<[f64; 3]> = points.iter().map(|p| [p.x, p.y, p.z]).collect();
    Aabb3::from_points(arrays.iter())
}

fn centroid(points: &[Point3]) -> [f64; 3] {
    let n = points.len().max(1) as f64;
    let sum = points
        .iter()
        .fold([0.0; 3], |acc, p| [acc[0] + p.x, acc[1] + p.y, acc[2] + p.z]);
    [sum[0] / n, sum[1] / n, sum[2] / n]
}

impl Kernel for TruckKernel {
    fn make_profile(
        &mut self,
        plane: &Workplane,
        commands: &[ProfileCommand],
    ) -> Result<KernelId, KernelError> {
        let loops = collect_loops(commands)?;
        let faces = build_faces(plane, &loops)?;
        if faces.is_empty() {
            return Err(invalid("profile has no outer boundary"));
        }

        // Single straight-sided quads keep their corners so they can be lofted.
        let corners = match loops.as_slice() {
            [only] if only.starts.len() == 4
                && only.pieces.iter().all(|p| matches!(p, LoopPiece::Line)) =>
            {
                let mut c = [only.starts[0], only.starts[1], only.starts[2], only.starts[3]];
                if only.signed_area() < 0.0 {
                    c.reverse();
                }
                Some(c)
            }
            _ => None,
        };

        debug!(loops = loops.len(), faces = faces.len(), "built profile");
        let id = self.alloc_id();
        self.profiles.insert(
            id.0,
            TruckProfile {
                plane: *plane,
                faces,
                corners,
            },
        );
        Ok(id)
    }

    fn extrude_profile(
        &mut self,
        profile: KernelId,
        distance: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        let profile = self.take_profile(profile)?;
        if !distance.is_finite() || distance.abs() < 1e-12 {
            return Err(KernelError::ExtrudeFailed {
                reason: format!("invalid extrude distance {distance}"),
            });
        }

        let sweep = vector3(profile.plane.normal).normalize() * distance;
        let mut result: Option<Solid> = None;
        for face in &profile.faces {
            // Sweep along the face normal so the solid is oriented outward.
            let face = if distance < 0.0 {
                face.inverse()
            } else {
                face.clone()
            };
            let solid = builder::tsweep(&face, sweep);
            result = Some(match result {
                None => solid,
                Some(acc) => truck_shapeops::or(&acc, &solid, BOOLEAN_TOLERANCE).ok_or_else(
                    || KernelError::ExtrudeFailed {
                        reason: "failed to merge disjoint profile regions".to_string(),
                    },
                )?,
            });
        }

        let solid = result.ok_or_else(|| KernelError::ExtrudeFailed {
            reason: "profile has no faces".to_string(),
        })?;
        Ok(self.store_solid(solid))
    }

    fn loft_profiles(
        &mut self,
        base: KernelId,
        top: KernelId,
    ) -> Result<KernelSolidHandle, KernelError> {
        let base = self.take_profile(base)?;
        let top = self.take_profile(top)?;
        let (Some(bc), Some(tc)) = (base.corners, top.corners) else {
            return Err(KernelError::NotSupported {
                operation: "loft between non-quadrilateral profiles".to_string(),
            });
        };
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

        let lower = bc.map(|p| point3(base.plane.to_world(p)));
        let upper = tc.map(|p| point3(top.plane.to_world(p)));
        let solid = if separation > 0.0 {
            frustum(lower, upper)?
        } else {
            let mut l = lower;
            let mut u = upper;
            l.reverse();
            u.reverse();
            frustum(l, u)?
        };
        Ok(self.store_solid(solid))
    }

    fn boolean_union(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
        mode: UnionMode,
    ) -> Result<KernelSolidHandle, KernelError> {
        let solid_a = self.cloned_solid(a)?;
        let solid_b = self.cloned_solid(b)?;

        // truck fuses coincident faces itself; glue needs no separate path.
        debug!(?mode, "union");
        let result = truck_shapeops::or(&solid_a, &solid_b, BOOLEAN_TOLERANCE).ok_or_else(|| {
            KernelError::BooleanFailed {
                reason: "truck or() returned None".to_string(),
            }
        })?;
        Ok(self.store_solid(result))
    }

    fn boolean_subtract(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let solid_a = self.cloned_solid(a)?;
        let mut solid_b = self.cloned_solid(b)?;

        // Subtraction = A ∩ ¬B. not() mutates in place.
        solid_b.not();
        let result = truck_shapeops::and(&solid_a, &solid_b, BOOLEAN_TOLERANCE).ok_or_else(|| {
            KernelError::BooleanFailed {
                reason: "truck and() returned None for subtraction".to_string(),
            }
        })?;
        Ok(self.store_solid(result))
    }

    fn fillet_edges(
        &mut self,
        _solid: &KernelSolidHandle,
        _edges: &[KernelId],
        _radius: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        Err(KernelError::NotSupported {
            operation: "fillet_edges".to_string(),
        })
    }

    fn tessellate(
        &mut self,
        solid: &KernelSolidHandle,
        tolerance: f64,
    ) -> Result<RenderMesh, KernelError> {
        if !(tolerance > 0.0) {
            return Err(KernelError::TessellationFailed {
                reason: format!("invalid tolerance {tolerance}"),
            });
        }
        let truck_solid = self
            .get_solid(solid)
            .ok_or(KernelError::EntityNotFound {
                id: KernelId(solid.id()),
            })?;
        tessellation::tessellate_solid(truck_solid, tolerance, solid.id() * ID_STRIDE)
    }

    fn release(&mut self, solid: KernelSolidHandle) {
        self.solids.remove(&solid.id());
    }
}

impl KernelIntrospect for TruckKernel {
    fn bounding_box(&self, solid: &KernelSolidHandle) -> Option<Aabb3> {
        let truck_solid = self.get_solid(solid)?;
        let points: Vec<Point3> = truck_solid
            .boundaries()
            .iter()
            .flat_map(|shell| shell.face_iter())
            .flat_map(face_points)
            .collect();
        aabb_of(&points)
    }

    fn select_faces(&self, solid: &KernelSolidHandle, selector: FaceSelector) -> Vec<KernelId> {
        let Some(truck_solid) = self.get_solid(solid) else {
            return Vec::new();
        };
        let tol = self
            .bounding_box(solid)
            .map(|b| 1e-6 * b.diagonal().max(1.0))
            .unwrap_or(1e-6);

        let faces: Vec<(KernelId, Face, Vec<Point3>)> = truck_solid
            .boundaries()
            .iter()
            .flat_map(|shell| shell.face_iter())
            .enumerate()
            .map(|(i, f)| {
                (
                    KernelId(solid.id() * ID_STRIDE + i as u64),
                    f.clone(),
                    face_points(f),
                )
            })
            .collect();

        match selector {
            FaceSelector::Min(axis) | FaceSelector::Max(axis) => {
                let i = axis.index();
                let sign = if matches!(selector, FaceSelector::Max(_)) {
                    1.0
                } else {
                    -1.0
                };
                let keys: Vec<f64> = faces.iter().map(|(_, _, pts)| sign * centroid(pts)[i]).collect();
                let Some(best) = keys.iter().copied().reduce(f64::max) else {
                    return Vec::new();
                };
                faces
                    .iter()
                    .zip(keys)
                    .filter(|(_, k)| (best - k).abs() <= tol)
                    .map(|((id, _, _), _)| *id)
                    .collect()
            }
            FaceSelector::OnPlane { axis, offset } => {
                let i = axis.index();
                faces
                    .iter()
                    .filter(|(_, face, _)| matches!(face.surface(), Surface::Plane(_)))
                    .filter(|(_, _, pts)| {
                        pts.iter().all(|p| {
                            let c = [p.x, p.y, p.z];
                            (c[i] - offset).abs() <= tol
                        })
                    })
                    .map(|(id, _, _)| *id)
                    .collect()
            }
        }
    }

    fn face_bounding_box(&self, face: KernelId) -> Option<Aabb3> {
        let (_, _, f, _) = self.face_by_id(face)?;
        aabb_of(&face_points(&f))
    }

    fn face_edges(&self, face: KernelId) -> Vec<KernelId> {
        let Some((handle_id, _, target, shell)) = self.face_by_id(face) else {
            return Vec::new();
        };

        let mut index_of = HashMap::new();
        let mut seen = HashSet::new();
        for edge in shell.edge_iter() {
            if seen.insert(edge.id()) {
                index_of.insert(edge.id(), index_of.len() as u64);
            }
        }

        target
            .boundaries()
            .iter()
            .flat_map(|w| w.edge_iter())
            .filter_map(|e| index_of.get(&e.id()))
            .map(|i| KernelId(handle_id * ID_STRIDE + EDGE_OFFSET + i))
            .collect()
    }
}
