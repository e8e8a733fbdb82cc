use crate::types::*;

/// Core geometry kernel trait. Provides the construction operations the block
/// pipeline issues. Implemented by TruckKernel (wraps real truck) and
/// MockKernel (deterministic test double).
///
/// Operations never mutate their input solids; callers release handles they
/// no longer need.
pub trait Kernel {
    /// Build a planar profile from drawing commands on a workplane.
    /// Returns a profile id consumed by `extrude_profile` or `loft_profiles`.
    fn make_profile(
        &mut self,
        plane: &Workplane,
        commands: &[ProfileCommand],
    ) -> Result<KernelId, KernelError>;

    /// Extrude a profile along its workplane normal. Negative distances
    /// extrude against the normal.
    fn extrude_profile(
        &mut self,
        profile: KernelId,
        distance: f64,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Loft between two profiles lying on parallel planes.
    fn loft_profiles(
        &mut self,
        base: KernelId,
        top: KernelId,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Boolean union of two solids.
    fn boolean_union(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
        mode: UnionMode,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Boolean subtraction: a minus b.
    fn boolean_subtract(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Fillet (round) the specified edges with the given radius.
    fn fillet_edges(
        &mut self,
        solid: &KernelSolidHandle,
        edges: &[KernelId],
        radius: f64,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Tessellate a solid to a triangle mesh.
    fn tessellate(
        &mut self,
        solid: &KernelSolidHandle,
        tolerance: f64,
    ) -> Result<RenderMesh, KernelError>;

    /// Drop a solid. Unknown handles are ignored.
    fn release(&mut self, solid: KernelSolidHandle);
}

/// Topology introspection trait. Provides read-only queries on kernel geometry.
pub trait KernelIntrospect {
    /// Axis-aligned bounds of a solid.
    fn bounding_box(&self, solid: &KernelSolidHandle) -> Option<Aabb3>;

    /// Faces of a solid matching a selector.
    fn select_faces(&self, solid: &KernelSolidHandle, selector: FaceSelector) -> Vec<KernelId>;

    /// Axis-aligned bounds of a single face.
    fn face_bounding_box(&self, face: KernelId) -> Option<Aabb3>;

    /// Get the edges bounding a face.
    fn face_edges(&self, face: KernelId) -> Vec<KernelId>;
}
