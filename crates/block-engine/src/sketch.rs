use block_kernel::{Aabb3, FaceSelector, KernelIntrospect, KernelSolidHandle, ProfileCommand};
use block_types::Point2;

/// Closed polygon through `corners`, in workplane coordinates.
pub(crate) fn polygon(corners: &[Point2]) -> Vec<ProfileCommand> {
    let mut commands = Vec::with_capacity(corners.len() + 1);
    let mut iter = corners.iter();
    if let Some(&first) = iter.next() {
        commands.push(ProfileCommand::MoveTo { to: first });
        commands.extend(iter.map(|&to| ProfileCommand::LineTo { to }));
        commands.push(ProfileCommand::Close);
    }
    commands
}

/// Axis-aligned rectangle of `width` by `height` centered on `center`.
pub(crate) fn rectangle(center: Point2, width: f64, height: f64) -> Vec<ProfileCommand> {
    let (hw, hh) = (width / 2.0, height / 2.0);
    polygon(&[
        Point2::new(center.x - hw, center.y - hh),
        Point2::new(center.x + hw, center.y - hh),
        Point2::new(center.x + hw, center.y + hh),
        Point2::new(center.x - hw, center.y + hh),
    ])
}

/// Combined bounds of every face the selector picks.
pub(crate) fn faces_bbox(
    kernel: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
    selector: FaceSelector,
) -> Option<Aabb3> {
    kernel
        .select_faces(solid, selector)
        .into_iter()
        .filter_map(|face| kernel.face_bounding_box(face))
        .reduce(|acc, b| acc.union(&b))
}
