use block_kernel::Aabb3;
use block_ops::ScaleTier;
use block_types::BoundingBox;
use serde::Serialize;

use crate::types::BuildWarning;

/// What a build measured and decided, stage by stage. Dimensions are in
/// scaled units.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildReport {
    pub path_count: usize,
    /// Artwork extent in source units.
    pub estimate: Option<BoundingBox>,
    pub scale_tier: Option<ScaleTier>,
    pub scale_by: f64,
    pub paths_extruded: usize,
    pub skipped_by_request: Vec<usize>,
    pub skipped_unsupported: Vec<usize>,
    pub closed_contours: usize,
    pub neck_bbox: Option<Aabb3>,
    /// Body (x, y) footprint.
    pub body_footprint: Option<(f64, f64)>,
    /// Cavity (x, y) footprint.
    pub cavity_footprint: Option<(f64, f64)>,
    /// Wall thickness (x, y) around the cavity. Not clamped.
    pub wall_thickness: Option<(f64, f64)>,
    /// Draft pyramid base (x, y).
    pub pyramid_base: Option<(f64, f64)>,
    pub feet_depth: Option<f64>,
    pub filleted: bool,
    pub warnings: Vec<BuildWarning>,
}

impl BuildReport {
    pub fn warn(&mut self, warning: BuildWarning) {
        tracing::warn!(%warning, "build warning");
        self.warnings.push(warning);
    }
}
