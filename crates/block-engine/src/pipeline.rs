//! Solid construction pipeline.
//!
//! A [`Block`] owns the one live solid of a build. Each stage consumes the
//! block it refines and returns the next stage's block, so stages run once
//! and in order. Every transition releases the solid it replaced, also when
//! it fails.

use block_kernel::{
    Axis, FaceSelector, KernelBundle, KernelSolidHandle, UnionMode, Workplane,
};
use block_ops::{interpret_path, PathProfile, SegmentError};
use block_types::{Point2, VectorPath};
use tracing::{debug, info, instrument};

use crate::context::BuildContext;
use crate::sketch::{faces_bbox, polygon, rectangle};
use crate::types::{BuildError, BuildStage, BuildWarning};

/// Draft pyramid top edge as a fraction of its base.
const PYRAMID_TOP_RATIO: f64 = 0.01;

/// Foot groove outline along the `>X` face, as fractions of the face length:
/// ramp start, full depth reached, full depth left, ramp end.
const FEET_PROFILE: [f64; 4] = [0.18, 0.20, 0.80, 0.82];

/// A stage that owns a solid.
pub trait SolidStage {
    fn handle(&self) -> &KernelSolidHandle;
    fn into_handle(self) -> KernelSolidHandle;
}

/// No solid yet.
#[derive(Debug)]
pub struct Empty;

macro_rules! solid_stages {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {$(
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name(KernelSolidHandle);

        impl SolidStage for $name {
            fn handle(&self) -> &KernelSolidHandle {
                &self.0
            }

            fn into_handle(self) -> KernelSolidHandle {
                self.0
            }
        }
    )*};
}

solid_stages! {
    /// Artwork relief, extruded and unioned.
    Necked,
    /// Relief standing on its body.
    Boxed,
    /// Body hollowed from below.
    Hollowed,
    /// Draft pyramid cut above the cavity.
    PyramidCut,
    /// Foot groove cut.
    FeetCut,
    Filleted,
}

/// Complete block, ready for export.
#[derive(Debug)]
pub struct Finished {
    solid: KernelSolidHandle,
    scale_by: f64,
}

impl SolidStage for Finished {
    fn handle(&self) -> &KernelSolidHandle {
        &self.solid
    }

    fn into_handle(self) -> KernelSolidHandle {
        self.solid
    }
}

#[derive(Debug)]
pub struct Block<S> {
    stage: S,
}

impl Block<Empty> {
    pub fn new() -> Self {
        Block { stage: Empty }
    }

    /// Interpret, extrude and glue every path that is not skipped.
    ///
    /// Paths with unsupported segments are left out with a warning. Kernel
    /// failures abort the build.
    #[instrument(skip_all, fields(paths = paths.len()))]
    pub fn extrude_paths(
        self,
        paths: &[VectorPath],
        ctx: &mut BuildContext,
        kernel: &mut dyn KernelBundle,
    ) -> Result<Block<Necked>, BuildError> {
        let mut running = None;
        let outcome = extrude_each(paths, ctx, kernel, &mut running);
        match (outcome, running) {
            (Ok(()), Some(solid)) => {
                ctx.report.neck_bbox = kernel.bounding_box(&solid);
                info!(
                    extruded = ctx.report.paths_extruded,
                    skipped = ctx.report.skipped_by_request.len()
                        + ctx.report.skipped_unsupported.len(),
                    "relief extruded"
                );
                Ok(Block {
                    stage: Necked(solid),
                })
            }
            (Ok(()), None) => Err(BuildError::NothingToExtrude),
            (Err(e), leftover) => {
                if let Some(solid) = leftover {
                    kernel.release(solid);
                }
                Err(e)
            }
        }
    }
}

impl Default for Block<Empty> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SolidStage> Block<S> {
    pub fn solid(&self) -> &KernelSolidHandle {
        self.stage.handle()
    }

    /// Give up the block, keeping its solid alive.
    pub fn into_solid(self) -> KernelSolidHandle {
        self.stage.into_handle()
    }

    /// Drop the block and its solid.
    pub fn discard(self, kernel: &mut dyn KernelBundle) {
        kernel.release(self.into_solid());
    }
}

/// Run `step` against the block's solid and release that solid afterwards,
/// whatever the outcome.
fn refine<S, N>(
    block: Block<S>,
    kernel: &mut dyn KernelBundle,
    step: impl FnOnce(&mut dyn KernelBundle, &KernelSolidHandle) -> Result<KernelSolidHandle, BuildError>,
    wrap: impl FnOnce(KernelSolidHandle) -> N,
) -> Result<Block<N>, BuildError>
where
    S: SolidStage,
{
    let current = block.into_solid();
    let result = step(&mut *kernel, &current);
    kernel.release(current);
    result.map(|solid| Block { stage: wrap(solid) })
}

impl Block<Necked> {
    /// Stand the relief on a rectangular body sized from its footprint.
    #[instrument(skip_all)]
    pub fn build_body(
        self,
        ctx: &mut BuildContext,
        kernel: &mut dyn KernelBundle,
    ) -> Result<Block<Boxed>, BuildError> {
        refine(self, kernel, |kernel, solid| add_body(ctx, kernel, solid), Boxed)
    }
}

impl Block<Boxed> {
    /// Cut the cavity up from the bottom face.
    #[instrument(skip_all)]
    pub fn hollow(
        self,
        ctx: &mut BuildContext,
        kernel: &mut dyn KernelBundle,
    ) -> Result<Block<Hollowed>, BuildError> {
        refine(self, kernel, |kernel, solid| cut_cavity(ctx, kernel, solid), Hollowed)
    }
}

impl Block<Hollowed> {
    /// Cut a tapered pyramid up from the cavity ceiling.
    #[instrument(skip_all)]
    pub fn cut_pyramid(
        self,
        ctx: &mut BuildContext,
        kernel: &mut dyn KernelBundle,
    ) -> Result<Block<PyramidCut>, BuildError> {
        refine(self, kernel, |kernel, solid| cut_draft(ctx, kernel, solid), PyramidCut)
    }
}

impl Block<PyramidCut> {
    /// Cut the foot groove across the bottom, leaving two feet.
    #[instrument(skip_all)]
    pub fn cut_feet(
        self,
        ctx: &mut BuildContext,
        kernel: &mut dyn KernelBundle,
    ) -> Result<Block<FeetCut>, BuildError> {
        if ctx.params.feet_cut_out_percentage() == 0.0 {
            ctx.report.warn(BuildWarning::FeetSkipped);
            return Ok(Block {
                stage: FeetCut(self.into_solid()),
            });
        }
        refine(self, kernel, |kernel, solid| cut_groove(ctx, kernel, solid), FeetCut)
    }
}

impl Block<FeetCut> {
    /// Round the side and bottom edges.
    #[instrument(skip_all)]
    pub fn fillet(
        self,
        ctx: &mut BuildContext,
        kernel: &mut dyn KernelBundle,
    ) -> Result<Block<Filleted>, BuildError> {
        if ctx.params.fillet_amount() == 0.0 {
            ctx.report.warn(BuildWarning::FilletSkipped);
            return Ok(Block {
                stage: Filleted(self.into_solid()),
            });
        }
        let block = refine(self, kernel, |kernel, solid| round_edges(ctx, kernel, solid), Filleted)?;
        ctx.report.filleted = true;
        Ok(block)
    }

    pub fn finish(self, ctx: &BuildContext) -> Block<Finished> {
        finished(self.into_solid(), ctx)
    }
}

impl Block<Filleted> {
    pub fn finish(self, ctx: &BuildContext) -> Block<Finished> {
        finished(self.into_solid(), ctx)
    }
}

impl Block<Finished> {
    /// Factor the model was built at; export divides it back out.
    pub fn scale_by(&self) -> f64 {
        self.stage.scale_by
    }
}

fn finished(solid: KernelSolidHandle, ctx: &BuildContext) -> Block<Finished> {
    Block {
        stage: Finished {
            solid,
            scale_by: ctx.params.scale_by(),
        },
    }
}

/// Drive every stage in order. Filleting runs only when the options ask for it.
pub fn run_pipeline(
    paths: &[VectorPath],
    ctx: &mut BuildContext,
    kernel: &mut dyn KernelBundle,
) -> Result<Block<Finished>, BuildError> {
    let feet = Block::new()
        .extrude_paths(paths, ctx, kernel)?
        .build_body(ctx, kernel)?
        .hollow(ctx, kernel)?
        .cut_pyramid(ctx, kernel)?
        .cut_feet(ctx, kernel)?;
    let finished = if ctx.options.fillet {
        feet.fillet(ctx, kernel)?.finish(ctx)
    } else {
        feet.finish(ctx)
    };
    info!(warnings = ctx.report.warnings.len(), "block finished");
    Ok(finished)
}

// ── Stage bodies ────────────────────────────────────────────────────────────

fn extrude_each(
    paths: &[VectorPath],
    ctx: &mut BuildContext,
    kernel: &mut dyn KernelBundle,
    running: &mut Option<KernelSolidHandle>,
) -> Result<(), BuildError> {
    let geometry = BuildError::geometry;
    let neck_height = ctx.params.neck_height();

    for (index, path) in paths.iter().enumerate() {
        if ctx.options.skips(index) {
            debug!(index, "path skipped by request");
            ctx.report.skipped_by_request.push(index);
            continue;
        }
        let profile = match interpret_path(path) {
            Ok(profile) => profile,
            Err(SegmentError::UnsupportedSegment {
                index: segment,
                kind,
                reason,
            }) => {
                ctx.report.skipped_unsupported.push(index);
                ctx.report.warn(BuildWarning::UnsupportedSegment {
                    path: index,
                    segment,
                    kind,
                    reason,
                });
                continue;
            }
        };
        if profile.is_empty() {
            ctx.report.warn(BuildWarning::EmptyPath { path: index });
            continue;
        }

        let solid = extrude_relief(kernel, &profile, neck_height)?;
        let merged = match running.take() {
            None => solid,
            Some(acc) => {
                let merged = kernel.boolean_union(&acc, &solid, UnionMode::Glue);
                kernel.release(acc);
                kernel.release(solid);
                merged.map_err(geometry(BuildStage::Extrude))?
            }
        };
        *running = Some(merged);

        ctx.report.paths_extruded += 1;
        ctx.report.closed_contours += profile.closed_contours;
        debug!(index, contours = profile.closed_contours, "path extruded");
    }
    Ok(())
}

fn extrude_relief(
    kernel: &mut dyn KernelBundle,
    profile: &PathProfile,
    height: f64,
) -> Result<KernelSolidHandle, BuildError> {
    let geometry = BuildError::geometry;
    let id = kernel
        .make_profile(&Workplane::xy(), &profile.commands)
        .map_err(geometry(BuildStage::Extrude))?;
    kernel
        .extrude_profile(id, height)
        .map_err(geometry(BuildStage::Extrude))
}

fn add_body(
    ctx: &mut BuildContext,
    kernel: &mut dyn KernelBundle,
    necked: &KernelSolidHandle,
) -> Result<KernelSolidHandle, BuildError> {
    const STAGE: BuildStage = BuildStage::Body;
    let p = &ctx.params;
    let relief = kernel
        .bounding_box(necked)
        .ok_or_else(|| BuildError::missing(STAGE, "relief bounds"))?;

    let width = relief.xlen() * p.x_len_adj();
    let height = relief.ylen() * p.y_len_adj();
    let [cx, cy, _] = relief.center();
    let plane = Workplane::xy().offset(p.body_offset());
    let profile = kernel
        .make_profile(&plane, &rectangle(Point2::new(cx, cy), width, height))
        .map_err(BuildError::geometry(STAGE))?;
    let body = kernel
        .extrude_profile(profile, -p.body_height())
        .map_err(BuildError::geometry(STAGE))?;

    let merged = kernel.boolean_union(necked, &body, UnionMode::Glue);
    kernel.release(body);
    debug!(width, height, depth = p.body_height(), "body added");
    ctx.report.body_footprint = Some((width, height));
    merged.map_err(BuildError::geometry(STAGE))
}

fn cut_cavity(
    ctx: &mut BuildContext,
    kernel: &mut dyn KernelBundle,
    boxed: &KernelSolidHandle,
) -> Result<KernelSolidHandle, BuildError> {
    const STAGE: BuildStage = BuildStage::Hollow;
    let p = &ctx.params;
    let bottom = faces_bbox(kernel.as_introspect(), boxed, FaceSelector::Min(Axis::Z))
        .ok_or_else(|| BuildError::missing(STAGE, "bottom face"))?;

    let eps = p.body_offset();
    let (body_w, body_h) = (bottom.xlen(), bottom.ylen());
    let cavity_w = body_w * p.x_hollow_percentage();
    let cavity_h = body_h * p.y_hollow_percentage();
    let [cx, cy, _] = bottom.center();

    // Starts just below the bottom face and rises half the hollow depth.
    let plane = Workplane::new(
        [cx, cy, bottom.min[2] - eps],
        [0.0, 0.0, -1.0],
        [1.0, 0.0, 0.0],
    );
    let profile = kernel
        .make_profile(&plane, &rectangle(Point2::new(0.0, 0.0), cavity_w, cavity_h))
        .map_err(BuildError::geometry(STAGE))?;
    let tool = kernel
        .extrude_profile(profile, -(p.hollow_depth() / 2.0 + eps))
        .map_err(BuildError::geometry(STAGE))?;

    let cut = kernel.boolean_subtract(boxed, &tool);
    kernel.release(tool);

    let walls = ((body_w - cavity_w) / 2.0, (body_h - cavity_h) / 2.0);
    debug!(cavity_w, cavity_h, wall_x = walls.0, wall_y = walls.1, "cavity cut");
    ctx.report.cavity_footprint = Some((cavity_w, cavity_h));
    ctx.report.wall_thickness = Some(walls);
    cut.map_err(BuildError::geometry(STAGE))
}

fn cut_draft(
    ctx: &mut BuildContext,
    kernel: &mut dyn KernelBundle,
    hollowed: &KernelSolidHandle,
) -> Result<KernelSolidHandle, BuildError> {
    const STAGE: BuildStage = BuildStage::Pyramid;
    let p = &ctx.params;
    let bottom = faces_bbox(kernel.as_introspect(), hollowed, FaceSelector::Min(Axis::Z))
        .ok_or_else(|| BuildError::missing(STAGE, "bottom face"))?;
    let half_depth = p.hollow_depth() / 2.0;
    let ceiling = bottom.min[2] + half_depth;
    let base = faces_bbox(
        kernel.as_introspect(),
        hollowed,
        FaceSelector::OnPlane {
            axis: Axis::Z,
            offset: ceiling,
        },
    )
    .ok_or_else(|| BuildError::missing(STAGE, "cavity ceiling"))?;

    let eps = p.body_offset();
    let (base_w, base_h) = (base.xlen(), base.ylen());
    let [cx, cy, _] = base.center();
    let origin = Point2::new(0.0, 0.0);
    let base_plane = Workplane::xy().with_origin([cx, cy, ceiling - eps]);
    let top_plane = Workplane::xy().with_origin([cx, cy, ceiling + half_depth]);

    let base_profile = kernel
        .make_profile(&base_plane, &rectangle(origin, base_w, base_h))
        .map_err(BuildError::geometry(STAGE))?;
    let top_profile = kernel
        .make_profile(
            &top_plane,
            &rectangle(origin, base_w * PYRAMID_TOP_RATIO, base_h * PYRAMID_TOP_RATIO),
        )
        .map_err(BuildError::geometry(STAGE))?;
    let pyramid = kernel
        .loft_profiles(base_profile, top_profile)
        .map_err(BuildError::geometry(STAGE))?;

    let cut = kernel.boolean_subtract(hollowed, &pyramid);
    kernel.release(pyramid);
    debug!(base_w, base_h, ceiling, "draft pyramid cut");
    ctx.report.pyramid_base = Some((base_w, base_h));
    cut.map_err(BuildError::geometry(STAGE))
}

fn cut_groove(
    ctx: &mut BuildContext,
    kernel: &mut dyn KernelBundle,
    solid: &KernelSolidHandle,
) -> Result<KernelSolidHandle, BuildError> {
    const STAGE: BuildStage = BuildStage::Feet;
    let p = &ctx.params;
    let body = kernel
        .bounding_box(solid)
        .ok_or_else(|| BuildError::missing(STAGE, "block bounds"))?;
    let face = faces_bbox(kernel.as_introspect(), solid, FaceSelector::Max(Axis::X))
        .ok_or_else(|| BuildError::missing(STAGE, "end face"))?;

    let eps = p.body_offset();
    let depth = body.ylen() * p.feet_cut_out_percentage();
    let length = face.ylen();
    let [ramp_in, full_in, full_out, ramp_out] = FEET_PROFILE.map(|f| f * length);

    // Plane u runs along +Y and v up +Z from the bottom edge of the end face.
    let plane = Workplane::new(
        [face.max[0] + eps, face.min[1], face.min[2]],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
    );
    let groove = polygon(&[
        Point2::new(ramp_in, -eps),
        Point2::new(full_in, depth),
        Point2::new(full_out, depth),
        Point2::new(ramp_out, -eps),
    ]);
    let profile = kernel
        .make_profile(&plane, &groove)
        .map_err(BuildError::geometry(STAGE))?;
    let tool = kernel
        .extrude_profile(profile, -(body.xlen() + 2.0 * eps))
        .map_err(BuildError::geometry(STAGE))?;

    let cut = kernel.boolean_subtract(solid, &tool);
    kernel.release(tool);
    debug!(depth, length, "foot groove cut");
    ctx.report.feet_depth = Some(depth);
    cut.map_err(BuildError::geometry(STAGE))
}

fn round_edges(
    ctx: &mut BuildContext,
    kernel: &mut dyn KernelBundle,
    solid: &KernelSolidHandle,
) -> Result<KernelSolidHandle, BuildError> {
    const STAGE: BuildStage = BuildStage::Fillet;
    let selectors = [
        FaceSelector::Min(Axis::Y),
        FaceSelector::Max(Axis::Y),
        FaceSelector::Max(Axis::X),
        FaceSelector::Min(Axis::Z),
    ];
    let mut edges = Vec::new();
    for selector in selectors {
        for face in kernel.select_faces(solid, selector) {
            for edge in kernel.face_edges(face) {
                if !edges.contains(&edge) {
                    edges.push(edge);
                }
            }
        }
    }
    if edges.is_empty() {
        return Err(BuildError::missing(STAGE, "edges to round"));
    }

    let radius = ctx.params.fillet_amount();
    debug!(edges = edges.len(), radius, "rounding edges");
    kernel
        .fillet_edges(solid, &edges, radius)
        .map_err(BuildError::geometry(STAGE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BuildOptions;
    use block_kernel::{MockKernel, MockOp};
    use block_ops::BlockParameters;

    fn square(size: f64) -> VectorPath {
        VectorPath::polygon(&[
            Point2::new(0.0, 0.0),
            Point2::new(size, 0.0),
            Point2::new(size, size),
            Point2::new(0.0, size),
        ])
    }

    fn context() -> BuildContext {
        let params = BlockParameters::default().scaled().unwrap();
        BuildContext::new(params, BuildOptions::default())
    }

    #[test]
    fn test_stages_release_replaced_solids() {
        let mut kernel = MockKernel::new();
        let mut ctx = context();
        let finished = run_pipeline(&[square(50.0)], &mut ctx, &mut kernel).unwrap();
        assert_eq!(kernel.live_solids(), 1);
        assert_eq!(finished.scale_by(), 1.0);
        finished.discard(&mut kernel);
        assert_eq!(kernel.live_solids(), 0);
    }

    #[test]
    fn test_failed_stage_leaves_nothing_alive() {
        let mut kernel = MockKernel::new();
        kernel.fail_on(MockOp::Loft, 1);
        let mut ctx = context();
        let err = run_pipeline(&[square(50.0)], &mut ctx, &mut kernel).unwrap_err();
        assert_eq!(err.stage(), Some(BuildStage::Pyramid));
        assert_eq!(kernel.live_solids(), 0);
    }

    #[test]
    fn test_failed_glue_releases_running_solid() {
        let mut kernel = MockKernel::new();
        kernel.fail_on(MockOp::Union, 1);
        let mut ctx = context();
        let paths = [square(10.0), square(20.0)];
        let err = Block::new()
            .extrude_paths(&paths, &mut ctx, &mut kernel)
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::Geometry {
                stage: BuildStage::Extrude,
                ..
            }
        ));
        assert_eq!(kernel.live_solids(), 0);
    }

    #[test]
    fn test_zero_feet_passes_solid_through() {
        let params = BlockParameters {
            feet_cut_out_percentage: 0.0,
            ..BlockParameters::default()
        }
        .scaled()
        .unwrap();
        let mut ctx = BuildContext::new(params, BuildOptions::default());
        let mut kernel = MockKernel::new();
        let finished = run_pipeline(&[square(50.0)], &mut ctx, &mut kernel).unwrap();
        assert_eq!(kernel.call_count(MockOp::Subtract), 2);
        assert!(ctx.report.warnings.contains(&BuildWarning::FeetSkipped));
        assert!(ctx.report.feet_depth.is_none());
        finished.discard(&mut kernel);
    }
}
