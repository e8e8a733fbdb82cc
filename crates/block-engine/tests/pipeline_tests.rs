use approx::assert_relative_eq;
use block_engine::*;
use block_kernel::{KernelIntrospect, MockKernel, MockOp, UnionMode};
use block_ops::{ParameterOverrides, ScaleTier};
use block_types::{ArtworkDocument, PathSegment, Point2, VectorPath};

fn square(x: f64, y: f64, size: f64) -> VectorPath {
    VectorPath::polygon(&[
        Point2::new(x, y),
        Point2::new(x + size, y),
        Point2::new(x + size, y + size),
        Point2::new(x, y + size),
    ])
}

fn prepare(document: &ArtworkDocument, options: BuildOptions) -> BuildContext {
    BuildContext::prepare(document, &ParameterOverrides::default(), options).unwrap()
}

fn build(
    document: &ArtworkDocument,
    options: BuildOptions,
    kernel: &mut MockKernel,
) -> (Result<Block<Finished>, BuildError>, BuildContext) {
    let mut ctx = prepare(document, options);
    let result = run_pipeline(&document.paths, &mut ctx, kernel);
    (result, ctx)
}

#[test]
fn square_artwork_end_to_end() {
    let document = ArtworkDocument::from_paths(vec![square(0.0, 0.0, 100.0)]);
    let mut kernel = MockKernel::new();
    let (result, ctx) = build(&document, BuildOptions::default(), &mut kernel);
    let finished = result.unwrap();

    let report = &ctx.report;
    assert_eq!(report.scale_tier, Some(ScaleTier::Ten));
    assert_eq!(finished.scale_by(), 10.0);
    assert_relative_eq!(ctx.params.body_height(), 213.1, epsilon = 1e-9);
    assert_eq!(report.paths_extruded, 1);
    assert_eq!(report.closed_contours, 1);

    let neck = report.neck_bbox.unwrap();
    assert_eq!(neck.max[2], 20.0);

    let (bw, bh) = report.body_footprint.unwrap();
    assert_relative_eq!(bw, 100.0);
    assert_relative_eq!(bh, 100.0);
    let (cw, ch) = report.cavity_footprint.unwrap();
    assert_relative_eq!(cw, 80.0, epsilon = 1e-9);
    assert_relative_eq!(ch, 80.0, epsilon = 1e-9);
    let (wx, wy) = report.wall_thickness.unwrap();
    assert_relative_eq!(wx, 10.0, epsilon = 1e-9);
    assert_relative_eq!(wy, 10.0, epsilon = 1e-9);
    let (px, py) = report.pyramid_base.unwrap();
    assert_relative_eq!(px, 80.0, epsilon = 1e-6);
    assert_relative_eq!(py, 80.0, epsilon = 1e-6);
    assert_relative_eq!(report.feet_depth.unwrap(), 4.0, epsilon = 1e-9);
    assert!(!report.filleted);
    assert!(report.warnings.is_empty());

    // Relief on top, body below down to the scaled type height.
    let bbox = kernel.bounding_box(finished.solid()).unwrap();
    assert_relative_eq!(bbox.zlen(), 233.1, epsilon = 1e-2);
    assert_eq!(kernel.call_count(MockOp::Loft), 1);
    assert_eq!(kernel.call_count(MockOp::Subtract), 3);
    assert_eq!(kernel.call_count(MockOp::Fillet), 0);
}

#[test]
fn every_union_is_a_glue_union() {
    let document = ArtworkDocument::from_paths(vec![
        square(0.0, 0.0, 20.0),
        square(30.0, 0.0, 20.0),
        square(60.0, 0.0, 20.0),
    ]);
    let mut kernel = MockKernel::new();
    let (result, ctx) = build(&document, BuildOptions::default(), &mut kernel);
    result.unwrap();
    assert_eq!(ctx.report.paths_extruded, 3);
    assert_eq!(kernel.union_modes(), &[UnionMode::Glue; 3]);
}

#[test]
fn skipped_and_unsupported_paths_are_counted() {
    let broken = VectorPath::new(vec![PathSegment::Line {
        start: Point2::new(0.0, 0.0),
        end: Point2::new(f64::NAN, 5.0),
    }]);
    let mut document = ArtworkDocument::from_paths(vec![
        square(0.0, 0.0, 40.0),
        broken,
        square(50.0, 0.0, 40.0),
        VectorPath::default(),
    ]);
    document.non_path_elements = 2;
    let options = BuildOptions {
        skip_paths: vec![2, 9],
        ..BuildOptions::default()
    };
    let mut kernel = MockKernel::new();
    let (result, ctx) = build(&document, options, &mut kernel);
    result.unwrap();

    let report = &ctx.report;
    assert_eq!(report.path_count, 4);
    assert_eq!(report.paths_extruded, 1);
    assert_eq!(report.skipped_by_request, vec![2]);
    assert_eq!(report.skipped_unsupported, vec![1]);
    assert!(report
        .warnings
        .contains(&BuildWarning::NonPathElements { count: 2 }));
    assert!(report
        .warnings
        .contains(&BuildWarning::UnknownSkipIndex { path: 9 }));
    assert!(report.warnings.contains(&BuildWarning::EmptyPath { path: 3 }));
    assert!(report.warnings.iter().any(|w| matches!(
        w,
        BuildWarning::UnsupportedSegment {
            path: 1,
            segment: 0,
            kind: "line",
            ..
        }
    )));
}

#[test]
fn nothing_left_to_extrude() {
    let document = ArtworkDocument::from_paths(vec![square(0.0, 0.0, 40.0)]);
    let options = BuildOptions {
        skip_paths: vec![0],
        ..BuildOptions::default()
    };
    let mut kernel = MockKernel::new();
    let (result, _) = build(&document, options, &mut kernel);
    assert!(matches!(result, Err(BuildError::NothingToExtrude)));
    assert_eq!(kernel.live_solids(), 0);
}

#[test]
fn empty_artwork_fails_before_the_kernel() {
    let err = BuildContext::prepare(
        &ArtworkDocument::default(),
        &ParameterOverrides::default(),
        BuildOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, BuildError::Estimate(_)));
    assert_eq!(err.stage(), None);
}

#[test]
fn oversized_neck_is_rejected_at_preparation() {
    let document = ArtworkDocument::from_paths(vec![square(0.0, 0.0, 100.0)]);
    let overrides = ParameterOverrides {
        neck_height: Some(233.1),
        ..ParameterOverrides::default()
    };
    let err = BuildContext::prepare(&document, &overrides, BuildOptions::default()).unwrap_err();
    assert!(matches!(err, BuildError::Parameters(_)));
}

#[test]
fn report_names_the_tier_whose_defaults_were_used() {
    let document = ArtworkDocument::from_paths(vec![square(0.0, 0.0, 50.0)]);
    let overrides = ParameterOverrides {
        scale_by: Some(10.0),
        ..ParameterOverrides::default()
    };
    let ctx = BuildContext::prepare(&document, &overrides, BuildOptions::default()).unwrap();
    assert_eq!(ctx.report.scale_tier, Some(ScaleTier::Ten));
    assert_eq!(ctx.report.scale_by, 10.0);
    assert_eq!(ctx.params.neck_height(), 20.0);

    // A scale that matches no tier keeps the measured tier's defaults.
    let overrides = ParameterOverrides {
        scale_by: Some(4.0),
        ..ParameterOverrides::default()
    };
    let ctx = BuildContext::prepare(&document, &overrides, BuildOptions::default()).unwrap();
    assert_eq!(ctx.report.scale_tier, Some(ScaleTier::Unit));
    assert_eq!(ctx.report.scale_by, 4.0);
}

#[test]
fn open_path_fails_the_extrude_stage() {
    let open = VectorPath::new(vec![
        PathSegment::Line {
            start: Point2::new(0.0, 0.0),
            end: Point2::new(30.0, 0.0),
        },
        PathSegment::Line {
            start: Point2::new(30.0, 0.0),
            end: Point2::new(30.0, 30.0),
        },
    ]);
    let document = ArtworkDocument::from_paths(vec![open]);
    let mut kernel = MockKernel::new();
    let (result, _) = build(&document, BuildOptions::default(), &mut kernel);
    let err = result.unwrap_err();
    assert_eq!(err.stage(), Some(BuildStage::Extrude));
    assert!(matches!(err, BuildError::Geometry { .. }));
}

#[test]
fn kernel_failures_abort_at_their_stage() {
    let cases = [
        (MockOp::Extrude, 1, BuildStage::Extrude),
        (MockOp::Extrude, 2, BuildStage::Body),
        (MockOp::Union, 1, BuildStage::Body),
        (MockOp::Extrude, 3, BuildStage::Hollow),
        (MockOp::Subtract, 2, BuildStage::Pyramid),
        (MockOp::Subtract, 3, BuildStage::Feet),
    ];
    let document = ArtworkDocument::from_paths(vec![square(0.0, 0.0, 50.0)]);
    for (op, nth, stage) in cases {
        let mut kernel = MockKernel::new();
        kernel.fail_on(op, nth);
        let (result, _) = build(&document, BuildOptions::default(), &mut kernel);
        let err = result.unwrap_err();
        assert_eq!(err.stage(), Some(stage), "{op:?} #{nth}");
        assert_eq!(kernel.live_solids(), 0, "{op:?} #{nth}");
    }
}

#[test]
fn fillet_is_opt_in() {
    let document = ArtworkDocument::from_paths(vec![square(0.0, 0.0, 50.0)]);
    let options = BuildOptions {
        fillet: true,
        ..BuildOptions::default()
    };
    let mut kernel = MockKernel::new();
    let (result, ctx) = build(&document, options, &mut kernel);
    result.unwrap();
    assert!(ctx.report.filleted);
    assert_eq!(kernel.call_count(MockOp::Fillet), 1);
    assert_eq!(kernel.calls().last(), Some(&MockOp::Fillet));
}

#[test]
fn oversized_fillet_fails_its_stage() {
    let document = ArtworkDocument::from_paths(vec![square(0.0, 0.0, 50.0)]);
    let overrides = ParameterOverrides {
        fillet_amount: Some(30.0),
        ..ParameterOverrides::default()
    };
    let options = BuildOptions {
        fillet: true,
        ..BuildOptions::default()
    };
    let mut ctx = BuildContext::prepare(&document, &overrides, options).unwrap();
    let mut kernel = MockKernel::new();
    let err = run_pipeline(&document.paths, &mut ctx, &mut kernel).unwrap_err();
    assert_eq!(err.stage(), Some(BuildStage::Fillet));
    assert_eq!(kernel.live_solids(), 0);
}

#[test]
fn report_serializes_for_clients() {
    let document = ArtworkDocument::from_paths(vec![square(0.0, 0.0, 50.0)]);
    let mut kernel = MockKernel::new();
    let (result, ctx) = build(&document, BuildOptions::default(), &mut kernel);
    result.unwrap();
    let json = serde_json::to_value(&ctx.report).unwrap();
    assert_eq!(json["scale_tier"], "Unit");
    assert_eq!(json["paths_extruded"], 1);
}
