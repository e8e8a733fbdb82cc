use block_kernel::{Kernel, KernelIntrospect, MockKernel, ProfileCommand, Workplane};
use block_ops::{
    estimate, interpret_path, BlockParameters, ParameterOverrides, ScaleTier, SegmentError,
};
use block_types::{PathSegment, Point2, VectorPath};
use proptest::prelude::*;

fn square_at(x: f64, y: f64, size: f64) -> Vec<PathSegment> {
    VectorPath::polygon(&[
        Point2::new(x, y),
        Point2::new(x + size, y),
        Point2::new(x + size, y + size),
        Point2::new(x, y + size),
    ])
    .segments
}

fn closes(commands: &[ProfileCommand]) -> usize {
    commands
        .iter()
        .filter(|c| matches!(c, ProfileCommand::Close))
        .count()
}

// ── Interpreter ─────────────────────────────────────────────────────────────

#[test]
fn n_disjoint_contours_close_n_times() {
    for n in 1..=5 {
        let segments: Vec<PathSegment> = (0..n)
            .flat_map(|i| square_at(i as f64 * 20.0, 0.0, 10.0))
            .collect();
        let profile = interpret_path(&VectorPath::new(segments)).unwrap();
        assert_eq!(profile.closed_contours, n);
        assert_eq!(closes(&profile.commands), n);
    }
}

#[test]
fn glyph_with_counter_closes_twice() {
    let mut segments = square_at(0.0, 0.0, 10.0);
    segments.extend(square_at(3.0, 3.0, 4.0));
    let profile = interpret_path(&VectorPath::new(segments)).unwrap();
    assert_eq!(profile.closed_contours, 2);
}

#[test]
fn degenerate_line_is_elided_and_next_segment_moves() {
    let path = VectorPath::new(vec![
        PathSegment::Line {
            start: Point2::new(0.0, 0.0),
            end: Point2::new(10.0, 0.0),
        },
        PathSegment::Line {
            start: Point2::new(10.0, 0.0),
            end: Point2::new(10.0005, 0.0005),
        },
        PathSegment::Line {
            start: Point2::new(10.0005, 0.0005),
            end: Point2::new(10.0, 10.0),
        },
    ]);
    let profile = interpret_path(&path).unwrap();
    assert_eq!(
        profile.commands,
        vec![
            ProfileCommand::MoveTo {
                to: Point2::new(0.0, 0.0)
            },
            ProfileCommand::LineTo {
                to: Point2::new(10.0, 0.0)
            },
            ProfileCommand::MoveTo {
                to: Point2::new(10.0005, 0.0005)
            },
            ProfileCommand::LineTo {
                to: Point2::new(10.0, 10.0)
            },
        ]
    );
}

#[test]
fn segments_that_draw_nothing_never_close_a_contour() {
    let line = |x0: f64, y0: f64, x1: f64, y1: f64| PathSegment::Line {
        start: Point2::new(x0, y0),
        end: Point2::new(x1, y1),
    };
    let leading_stub = VectorPath::new(vec![
        line(0.0, 0.0, 0.0, 0.0005),
        line(0.0, 0.0005, 10.0, 0.0),
        line(10.0, 0.0, 10.0, 10.0),
        line(10.0, 10.0, 0.0, 0.0),
    ]);
    let profile = interpret_path(&leading_stub).unwrap();
    assert_eq!(profile.closed_contours, 1);
    assert_eq!(closes(&profile.commands), 1);
    assert_eq!(profile.commands.last(), Some(&ProfileCommand::Close));

    let mut segments = vec![PathSegment::EllipticalArc {
        start: Point2::new(0.0, 0.0),
        end: Point2::new(0.0, 0.0),
        radius: (2.0, 2.0),
        rotation: 0.0,
        large_arc: false,
        sweep: true,
    }];
    segments.extend(square_at(0.0, 0.0, 10.0));
    let profile = interpret_path(&VectorPath::new(segments)).unwrap();
    assert_eq!(profile.closed_contours, 1);
    assert_eq!(
        profile.commands.first(),
        Some(&ProfileCommand::MoveTo {
            to: Point2::new(0.0, 0.0)
        })
    );
    assert_eq!(closes(&profile.commands), 1);
}

#[test]
fn arc_flag_pairs_draw_complementary_arcs() {
    let arc = |large_arc, sweep| {
        VectorPath::new(vec![PathSegment::EllipticalArc {
            start: Point2::new(0.0, 0.0),
            end: Point2::new(1.0, 1.0),
            radius: (1.0, 1.0),
            rotation: 0.0,
            large_arc,
            sweep,
        }])
    };
    let sweep_of = |path: VectorPath| match interpret_path(&path).unwrap().commands[1] {
        ProfileCommand::EllipseArc {
            start_angle,
            end_angle,
            ..
        } => end_angle - start_angle,
        ref other => panic!("expected an arc, got {other:?}"),
    };

    let small = sweep_of(arc(false, false));
    let large = sweep_of(arc(true, true));
    assert!(small < 0.0 && large > 0.0);
    assert!((small.abs() + large.abs() - std::f64::consts::TAU).abs() < 1e-12);
}

#[test]
fn unsupported_segment_reports_index() {
    let mut segments = square_at(0.0, 0.0, 10.0);
    segments[2] = PathSegment::CubicBezier {
        start: Point2::new(10.0, 10.0),
        control1: Point2::new(f64::INFINITY, 0.0),
        control2: Point2::new(5.0, 5.0),
        end: Point2::new(0.0, 10.0),
    };
    let err = interpret_path(&VectorPath::new(segments)).unwrap_err();
    let SegmentError::UnsupportedSegment { index, kind, .. } = err;
    assert_eq!(index, 2);
    assert_eq!(kind, "cubic bezier");
}

#[test]
fn interpreted_square_extrudes_on_mock_kernel() {
    let profile = interpret_path(&VectorPath::new(square_at(0.0, 0.0, 100.0))).unwrap();
    let mut kernel = MockKernel::new();
    let id = kernel
        .make_profile(&Workplane::xy(), &profile.commands)
        .unwrap();
    let solid = kernel.extrude_profile(id, 2.0).unwrap();
    let bbox = kernel.bounding_box(&solid).unwrap();
    assert_eq!(bbox.min, [0.0, 0.0, 0.0]);
    assert_eq!(bbox.max, [100.0, 100.0, 2.0]);
}

// ── Estimator and scale policy ──────────────────────────────────────────────

#[test]
fn estimate_spans_all_paths() {
    let paths = vec![
        VectorPath::new(square_at(0.0, 0.0, 10.0)),
        VectorPath::default(),
        VectorPath::new(square_at(90.0, -40.0, 10.0)),
    ];
    let bbox = estimate(&paths).unwrap();
    assert_eq!(bbox.width(), 100.0);
    assert_eq!(bbox.height(), 50.0);
    assert_eq!(ScaleTier::for_extent(bbox.max_extent()), ScaleTier::Ten);
}

#[test]
fn full_parameter_flow_for_square_artwork() {
    let bbox = estimate(&[VectorPath::new(square_at(0.0, 0.0, 100.0))]).unwrap();
    let params =
        block_ops::resolve_parameters(bbox.max_extent(), &ParameterOverrides::default());
    assert_eq!(params.scale_by, 10.0);
    let scaled = params.scaled().unwrap();
    assert!((scaled.body_height() - 213.1).abs() < 1e-9);
}

#[test]
fn scaled_parameters_keep_their_source() {
    let scaled = BlockParameters::for_tier(ScaleTier::Hundred).scaled().unwrap();
    assert_eq!(scaled.source().overall_type_height, 23.31);
    assert!((scaled.overall_type_height() - 2331.0).abs() < 1e-9);
    assert_eq!(scaled.neck_height(), 200.0);
}

fn arb_square() -> impl Strategy<Value = VectorPath> {
    (-500.0..500.0f64, -500.0..500.0f64, 0.5..200.0f64)
        .prop_map(|(x, y, size)| VectorPath::new(square_at(x, y, size)))
}

proptest! {
    #[test]
    fn estimate_is_order_independent(
        paths in prop::collection::vec(arb_square(), 1..8),
        rotate in 0usize..8,
    ) {
        let forward = estimate(&paths).unwrap();
        let mut reordered = paths.clone();
        reordered.reverse();
        let k = rotate % reordered.len();
        reordered.rotate_left(k);
        prop_assert_eq!(forward, estimate(&reordered).unwrap());
    }

    #[test]
    fn tiers_are_monotonic(a in 0.0..100_000.0f64, b in 0.0..100_000.0f64) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(ScaleTier::for_extent(lo).scale_by() <= ScaleTier::for_extent(hi).scale_by());
    }

    #[test]
    fn scaled_dimensions_stay_positive(extent in 0.1..50_000.0f64) {
        let scaled = block_ops::derive_defaults(extent).scaled().unwrap();
        prop_assert!(scaled.body_height() > 0.0);
        prop_assert!(scaled.hollow_depth() > 0.0);
        prop_assert!(scaled.hollow_depth() < scaled.body_height());
    }
}
