use block_kernel::ProfileCommand;
use block_types::{PathSegment, Point2, VectorPath};
use tracing::trace;

use crate::arc::{arc_endpoint_to_center, ArcShape};
use crate::types::{coincident, unsupported, PathProfile, SegmentError};

/// Translate one artwork path into kernel drawing commands.
///
/// A move-to precedes every segment whose start is not exactly the current
/// pen position. Near-zero lines are elided without moving the pen. Each time
/// a segment returns to the running contour start, a `Close` is emitted and
/// the contour start is cleared, so N disjoint closed contours yield exactly N
/// closes.
pub fn interpret_path(path: &VectorPath) -> Result<PathProfile, SegmentError> {
    let mut commands = Vec::with_capacity(path.len() * 2);
    let mut pen: Option<Point2> = None;
    let mut contour_start: Option<Point2> = None;
    let mut closed_contours = 0;

    for (index, segment) in path.segments.iter().enumerate() {
        check_finite(index, segment)?;

        let start = segment.start();
        if pen != Some(start) {
            commands.push(ProfileCommand::MoveTo { to: start });
            pen = Some(start);
        }

        let drew = match *segment {
            PathSegment::Line { start, end } => {
                if coincident(start, end) {
                    trace!(index, "eliding degenerate line");
                    false
                } else {
                    commands.push(ProfileCommand::LineTo { to: end });
                    pen = Some(end);
                    true
                }
            }
            PathSegment::QuadraticBezier { control, end, .. } => {
                commands.push(ProfileCommand::QuadTo { control, to: end });
                pen = Some(end);
                true
            }
            PathSegment::CubicBezier {
                control1,
                control2,
                end,
                ..
            } => {
                commands.push(ProfileCommand::CubicTo {
                    control1,
                    control2,
                    to: end,
                });
                pen = Some(end);
                true
            }
            PathSegment::EllipticalArc {
                start,
                end,
                radius,
                rotation,
                large_arc,
                sweep,
            } => match arc_endpoint_to_center(start, end, radius, rotation, large_arc, sweep) {
                ArcShape::Empty => false,
                ArcShape::Straight => {
                    commands.push(ProfileCommand::LineTo { to: end });
                    pen = Some(end);
                    true
                }
                ArcShape::Elliptical(arc) => {
                    if !arc.center.is_finite() || !arc.start_angle.is_finite() {
                        return Err(unsupported(
                            index,
                            segment.kind_name(),
                            "arc center could not be resolved",
                        ));
                    }
                    commands.push(ProfileCommand::EllipseArc {
                        center: arc.center,
                        radii: arc.radii,
                        rotation: arc.rotation,
                        start_angle: arc.start_angle,
                        end_angle: arc.end_angle(),
                    });
                    pen = Some(end);
                    true
                }
            },
        };
        if !drew {
            continue;
        }

        // Only segments that drew something can start or close a contour.
        let first = *contour_start.get_or_insert(start);
        if coincident(first, segment.end()) {
            commands.push(ProfileCommand::Close);
            closed_contours += 1;
            contour_start = None;
            pen = None;
        }
    }

    Ok(PathProfile {
        commands,
        closed_contours,
    })
}

fn check_finite(index: usize, segment: &PathSegment) -> Result<(), SegmentError> {
    let points_finite = match segment {
        PathSegment::Line { start, end } => start.is_finite() && end.is_finite(),
        PathSegment::QuadraticBezier {
            start,
            control,
            end,
        } => start.is_finite() && control.is_finite() && end.is_finite(),
        PathSegment::CubicBezier {
            start,
            control1,
            control2,
            end,
        } => start.is_finite() && control1.is_finite() && control2.is_finite() && end.is_finite(),
        PathSegment::EllipticalArc {
            start,
            end,
            radius,
            rotation,
            ..
        } => {
            if !(radius.0.is_finite() && radius.1.is_finite() && rotation.is_finite()) {
                return Err(unsupported(
                    index,
                    segment.kind_name(),
                    "non-finite arc parameter",
                ));
            }
            start.is_finite() && end.is_finite()
        }
    };
    if points_finite {
        Ok(())
    } else {
        Err(unsupported(index, segment.kind_name(), "non-finite coordinate"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> PathSegment {
        PathSegment::Line {
            start: Point2::new(x0, y0),
            end: Point2::new(x1, y1),
        }
    }

    fn count_moves(profile: &PathProfile) -> usize {
        profile
            .commands
            .iter()
            .filter(|c| matches!(c, ProfileCommand::MoveTo { .. }))
            .count()
    }

    #[test]
    fn contiguous_square_moves_once_and_closes() {
        let path = VectorPath::new(vec![
            line(0.0, 0.0, 10.0, 0.0),
            line(10.0, 0.0, 10.0, 10.0),
            line(10.0, 10.0, 0.0, 10.0),
            line(0.0, 10.0, 0.0, 0.0),
        ]);
        let profile = interpret_path(&path).unwrap();
        assert_eq!(count_moves(&profile), 1);
        assert_eq!(profile.closed_contours, 1);
        assert_eq!(profile.commands.last(), Some(&ProfileCommand::Close));
        assert_eq!(profile.commands.len(), 6);
    }

    #[test]
    fn empty_path_yields_nothing() {
        let profile = interpret_path(&VectorPath::default()).unwrap();
        assert!(profile.commands.is_empty());
        assert!(profile.is_empty());
        assert_eq!(profile.closed_contours, 0);
    }

    #[test]
    fn open_path_has_no_close() {
        let path = VectorPath::new(vec![line(0.0, 0.0, 5.0, 0.0), line(5.0, 0.0, 5.0, 5.0)]);
        let profile = interpret_path(&path).unwrap();
        assert_eq!(profile.closed_contours, 0);
        assert!(!profile.commands.contains(&ProfileCommand::Close));
    }

    #[test]
    fn beziers_pass_through() {
        let path = VectorPath::new(vec![
            PathSegment::QuadraticBezier {
                start: Point2::new(0.0, 0.0),
                control: Point2::new(5.0, 10.0),
                end: Point2::new(10.0, 0.0),
            },
            PathSegment::CubicBezier {
                start: Point2::new(10.0, 0.0),
                control1: Point2::new(7.0, -3.0),
                control2: Point2::new(3.0, -3.0),
                end: Point2::new(0.0, 0.0),
            },
        ]);
        let profile = interpret_path(&path).unwrap();
        assert_eq!(
            profile.commands[1],
            ProfileCommand::QuadTo {
                control: Point2::new(5.0, 10.0),
                to: Point2::new(10.0, 0.0),
            }
        );
        assert_eq!(
            profile.commands[2],
            ProfileCommand::CubicTo {
                control1: Point2::new(7.0, -3.0),
                control2: Point2::new(3.0, -3.0),
                to: Point2::new(0.0, 0.0),
            }
        );
        assert_eq!(profile.closed_contours, 1);
    }

    #[test]
    fn non_finite_segment_is_unsupported() {
        let path = VectorPath::new(vec![line(0.0, 0.0, f64::NAN, 1.0)]);
        let err = interpret_path(&path).unwrap_err();
        assert!(matches!(
            err,
            SegmentError::UnsupportedSegment { index: 0, kind: "line", .. }
        ));
    }

    #[test]
    fn zero_radius_arc_becomes_line() {
        let path = VectorPath::new(vec![PathSegment::EllipticalArc {
            start: Point2::new(0.0, 0.0),
            end: Point2::new(4.0, 0.0),
            radius: (0.0, 2.0),
            rotation: 0.0,
            large_arc: false,
            sweep: true,
        }]);
        let profile = interpret_path(&path).unwrap();
        assert_eq!(
            profile.commands[1],
            ProfileCommand::LineTo {
                to: Point2::new(4.0, 0.0)
            }
        );
    }

    #[test]
    fn arc_rotation_is_converted_to_radians() {
        let path = VectorPath::new(vec![PathSegment::EllipticalArc {
            start: Point2::new(0.0, 0.0),
            end: Point2::new(4.0, 0.0),
            radius: (3.0, 2.0),
            rotation: 90.0,
            large_arc: false,
            sweep: true,
        }]);
        let profile = interpret_path(&path).unwrap();
        match profile.commands[1] {
            ProfileCommand::EllipseArc { rotation, .. } => {
                assert!((rotation - std::f64::consts::FRAC_PI_2).abs() < 1e-12)
            }
            ref other => panic!("expected an arc, got {other:?}"),
        }
    }
}
