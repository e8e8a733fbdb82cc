use block_kernel::ProfileCommand;
use block_types::Point2;

/// Kernel-ready drawing of one artwork path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathProfile {
    /// Drawing commands in source units, on the XY workplane.
    pub commands: Vec<ProfileCommand>,
    /// Number of `Close` events emitted, one per closed contour.
    pub closed_contours: usize,
}

impl PathProfile {
    /// True when the profile draws nothing.
    pub fn is_empty(&self) -> bool {
        !self.commands.iter().any(|c| {
            !matches!(c, ProfileCommand::MoveTo { .. } | ProfileCommand::Close)
        })
    }
}

/// A segment the interpreter cannot represent. The whole path is skipped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SegmentError {
    #[error("unsupported {kind} segment at index {index}: {reason}")]
    UnsupportedSegment {
        index: usize,
        kind: &'static str,
        reason: String,
    },
}

/// Errors from the size estimator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimateError {
    #[error("artwork contains no drawable geometry")]
    EmptyArtwork,
}

/// Errors from parameter derivation and scaling.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParameterError {
    #[error("invalid parameter {name} = {value}: {reason}")]
    Invalid {
        name: &'static str,
        value: f64,
        reason: String,
    },
}

impl ParameterError {
    pub(crate) fn invalid(name: &'static str, value: f64, reason: impl Into<String>) -> Self {
        ParameterError::Invalid {
            name,
            value,
            reason: reason.into(),
        }
    }
}

pub(crate) fn unsupported(index: usize, kind: &'static str, reason: impl Into<String>) -> SegmentError {
    SegmentError::UnsupportedSegment {
        index,
        kind,
        reason: reason.into(),
    }
}

/// Sub-path start check shared by closure detection and line elision.
pub(crate) fn coincident(a: Point2, b: Point2) -> bool {
    a.approx_eq(&b, block_types::PATH_TOLERANCE)
}
