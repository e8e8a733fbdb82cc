use std::fmt;

use block_kernel::KernelError;
use block_ops::{EstimateError, ParameterError};
use serde::Serialize;

/// Pipeline stage, for error and log attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStage {
    Extrude,
    Body,
    Hollow,
    Pyramid,
    Feet,
    Fillet,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStage::Extrude => "extrude",
            BuildStage::Body => "body",
            BuildStage::Hollow => "hollow",
            BuildStage::Pyramid => "pyramid",
            BuildStage::Feet => "feet",
            BuildStage::Fillet => "fillet",
        };
        f.write_str(name)
    }
}

/// Errors that abort a build. No partial result survives any of them.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Estimate(#[from] EstimateError),

    #[error(transparent)]
    Parameters(#[from] ParameterError),

    #[error("no path could be extruded")]
    NothingToExtrude,

    #[error("{stage} stage: kernel reported no {what}")]
    MissingGeometry {
        stage: BuildStage,
        what: &'static str,
    },

    #[error("{stage} stage failed: {source}")]
    Geometry {
        stage: BuildStage,
        #[source]
        source: KernelError,
    },
}

impl BuildError {
    pub(crate) fn geometry(stage: BuildStage) -> impl FnOnce(KernelError) -> BuildError {
        move |source| BuildError::Geometry { stage, source }
    }

    pub(crate) fn missing(stage: BuildStage, what: &'static str) -> BuildError {
        BuildError::MissingGeometry { stage, what }
    }

    /// The stage that failed, for errors raised inside the pipeline.
    pub fn stage(&self) -> Option<BuildStage> {
        match self {
            BuildError::Geometry { stage, .. } | BuildError::MissingGeometry { stage, .. } => {
                Some(*stage)
            }
            BuildError::NothingToExtrude => Some(BuildStage::Extrude),
            BuildError::Estimate(_) | BuildError::Parameters(_) => None,
        }
    }
}

/// Advisories collected during a successful build.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BuildWarning {
    /// The document held shapes or text that were not converted.
    NonPathElements { count: usize },
    /// A path held a segment that could not be drawn and was left out.
    UnsupportedSegment {
        path: usize,
        segment: usize,
        kind: &'static str,
        reason: String,
    },
    /// A path drew nothing after interpretation.
    EmptyPath { path: usize },
    /// A skip-list index named no path.
    UnknownSkipIndex { path: usize },
    /// Zero cut-out depth; the groove was not cut.
    FeetSkipped,
    /// Zero fillet radius; edges were left sharp.
    FilletSkipped,
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildWarning::NonPathElements { count } => {
                write!(f, "{count} non-path element(s) ignored")
            }
            BuildWarning::UnsupportedSegment {
                path,
                segment,
                kind,
                reason,
            } => write!(
                f,
                "path {path} skipped: unsupported {kind} segment at index {segment}: {reason}"
            ),
            BuildWarning::EmptyPath { path } => write!(f, "path {path} draws nothing"),
            BuildWarning::UnknownSkipIndex { path } => {
                write!(f, "skip index {path} does not name a path")
            }
            BuildWarning::FeetSkipped => f.write_str("feet cut-out percentage is zero"),
            BuildWarning::FilletSkipped => f.write_str("fillet amount is zero"),
        }
    }
}
