use block_ops::{estimate, resolve_parameters, resolve_tier, ParameterOverrides, ScaledParameters};
use block_types::ArtworkDocument;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::report::BuildReport;
use crate::types::{BuildError, BuildWarning};

/// Per-build switches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Path indices never interpreted or extruded.
    pub skip_paths: Vec<usize>,
    /// Round the outer edges after the feet are cut.
    pub fillet: bool,
}

impl BuildOptions {
    pub fn skips(&self, index: usize) -> bool {
        self.skip_paths.contains(&index)
    }
}

/// Everything one build reads and writes. Created fresh for every request.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub params: ScaledParameters,
    pub options: BuildOptions,
    pub report: BuildReport,
}

impl BuildContext {
    pub fn new(params: ScaledParameters, options: BuildOptions) -> Self {
        let report = BuildReport {
            scale_by: params.scale_by(),
            ..BuildReport::default()
        };
        Self {
            params,
            options,
            report,
        }
    }

    /// Estimate the artwork, pick its tier, apply overrides and scale once.
    pub fn prepare(
        document: &ArtworkDocument,
        overrides: &ParameterOverrides,
        options: BuildOptions,
    ) -> Result<Self, BuildError> {
        let bbox = estimate(&document.paths)?;
        let tier = resolve_tier(bbox.max_extent(), overrides);
        let params = resolve_parameters(bbox.max_extent(), overrides).scaled()?;
        info!(
            paths = document.path_count(),
            width = bbox.width(),
            height = bbox.height(),
            ?tier,
            scale_by = params.scale_by(),
            "prepared build"
        );

        let mut ctx = Self::new(params, options);
        ctx.report.path_count = document.path_count();
        ctx.report.estimate = Some(bbox);
        ctx.report.scale_tier = Some(tier);
        if document.non_path_elements > 0 {
            ctx.report.warn(BuildWarning::NonPathElements {
                count: document.non_path_elements,
            });
        }
        for &index in &ctx.options.skip_paths {
            if index >= document.path_count() {
                ctx.report.warn(BuildWarning::UnknownSkipIndex { path: index });
            }
        }
        Ok(ctx)
    }
}
