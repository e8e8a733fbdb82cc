use block_engine::{run_pipeline, BuildContext, BuildOptions, BuildReport, BuildWarning};
use block_export::{export_block, Artifact, ExportOptions, ExportedBlock};
use block_kernel::KernelBundle;
use block_ops::{estimate, ParameterOverrides, ScaleTier};
use block_types::{ArtifactId, BoundingBox};
use svg_import::parse_document;
use tracing::{debug, info, instrument};

use crate::store::ArtifactStore;
use crate::types::BridgeError;

/// Measure the artwork and pick its scale tier. Needs no kernel.
#[instrument(skip_all)]
pub fn analyze_artwork(svg: &str) -> Result<Analysis, BridgeError> {
    let document = parse_document(svg)?;
    let bounds = estimate(&document.paths).map_err(block_engine::BuildError::from)?;
    let mut warnings = Vec::new();
    if document.non_path_elements > 0 {
        warnings.push(BuildWarning::NonPathElements {
            count: document.non_path_elements,
        });
    }
    Ok(Analysis {
        path_count: document.path_count(),
        bounds,
        scale_tier: ScaleTier::for_extent(bounds.max_extent()),
        warnings,
    })
}

/// Creates a fresh kernel for every build.
pub type KernelFactory = Box<dyn Fn() -> Box<dyn KernelBundle>>;

/// Result of measuring an artwork.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub path_count: usize,
    pub bounds: BoundingBox,
    pub scale_tier: ScaleTier,
    pub warnings: Vec<BuildWarning>,
}

/// Result of a successful build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    pub preview_id: ArtifactId,
    pub mesh_id: ArtifactId,
    pub triangle_count: usize,
    pub report: BuildReport,
}

/// Accepts artwork, runs builds and keeps the produced artifacts.
///
/// Builds share nothing but the artifact store: each one gets its own
/// [`BuildContext`] and its own kernel from the factory.
pub struct BlockService {
    kernels: KernelFactory,
    pub artifacts: ArtifactStore,
}

impl BlockService {
    pub fn new(kernels: KernelFactory) -> Self {
        Self {
            kernels,
            artifacts: ArtifactStore::new(),
        }
    }

    /// See [`analyze_artwork`].
    pub fn analyze(&self, svg: &str) -> Result<Analysis, BridgeError> {
        analyze_artwork(svg)
    }

    /// Import, build and export one block, storing both artifacts.
    /// Nothing is stored when any step fails.
    #[instrument(skip_all)]
    pub fn build(
        &mut self,
        svg: &str,
        overrides: &ParameterOverrides,
        options: BuildOptions,
        export: &ExportOptions,
    ) -> Result<BuildOutcome, BridgeError> {
        let document = parse_document(svg)?;
        let mut ctx = BuildContext::prepare(&document, overrides, options)?;
        let mut kernel = (self.kernels)();
        let finished = run_pipeline(&document.paths, &mut ctx, &mut *kernel)?;
        let ExportedBlock {
            preview,
            mesh,
            triangle_count,
            ..
        } = export_block(finished, &mut *kernel, export)?;

        let preview_id = self.artifacts.insert(preview);
        let mesh_id = self.artifacts.insert(mesh);
        info!(%preview_id, %mesh_id, triangle_count, "build stored");
        Ok(BuildOutcome {
            preview_id,
            mesh_id,
            triangle_count,
            report: ctx.report,
        })
    }

    pub fn fetch(&self, id: ArtifactId) -> Result<&Artifact, BridgeError> {
        self.artifacts
            .get(&id)
            .ok_or(BridgeError::UnknownArtifact { id })
    }

    /// Remove an artifact from the store and hand it back.
    pub fn release(&mut self, id: ArtifactId) -> Result<Artifact, BridgeError> {
        let artifact = self
            .artifacts
            .remove(&id)
            .ok_or(BridgeError::UnknownArtifact { id })?;
        debug!(%id, remaining = self.artifacts.len(), "artifact released");
        Ok(artifact)
    }
}
