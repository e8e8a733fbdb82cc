use block_engine::BuildError;
use block_export::ExportError;
use block_types::ArtifactId;
use svg_import::ImportError;

/// Errors from the service layer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BridgeError {
    #[error("import failed: {0}")]
    Import(#[from] ImportError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("export failed: {0}")]
    Export(#[from] ExportError),

    #[error("no artifact with id {id}")]
    UnknownArtifact { id: ArtifactId },

    #[error("serialization error: {reason}")]
    Serialization { reason: String },
}
