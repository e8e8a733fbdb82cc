use block_engine::{BuildOptions, BuildReport, BuildWarning};
use block_export::ExportOptions;
use block_ops::{ParameterOverrides, ScaleTier};
use block_types::ArtifactId;
use serde::{Deserialize, Serialize};

/// Messages from a client to the block service.
/// Serialized as JSON with a `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Measure the artwork without building anything.
    Analyze { svg: String },

    /// Build, export and store the preview and mesh artifacts.
    Build {
        svg: String,
        #[serde(default)]
        overrides: ParameterOverrides,
        #[serde(default)]
        options: BuildOptions,
        #[serde(default)]
        export: ExportOptions,
    },

    /// Retrieve a stored artifact by id.
    FetchArtifact { id: ArtifactId },

    /// Drop a stored artifact once the client has it.
    ReleaseArtifact { id: ArtifactId },
}

/// Messages from the block service back to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Response {
    Analysis {
        path_count: usize,
        /// Artwork width in source units.
        estimated_width: f64,
        /// Artwork height in source units.
        estimated_height: f64,
        scale_tier: ScaleTier,
        warnings: Vec<BuildWarning>,
    },

    /// The block was built; both artifacts are ready to fetch.
    Built {
        preview_id: ArtifactId,
        mesh_id: ArtifactId,
        triangle_count: usize,
        report: BuildReport,
    },

    Artifact {
        id: ArtifactId,
        media_type: String,
        file_name: String,
        /// Standard base64 of the artifact bytes.
        data: String,
    },

    Released { id: ArtifactId },

    /// The request failed; nothing was stored.
    Failed { message: String },
}
