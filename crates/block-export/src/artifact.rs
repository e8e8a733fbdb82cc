use block_engine::{Block, Finished};
use block_kernel::KernelBundle;
use block_types::ArtifactId;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::mesh::unscale_mesh;
use crate::preview::{render_preview_svg, PreviewOptions};
use crate::stl::{encode_stl, StlFormat};
use crate::types::ExportError;

/// Export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub format: StlFormat,
    /// Chordal tessellation tolerance in millimetres.
    pub tolerance: f64,
    /// Solid name written into the STL header.
    pub name: String,
    pub preview: PreviewOptions,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: StlFormat::Binary,
            tolerance: 0.01,
            name: "typeblock".to_string(),
            preview: PreviewOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    PreviewSvg,
    Stl,
}

impl ArtifactKind {
    pub fn media_type(self) -> &'static str {
        match self {
            ArtifactKind::PreviewSvg => "image/svg+xml",
            ArtifactKind::Stl => "model/stl",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::PreviewSvg => "svg",
            ArtifactKind::Stl => "stl",
        }
    }
}

/// One produced file under a server-generated id.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub id: ArtifactId,
    pub kind: ArtifactKind,
    pub bytes: Vec<u8>,
}

impl Artifact {
    fn new(kind: ArtifactKind, bytes: Vec<u8>) -> Self {
        Self {
            id: ArtifactId::generate(),
            kind,
            bytes,
        }
    }

    /// `<id>.<extension>`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.id, self.kind.extension())
    }
}

#[derive(Debug, Clone)]
pub struct ExportedBlock {
    pub preview: Artifact,
    pub mesh: Artifact,
    pub triangle_count: usize,
    /// Mesh bounds in millimetres, `(min, max)`.
    pub bounds: ([f32; 3], [f32; 3]),
}

/// Tessellate the finished block once, shrink it back to millimetres and
/// produce the preview and manufacturing artifacts. The block's solid is
/// released whatever the outcome.
#[instrument(skip_all, fields(scale_by = finished.scale_by()))]
pub fn export_block(
    finished: Block<Finished>,
    kernel: &mut dyn KernelBundle,
    options: &ExportOptions,
) -> Result<ExportedBlock, ExportError> {
    let scale_by = finished.scale_by();
    let solid = finished.into_solid();
    let tessellated = kernel.tessellate(&solid, options.tolerance * scale_by);
    kernel.release(solid);
    let mesh = unscale_mesh(tessellated?, scale_by)?;

    let preview = render_preview_svg(&mesh, &options.preview)?;
    let stl = encode_stl(&mesh, &options.name, options.format)?;
    let bounds = mesh_bounds(&mesh.vertices);

    let exported = ExportedBlock {
        preview: Artifact::new(ArtifactKind::PreviewSvg, preview.into_bytes()),
        mesh: Artifact::new(ArtifactKind::Stl, stl),
        triangle_count: mesh.triangle_count(),
        bounds,
    };
    info!(
        triangles = exported.triangle_count,
        preview = %exported.preview.id,
        mesh = %exported.mesh.id,
        "block exported"
    );
    Ok(exported)
}

fn mesh_bounds(vertices: &[f32]) -> ([f32; 3], [f32; 3]) {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];
    for v in vertices.chunks_exact(3) {
        for i in 0..3 {
            min[i] = min[i].min(v[i]);
            max[i] = max[i].max(v[i]);
        }
    }
    (min, max)
}
