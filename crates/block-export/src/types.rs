use block_kernel::KernelError;

/// Errors from mesh correction, encoding and artifact production.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExportError {
    #[error("mesh has no triangles")]
    EmptyMesh,

    #[error("triangle index {index} out of range (vertex count = {vertex_count})")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("invalid scale factor {scale_by}")]
    InvalidScale { scale_by: f64 },

    #[error("invalid projection direction {dir:?}")]
    InvalidProjection { dir: [f64; 3] },

    #[error("tessellation failed: {0}")]
    Tessellation(#[from] KernelError),
}
