pub mod artifact;
pub mod mesh;
pub mod preview;
pub mod stl;
pub mod types;

pub use artifact::{export_block, Artifact, ArtifactKind, ExportOptions, ExportedBlock};
pub use mesh::unscale_mesh;
pub use preview::{preview_edges, render_preview_svg, PreviewEdge, PreviewOptions};
pub use stl::{encode_ascii_stl, encode_binary_stl, encode_stl, StlFormat};
pub use types::ExportError;
