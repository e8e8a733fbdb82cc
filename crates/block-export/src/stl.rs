//! STL encoding of a render mesh, binary and ASCII.
//!
//! Facet normals are recomputed from the triangle winding; the mesh's
//! per-vertex normals are not consulted.

use block_kernel::RenderMesh;
use serde::{Deserialize, Serialize};

use crate::mesh::{triangle_normal, triangles, validate};
use crate::types::ExportError;

/// STL flavour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StlFormat {
    #[default]
    Binary,
    Ascii,
}

/// Encode a mesh in the requested flavour.
pub fn encode_stl(mesh: &RenderMesh, name: &str, format: StlFormat) -> Result<Vec<u8>, ExportError> {
    match format {
        StlFormat::Binary => encode_binary_stl(mesh, name),
        StlFormat::Ascii => encode_ascii_stl(mesh, name).map(String::into_bytes),
    }
}

/// Binary STL:
/// - 80 bytes: header
/// - 4 bytes: u32 LE triangle count
/// - 50 bytes per triangle: normal and 3 vertices (12 × f32 LE), then a
///   zero u16 attribute count
pub fn encode_binary_stl(mesh: &RenderMesh, name: &str) -> Result<Vec<u8>, ExportError> {
    validate(mesh)?;
    let tri_count = mesh.triangle_count();
    let mut buf = Vec::with_capacity(84 + tri_count * 50);

    let header = format!("typeblock binary STL: {name}");
    let header = header.as_bytes();
    buf.extend_from_slice(&header[..header.len().min(80)]);
    buf.resize(80, 0u8);
    buf.extend_from_slice(&(tri_count as u32).to_le_bytes());

    for [a, b, c] in triangles(mesh) {
        let normal = triangle_normal(a, b, c);
        for value in normal.iter().chain(&a).chain(&b).chain(&c) {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        buf.extend_from_slice(&0u16.to_le_bytes());
    }
    Ok(buf)
}

pub fn encode_ascii_stl(mesh: &RenderMesh, name: &str) -> Result<String, ExportError> {
    validate(mesh)?;
    let mut out = String::with_capacity(mesh.triangle_count() * 256);
    out.push_str(&format!("solid {name}\n"));
    for [a, b, c] in triangles(mesh) {
        let [nx, ny, nz] = triangle_normal(a, b, c);
        out.push_str(&format!("  facet normal {nx} {ny} {nz}\n"));
        out.push_str("    outer loop\n");
        for [x, y, z] in [a, b, c] {
            out.push_str(&format!("      vertex {x} {y} {z}\n"));
        }
        out.push_str("    endloop\n");
        out.push_str("  endfacet\n");
    }
    out.push_str(&format!("endsolid {name}\n"));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> RenderMesh {
        RenderMesh {
            vertices: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            normals: vec![],
            indices: vec![0, 1, 2],
            face_ranges: vec![],
        }
    }

    fn read_f32(buf: &[u8], at: usize) -> f32 {
        f32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
    }

    #[test]
    fn binary_single_triangle_layout() {
        let stl = encode_binary_stl(&triangle(), "tri").unwrap();
        assert_eq!(stl.len(), 134);
        assert!(stl.starts_with(b"typeblock binary STL: tri"));
        assert_eq!(u32::from_le_bytes([stl[80], stl[81], stl[82], stl[83]]), 1);
        // Normal z, then the second vertex x.
        assert_eq!(read_f32(&stl, 92), 1.0);
        assert_eq!(read_f32(&stl, 108), 1.0);
        assert_eq!(&stl[132..134], &[0, 0]);
    }

    #[test]
    fn long_names_are_truncated_in_the_header() {
        let name = "n".repeat(200);
        let stl = encode_binary_stl(&triangle(), &name).unwrap();
        assert_eq!(stl.len(), 134);
    }

    #[test]
    fn ascii_structure() {
        let text = encode_ascii_stl(&triangle(), "block").unwrap();
        assert!(text.starts_with("solid block\n"));
        assert!(text.ends_with("endsolid block\n"));
        assert_eq!(text.matches("facet normal 0 0 1").count(), 1);
        assert_eq!(text.matches("vertex ").count(), 3);
    }

    #[test]
    fn empty_mesh_is_rejected() {
        let empty = RenderMesh {
            vertices: vec![],
            normals: vec![],
            indices: vec![],
            face_ranges: vec![],
        };
        assert!(matches!(
            encode_stl(&empty, "x", StlFormat::Binary),
            Err(ExportError::EmptyMesh)
        ));
        assert!(encode_stl(&empty, "x", StlFormat::Ascii).is_err());
    }
}
