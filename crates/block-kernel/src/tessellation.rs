//! Tessellation wrapper with face-range metadata.
//!
//! Wraps truck-meshalgo to produce RenderMesh with FaceRange entries whose
//! face ids match the ones handed out by face selection.

use crate::types::*;
use truck_meshalgo::prelude::*;
use truck_meshalgo::tessellation::MeshableShape;

type TruckSolid = truck_modeling::Solid;

/// Tessellate a truck Solid into a RenderMesh with per-face tracking.
///
/// `face_id_base` is added to each face's index in shell iteration order.
pub fn tessellate_solid(
    solid: &TruckSolid,
    tolerance: f64,
    face_id_base: u64,
) -> std::result::Result<RenderMesh, KernelError> {
    let meshed_solid = solid.triangulation(tolerance);

    let mut all_vertices: Vec<f32> = Vec::new();
    let mut all_normals: Vec<f32> = Vec::new();
    let mut all_indices: Vec<u32> = Vec::new();
    let mut face_ranges: Vec<FaceRange> = Vec::new();

    let faces = meshed_solid
        .boundaries()
        .iter()
        .flat_map(|shell| shell.face_iter());
    for (face_index, face) in faces.enumerate() {
        let maybe_mesh: Option<PolygonMesh> = face.surface();
        let Some(mut face_mesh) = maybe_mesh else {
            return Err(KernelError::TessellationFailed {
                reason: format!("face {face_index} could not be triangulated"),
            });
        };
        if !face.orientation() {
            face_mesh.invert();
        }

        let start_index = all_indices.len() as u32;
        let base_vertex = (all_vertices.len() / 3) as u32;

        let positions = face_mesh.positions();
        let normals = face_mesh.normals();
        for pos in positions {
            all_vertices.extend_from_slice(&[pos[0] as f32, pos[1] as f32, pos[2] as f32]);
        }
        if normals.len() == positions.len() {
            for n in normals {
                all_normals.extend_from_slice(&[n[0] as f32, n[1] as f32, n[2] as f32]);
            }
        } else {
            all_normals.extend(std::iter::repeat([0.0f32, 0.0, 1.0]).take(positions.len()).flatten());
        }

        // triangle_iter also splits any quads and polygons the mesher emits.
        for tri in face_mesh.faces().triangle_iter() {
            for v in tri.iter() {
                all_indices.push(v.pos as u32 + base_vertex);
            }
        }

        let end_index = all_indices.len() as u32;
        if end_index > start_index {
            face_ranges.push(FaceRange {
                face_id: KernelId(face_id_base + face_index as u64),
                start_index,
                end_index,
            });
        }
    }

    if all_indices.is_empty() {
        return Err(KernelError::TessellationFailed {
            reason: "solid produced no triangles".to_string(),
        });
    }

    Ok(RenderMesh {
        vertices: all_vertices,
        normals: all_normals,
        indices: all_indices,
        face_ranges,
    })
}
