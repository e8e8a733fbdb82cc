use block_kernel::RenderMesh;

use crate::types::ExportError;

/// Divide every vertex coordinate by `scale_by`, returning the model to
/// millimetres. A factor of exactly 1 passes the mesh through untouched.
pub fn unscale_mesh(mut mesh: RenderMesh, scale_by: f64) -> Result<RenderMesh, ExportError> {
    if !scale_by.is_finite() || scale_by <= 0.0 {
        return Err(ExportError::InvalidScale { scale_by });
    }
    if scale_by != 1.0 {
        for v in &mut mesh.vertices {
            *v = (f64::from(*v) / scale_by) as f32;
        }
    }
    Ok(mesh)
}

/// Reject meshes the encoders cannot write.
pub(crate) fn validate(mesh: &RenderMesh) -> Result<(), ExportError> {
    if mesh.triangle_count() == 0 {
        return Err(ExportError::EmptyMesh);
    }
    let vertex_count = mesh.vertex_count();
    match mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
        Some(&index) => Err(ExportError::IndexOutOfRange {
            index,
            vertex_count,
        }),
        None => Ok(()),
    }
}

/// Unit normal of a triangle from its winding, or +Z when degenerate.
pub(crate) fn triangle_normal(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> [f32; 3] {
    let e1 = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let e2 = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    let n = [
        e1[1] * e2[2] - e1[2] * e2[1],
        e1[2] * e2[0] - e1[0] * e2[2],
        e1[0] * e2[1] - e1[1] * e2[0],
    ];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len > 1e-12 {
        [n[0] / len, n[1] / len, n[2] / len]
    } else {
        [0.0, 0.0, 1.0]
    }
}

/// Corner positions of every triangle.
pub(crate) fn triangles(mesh: &RenderMesh) -> impl Iterator<Item = [[f32; 3]; 3]> + '_ {
    mesh.indices.chunks_exact(3).map(move |tri| {
        [
            mesh.vertex(tri[0] as usize),
            mesh.vertex(tri[1] as usize),
            mesh.vertex(tri[2] as usize),
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad(scale: f32) -> RenderMesh {
        RenderMesh {
            vertices: [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.5, 0.0, 1.0, 0.5]
                .iter()
                .map(|v| v * scale)
                .collect(),
            normals: vec![],
            indices: vec![0, 1, 2, 0, 2, 3],
            face_ranges: vec![],
        }
    }

    #[test]
    fn unit_scale_is_exact_passthrough() {
        let mesh = quad(3.3);
        let out = unscale_mesh(mesh.clone(), 1.0).unwrap();
        assert_eq!(out.vertices, mesh.vertices);
    }

    #[test]
    fn scale_hundred_round_trip() {
        let original = quad(1.0);
        let scaled = quad(100.0);
        let restored = unscale_mesh(scaled, 100.0).unwrap();
        for (a, b) in restored.vertices.iter().zip(&original.vertices) {
            assert_relative_eq!(*a, *b, epsilon = 1e-6);
        }
        assert_eq!(restored.indices, original.indices);
    }

    #[test]
    fn bad_scale_is_rejected() {
        assert!(matches!(
            unscale_mesh(quad(1.0), 0.0),
            Err(ExportError::InvalidScale { .. })
        ));
        assert!(unscale_mesh(quad(1.0), f64::NAN).is_err());
    }

    #[test]
    fn validation_catches_bad_indices() {
        let mut mesh = quad(1.0);
        mesh.indices[4] = 9;
        assert!(matches!(
            validate(&mesh),
            Err(ExportError::IndexOutOfRange {
                index: 9,
                vertex_count: 4
            })
        ));
        mesh.indices.clear();
        assert!(matches!(validate(&mesh), Err(ExportError::EmptyMesh)));
    }

    #[test]
    fn normal_follows_winding() {
        let n = triangle_normal([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        assert_eq!(n, [0.0, 0.0, 1.0]);
        let flipped = triangle_normal([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]);
        assert_eq!(flipped, [0.0, 0.0, -1.0]);
    }
}
