//! Orthographic line-drawing preview of a tessellated block.
//!
//! Only feature edges are drawn: mesh edges on a boundary or where the two
//! adjacent facets meet at more than [`FEATURE_ANGLE_DEG`]. An edge is
//! visible when any adjacent facet faces the viewer, otherwise hidden.

use std::collections::HashMap;
use std::fmt::Write as _;

use block_kernel::RenderMesh;
use serde::{Deserialize, Serialize};

use crate::mesh::{triangle_normal, triangles, validate};
use crate::types::ExportError;

/// Facet angle above which a shared edge is drawn.
pub const FEATURE_ANGLE_DEG: f64 = 30.0;

/// Vertex welding grid, in mesh units.
const WELD_GRID: f64 = 1e-4;

/// Preview page and styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewOptions {
    pub width: f64,
    pub height: f64,
    pub margin_left: f64,
    pub margin_top: f64,
    /// Direction from the model towards the viewer.
    pub projection_dir: [f64; 3],
    pub stroke_width: f64,
    pub stroke_color: [u8; 3],
    pub hidden_color: [u8; 3],
    pub show_hidden: bool,
    pub show_axes: bool,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 400.0,
            margin_left: 60.0,
            margin_top: 60.0,
            projection_dir: [0.5, 0.5, 0.5],
            stroke_width: 1.6,
            stroke_color: [0, 0, 0],
            hidden_color: [140, 140, 140],
            show_hidden: true,
            show_axes: false,
        }
    }
}

/// A projected feature edge in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewEdge {
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub visible: bool,
}

type WeldKey = (i64, i64, i64);

fn weld(p: [f32; 3]) -> WeldKey {
    let q = |v: f32| (f64::from(v) / WELD_GRID).round() as i64;
    (q(p[0]), q(p[1]), q(p[2]))
}

/// Screen basis for a view direction: (right, up, towards viewer).
fn view_basis(dir: [f64; 3]) -> Result<([f64; 3], [f64; 3], [f64; 3]), ExportError> {
    let len = (dir[0] * dir[0] + dir[1] * dir[1] + dir[2] * dir[2]).sqrt();
    if !(len > 1e-12) || !len.is_finite() {
        return Err(ExportError::InvalidProjection { dir });
    }
    let d = [dir[0] / len, dir[1] / len, dir[2] / len];
    // Keep +Z up unless looking straight along it.
    let up_hint = if d[2].abs() > 1.0 - 1e-9 {
        [0.0, 1.0, 0.0]
    } else {
        [0.0, 0.0, 1.0]
    };
    let right = normalize(cross(up_hint, d));
    let up = cross(d, right);
    Ok((right, up, d))
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn normalize(a: [f64; 3]) -> [f64; 3] {
    let len = dot(a, a).sqrt();
    [a[0] / len, a[1] / len, a[2] / len]
}

fn widen(p: [f32; 3]) -> [f64; 3] {
    p.map(f64::from)
}

/// Feature edges of the mesh, projected and fitted to the page.
pub fn preview_edges(
    mesh: &RenderMesh,
    options: &PreviewOptions,
) -> Result<Vec<PreviewEdge>, ExportError> {
    validate(mesh)?;
    let (right, up, towards) = view_basis(options.projection_dir)?;

    // Welded edge -> (end points, normals of adjacent facets).
    let mut edges: HashMap<(WeldKey, WeldKey), ([f32; 3], [f32; 3], Vec<[f64; 3]>)> =
        HashMap::new();
    for tri in triangles(mesh) {
        let normal = widen(triangle_normal(tri[0], tri[1], tri[2]));
        for k in 0..3 {
            let (a, b) = (tri[k], tri[(k + 1) % 3]);
            let (ka, kb) = (weld(a), weld(b));
            if ka == kb {
                continue;
            }
            let key = if ka < kb { (ka, kb) } else { (kb, ka) };
            edges
                .entry(key)
                .or_insert_with(|| (a, b, Vec::new()))
                .2
                .push(normal);
        }
    }

    let threshold = FEATURE_ANGLE_DEG.to_radians().cos();
    let mut features: Vec<([f64; 3], [f64; 3], bool)> = edges
        .into_values()
        .filter(|(_, _, normals)| {
            normals.len() == 1
                || normals
                    .iter()
                    .any(|n| normals.iter().any(|m| dot(*n, *m) < threshold))
        })
        .map(|(a, b, normals)| {
            let visible = normals.iter().any(|n| dot(*n, towards) > 1e-9);
            (widen(a), widen(b), visible)
        })
        .collect();
    // Deterministic output order.
    features.sort_by(|x, y| {
        let key = |e: &([f64; 3], [f64; 3], bool)| (e.0[0], e.0[1], e.0[2], e.1[0], e.1[1], e.1[2]);
        key(x).partial_cmp(&key(y)).unwrap_or(std::cmp::Ordering::Equal)
    });

    let project = |p: [f64; 3]| (dot(p, right), -dot(p, up));
    let projected: Vec<((f64, f64), (f64, f64), bool)> = features
        .iter()
        .map(|&(a, b, visible)| (project(a), project(b), visible))
        .collect();

    let (mut min_x, mut max_x, mut min_y, mut max_y) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
    for &(a, b, _) in &projected {
        for (x, y) in [a, b] {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }
    let avail_w = (options.width - 2.0 * options.margin_left).max(1.0);
    let avail_h = (options.height - 2.0 * options.margin_top).max(1.0);
    let data_w = (max_x - min_x).max(1e-9);
    let data_h = (max_y - min_y).max(1e-9);
    let scale = (avail_w / data_w).min(avail_h / data_h);
    let offset_x = options.margin_left + (avail_w - data_w * scale) / 2.0;
    let offset_y = options.margin_top + (avail_h - data_h * scale) / 2.0;
    let fit = |(x, y): (f64, f64)| ((x - min_x) * scale + offset_x, (y - min_y) * scale + offset_y);

    Ok(projected
        .into_iter()
        .map(|(a, b, visible)| PreviewEdge {
            from: fit(a),
            to: fit(b),
            visible,
        })
        .collect())
}

fn rgb(c: [u8; 3]) -> String {
    format!("rgb({},{},{})", c[0], c[1], c[2])
}

/// Render the preview SVG document.
pub fn render_preview_svg(mesh: &RenderMesh, options: &PreviewOptions) -> Result<String, ExportError> {
    let edges = preview_edges(mesh, options)?;
    let stroke = rgb(options.stroke_color);
    let hidden = rgb(options.hidden_color);
    let sw = options.stroke_width;

    let mut svg = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(
        svg,
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n\
         <svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
        w = options.width,
        h = options.height,
    );

    if options.show_hidden {
        let _ = writeln!(
            svg,
            "  <g id=\"hidden\" stroke=\"{hidden}\" stroke-width=\"{sw}\" stroke-dasharray=\"{d},{d}\" fill=\"none\">",
            d = sw * 2.0
        );
        for e in edges.iter().filter(|e| !e.visible) {
            write_line(&mut svg, e);
        }
        svg.push_str("  </g>\n");
    }

    let _ = writeln!(
        svg,
        "  <g id=\"visible\" stroke=\"{stroke}\" stroke-width=\"{sw}\" fill=\"none\">"
    );
    for e in edges.iter().filter(|e| e.visible) {
        write_line(&mut svg, e);
    }
    svg.push_str("  </g>\n");

    if options.show_axes {
        write_axes(&mut svg, options)?;
    }

    svg.push_str("</svg>\n");
    Ok(svg)
}

fn write_line(svg: &mut String, e: &PreviewEdge) {
    let _ = writeln!(
        svg,
        "    <line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\"/>",
        e.from.0, e.from.1, e.to.0, e.to.1
    );
}

/// Axis triad in the lower-left corner.
fn write_axes(svg: &mut String, options: &PreviewOptions) -> Result<(), ExportError> {
    let (right, up, _) = view_basis(options.projection_dir)?;
    let origin = (options.margin_left / 2.0, options.height - options.margin_top / 2.0);
    let length = (options.margin_left.min(options.margin_top) / 2.0).max(10.0);
    let _ = writeln!(svg, "  <g id=\"axes\" stroke=\"rgb(0,0,255)\" stroke-width=\"1\">");
    for (label, axis) in [("X", [1.0, 0.0, 0.0]), ("Y", [0.0, 1.0, 0.0]), ("Z", [0.0, 0.0, 1.0])] {
        let tip = (
            origin.0 + dot(axis, right) * length,
            origin.1 - dot(axis, up) * length,
        );
        let _ = writeln!(
            svg,
            "    <line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\"/>\n    \
             <text x=\"{:.2}\" y=\"{:.2}\" font-family=\"monospace\" font-size=\"10\" stroke=\"none\" fill=\"rgb(0,0,255)\">{label}</text>",
            origin.0, origin.1, tip.0, tip.1, tip.0, tip.1
        );
    }
    svg.push_str("  </g>\n");
    Ok(())
}
