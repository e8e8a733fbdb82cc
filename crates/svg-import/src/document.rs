use block_types::ArtworkDocument;
use regex::Regex;
use tracing::{debug, info, instrument};

use crate::path_data::parse_path_data;
use crate::types::ImportError;

/// Elements that are recognised but never converted.
const NON_PATH_ELEMENTS: &[&str] = &[
    "rect", "circle", "ellipse", "line", "polyline", "polygon", "text", "image", "g", "use",
];

struct Patterns {
    comment: Regex,
    root: Regex,
    path: Regex,
    d: Regex,
    other: Regex,
    width: Regex,
    height: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, ImportError> {
        Ok(Self {
            comment: Regex::new(r"(?s)<!--.*?-->")?,
            root: Regex::new(r"<svg\b([^>]*)>")?,
            path: Regex::new(r"<path\b([^>]*)>")?,
            d: Regex::new(r#"(?:^|\s)d\s*=\s*(?:"([^"]*)"|'([^']*)')"#)?,
            other: Regex::new(&format!(r"<({})\b", NON_PATH_ELEMENTS.join("|")))?,
            width: dimension_pattern("width")?,
            height: dimension_pattern("height")?,
        })
    }
}

/// Matches a length attribute and captures its numeric prefix.
fn dimension_pattern(name: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r#"(?:^|\s){name}\s*=\s*["']\s*([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)"#
    ))
}

/// Read an SVG document into an [`ArtworkDocument`].
///
/// Every `<path>` carrying a `d` attribute becomes one path, in document
/// order. Shapes, text, groups and references are counted but not
/// converted. The root's declared `width`/`height` are recorded with units
/// dropped.
#[instrument(skip_all, fields(bytes = svg.len()))]
pub fn parse_document(svg: &str) -> Result<ArtworkDocument, ImportError> {
    let patterns = Patterns::compile()?;
    let text = patterns.comment.replace_all(svg, "");

    let root = patterns
        .root
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .ok_or(ImportError::NotSvg)?
        .as_str();
    let declared_width = declared_length(&patterns.width, root);
    let declared_height = declared_length(&patterns.height, root);

    let mut document = ArtworkDocument {
        declared_width,
        declared_height,
        ..ArtworkDocument::default()
    };

    for caps in patterns.path.captures_iter(&text) {
        let attrs = caps.get(1).map_or("", |m| m.as_str());
        let Some(d) = patterns.d.captures(attrs) else {
            debug!("skipping <path> without path data");
            continue;
        };
        let data = d.get(1).or_else(|| d.get(2)).map_or("", |m| m.as_str());
        let index = document.paths.len();
        let path = parse_path_data(data).map_err(|source| ImportError::PathData {
            path: index,
            source,
        })?;
        debug!(index, segments = path.len(), "path imported");
        document.paths.push(path);
    }

    document.non_path_elements = patterns.other.find_iter(&text).count();

    info!(
        paths = document.paths.len(),
        non_path_elements = document.non_path_elements,
        "svg imported"
    );
    Ok(document)
}

fn declared_length(pattern: &Regex, attrs: &str) -> Option<f64> {
    pattern
        .captures(attrs)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
