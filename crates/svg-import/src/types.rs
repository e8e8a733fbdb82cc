/// Malformed path data, located by byte offset into the `d` attribute.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{reason} at offset {offset}")]
pub struct PathDataError {
    pub offset: usize,
    pub reason: String,
}

impl PathDataError {
    pub(crate) fn new(offset: usize, reason: impl Into<String>) -> Self {
        Self {
            offset,
            reason: reason.into(),
        }
    }
}

/// Errors while reading an SVG document.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ImportError {
    #[error("document has no <svg> root element")]
    NotSvg,

    #[error("path {path}: {source}")]
    PathData {
        path: usize,
        #[source]
        source: PathDataError,
    },

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}
