use serde::{Deserialize, Serialize};

use crate::path::VectorPath;

/// A parsed vector artwork: its outline paths plus bookkeeping about
/// everything that was not converted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtworkDocument {
    /// Outline paths in document order. Indices into this list are the
    /// path numbers used by skip lists.
    pub paths: Vec<VectorPath>,
    /// Count of shapes, text, groups and other non-path elements seen.
    /// Informational only; they are never converted.
    pub non_path_elements: usize,
    /// Document-declared width, if any. Never used for sizing.
    pub declared_width: Option<f64>,
    /// Document-declared height, if any. Never used for sizing.
    pub declared_height: Option<f64>,
}

impl ArtworkDocument {
    pub fn from_paths(paths: Vec<VectorPath>) -> Self {
        Self {
            paths,
            ..Self::default()
        }
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }
}
