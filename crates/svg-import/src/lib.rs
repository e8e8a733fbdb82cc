//! SVG artwork import: outline paths, declared size and a count of the
//! elements that are not converted.

pub mod document;
pub mod path_data;
pub mod types;

pub use document::parse_document;
pub use path_data::parse_path_data;
pub use types::{ImportError, PathDataError};
