pub mod artwork;
pub mod bbox;
pub mod ids;
pub mod path;

pub use artwork::*;
pub use bbox::*;
pub use ids::*;
pub use path::*;
