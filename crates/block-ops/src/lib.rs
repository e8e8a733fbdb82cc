pub mod arc;
pub mod estimate;
pub mod profile;
pub mod scale;
pub mod types;

pub use arc::{arc_endpoint_to_center, ArcShape, CenterArc};
pub use estimate::{estimate, path_bounds, segment_bounds};
pub use profile::interpret_path;
pub use scale::{
    derive_defaults, resolve_parameters, resolve_tier, BlockParameters, ParameterOverrides, ScaleTier,
    ScaledParameters, TierDefaults, BODY_OFFSET,
};
pub use types::*;
