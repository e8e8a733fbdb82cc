pub mod dispatch;
pub mod messages;
pub mod service;
pub mod store;
pub mod types;

pub use dispatch::{dispatch, dispatch_json};
pub use messages::{Request, Response};
pub use service::{analyze_artwork, Analysis, BlockService, BuildOutcome, KernelFactory};
pub use store::ArtifactStore;
pub use types::BridgeError;
