pub mod bundle;
pub mod mock_kernel;
#[cfg(feature = "truck")]
pub mod tessellation;
pub mod traits;
#[cfg(feature = "truck")]
pub mod truck_kernel;
pub mod types;

pub use bundle::KernelBundle;
pub use mock_kernel::{MockKernel, MockOp};
pub use traits::*;
#[cfg(feature = "truck")]
pub use truck_kernel::TruckKernel;
pub use types::*;
