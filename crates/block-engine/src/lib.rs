pub mod context;
pub mod pipeline;
pub mod report;
mod sketch;
pub mod types;

pub use context::{BuildContext, BuildOptions};
pub use pipeline::{
    run_pipeline, Block, Boxed, Empty, FeetCut, Filleted, Finished, Hollowed, Necked, PyramidCut,
    SolidStage,
};
pub use report::BuildReport;
pub use types::{BuildError, BuildStage, BuildWarning};
