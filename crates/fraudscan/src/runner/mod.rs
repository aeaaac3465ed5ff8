pub mod executor;
pub mod result;
pub mod task;

pub use executor::{TaskExecutor, TaskRunner};
pub use result::AnalysisResult;
pub use task::{AnalysisTask, ProgramId};
