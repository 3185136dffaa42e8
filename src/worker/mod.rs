mod executor;
mod error;

pub use executor::{JobExecutor, JobHandle};
pub use error::{WorkerError, WorkerResult};
