#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("A batch run is already in progress")]
    Busy,

    #[error("Batch run failed: {0}")]
    ProcessingError(String),

    #[error("Worker state error: {0}")]
    StateError(String),

    #[error(transparent)]
    DownsizerError(#[from] crate::utils::DownsizerError),
}

pub type WorkerResult<T> = Result<T, WorkerError>;

impl From<tokio::sync::TryAcquireError> for WorkerError {
    fn from(err: tokio::sync::TryAcquireError) -> Self {
        match err {
            tokio::sync::TryAcquireError::NoPermits => WorkerError::Busy,
            tokio::sync::TryAcquireError::Closed => {
                WorkerError::StateError("Executor has been shut down".to_string())
            }
        }
    }
}

impl From<tokio::task::JoinError> for WorkerError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            WorkerError::ProcessingError("Batch worker panicked".to_string())
        } else {
            WorkerError::ProcessingError(format!("Batch worker was aborted: {}", err))
        }
    }
}
