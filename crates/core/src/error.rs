#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("No task registered with id: {0}")]
    UnknownTaskType(String),

    #[error("Queue exceeds maximum size")]
    QueueFull,

    #[error("Running tasks can't be cancelled: {0}")]
    CannotCancelRunning(String),

    #[error("Task already exists: {0}")]
    DuplicateTaskType(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}
