//! Protocol grouper errors.

use thiserror::Error;
use tokio::task::JoinError;

#[derive(Debug, Error)]
pub enum GrouperError {
    #[error("protocol grouper is already running")]
    AlreadyRunning,

    #[error("protocol grouper is not running")]
    NotRunning,

    #[error("update task failed: {0}")]
    Task(#[from] JoinError),
}
