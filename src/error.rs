use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("pool error: {0}")]
    Pool(String),

    #[error("task failed: {0}")]
    TaskFailed(String),

    #[error("task panicked: {0}")]
    TaskPanicked(String),

    #[error("task exceeded deadline of {0:?}")]
    DeadlineExceeded(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn pool<S: Into<String>>(msg: S) -> Self {
        Error::Pool(msg.into())
    }

    pub fn task<S: Into<String>>(msg: S) -> Self {
        Error::TaskFailed(msg.into())
    }

    /// True for the deadline variant. `WorkPool::wait` detaches instead of
    /// joining a worker stuck in an abandoned task when this is the first error.
    pub fn is_deadline(&self) -> bool {
        matches!(self, Error::DeadlineExceeded(_))
    }
}
