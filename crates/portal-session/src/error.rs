use thiserror::Error;

/// Failure of the best-effort remote session termination call.
///
/// Never surfaced to the user: the logout invoker logs it and carries on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("server answered with status {0}")]
    Status(u16),
    #[error("request rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuardError {
    #[error("inactivity timeout must be greater than zero")]
    InvalidTimeout,
    #[error("mailbox capacity must be greater than zero")]
    InvalidCapacity,
    #[error("no activity events configured")]
    NoActivityEvents,
    #[error("guard did not answer within {0:?}")]
    Timeout(std::time::Duration),
    #[error("guard is no longer running")]
    Closed,
    #[error("guard task failed: {0}")]
    TaskFailed(String),
}
