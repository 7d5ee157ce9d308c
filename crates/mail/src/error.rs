use std::fmt;

/// Transport failure for one party. Caught per party; never aborts the run.
#[derive(Debug)]
pub enum DispatchError {
    /// An address failed to parse into a mailbox.
    Address(String),
    /// The message could not be assembled.
    Message(String),
    /// The transport rejected the send. Carries the transport's error
    /// message verbatim.
    Transport(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(msg) => write!(f, "invalid address: {msg}"),
            Self::Message(msg) => write!(f, "cannot build message: {msg}"),
            Self::Transport(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for DispatchError {}

/// Append failure on one of the run's append-only text logs.
#[derive(Debug)]
pub struct AuditError(pub String);

impl fmt::Display for AuditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot append to log: {}", self.0)
    }
}

impl std::error::Error for AuditError {}

/// Dedup store failure.
#[derive(Debug)]
pub struct DedupError(pub String);

impl fmt::Display for DedupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dedup store error: {}", self.0)
    }
}

impl std::error::Error for DedupError {}
