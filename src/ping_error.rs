use std::{error::Error, fmt, io};

/// Errors that end a whole run. Per-attempt failures are reported as
/// [`crate::AttemptError`] through the outcome sink instead.
#[derive(Debug)]
pub enum PingError {
    /// The raw ICMP socket could not be opened, usually for lack of privilege.
    Open(io::Error),
    InvalidConfig(String),
}

impl PingError {
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, PingError::Open(e) if e.kind() == io::ErrorKind::PermissionDenied)
    }
}

impl fmt::Display for PingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "PingError")?;
        match self {
            PingError::Open(e) => write!(f, ": could not open raw ICMP socket: {e}"),
            PingError::InvalidConfig(message) if message.is_empty() => Ok(()),
            PingError::InvalidConfig(message) => write!(f, ": {message}"),
        }
    }
}

impl Error for PingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PingError::Open(e) => Some(e),
            PingError::InvalidConfig(_) => None,
        }
    }
}

impl From<io::Error> for PingError {
    fn from(error: io::Error) -> PingError {
        PingError::Open(error)
    }
}

pub type PingResult<T> = std::result::Result<T, PingError>;
