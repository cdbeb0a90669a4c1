use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Platform-layer error.
///
/// Anything that reaches the main loop as an `Err` is treated as fatal and routed
/// through [`crate::lifecycle::Lifecycle::fatal`]. Recoverable conditions never use this
/// type; they come back as `Option` or are swallowed at the call site.
#[derive(Debug, Error)]
pub enum SysError {
    /// Unrecoverable condition escalated by the host or raised during startup.
    #[error("{0}")]
    Fatal(String),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("config: {0}")]
    Config(String),
}

impl SysError {
    #[inline]
    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    #[inline]
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<&str> for SysError {
    #[inline]
    fn from(value: &str) -> Self {
        SysError::Fatal(value.to_string())
    }
}

impl From<String> for SysError {
    #[inline]
    fn from(value: String) -> Self {
        SysError::Fatal(value)
    }
}

pub type SysResult<T> = Result<T, SysError>;
