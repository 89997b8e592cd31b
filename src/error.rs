use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Device control operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    GetDeviceInfo,
    GetDoorbell,
    SendFeedback,
    SendReset,
    Read,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::GetDeviceInfo => write!(f, "GET_DEVICE_INFO"),
            Op::GetDoorbell => write!(f, "GET_DOORBELL"),
            Op::SendFeedback => write!(f, "SEND_FEEDBACK"),
            Op::SendReset => write!(f, "SEND_RESET"),
            Op::Read => write!(f, "READ"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("{op} failed: {source}")]
    Transport { op: Op, source: io::Error },

    #[error("failed to read config {}: {source}", path.display())]
    Config { path: PathBuf, source: io::Error },

    #[error("failed to parse config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid screen size {width}x{height}, both dimensions must be positive")]
    InvalidSize { width: f64, height: f64 },
}

impl Error {
    pub(crate) fn transport(op: Op) -> impl FnOnce(io::Error) -> Self {
        move |source| Error::Transport { op, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
