use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Requested size was less than one bit.
    InvalidSize(i64),
    /// The backing buffer could not be reserved.
    OutOfMemory { bytes: usize },
    /// No live array behind the handle.
    InvalidHandle,
    IndexOutOfBounds { index: i64, size: usize },
    Parse { line: usize, message: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSize(size) => {
                write!(f, "bit array must be larger than 0 bits, got {}", size)
            }
            Self::OutOfMemory { bytes } => {
                write!(f, "could not allocate {} bytes for bit array", bytes)
            }
            Self::InvalidHandle => write!(f, "bit array handle is not valid"),
            Self::IndexOutOfBounds { index, size } => write!(
                f,
                "cannot access bit {} outside of a bit array of size {}",
                index, size
            ),
            Self::Parse { line, message } => write!(f, "line {}: {}", line, message),
        }
    }
}

impl std::error::Error for Error {}
