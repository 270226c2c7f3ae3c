//! Error variants.

use std::{error, fmt, result};

/// Result type with [`Error`] variants.
///
/// [`Error`]: ./enum.Error.html
pub type Result<T> = result::Result<T, Error>;

/// Error variants used in this crate.
///
/// All variants carry a message naming the offending entity. The library
/// does not attempt recovery; callers should discard partial output when
/// generation fails.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A connection could not be made or used: incompatible node types,
    /// a missing type mapping, or an edge queried against a node it does
    /// not belong to.
    ConnectivityError(String),
    /// A type could not be used where it was supplied: an undefined width
    /// on a concrete type, or a non-literal where a literal is required.
    TypeError(String),
    /// An index into a node array, flat type list or mapping matrix was
    /// out of bounds.
    IndexError(String),
    /// A pool entry was registered twice under the same name with a
    /// different structure.
    PoolError(String),
    /// A graph transformation could not determine the structure it needs,
    /// e.g. an edge endpoint without a parent during port-to-port
    /// resolution.
    TransformError(String),
    /// A back-end could not render its input.
    BackEndError(String),
    /// File I/O failed while writing generated sources.
    FileIOError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ConnectivityError(msg) => write!(f, "Connectivity error: {}", msg),
            Error::TypeError(msg) => write!(f, "Type error: {}", msg),
            Error::IndexError(msg) => write!(f, "Index error: {}", msg),
            Error::PoolError(msg) => write!(f, "Pool error: {}", msg),
            Error::TransformError(msg) => write!(f, "Transform error: {}", msg),
            Error::BackEndError(msg) => write!(f, "Back-end error: {}", msg),
            Error::FileIOError(msg) => write!(f, "File I/O error: {}", msg),
        }
    }
}

impl error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::FileIOError(error.to_string())
    }
}
