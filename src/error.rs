//! Error types
//!
//! `ServeError` covers everything that can go wrong while answering a single
//! request and maps onto an HTTP status. `StartupError` covers everything that
//! stops the process before it starts listening.

use hyper::StatusCode;
use std::io;
use std::net::{AddrParseError, SocketAddr};
use thiserror::Error;

/// Per-request failure while resolving or reading an asset
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("asset not found")]
    NotFound,

    #[error("request escapes the asset root")]
    Forbidden,

    #[error("I/O error: {0}")]
    Internal(io::Error),
}

impl ServeError {
    /// Classify a filesystem error.
    ///
    /// Missing files, path components that are not directories and names
    /// the filesystem cannot hold (`ENAMETOOLONG`) are plain 404s; permission
    /// problems and everything else are server errors.
    pub fn from_io(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound
            | io::ErrorKind::NotADirectory
            | io::ErrorKind::InvalidFilename => Self::NotFound,
            _ => Self::Internal(err),
        }
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Failure before the server is accepting connections
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("invalid listen host '{host}': {source}")]
    InvalidAddress {
        host: String,
        source: AddrParseError,
    },

    #[error("asset root '{path}' is not usable: {reason}")]
    AssetRoot { path: String, reason: String },

    #[error("failed to bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
