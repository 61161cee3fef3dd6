#![forbid(unsafe_code)]

use std::io;
use std::path::PathBuf;

use pagedo_codec::CodecError;
use pagedo_core::CommandError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors surfaced by [`DiskHistory`](crate::DiskHistory) and
/// [`ChunkStore`](crate::ChunkStore).
#[derive(Debug, Error)]
pub enum Error {
    /// A command's own execute or undo failed, or no context is bound.
    #[error(transparent)]
    Command(#[from] CommandError),
    /// A chunk could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A chunk file with the chosen name is already present.
    #[error("chunk file already exists: {}", path.display())]
    DestinationExists {
        /// Path that was about to be written.
        path: PathBuf,
    },
    /// Filesystem failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File or folder being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

/// Result alias for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
