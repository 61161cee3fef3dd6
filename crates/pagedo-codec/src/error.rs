#![forbid(unsafe_code)]

use std::fmt;

use thiserror::Error;

use crate::format::ChunkFormat;

/// Errors raised while encoding or decoding a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A stored type tag (or XML element name) is not registered.
    #[error("unknown command type `{tag}`")]
    TypeResolution {
        /// The tag or element name that failed to resolve.
        tag: String,
    },
    /// The payload is structurally malformed for the resolved types.
    #[error("malformed {format} chunk: {reason}")]
    Deserialization {
        /// Format being decoded.
        format: ChunkFormat,
        /// What was wrong.
        reason: String,
    },
    /// A command cannot be rendered in this format.
    #[error("cannot encode {format} chunk: {reason}")]
    Serialization {
        /// Format being encoded.
        format: ChunkFormat,
        /// What was wrong.
        reason: String,
    },
}

impl CodecError {
    pub(crate) fn malformed(format: ChunkFormat, reason: impl fmt::Display) -> Self {
        Self::Deserialization {
            format,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn unencodable(format: ChunkFormat, reason: impl fmt::Display) -> Self {
        Self::Serialization {
            format,
            reason: reason.to_string(),
        }
    }

    /// Check if this is a [`CodecError::TypeResolution`].
    #[must_use]
    pub fn is_type_resolution(&self) -> bool {
        matches!(self, Self::TypeResolution { .. })
    }

    /// Check if this is a [`CodecError::Deserialization`].
    #[must_use]
    pub fn is_deserialization(&self) -> bool {
        matches!(self, Self::Deserialization { .. })
    }
}
