#![forbid(unsafe_code)]

//! Serializer trait and format selection.

use std::fmt;

use pagedo_core::Command;
use serde::{Deserialize, Serialize};

use crate::binary::BinarySerializer;
use crate::error::CodecError;
use crate::json::JsonSerializer;
use crate::registry::CommandRegistry;
use crate::xml::XmlSerializer;

/// Version marker written at the head of binary and XML chunks.
pub const CHUNK_FORMAT_VERSION: &str = "pagedo-chunk-v1";

/// Interchange format of persisted chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkFormat {
    /// Field-ordered primitive stream.
    Binary,
    /// Top-level JSON array.
    #[default]
    Json,
    /// XML document over a pre-registered set of element names.
    Xml,
}

impl ChunkFormat {
    /// Every supported format.
    pub const ALL: [Self; 3] = [Self::Binary, Self::Json, Self::Xml];

    /// Build the serializer for this format.
    #[must_use]
    pub fn serializer<C: 'static>(self) -> Box<dyn ChunkSerializer<C>> {
        match self {
            Self::Binary => Box::new(BinarySerializer),
            Self::Json => Box::new(JsonSerializer),
            Self::Xml => Box::new(XmlSerializer),
        }
    }

    /// Lowercase name, as used in configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }
}

impl fmt::Display for ChunkFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encodes an ordered chunk of commands to one payload and back.
pub trait ChunkSerializer<C> {
    /// Format produced by this serializer.
    fn format(&self) -> ChunkFormat;

    /// Encode `commands` in order.
    fn encode(
        &self,
        commands: &[Box<dyn Command<C>>],
        registry: &CommandRegistry<C>,
    ) -> Result<Vec<u8>, CodecError>;

    /// Decode a payload produced by [`encode`](ChunkSerializer::encode).
    fn decode(
        &self,
        bytes: &[u8],
        registry: &CommandRegistry<C>,
    ) -> Result<Vec<Box<dyn Command<C>>>, CodecError>;
}
