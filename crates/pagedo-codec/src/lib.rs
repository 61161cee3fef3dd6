#![forbid(unsafe_code)]

//! pagedo codec
//!
//! Turns a chunk (an ordered slice of `Box<dyn Command<C>>`) into one payload
//! and back, keeping every command's concrete type.
//!
//! # Formats
//!
//! | [`ChunkFormat`] | Serializer           | Type information                          |
//! |-----------------|----------------------|-------------------------------------------|
//! | `Binary`        | [`BinarySerializer`] | `(module, name)` strings before each record |
//! | `Json`          | [`JsonSerializer`]   | `$module` / `$type` sidecar keys          |
//! | `Xml`           | [`XmlSerializer`]    | element name from the registry's closed set |
//!
//! Decoding always goes through [`CommandRegistry`]: read the tag, build an
//! empty instance with the registered constructor, then fill it in with the
//! format's field-read step. An unknown tag is a
//! [`CodecError::TypeResolution`]; a malformed payload is a
//! [`CodecError::Deserialization`].

pub mod binary;
pub mod error;
pub mod format;
pub mod json;
pub mod registry;
pub mod xml;

pub use binary::BinarySerializer;
pub use error::CodecError;
pub use format::{CHUNK_FORMAT_VERSION, ChunkFormat, ChunkSerializer};
pub use json::JsonSerializer;
pub use registry::CommandRegistry;
pub use xml::XmlSerializer;
