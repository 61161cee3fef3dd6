#![forbid(unsafe_code)]

//! Disk-paged undo/redo.
//!
//! [`DiskHistory`] records commands like an ordinary undo stack but keeps only
//! three fixed-size chunks of them in memory. Older chunks are written to a
//! folder and read back when undo or redo reaches them, so history depth is
//! limited by disk, not RAM.
//!
//! # Example
//!
//! ```no_run
//! use pagedo::{ChunkFormat, CommandRegistry, DiskHistory, PagingConfig, SetFieldCmd};
//! use pagedo::{CommandError, FieldAccess, FieldValue};
//!
//! #[derive(Default)]
//! struct Doc {
//!     title: String,
//! }
//!
//! impl FieldAccess for Doc {
//!     fn read_field(&self, name: &str) -> Result<FieldValue, CommandError> {
//!         match name {
//!             "title" => Ok(self.title.clone().into()),
//!             _ => Err(CommandError::UnknownField(name.into())),
//!         }
//!     }
//!
//!     fn apply_field(&mut self, name: &str, value: FieldValue) -> Result<(), CommandError> {
//!         match (name, value) {
//!             ("title", FieldValue::Text(t)) => self.title = t,
//!             (_, v) => {
//!                 return Err(CommandError::FieldType { field: name.into(), kind: v.kind() });
//!             }
//!         }
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> pagedo::Result<()> {
//! let config = PagingConfig::new("temp/rollbacks")
//!     .with_window_capacity(500)
//!     .with_format(ChunkFormat::Binary);
//! let registry = CommandRegistry::new().with::<SetFieldCmd>();
//!
//! let mut history = DiskHistory::open(config, registry)?.with_context(Doc::default());
//! history.execute(Box::new(SetFieldCmd::new("title", "Draft")))?;
//! history.undo()?;
//! assert_eq!(history.context().map(|d| d.title.as_str()), Some(""));
//! # Ok(())
//! # }
//! ```
//!
//! # Crates
//!
//! - `pagedo-core`: the [`Command`] trait, type tags and the primitive wire
//!   stream.
//! - `pagedo-codec`: [`CommandRegistry`] and the binary, JSON and XML chunk
//!   serializers.
//! - `pagedo` (this crate): configuration, the chunk store and the histories.

pub mod config;
pub mod error;
pub mod history;
pub mod manager;
pub mod stack;
pub mod store;

pub use config::{ConfigError, PagingConfig};
pub use error::{Error, Result};
pub use history::DiskHistory;
pub use manager::CommandManager;
pub use stack::StackHistory;
pub use store::{ChunkKind, ChunkStore};

pub use pagedo_codec::{
    CHUNK_FORMAT_VERSION, ChunkFormat, ChunkSerializer, CodecError, CommandRegistry,
};
pub use pagedo_core::{
    Command, CommandError, CommandResult, CommandType, Erased, ErasedCommand, FieldAccess,
    FieldValue, Persistable, PrimitiveReader, PrimitiveWriter, SetFieldCmd, TypeTag, WireError,
};
