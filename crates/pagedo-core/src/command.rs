#![forbid(unsafe_code)]

//! Reversible command trait and the type tags that make it persistable.
//!
//! A command is split across three traits so that concrete types only write
//! what is specific to them:
//!
//! - [`CommandType`] declares the static [`TypeTag`] of a command type.
//! - [`Persistable`] is blanket-implemented for every `CommandType` that is
//!   also `Serialize + DeserializeOwned`. It gives trait objects a tag, a
//!   downcast hook, and a structured (`serde_json::Value`) view of their
//!   fields.
//! - [`Command<C>`] is the Do/Undo contract plus the primitive-stream field
//!   order used by the binary chunk format.
//!
//! # Invariants
//!
//! - `execute()` followed by `undo()` on an unmodified context restores the
//!   context's observable state exactly.
//! - `read_fields()` consumes exactly the bytes `write_fields()` produced, in
//!   the same order.
//! - `populate_structured(to_structured())` reproduces every serialized field.
//!
//! # Example
//!
//! ```
//! use pagedo_core::{
//!     Command, CommandResult, CommandType, PrimitiveReader, PrimitiveWriter, TypeTag, WireError,
//! };
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct Bump {
//!     by: i64,
//! }
//!
//! impl CommandType for Bump {
//!     const TYPE_TAG: TypeTag = TypeTag::new_static("doc", "Bump");
//! }
//!
//! impl Command<i64> for Bump {
//!     fn execute(&mut self, ctx: &mut i64) -> CommandResult {
//!         *ctx += self.by;
//!         Ok(())
//!     }
//!
//!     fn undo(&mut self, ctx: &mut i64) -> CommandResult {
//!         *ctx -= self.by;
//!         Ok(())
//!     }
//!
//!     fn write_fields(&self, out: &mut PrimitiveWriter) {
//!         out.write_i64(self.by);
//!     }
//!
//!     fn read_fields(&mut self, input: &mut PrimitiveReader<'_>) -> Result<(), WireError> {
//!         self.by = input.read_i64()?;
//!         Ok(())
//!     }
//! }
//!
//! let mut value = 1;
//! let mut cmd = Bump { by: 41 };
//! cmd.execute(&mut value).unwrap();
//! assert_eq!(value, 42);
//! cmd.undo(&mut value).unwrap();
//! assert_eq!(value, 1);
//! ```

use std::any::Any;
use std::borrow::Cow;
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CommandResult;
use crate::wire::{PrimitiveReader, PrimitiveWriter, WireError};

/// Out-of-band identifier of a concrete command type.
///
/// Stored next to every persisted command so a decoder can pick the right
/// constructor. Tags compare by value, so a tag read back from disk equals the
/// statically declared one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag {
    module: Cow<'static, str>,
    name: Cow<'static, str>,
}

impl TypeTag {
    /// Create a tag from static strings (usable in `const` items).
    #[must_use]
    pub const fn new_static(module: &'static str, name: &'static str) -> Self {
        Self {
            module: Cow::Borrowed(module),
            name: Cow::Borrowed(name),
        }
    }

    /// Create a tag from owned strings, e.g. when decoding.
    #[must_use]
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: Cow::Owned(module.into()),
            name: Cow::Owned(name.into()),
        }
    }

    /// Module (or crate path) part of the tag.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Type name part of the tag.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module, self.name)
    }
}

/// Static declaration of a command type's tag.
pub trait CommandType {
    /// Tag written next to every persisted instance.
    const TYPE_TAG: TypeTag;
}

/// Object-safe persistence hooks, blanket-implemented for every
/// [`CommandType`] that serde can round-trip.
pub trait Persistable: Any {
    /// Tag of the concrete type behind this value.
    fn type_tag(&self) -> TypeTag;

    /// Downcast hook.
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast hook.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Structured view of the public fields (for tree-document formats).
    fn to_structured(&self) -> serde_json::Result<serde_json::Value>;

    /// Replace this value's fields with the ones in `value`.
    fn populate_structured(&mut self, value: serde_json::Value) -> serde_json::Result<()>;
}

impl<T> Persistable for T
where
    T: CommandType + Serialize + DeserializeOwned + Any,
{
    fn type_tag(&self) -> TypeTag {
        T::TYPE_TAG
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn to_structured(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    fn populate_structured(&mut self, value: serde_json::Value) -> serde_json::Result<()> {
        *self = serde_json::from_value(value)?;
        Ok(())
    }
}

/// A reversible command operating on a context of type `C`.
///
/// Persistable command types must also implement `Default`: the registry in
/// `pagedo-codec` builds an empty instance first and then fills it in.
///
/// `f64` fields that can be NaN or infinite need
/// `#[serde(with = "pagedo_core::float")]`; plain serde writes them as `null`
/// in the JSON and XML formats, and that chunk can no longer be decoded.
pub trait Command<C>: Persistable {
    /// Apply the command's effect to `ctx`.
    fn execute(&mut self, ctx: &mut C) -> CommandResult;

    /// Revert the effect applied by [`execute`](Command::execute).
    fn undo(&mut self, ctx: &mut C) -> CommandResult;

    /// Identifiers of the context fields this command may change.
    ///
    /// Metadata for observers; the history never reads it.
    fn affected_fields(&self) -> &[String] {
        &[]
    }

    /// Restore the affected-field list read back from a binary chunk.
    fn set_affected_fields(&mut self, _fields: Vec<String>) {}

    /// Write the type-specific fields, in the type's own order.
    fn write_fields(&self, out: &mut PrimitiveWriter);

    /// Read the fields written by [`write_fields`](Command::write_fields).
    fn read_fields(&mut self, input: &mut PrimitiveReader<'_>) -> Result<(), WireError>;
}

impl<C: 'static> fmt::Debug for dyn Command<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("type_tag", &self.type_tag())
            .field("affected_fields", &self.affected_fields())
            .finish()
    }
}

impl<C: 'static> dyn Command<C> {
    /// Downcast to a concrete command type.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Mutable downcast to a concrete command type.
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}
