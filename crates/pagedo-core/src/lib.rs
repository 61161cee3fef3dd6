#![forbid(unsafe_code)]

//! pagedo core
//!
//! Leaf abstractions shared by every other pagedo crate:
//!
//! - [`Command`] - a reversible unit of work over a context `C`
//! - [`CommandType`] / [`TypeTag`] - the static `(module, name)` tag used to
//!   rebuild a command from a persisted chunk
//! - [`PrimitiveWriter`] / [`PrimitiveReader`] - the field-ordered byte stream
//!   used by the binary chunk format
//! - [`ErasedCommand`] - the type-erased call boundary that checks the context
//!   type at runtime
//! - [`SetFieldCmd`] - a built-in command that sets a named field through
//!   [`FieldAccess`]
//!
//! # Role in pagedo
//! `pagedo-codec` turns slices of `Box<dyn Command<C>>` into chunk payloads and
//! back; `pagedo` pages those chunks between memory and disk. Neither needs to
//! know a concrete command type: everything goes through the traits here.

pub mod command;
pub mod erased;
pub mod error;
pub mod field;
pub mod float;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;
pub mod wire;

pub use command::{Command, CommandType, Persistable, TypeTag};
pub use erased::{Erased, ErasedCommand};
pub use error::{CommandError, CommandResult};
pub use field::{FieldAccess, FieldValue, SetFieldCmd};
pub use wire::{PrimitiveReader, PrimitiveWriter, WireError};
