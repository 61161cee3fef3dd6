#![forbid(unsafe_code)]

//! The Do/Undo/Redo contract shared by history implementations.

use pagedo_core::Command;

use crate::error::Result;

/// A history that executes, undoes and redoes commands against a context.
///
/// UI layers and other consumers should depend on this trait, not on a
/// concrete history, and refresh whatever
/// [`affected_fields`](Command::affected_fields) the returned command names.
pub trait CommandManager<C> {
    /// The bound context, if any.
    fn context(&self) -> Option<&C>;

    /// Execute `cmd` and record it, discarding any redo branch.
    fn execute(&mut self, cmd: Box<dyn Command<C>>) -> Result<()>;

    /// Undo the most recent executed command; `None` if there is none.
    fn undo(&mut self) -> Result<Option<&dyn Command<C>>>;

    /// Redo the most recently undone command; `None` if there is none.
    fn redo(&mut self) -> Result<Option<&dyn Command<C>>>;

    /// Whether [`undo`](Self::undo) would return a command.
    fn can_undo(&self) -> bool;

    /// Whether [`redo`](Self::redo) would return a command.
    fn can_redo(&self) -> bool;
}
