#![forbid(unsafe_code)]

//! Type-erased command boundary.
//!
//! Hosts that route commands for several document types through one queue can
//! hold them as `Box<dyn ErasedCommand>` and pass the context as `dyn Any`.
//! The concrete context type is checked on every call:
//!
//! - no context → [`CommandError::MissingContext`]
//! - a context of another type → [`CommandError::ContextType`]

use std::any::{Any, type_name};
use std::fmt;

use crate::command::{Command, TypeTag};
use crate::error::{CommandError, CommandResult};

/// A command whose context type is only known at runtime.
pub trait ErasedCommand {
    /// Execute against a dynamically typed context.
    fn execute_erased(&mut self, ctx: Option<&mut dyn Any>) -> CommandResult;

    /// Undo against a dynamically typed context.
    fn undo_erased(&mut self, ctx: Option<&mut dyn Any>) -> CommandResult;

    /// Tag of the wrapped command.
    fn erased_tag(&self) -> TypeTag;
}

/// Adapter from a typed [`Command<C>`] to [`ErasedCommand`].
pub struct Erased<C> {
    inner: Box<dyn Command<C>>,
}

impl<C: 'static> fmt::Debug for Erased<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Erased")
            .field("inner", &self.inner)
            .field("context", &type_name::<C>())
            .finish()
    }
}

impl<C: 'static> Erased<C> {
    /// Wrap a typed command.
    #[must_use]
    pub fn new(inner: Box<dyn Command<C>>) -> Self {
        Self { inner }
    }

    /// Borrow the wrapped command.
    #[must_use]
    pub fn inner(&self) -> &dyn Command<C> {
        self.inner.as_ref()
    }

    /// Unwrap the typed command.
    #[must_use]
    pub fn into_inner(self) -> Box<dyn Command<C>> {
        self.inner
    }
}

fn bind<'a, C: 'static>(ctx: Option<&'a mut dyn Any>) -> Result<&'a mut C, CommandError> {
    ctx.ok_or(CommandError::MissingContext)?
        .downcast_mut::<C>()
        .ok_or(CommandError::ContextType {
            expected: type_name::<C>(),
        })
}

impl<C: 'static> ErasedCommand for Erased<C> {
    fn execute_erased(&mut self, ctx: Option<&mut dyn Any>) -> CommandResult {
        self.inner.execute(bind::<C>(ctx)?)
    }

    fn undo_erased(&mut self, ctx: Option<&mut dyn Any>) -> CommandResult {
        self.inner.undo(bind::<C>(ctx)?)
    }

    fn erased_tag(&self) -> TypeTag {
        self.inner.type_tag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandType;
    use crate::testing::{SetText, Sheet};

    fn erased(text: &str) -> Box<dyn ErasedCommand> {
        Box::new(Erased::<Sheet>::new(Box::new(SetText::new(text))))
    }

    #[test]
    fn matching_context_executes_and_undoes() {
        let mut sheet = Sheet::new("before");
        let mut cmd = erased("after");

        cmd.execute_erased(Some(&mut sheet)).unwrap();
        assert_eq!(sheet.text, "after");
        cmd.undo_erased(Some(&mut sheet)).unwrap();
        assert_eq!(sheet.text, "before");
    }

    #[test]
    fn missing_context_is_rejected() {
        let mut cmd = erased("x");
        assert_eq!(cmd.execute_erased(None), Err(CommandError::MissingContext));
        assert_eq!(cmd.undo_erased(None), Err(CommandError::MissingContext));
    }

    #[test]
    fn wrong_context_type_is_rejected() {
        let mut cmd = erased("x");
        let mut wrong = String::from("not a sheet");
        let err = cmd.execute_erased(Some(&mut wrong)).unwrap_err();
        assert_eq!(
            err,
            CommandError::ContextType {
                expected: type_name::<Sheet>()
            }
        );
        assert_eq!(wrong, "not a sheet");
    }

    #[test]
    fn tag_passes_through() {
        let cmd = erased("x");
        assert_eq!(cmd.erased_tag(), SetText::TYPE_TAG);
    }
}
