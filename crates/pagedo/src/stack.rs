#![forbid(unsafe_code)]

//! Unbounded in-memory history.
//!
//! Two stacks, no paging. [`StackHistory`] defines the behaviour a paged
//! history must reproduce, which makes it the oracle for differential tests
//! of [`DiskHistory`](crate::DiskHistory).
//!
//! ```text
//! execute(c3)          undo()               execute(c4)
//! undo:  [c1, c2, c3]  undo:  [c1, c2]      undo:  [c1, c2, c4]
//! redo:  []            redo:  [c3]          redo:  []
//! ```

use std::fmt;

use pagedo_core::{Command, CommandError};

use crate::error::Result;
use crate::manager::CommandManager;

/// In-memory undo/redo stacks.
pub struct StackHistory<C> {
    /// Executed commands (newest at back).
    undo_stack: Vec<Box<dyn Command<C>>>,
    /// Undone commands (most recently undone at back).
    redo_stack: Vec<Box<dyn Command<C>>>,
    context: Option<C>,
}

impl<C> fmt::Debug for StackHistory<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackHistory")
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("has_context", &self.context.is_some())
            .finish()
    }
}

impl<C> Default for StackHistory<C> {
    fn default() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            context: None,
        }
    }
}

impl<C> StackHistory<C> {
    /// Create an empty history with no context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the context commands operate on.
    #[must_use]
    pub fn with_context(mut self, context: C) -> Self {
        self.context = Some(context);
        self
    }

    /// Bind a new context, returning the previous one.
    pub fn set_context(&mut self, context: C) -> Option<C> {
        self.context.replace(context)
    }

    /// Unbind and return the context.
    pub fn take_context(&mut self) -> Option<C> {
        self.context.take()
    }

    /// The bound context, mutably.
    pub fn context_mut(&mut self) -> Option<&mut C> {
        self.context.as_mut()
    }

    /// Number of commands that can be undone.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of commands that can be redone.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Drop all history. The context is kept.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl<C: 'static> CommandManager<C> for StackHistory<C> {
    fn context(&self) -> Option<&C> {
        self.context.as_ref()
    }

    fn execute(&mut self, mut cmd: Box<dyn Command<C>>) -> Result<()> {
        let ctx = self.context.as_mut().ok_or(CommandError::MissingContext)?;
        cmd.execute(ctx)?;
        self.redo_stack.clear();
        self.undo_stack.push(cmd);
        Ok(())
    }

    fn undo(&mut self) -> Result<Option<&dyn Command<C>>> {
        let Some(cmd) = self.undo_stack.last_mut() else {
            return Ok(None);
        };
        let ctx = self.context.as_mut().ok_or(CommandError::MissingContext)?;
        cmd.undo(ctx)?;
        if let Some(cmd) = self.undo_stack.pop() {
            self.redo_stack.push(cmd);
        }
        Ok(self.redo_stack.last().map(|cmd| &**cmd))
    }

    fn redo(&mut self) -> Result<Option<&dyn Command<C>>> {
        let Some(cmd) = self.redo_stack.last_mut() else {
            return Ok(None);
        };
        let ctx = self.context.as_mut().ok_or(CommandError::MissingContext)?;
        cmd.execute(ctx)?;
        if let Some(cmd) = self.redo_stack.pop() {
            self.undo_stack.push(cmd);
        }
        Ok(self.undo_stack.last().map(|cmd| &**cmd))
    }

    fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}
