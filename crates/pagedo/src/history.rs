#![forbid(unsafe_code)]

//! Disk-paged undo/redo history.
//!
//! [`DiskHistory`] keeps at most three chunks of commands in memory and pages
//! everything older (or further ahead) to a [`ChunkStore`]:
//!
//! ```text
//!            previous         current          next
//! disk E* ◄─┤ c0 .. c(k-1) │ c0 .. c(k-1) │ c0 .. c(k-1) ├─► disk U*
//!                                 ▲
//!                               cursor
//! ```
//!
//! Commands in `current` at or before the cursor are executed; those after it
//! are undone and kept for redo. `previous` holds only executed commands and
//! `next` only undone ones.
//!
//! # Rollovers
//!
//! - **Do** with a full `current`: `previous` is saved as an executed chunk,
//!   `current` becomes `previous`, and a fresh `current` starts.
//! - **Undo** past the start of `current`: `next` is saved as an undone chunk,
//!   the window slides back one chunk, and the newest executed chunk is loaded
//!   into `previous`.
//! - **Redo** past the end of `current`: `previous` is saved as an executed
//!   chunk, the window slides forward one chunk, and the newest undone chunk is
//!   loaded into `next`.
//!
//! A Do after any undo discards the redo branch: the undone tail of
//! `current`, all of `next`, and every undone chunk file.
//!
//! # Invariants
//!
//! 1. `-1 <= cursor() < |current|`
//! 2. `resident_len() <= 3 * window_capacity`
//! 3. A chunk is either resident or persisted, never both
//! 4. If a command's own execute or undo fails, the cursor does not move

use std::fmt;
use std::mem;

use pagedo_codec::CommandRegistry;
use pagedo_core::{Command, CommandError};

use crate::config::PagingConfig;
use crate::error::Result;
use crate::manager::CommandManager;
use crate::store::{ChunkKind, ChunkStore};

type Chunk<C> = Vec<Box<dyn Command<C>>>;

/// Undo/redo history with bounded resident memory.
pub struct DiskHistory<C> {
    /// Executed chunk behind `current`.
    previous: Chunk<C>,
    /// Chunk holding the cursor.
    current: Chunk<C>,
    /// Undone chunk ahead of `current`.
    next: Chunk<C>,
    /// Number of executed commands in `current` (`cursor + 1`).
    executed: usize,
    context: Option<C>,
    store: ChunkStore<C>,
    config: PagingConfig,
}

impl<C> fmt::Debug for DiskHistory<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskHistory")
            .field("previous_len", &self.previous.len())
            .field("current_len", &self.current.len())
            .field("next_len", &self.next.len())
            .field("cursor", &self.cursor())
            .field("has_context", &self.context.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl<C: 'static> DiskHistory<C> {
    /// Open a history over `config.folder`.
    ///
    /// The config is validated first. Unless
    /// [`preserve_folder_state`](PagingConfig::preserve_folder_state) is set,
    /// chunk files left by an earlier run are purged.
    pub fn open(config: PagingConfig, registry: CommandRegistry<C>) -> Result<Self> {
        let config = config.validated()?;
        let store = ChunkStore::new(&config, registry);
        if !config.preserve_folder_state {
            store.purge_all()?;
        }
        tracing::debug!(
            target: "pagedo.history",
            folder = %config.folder.display(),
            capacity = config.window_capacity,
            format = %config.format,
            preserve = config.preserve_folder_state,
            "history opened"
        );
        Ok(Self {
            previous: Vec::new(),
            current: Vec::new(),
            next: Vec::new(),
            executed: 0,
            context: None,
            store,
            config,
        })
    }
}

impl<C> DiskHistory<C> {
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

    /// The bound context.
    #[must_use]
    pub fn context(&self) -> Option<&C> {
        self.context.as_ref()
    }

    /// The bound context, mutably.
    pub fn context_mut(&mut self) -> Option<&mut C> {
        self.context.as_mut()
    }

    /// Configuration this history was opened with.
    #[must_use]
    pub fn config(&self) -> &PagingConfig {
        &self.config
    }

    /// The backing chunk store.
    #[must_use]
    pub fn store(&self) -> &ChunkStore<C> {
        &self.store
    }

    /// Index of the last executed command in `current`; `-1` when none.
    #[must_use]
    pub fn cursor(&self) -> isize {
        // Vec lengths never exceed isize::MAX.
        self.executed as isize - 1
    }

    /// Lengths of `(previous, current, next)`.
    #[must_use]
    pub fn window_lens(&self) -> (usize, usize, usize) {
        (self.previous.len(), self.current.len(), self.next.len())
    }

    /// Commands held in memory.
    #[must_use]
    pub fn resident_len(&self) -> usize {
        self.previous.len() + self.current.len() + self.next.len()
    }

    /// Whether [`undo`](Self::undo) would return a command.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.executed > 0 || !self.previous.is_empty()
    }

    /// Whether [`redo`](Self::redo) would return a command.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.executed < self.current.len() || !self.next.is_empty()
    }

    fn capacity(&self) -> usize {
        self.config.window_capacity
    }
}

impl<C: 'static> DiskHistory<C> {
    /// Execute `cmd` against the context and record it.
    ///
    /// Discards any redo branch. The command is executed before any disk I/O;
    /// if execution fails, nothing is recorded.
    pub fn execute(&mut self, mut cmd: Box<dyn Command<C>>) -> Result<()> {
        let ctx = self.context.as_mut().ok_or(CommandError::MissingContext)?;
        cmd.execute(ctx)?;

        if !self.next.is_empty() {
            self.store.purge(ChunkKind::Undone)?;
            self.next.clear();
        }

        if self.executed >= self.capacity() {
            self.roll_full()?;
        } else {
            self.current.truncate(self.executed);
        }

        self.current.push(cmd);
        self.executed = self.current.len();
        Ok(())
    }

    /// Undo the command at the cursor.
    ///
    /// Returns `None` when there is nothing to undo. The returned command has
    /// already been undone.
    pub fn undo(&mut self) -> Result<Option<&dyn Command<C>>> {
        if !self.can_undo() {
            return Ok(None);
        }
        if self.context.is_none() {
            return Err(CommandError::MissingContext.into());
        }
        if self.executed == 0 {
            // Only after an interrupted rollover; finish it first.
            self.shift_back()?;
        }

        let index = self.executed - 1;
        let ctx = self.context.as_mut().ok_or(CommandError::MissingContext)?;
        self.current[index].undo(ctx)?;
        self.executed = index;

        if self.executed == 0 && !self.previous.is_empty() {
            self.shift_back()?;
            return Ok(self.next.first().map(|cmd| &**cmd));
        }
        Ok(Some(&*self.current[index]))
    }

    /// Re-execute the command after the cursor.
    ///
    /// Returns `None` when there is nothing to redo.
    pub fn redo(&mut self) -> Result<Option<&dyn Command<C>>> {
        if !self.can_redo() {
            return Ok(None);
        }
        if self.context.is_none() {
            return Err(CommandError::MissingContext.into());
        }
        if self.executed >= self.current.len() {
            self.shift_forward()?;
        }

        let index = self.executed;
        let ctx = self.context.as_mut().ok_or(CommandError::MissingContext)?;
        self.current[index].execute(ctx)?;
        self.executed = index + 1;
        Ok(Some(&*self.current[index]))
    }

    /// Drop every resident command and purge all chunk files.
    ///
    /// The context is kept.
    pub fn clear(&mut self) -> Result<()> {
        self.previous.clear();
        self.current.clear();
        self.next.clear();
        self.executed = 0;
        self.store.purge_all()?;
        Ok(())
    }

    // ========================================================================
    // Rollovers
    // ========================================================================

    /// `current` is full of executed commands: retire it to `previous`.
    fn roll_full(&mut self) -> Result<()> {
        let _span = tracing::debug_span!(
            target: "pagedo.history",
            "pagedo.rollover",
            direction = "do",
            capacity = self.capacity(),
        )
        .entered();

        if !self.previous.is_empty() {
            self.store.save(ChunkKind::Executed, &self.previous)?;
        }
        self.previous = mem::take(&mut self.current);
        self.executed = 0;

        tracing::debug!(
            target: "pagedo.history",
            previous = self.previous.len(),
            "window advanced on do"
        );
        Ok(())
    }

    /// Slide the window back one chunk.
    fn shift_back(&mut self) -> Result<()> {
        let _span = tracing::debug_span!(
            target: "pagedo.history",
            "pagedo.rollover",
            direction = "undo",
            capacity = self.capacity(),
        )
        .entered();

        if !self.next.is_empty() {
            self.store.save(ChunkKind::Undone, &self.next)?;
        }
        let loaded = self.store.load_latest(ChunkKind::Executed)?;
        let current = mem::replace(&mut self.previous, loaded);
        self.next = mem::replace(&mut self.current, current);
        self.executed = self.current.len();

        tracing::debug!(
            target: "pagedo.history",
            previous = self.previous.len(),
            current = self.current.len(),
            next = self.next.len(),
            "window shifted back"
        );
        Ok(())
    }

    /// Slide the window forward one chunk.
    fn shift_forward(&mut self) -> Result<()> {
        let _span = tracing::debug_span!(
            target: "pagedo.history",
            "pagedo.rollover",
            direction = "redo",
            capacity = self.capacity(),
        )
        .entered();

        if !self.previous.is_empty() {
            self.store.save(ChunkKind::Executed, &self.previous)?;
        }
        let loaded = self.store.load_latest(ChunkKind::Undone)?;
        let current = mem::replace(&mut self.next, loaded);
        self.previous = mem::replace(&mut self.current, current);
        self.executed = 0;

        tracing::debug!(
            target: "pagedo.history",
            previous = self.previous.len(),
            current = self.current.len(),
            next = self.next.len(),
            "window shifted forward"
        );
        Ok(())
    }
}

impl<C> Drop for DiskHistory<C> {
    fn drop(&mut self) {
        if self.config.preserve_folder_state {
            return;
        }
        if let Err(err) = self.store.purge_all() {
            tracing::warn!(
                target: "pagedo.history",
                folder = %self.config.folder.display(),
                error = %err,
                "failed to purge chunk files on drop"
            );
        }
    }
}

impl<C: 'static> CommandManager<C> for DiskHistory<C> {
    fn context(&self) -> Option<&C> {
        Self::context(self)
    }

    fn execute(&mut self, cmd: Box<dyn Command<C>>) -> Result<()> {
        Self::execute(self, cmd)
    }

    fn undo(&mut self) -> Result<Option<&dyn Command<C>>> {
        Self::undo(self)
    }

    fn redo(&mut self) -> Result<Option<&dyn Command<C>>> {
        Self::redo(self)
    }

    fn can_undo(&self) -> bool {
        Self::can_undo(self)
    }

    fn can_redo(&self) -> bool {
        Self::can_redo(self)
    }
}
