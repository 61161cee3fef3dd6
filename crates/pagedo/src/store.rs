#![forbid(unsafe_code)]

//! On-disk chunk files.
//!
//! Each persisted chunk is one file in the configured folder, named by a
//! prefix and a sequence number with no extension:
//!
//! ```text
//! temp/rollbacks/
//!   E1  E2  E3       executed chunks, oldest first
//!   U1  U2           undone chunks, oldest first
//! ```
//!
//! Sequence numbers are compared numerically (`E10` follows `E9`). The next
//! number for a prefix is the current maximum plus one, starting at 1.
//!
//! # Invariants
//!
//! 1. A file is never overwritten: [`ChunkStore::save`] opens with create-new
//!    semantics and reports [`Error::DestinationExists`] instead.
//! 2. [`ChunkStore::load_latest`] deletes the file only after it decoded
//!    successfully, so a chunk lives either in memory or on disk, never both.
//! 3. Only names of the exact form `<prefix><digits>` are touched; other files
//!    in the folder are left alone.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use pagedo_codec::{ChunkFormat, ChunkSerializer, CommandRegistry};
use pagedo_core::Command;

use crate::config::PagingConfig;
use crate::error::{Error, Result};

/// Which side of the cursor a persisted chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkKind {
    /// Commands behind the cursor (reachable by undo).
    Executed,
    /// Commands ahead of the cursor (reachable by redo).
    Undone,
}

impl ChunkKind {
    /// Both kinds.
    pub const ALL: [Self; 2] = [Self::Executed, Self::Undone];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Executed => "executed",
            Self::Undone => "undone",
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads and writes chunk files for one folder and prefix pair.
pub struct ChunkStore<C> {
    folder: PathBuf,
    executed_prefix: String,
    undone_prefix: String,
    serializer: Box<dyn ChunkSerializer<C>>,
    registry: CommandRegistry<C>,
}

impl<C> fmt::Debug for ChunkStore<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkStore")
            .field("folder", &self.folder)
            .field("executed_prefix", &self.executed_prefix)
            .field("undone_prefix", &self.undone_prefix)
            .field("format", &self.serializer.format())
            .field("registry", &self.registry)
            .finish()
    }
}

impl<C: 'static> ChunkStore<C> {
    /// Create a store for `config`'s folder, prefixes and format.
    ///
    /// Nothing is touched on disk until the first save, load or purge.
    #[must_use]
    pub fn new(config: &PagingConfig, registry: CommandRegistry<C>) -> Self {
        Self {
            folder: config.folder.clone(),
            executed_prefix: config.executed_prefix.clone(),
            undone_prefix: config.undone_prefix.clone(),
            serializer: config.format.serializer(),
            registry,
        }
    }
}

impl<C> ChunkStore<C> {
    /// Folder holding the chunk files.
    #[must_use]
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Chunk format in use.
    #[must_use]
    pub fn format(&self) -> ChunkFormat {
        self.serializer.format()
    }

    /// Registry used to decode chunks.
    #[must_use]
    pub fn registry(&self) -> &CommandRegistry<C> {
        &self.registry
    }

    /// File-name prefix for `kind`.
    #[must_use]
    pub fn prefix(&self, kind: ChunkKind) -> &str {
        match kind {
            ChunkKind::Executed => &self.executed_prefix,
            ChunkKind::Undone => &self.undone_prefix,
        }
    }

    /// Path of chunk `seq` of `kind`.
    #[must_use]
    pub fn path_for(&self, kind: ChunkKind, seq: u64) -> PathBuf {
        self.folder.join(format!("{}{seq}", self.prefix(kind)))
    }

    fn parse_seq(&self, kind: ChunkKind, file_name: &str) -> Option<u64> {
        let digits = file_name.strip_prefix(self.prefix(kind))?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// Persisted sequence numbers of `kind`, ascending.
    ///
    /// A missing folder has no chunks.
    pub fn sequence_numbers(&self, kind: ChunkKind) -> Result<Vec<u64>> {
        let entries = match fs::read_dir(&self.folder) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(Error::io(&self.folder)(err)),
        };

        let mut seqs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(Error::io(&self.folder))?;
            let is_file = entry
                .file_type()
                .map_err(Error::io(entry.path()))?
                .is_file();
            if !is_file {
                continue;
            }
            if let Some(seq) = entry
                .file_name()
                .to_str()
                .and_then(|name| self.parse_seq(kind, name))
            {
                seqs.push(seq);
            }
        }
        seqs.sort_unstable();
        Ok(seqs)
    }

    /// Sequence number the next [`save`](Self::save) of `kind` will use.
    pub fn next_sequence(&self, kind: ChunkKind) -> Result<u64> {
        Ok(self
            .sequence_numbers(kind)?
            .last()
            .map_or(1, |max| max.saturating_add(1)))
    }

    /// Persist `chunk` as the next file of `kind` and return its path.
    pub fn save(&self, kind: ChunkKind, chunk: &[Box<dyn Command<C>>]) -> Result<PathBuf> {
        let seq = self.next_sequence(kind)?;
        self.save_at(kind, seq, chunk)
    }

    /// Persist `chunk` as file `seq` of `kind`.
    ///
    /// Fails with [`Error::DestinationExists`] if that name is taken.
    pub fn save_at(
        &self,
        kind: ChunkKind,
        seq: u64,
        chunk: &[Box<dyn Command<C>>],
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.folder).map_err(Error::io(&self.folder))?;
        let bytes = self.serializer.encode(chunk, &self.registry)?;
        let path = self.path_for(kind, seq);

        write_new(&path, |file| file.write_all(&bytes).and_then(|()| file.flush()))?;

        tracing::debug!(
            target: "pagedo.store",
            path = %path.display(),
            kind = kind.as_str(),
            seq,
            commands = chunk.len(),
            bytes = bytes.len(),
            "chunk saved"
        );
        Ok(path)
    }

    /// Load and delete the highest-numbered chunk of `kind`.
    ///
    /// Returns an empty chunk when none is persisted. A file that fails to
    /// decode is left in place.
    pub fn load_latest(&self, kind: ChunkKind) -> Result<Vec<Box<dyn Command<C>>>> {
        let Some(seq) = self.sequence_numbers(kind)?.pop() else {
            tracing::trace!(target: "pagedo.store", kind = kind.as_str(), "no chunk to load");
            return Ok(Vec::new());
        };
        let path = self.path_for(kind, seq);
        let bytes = fs::read(&path).map_err(Error::io(&path))?;
        let chunk = self.serializer.decode(&bytes, &self.registry)?;
        fs::remove_file(&path).map_err(Error::io(&path))?;

        tracing::debug!(
            target: "pagedo.store",
            path = %path.display(),
            kind = kind.as_str(),
            seq,
            commands = chunk.len(),
            "chunk loaded"
        );
        Ok(chunk)
    }

    /// Delete every chunk file of `kind`. Returns how many were removed.
    pub fn purge(&self, kind: ChunkKind) -> Result<usize> {
        let seqs = self.sequence_numbers(kind)?;
        for &seq in &seqs {
            let path = self.path_for(kind, seq);
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(Error::io(path)(err)),
            }
        }
        if !seqs.is_empty() {
            tracing::debug!(
                target: "pagedo.store",
                path = %self.folder.display(),
                kind = kind.as_str(),
                removed = seqs.len(),
                "chunks purged"
            );
        }
        Ok(seqs.len())
    }

    /// Delete every chunk file of both kinds.
    pub fn purge_all(&self) -> Result<usize> {
        let mut removed = 0;
        for kind in ChunkKind::ALL {
            removed += self.purge(kind)?;
        }
        Ok(removed)
    }
}

/// Create `path` (which must not exist) and fill it with `write`.
///
/// A failed write removes the partial file so it is never loaded as a chunk.
fn write_new(path: &Path, write: impl FnOnce(&mut File) -> io::Result<()>) -> Result<()> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            return Err(Error::DestinationExists {
                path: path.to_path_buf(),
            });
        }
        Err(err) => return Err(Error::io(path)(err)),
    };
    if let Err(err) = write(&mut file) {
        drop(file);
        if let Err(cleanup) = fs::remove_file(path) {
            tracing::warn!(
                target: "pagedo.store",
                path = %path.display(),
                error = %cleanup,
                "failed to remove partial chunk file"
            );
        }
        return Err(Error::io(path)(err));
    }
    Ok(())
}
