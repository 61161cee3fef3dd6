#![forbid(unsafe_code)]

//! Paging configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```toml
//! folder = "state/undo"
//! window_capacity = 250
//! format = "binary"
//! ```
//!
//! The loaders parse only; call [`PagingConfig::validate`] (or let
//! [`DiskHistory::open`](crate::DiskHistory::open) do it) before use.

use std::path::{Path, PathBuf};

use pagedo_codec::ChunkFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or validating a [`PagingConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading a file.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// TOML parse error.
    #[cfg(feature = "config-files")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// JSON parse error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// Validation errors.
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

/// Where and how chunks are paged to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    /// Folder holding chunk files.
    pub folder: PathBuf,
    /// File-name prefix for executed chunks.
    pub executed_prefix: String,
    /// File-name prefix for undone chunks.
    pub undone_prefix: String,
    /// Commands per resident chunk.
    pub window_capacity: usize,
    /// Keep existing chunk files when a manager opens the folder.
    pub preserve_folder_state: bool,
    /// Interchange format of chunk files.
    pub format: ChunkFormat,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("temp/rollbacks"),
            executed_prefix: "E".into(),
            undone_prefix: "U".into(),
            window_capacity: 1000,
            preserve_folder_state: false,
            format: ChunkFormat::Json,
        }
    }
}

impl PagingConfig {
    /// Default configuration rooted at `folder`.
    #[must_use]
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            ..Self::default()
        }
    }

    /// Set the chunk folder.
    #[must_use]
    pub fn with_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.folder = folder.into();
        self
    }

    /// Set both file-name prefixes.
    #[must_use]
    pub fn with_prefixes(
        mut self,
        executed: impl Into<String>,
        undone: impl Into<String>,
    ) -> Self {
        self.executed_prefix = executed.into();
        self.undone_prefix = undone.into();
        self
    }

    /// Set the window capacity.
    #[must_use]
    pub fn with_window_capacity(mut self, capacity: usize) -> Self {
        self.window_capacity = capacity;
        self
    }

    /// Keep (or purge) pre-existing chunk files on open.
    #[must_use]
    pub fn with_preserve_folder_state(mut self, preserve: bool) -> Self {
        self.preserve_folder_state = preserve;
        self
    }

    /// Set the chunk format.
    #[must_use]
    pub fn with_format(mut self, format: ChunkFormat) -> Self {
        self.format = format;
        self
    }

    /// Load from a TOML string.
    #[cfg(feature = "config-files")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-files")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&read(path.as_ref())?)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_str(&read(path.as_ref())?)
    }

    /// Validate all parameters.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.window_capacity == 0 {
            errors.push("window_capacity must be > 0".into());
        }

        for (key, prefix) in [
            ("executed_prefix", &self.executed_prefix),
            ("undone_prefix", &self.undone_prefix),
        ] {
            if prefix.is_empty() {
                errors.push(format!("{key} must not be empty"));
                continue;
            }
            // `E1` + `2` would be indistinguishable from `E` + `12`.
            if prefix.ends_with(|c: char| c.is_ascii_digit()) {
                errors.push(format!("{key} must not end in a digit, got {prefix:?}"));
            }
            if prefix.contains(['/', '\\']) || prefix == "." || prefix == ".." {
                errors.push(format!("{key} must be a plain file name, got {prefix:?}"));
            }
        }

        if !self.executed_prefix.is_empty() && self.executed_prefix == self.undone_prefix {
            errors.push(format!(
                "executed_prefix and undone_prefix must differ, both are {:?}",
                self.executed_prefix
            ));
        }

        errors
    }

    /// [`validate`](Self::validate), folded into a `Result`.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PagingConfig::default();
        assert_eq!(config.folder, PathBuf::from("temp/rollbacks"));
        assert_eq!(config.executed_prefix, "E");
        assert_eq!(config.undone_prefix, "U");
        assert_eq!(config.window_capacity, 1000);
        assert!(!config.preserve_folder_state);
        assert_eq!(config.format, ChunkFormat::Json);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn builders_chain() {
        let config = PagingConfig::new("/tmp/x")
            .with_prefixes("Done", "Todo")
            .with_window_capacity(4)
            .with_preserve_folder_state(true)
            .with_format(ChunkFormat::Xml);
        assert_eq!(config.folder, PathBuf::from("/tmp/x"));
        assert_eq!(config.executed_prefix, "Done");
        assert_eq!(config.undone_prefix, "Todo");
        assert_eq!(config.window_capacity, 4);
        assert!(config.preserve_folder_state);
        assert_eq!(config.format, ChunkFormat::Xml);
    }

    #[test]
    fn zero_capacity_rejected() {
        let errors = PagingConfig::default().with_window_capacity(0).validate();
        assert_eq!(errors, vec!["window_capacity must be > 0".to_string()]);
    }

    #[test]
    fn bad_prefixes_rejected() {
        let cases = [
            ("", "U"),
            ("E", ""),
            ("E1", "U"),
            ("E", "sub/U"),
            ("E", "..\\U"),
            ("E", ".."),
            ("X", "X"),
        ];
        for (executed, undone) in cases {
            let config = PagingConfig::default().with_prefixes(executed, undone);
            assert!(
                !config.validate().is_empty(),
                "{executed:?}/{undone:?} should be rejected"
            );
        }
    }

    #[test]
    fn validated_wraps_errors() {
        let err = PagingConfig::default()
            .with_window_capacity(0)
            .validated()
            .unwrap_err();
        assert!(err.to_string().starts_with("validation errors: window_capacity"));
    }

    #[test]
    fn json_partial_overrides_defaults() {
        let config =
            PagingConfig::from_json_str(r#"{"window_capacity": 8, "format": "binary"}"#).unwrap();
        assert_eq!(config.window_capacity, 8);
        assert_eq!(config.format, ChunkFormat::Binary);
        assert_eq!(config.executed_prefix, "E");
    }

    #[test]
    fn json_rejects_unknown_format() {
        let err = PagingConfig::from_json_str(r#"{"format": "yaml"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[cfg(feature = "config-files")]
    #[test]
    fn toml_round_trip() {
        let config = PagingConfig::from_toml_str(
            r#"
            folder = "state/undo"
            executed_prefix = "Exec"
            undone_prefix = "Undo"
            preserve_folder_state = true
            format = "xml"
            "#,
        )
        .unwrap();
        assert_eq!(config.folder, PathBuf::from("state/undo"));
        assert_eq!(config.executed_prefix, "Exec");
        assert_eq!(config.window_capacity, 1000);
        assert!(config.preserve_folder_state);
        assert_eq!(config.format, ChunkFormat::Xml);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = PagingConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
