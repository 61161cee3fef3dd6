#![forbid(unsafe_code)]

//! Errors raised by commands while executing or undoing.

use thiserror::Error;

/// Result of command execution or undo.
pub type CommandResult = Result<(), CommandError>;

/// Errors that can occur during command execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// A type-erased command received a context of another concrete type.
    #[error("command context has the wrong type (expected `{expected}`)")]
    ContextType {
        /// Type name of the context the command operates on.
        expected: &'static str,
    },
    /// No context is bound.
    #[error("no context is bound to the command")]
    MissingContext,
    /// The context does not expose a field with this name.
    #[error("context has no field named `{0}`")]
    UnknownField(String),
    /// The context field cannot hold a value of this kind.
    #[error("field `{field}` cannot hold a {kind} value")]
    FieldType {
        /// Field that rejected the value.
        field: String,
        /// Kind of the rejected value (`bool`, `int`, `float`, `text`).
        kind: &'static str,
    },
    /// Command cannot be executed in its current state.
    #[error("invalid command state: {0}")]
    InvalidState(String),
}
