#![forbid(unsafe_code)]

//! Named-field mutation without reflection.
//!
//! A context opts in by implementing [`FieldAccess`]; [`SetFieldCmd`] then
//! sets any of its fields by name and restores the previous value on undo.

use serde::{Deserialize, Serialize};

use crate::command::{Command, CommandType, TypeTag};
use crate::error::{CommandError, CommandResult};
use crate::wire::{PrimitiveReader, PrimitiveWriter, WireError};

/// Dynamically typed field value.
///
/// Floats keep their exact bits in every chunk format, NaN and infinities
/// included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(#[serde(with = "crate::float")] f64),
    Text(String),
}

impl Default for FieldValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl FieldValue {
    /// Short kind name, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
        }
    }

    fn write(&self, out: &mut PrimitiveWriter) {
        match self {
            Self::Bool(v) => {
                out.write_u8(0);
                out.write_bool(*v);
            }
            Self::Int(v) => {
                out.write_u8(1);
                out.write_i64(*v);
            }
            Self::Float(v) => {
                out.write_u8(2);
                out.write_f64(*v);
            }
            Self::Text(v) => {
                out.write_u8(3);
                out.write_str(v);
            }
        }
    }

    fn read(input: &mut PrimitiveReader<'_>) -> Result<Self, WireError> {
        match input.read_u8()? {
            0 => Ok(Self::Bool(input.read_bool()?)),
            1 => Ok(Self::Int(input.read_i64()?)),
            2 => Ok(Self::Float(input.read_f64()?)),
            3 => Ok(Self::Text(input.read_str()?)),
            other => Err(WireError::InvalidTag(other)),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Explicit per-context accessor for named fields.
pub trait FieldAccess {
    /// Current value of `name`.
    fn read_field(&self, name: &str) -> Result<FieldValue, CommandError>;

    /// Set `name` to `value`.
    fn apply_field(&mut self, name: &str, value: FieldValue) -> CommandResult;
}

/// Set a named field of any [`FieldAccess`] context.
///
/// The previous value is captured on execute, so the same instance can be
/// redone after an undo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetFieldCmd {
    /// Field to set.
    pub field: String,
    /// Value applied on execute.
    pub new_value: FieldValue,
    /// Value captured on execute and restored on undo.
    pub old_value: Option<FieldValue>,
    /// Fields observers should refresh; starts as `[field]`.
    pub affected_fields: Vec<String>,
}

impl SetFieldCmd {
    /// Create a command setting `field` to `value`.
    #[must_use]
    pub fn new(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let field = field.into();
        Self {
            affected_fields: vec![field.clone()],
            field,
            new_value: value.into(),
            old_value: None,
        }
    }

    /// Also report `extra` as affected.
    #[must_use]
    pub fn with_affected<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.affected_fields.extend(extra.into_iter().map(Into::into));
        self
    }
}

impl CommandType for SetFieldCmd {
    const TYPE_TAG: TypeTag = TypeTag::new_static("pagedo_core", "SetFieldCmd");
}

impl<C: FieldAccess> Command<C> for SetFieldCmd {
    fn execute(&mut self, ctx: &mut C) -> CommandResult {
        let old = ctx.read_field(&self.field)?;
        ctx.apply_field(&self.field, self.new_value.clone())?;
        self.old_value = Some(old);
        Ok(())
    }

    fn undo(&mut self, ctx: &mut C) -> CommandResult {
        let Some(old) = self.old_value.clone() else {
            return Err(CommandError::InvalidState(format!(
                "undo of `{}` before execute",
                self.field
            )));
        };
        ctx.apply_field(&self.field, old)
    }

    fn affected_fields(&self) -> &[String] {
        &self.affected_fields
    }

    fn set_affected_fields(&mut self, fields: Vec<String>) {
        self.affected_fields = fields;
    }

    fn write_fields(&self, out: &mut PrimitiveWriter) {
        out.write_str(&self.field);
        self.new_value.write(out);
        match &self.old_value {
            Some(old) => {
                out.write_bool(true);
                old.write(out);
            }
            None => out.write_bool(false),
        }
    }

    fn read_fields(&mut self, input: &mut PrimitiveReader<'_>) -> Result<(), WireError> {
        self.field = input.read_str()?;
        self.new_value = FieldValue::read(input)?;
        self.old_value = if input.read_bool()? {
            Some(FieldValue::read(input)?)
        } else {
            None
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Sheet;

    #[test]
    fn set_and_restore_text_field() {
        let mut sheet = Sheet::new("old");
        let mut cmd = SetFieldCmd::new("text", "new");

        cmd.execute(&mut sheet).unwrap();
        assert_eq!(sheet.text, "new");
        assert_eq!(cmd.old_value, Some(FieldValue::Text("old".into())));

        cmd.undo(&mut sheet).unwrap();
        assert_eq!(sheet.text, "old");
    }

    #[test]
    fn redo_after_undo_uses_same_instance() {
        let mut sheet = Sheet::default();
        let mut cmd = SetFieldCmd::new("number", 5);
        cmd.execute(&mut sheet).unwrap();
        cmd.undo(&mut sheet).unwrap();
        cmd.execute(&mut sheet).unwrap();
        assert_eq!(sheet.number, 5);
    }

    #[test]
    fn unknown_field_leaves_command_untouched() {
        let mut sheet = Sheet::default();
        let mut cmd = SetFieldCmd::new("missing", true);
        assert_eq!(
            cmd.execute(&mut sheet),
            Err(CommandError::UnknownField("missing".into()))
        );
        assert!(cmd.old_value.is_none());
    }

    #[test]
    fn wrong_kind_is_rejected_by_context() {
        let mut sheet = Sheet::default();
        let mut cmd = SetFieldCmd::new("number", "seven");
        assert_eq!(
            cmd.execute(&mut sheet),
            Err(CommandError::FieldType {
                field: "number".into(),
                kind: "text"
            })
        );
        assert_eq!(sheet.number, 0);
    }

    #[test]
    fn undo_before_execute_fails() {
        let mut sheet = Sheet::default();
        let mut cmd = SetFieldCmd::new("text", "x");
        assert!(matches!(
            cmd.undo(&mut sheet),
            Err(CommandError::InvalidState(_))
        ));
    }

    #[test]
    fn affected_fields_start_with_target() {
        let cmd = SetFieldCmd::new("text", "x").with_affected(["title_bar"]);
        assert_eq!(
            Command::<Sheet>::affected_fields(&cmd),
            &["text".to_string(), "title_bar".to_string()]
        );
    }

    #[test]
    fn primitive_fields_round_trip() {
        let mut sheet = Sheet::new("a");
        let mut cmd = SetFieldCmd::new("text", 2.5);
        // Sheet rejects floats on `text`; build the old value by hand instead.
        assert!(cmd.execute(&mut sheet).is_err());
        cmd.old_value = Some(FieldValue::Bool(true));

        let mut out = PrimitiveWriter::new();
        Command::<Sheet>::write_fields(&cmd, &mut out);
        let bytes = out.into_bytes();

        let mut back = SetFieldCmd::default();
        let mut input = PrimitiveReader::new(&bytes);
        Command::<Sheet>::read_fields(&mut back, &mut input).unwrap();
        assert!(input.is_exhausted());
        assert_eq!(back.field, cmd.field);
        assert_eq!(back.new_value, cmd.new_value);
        assert_eq!(back.old_value, cmd.old_value);
    }

    #[test]
    fn bad_value_tag_is_reported() {
        let mut out = PrimitiveWriter::new();
        out.write_str("text");
        out.write_u8(9);
        let bytes = out.into_bytes();
        let mut back = SetFieldCmd::default();
        let err = Command::<Sheet>::read_fields(&mut back, &mut PrimitiveReader::new(&bytes));
        assert_eq!(err, Err(WireError::InvalidTag(9)));
    }
}
