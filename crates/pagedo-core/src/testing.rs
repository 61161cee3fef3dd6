#![forbid(unsafe_code)]

//! Sheet context and sample commands for tests, benches and fuzz targets.
//!
//! Enabled with the `test-helpers` feature.

use serde::{Deserialize, Serialize};

use crate::command::{Command, CommandType, TypeTag};
use crate::error::{CommandError, CommandResult};
use crate::field::{FieldAccess, FieldValue};
use crate::wire::{PrimitiveReader, PrimitiveWriter, WireError};

/// Minimal document with one text and one integer field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Sheet {
    pub text: String,
    pub number: i64,
}

impl Sheet {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            number: 0,
        }
    }
}

impl FieldAccess for Sheet {
    fn read_field(&self, name: &str) -> Result<FieldValue, CommandError> {
        match name {
            "text" => Ok(FieldValue::Text(self.text.clone())),
            "number" => Ok(FieldValue::Int(self.number)),
            other => Err(CommandError::UnknownField(other.to_owned())),
        }
    }

    fn apply_field(&mut self, name: &str, value: FieldValue) -> CommandResult {
        match (name, value) {
            ("text", FieldValue::Text(v)) => self.text = v,
            ("number", FieldValue::Int(v)) => self.number = v,
            ("text" | "number", other) => {
                return Err(CommandError::FieldType {
                    field: name.to_owned(),
                    kind: other.kind(),
                });
            }
            (other, _) => return Err(CommandError::UnknownField(other.to_owned())),
        }
        Ok(())
    }
}

/// Replace [`Sheet::text`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetText {
    pub new_value: String,
    pub old_value: String,
}

impl SetText {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            new_value: value.into(),
            old_value: String::new(),
        }
    }
}

impl CommandType for SetText {
    const TYPE_TAG: TypeTag = TypeTag::new_static("pagedo_core::testing", "SetText");
}

impl Command<Sheet> for SetText {
    fn execute(&mut self, ctx: &mut Sheet) -> CommandResult {
        self.old_value = std::mem::replace(&mut ctx.text, self.new_value.clone());
        Ok(())
    }

    fn undo(&mut self, ctx: &mut Sheet) -> CommandResult {
        ctx.text = self.old_value.clone();
        Ok(())
    }

    fn write_fields(&self, out: &mut PrimitiveWriter) {
        out.write_str(&self.new_value);
        out.write_str(&self.old_value);
    }

    fn read_fields(&mut self, input: &mut PrimitiveReader<'_>) -> Result<(), WireError> {
        self.new_value = input.read_str()?;
        self.old_value = input.read_str()?;
        Ok(())
    }
}

/// Replace [`Sheet::number`], reporting its affected fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetNumber {
    pub new_value: i64,
    pub old_value: i64,
    pub affected_fields: Vec<String>,
}

impl SetNumber {
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self {
            new_value: value,
            old_value: 0,
            affected_fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_affected<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.affected_fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

impl CommandType for SetNumber {
    const TYPE_TAG: TypeTag = TypeTag::new_static("pagedo_core::testing", "SetNumber");
}

impl Command<Sheet> for SetNumber {
    fn execute(&mut self, ctx: &mut Sheet) -> CommandResult {
        self.old_value = ctx.number;
        ctx.number = self.new_value;
        Ok(())
    }

    fn undo(&mut self, ctx: &mut Sheet) -> CommandResult {
        ctx.number = self.old_value;
        Ok(())
    }

    fn affected_fields(&self) -> &[String] {
        &self.affected_fields
    }

    fn set_affected_fields(&mut self, fields: Vec<String>) {
        self.affected_fields = fields;
    }

    fn write_fields(&self, out: &mut PrimitiveWriter) {
        out.write_i64(self.new_value);
        out.write_i64(self.old_value);
    }

    fn read_fields(&mut self, input: &mut PrimitiveReader<'_>) -> Result<(), WireError> {
        self.new_value = input.read_i64()?;
        self.old_value = input.read_i64()?;
        Ok(())
    }
}

/// Always fails; for exercising error paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reject {
    pub reason: String,
}

impl CommandType for Reject {
    const TYPE_TAG: TypeTag = TypeTag::new_static("pagedo_core::testing", "Reject");
}

impl Command<Sheet> for Reject {
    fn execute(&mut self, _ctx: &mut Sheet) -> CommandResult {
        Err(CommandError::InvalidState(self.reason.clone()))
    }

    fn undo(&mut self, _ctx: &mut Sheet) -> CommandResult {
        Err(CommandError::InvalidState(self.reason.clone()))
    }

    fn write_fields(&self, out: &mut PrimitiveWriter) {
        out.write_str(&self.reason);
    }

    fn read_fields(&mut self, input: &mut PrimitiveReader<'_>) -> Result<(), WireError> {
        self.reason = input.read_str()?;
        Ok(())
    }
}
