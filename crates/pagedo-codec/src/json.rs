#![forbid(unsafe_code)]

//! JSON chunks: one top-level array, one object per command.
//!
//! Each object carries the command's serde fields plus two sidecar keys
//! naming its type:
//!
//! ```json
//! [
//!   {"$module": "app::edits", "$type": "Rename", "new_value": "b", "old_value": "a"}
//! ]
//! ```

use pagedo_core::{Command, TypeTag};
use serde_json::{Map, Value};

use crate::error::CodecError;
use crate::format::{ChunkFormat, ChunkSerializer};
use crate::registry::CommandRegistry;

/// Sidecar key holding [`TypeTag::module`].
pub const MODULE_KEY: &str = "$module";
/// Sidecar key holding [`TypeTag::name`].
pub const TYPE_KEY: &str = "$type";

/// JSON chunk serializer.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

fn malformed(reason: impl std::fmt::Display) -> CodecError {
    CodecError::malformed(ChunkFormat::Json, reason)
}

fn unencodable(reason: impl std::fmt::Display) -> CodecError {
    CodecError::unencodable(ChunkFormat::Json, reason)
}

fn take_str(map: &mut Map<String, Value>, key: &str, index: usize) -> Result<String, CodecError> {
    match map.remove(key) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(malformed(format!(
            "command {index}: `{key}` must be a string, got {other}"
        ))),
        None => Err(malformed(format!("command {index}: missing `{key}`"))),
    }
}

fn encode_object<C: 'static>(cmd: &dyn Command<C>) -> Result<Value, CodecError> {
    let tag = cmd.type_tag();
    let value = cmd
        .to_structured()
        .map_err(|err| unencodable(format!("`{tag}`: {err}")))?;
    let Value::Object(mut map) = value else {
        return Err(unencodable(format!("`{tag}` does not serialize to an object")));
    };
    for key in [MODULE_KEY, TYPE_KEY] {
        if map.contains_key(key) {
            return Err(unencodable(format!("`{tag}` uses reserved key `{key}`")));
        }
    }
    map.insert(MODULE_KEY.to_owned(), Value::String(tag.module().to_owned()));
    map.insert(TYPE_KEY.to_owned(), Value::String(tag.name().to_owned()));
    Ok(Value::Object(map))
}

fn decode_object<C: 'static>(
    item: Value,
    index: usize,
    registry: &CommandRegistry<C>,
) -> Result<Box<dyn Command<C>>, CodecError> {
    let Value::Object(mut map) = item else {
        return Err(malformed(format!("command {index} is not an object")));
    };
    let module = take_str(&mut map, MODULE_KEY, index)?;
    let name = take_str(&mut map, TYPE_KEY, index)?;
    let tag = TypeTag::new(module, name);
    let mut cmd = registry.construct(&tag)?;
    cmd.populate_structured(Value::Object(map))
        .map_err(|err| malformed(format!("command {index} (`{tag}`): {err}")))?;
    Ok(cmd)
}

impl<C: 'static> ChunkSerializer<C> for JsonSerializer {
    fn format(&self) -> ChunkFormat {
        ChunkFormat::Json
    }

    fn encode(
        &self,
        commands: &[Box<dyn Command<C>>],
        _registry: &CommandRegistry<C>,
    ) -> Result<Vec<u8>, CodecError> {
        let items = commands
            .iter()
            .map(|cmd| encode_object(&**cmd))
            .collect::<Result<Vec<_>, _>>()?;
        let bytes = serde_json::to_vec(&Value::Array(items)).map_err(unencodable)?;
        tracing::trace!(
            target: "pagedo.codec",
            format = "json",
            commands = commands.len(),
            bytes = bytes.len(),
            "chunk encoded"
        );
        Ok(bytes)
    }

    fn decode(
        &self,
        bytes: &[u8],
        registry: &CommandRegistry<C>,
    ) -> Result<Vec<Box<dyn Command<C>>>, CodecError> {
        let value: Value = serde_json::from_slice(bytes).map_err(malformed)?;
        let Value::Array(items) = value else {
            return Err(malformed("top-level value is not an array"));
        };
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| decode_object(item, index, registry))
            .collect()
    }
}
