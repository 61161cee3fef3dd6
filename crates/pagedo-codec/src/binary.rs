#![forbid(unsafe_code)]

//! Field-ordered primitive stream.
//!
//! ```text
//! str   version            "pagedo-chunk-v1"
//! i32   count
//! count × record:
//!   str   module
//!   str   type name
//!   i32   affected count
//!   str × affected count
//!   ...   type-specific fields (Command::write_fields)
//! ```
//!
//! Strings are UTF-8 with a 7-bit varint length prefix; integers are
//! little-endian. Trailing bytes after the last record are rejected.

use pagedo_core::{Command, PrimitiveReader, PrimitiveWriter, TypeTag, WireError};

use crate::error::CodecError;
use crate::format::{CHUNK_FORMAT_VERSION, ChunkFormat, ChunkSerializer};
use crate::registry::CommandRegistry;

/// Upper bound on speculative allocation from an untrusted count.
const PREALLOC_LIMIT: usize = 1024;

/// Binary chunk serializer.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinarySerializer;

fn malformed(reason: impl std::fmt::Display) -> CodecError {
    CodecError::malformed(ChunkFormat::Binary, reason)
}

fn wire(err: WireError) -> CodecError {
    malformed(err)
}

fn encode_count(len: usize, what: &str) -> Result<i32, CodecError> {
    i32::try_from(len).map_err(|_| {
        CodecError::unencodable(ChunkFormat::Binary, format!("too many {what}: {len}"))
    })
}

fn decode_count(input: &mut PrimitiveReader<'_>, what: &str) -> Result<usize, CodecError> {
    let raw = input.read_i32().map_err(wire)?;
    usize::try_from(raw).map_err(|_| malformed(format!("negative {what} count {raw}")))
}

fn encode_record<C: 'static>(
    cmd: &dyn Command<C>,
    out: &mut PrimitiveWriter,
) -> Result<(), CodecError> {
    let tag = cmd.type_tag();
    out.write_str(tag.module());
    out.write_str(tag.name());
    let affected = cmd.affected_fields();
    out.write_i32(encode_count(affected.len(), "affected fields")?);
    for field in affected {
        out.write_str(field);
    }
    cmd.write_fields(out);
    Ok(())
}

fn decode_record<C: 'static>(
    input: &mut PrimitiveReader<'_>,
    registry: &CommandRegistry<C>,
) -> Result<Box<dyn Command<C>>, CodecError> {
    let module = input.read_str().map_err(wire)?;
    let name = input.read_str().map_err(wire)?;
    let tag = TypeTag::new(module, name);
    let mut cmd = registry.construct(&tag)?;

    let count = decode_count(input, "affected field")?;
    let mut affected = Vec::with_capacity(count.min(PREALLOC_LIMIT));
    for _ in 0..count {
        affected.push(input.read_str().map_err(wire)?);
    }
    cmd.set_affected_fields(affected);

    cmd.read_fields(input)
        .map_err(|err| malformed(format!("fields of `{tag}`: {err}")))?;
    Ok(cmd)
}

impl<C: 'static> ChunkSerializer<C> for BinarySerializer {
    fn format(&self) -> ChunkFormat {
        ChunkFormat::Binary
    }

    fn encode(
        &self,
        commands: &[Box<dyn Command<C>>],
        _registry: &CommandRegistry<C>,
    ) -> Result<Vec<u8>, CodecError> {
        let mut out = PrimitiveWriter::with_capacity(32 + 48 * commands.len());
        out.write_str(CHUNK_FORMAT_VERSION);
        out.write_i32(encode_count(commands.len(), "commands")?);
        for cmd in commands {
            encode_record(&**cmd, &mut out)?;
        }
        tracing::trace!(
            target: "pagedo.codec",
            format = "binary",
            commands = commands.len(),
            bytes = out.len(),
            "chunk encoded"
        );
        Ok(out.into_bytes())
    }

    fn decode(
        &self,
        bytes: &[u8],
        registry: &CommandRegistry<C>,
    ) -> Result<Vec<Box<dyn Command<C>>>, CodecError> {
        let mut input = PrimitiveReader::new(bytes);
        let version = input.read_str().map_err(wire)?;
        if version != CHUNK_FORMAT_VERSION {
            return Err(malformed(format!("unsupported version `{version}`")));
        }
        let count = decode_count(&mut input, "command")?;
        let mut commands = Vec::with_capacity(count.min(PREALLOC_LIMIT));
        for _ in 0..count {
            commands.push(decode_record(&mut input, registry)?);
        }
        if !input.is_exhausted() {
            return Err(malformed(format!(
                "{} trailing bytes after {count} commands",
                input.remaining()
            )));
        }
        Ok(commands)
    }
}
