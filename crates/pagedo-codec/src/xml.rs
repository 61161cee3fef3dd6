#![forbid(unsafe_code)]

//! XML chunks over a closed set of element names.
//!
//! Commands become child elements of the root, named by the element name
//! their type was registered under. Every serde field becomes a child element
//! with a `type` attribute so values decode without a schema:
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <CommandChunk version="pagedo-chunk-v1">
//!   <SetNumber>
//!     <new_value type="int">4</new_value>
//!     <affected_fields type="list"><item type="str">number</item></affected_fields>
//!   </SetNumber>
//! </CommandChunk>
//! ```
//!
//! Output is written without indentation; the layout above is for reading
//! only. Text content is never trimmed on decode, so leading and trailing
//! whitespace in strings survives.
//!
//! | `type`  | Content                        |
//! |---------|--------------------------------|
//! | `str`   | escaped text                   |
//! | `int`   | signed decimal                 |
//! | `uint`  | unsigned decimal beyond `i64`  |
//! | `float` | decimal or exponent form       |
//! | `bool`  | `true` / `false`               |
//! | `null`  | empty                          |
//! | `list`  | `<item>` children              |
//! | `map`   | one child per key              |

use pagedo_core::Command;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde_json::{Map, Number, Value};

use crate::error::CodecError;
use crate::format::{CHUNK_FORMAT_VERSION, ChunkFormat, ChunkSerializer};
use crate::registry::{CommandRegistry, is_xml_name};

/// Name of the document element.
pub const ROOT_ELEMENT: &str = "CommandChunk";
/// Element name for list entries.
pub const ITEM_ELEMENT: &str = "item";

const TYPE_ATTR: &str = "type";
const VERSION_ATTR: &str = "version";

/// XML chunk serializer.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlSerializer;

fn malformed(reason: impl std::fmt::Display) -> CodecError {
    CodecError::malformed(ChunkFormat::Xml, reason)
}

fn unencodable(reason: impl std::fmt::Display) -> CodecError {
    CodecError::unencodable(ChunkFormat::Xml, reason)
}

// ============================================================================
// Encoding
// ============================================================================

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), CodecError> {
    writer.write_event(event).map_err(unencodable)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() => "int",
        Value::Number(n) if n.is_u64() => "uint",
        Value::Number(_) => "float",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

fn write_value(writer: &mut Writer<Vec<u8>>, name: &str, value: &Value) -> Result<(), CodecError> {
    if !is_xml_name(name) {
        return Err(unencodable(format!("`{name}` is not a valid element name")));
    }
    let mut start = BytesStart::new(name);
    start.push_attribute((TYPE_ATTR, value_kind(value)));

    let text = match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            emit(writer, Event::Start(start))?;
            for item in items {
                write_value(writer, ITEM_ELEMENT, item)?;
            }
            return emit(writer, Event::End(BytesEnd::new(name)));
        }
        Value::Object(map) => {
            emit(writer, Event::Start(start))?;
            for (key, item) in map {
                write_value(writer, key, item)?;
            }
            return emit(writer, Event::End(BytesEnd::new(name)));
        }
    };

    if text.is_empty() {
        return emit(writer, Event::Empty(start));
    }
    emit(writer, Event::Start(start))?;
    emit(writer, Event::Text(BytesText::new(&text)))?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn write_command<C: 'static>(
    writer: &mut Writer<Vec<u8>>,
    cmd: &dyn Command<C>,
    registry: &CommandRegistry<C>,
) -> Result<(), CodecError> {
    let tag = cmd.type_tag();
    let element = registry.element_for(&tag)?;
    let value = cmd
        .to_structured()
        .map_err(|err| unencodable(format!("`{tag}`: {err}")))?;
    let Value::Object(fields) = value else {
        return Err(unencodable(format!("`{tag}` does not serialize to an object")));
    };

    emit(writer, Event::Start(BytesStart::new(element)))?;
    for (key, field) in &fields {
        write_value(writer, key, field)?;
    }
    emit(writer, Event::End(BytesEnd::new(element)))
}

// ============================================================================
// Decoding
// ============================================================================

#[derive(Debug, Default)]
struct Node {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn open(start: &BytesStart<'_>) -> Result<Self, CodecError> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(malformed)?
            .to_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(malformed)?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(malformed)?
                .to_owned();
            let value = attr.unescape_value().map_err(malformed)?.into_owned();
            attrs.push((key, value));
        }
        Ok(Self {
            name,
            attrs,
            ..Self::default()
        })
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) -> Result<(), CodecError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    } else if root.is_none() {
        *root = Some(node);
    } else {
        return Err(malformed("more than one root element"));
    }
    Ok(())
}

fn parse_document(bytes: &[u8]) -> Result<Node, CodecError> {
    let source = std::str::from_utf8(bytes).map_err(malformed)?;
    let mut reader = Reader::from_str(source);
    let mut stack: Vec<Node> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(start) => stack.push(Node::open(&start)?),
            Event::Empty(start) => {
                let node = Node::open(&start)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| malformed("unbalanced end tag"))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(malformed)?;
                match stack.last_mut() {
                    Some(top) => top.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(malformed("text outside the root element")),
                }
            }
            Event::CData(data) => {
                let top = stack
                    .last_mut()
                    .ok_or_else(|| malformed("CDATA outside the root element"))?;
                top.text
                    .push_str(std::str::from_utf8(&data).map_err(malformed)?);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(malformed("unexpected end of document"));
    }
    root.ok_or_else(|| malformed("missing root element"))
}

fn parse_text<T>(node: &Node) -> Result<T, CodecError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    node.text
        .parse()
        .map_err(|err| malformed(format!("<{}>: {err}", node.name)))
}

fn node_value(node: Node) -> Result<Value, CodecError> {
    let kind = node
        .attr(TYPE_ATTR)
        .map(str::to_owned)
        .ok_or_else(|| malformed(format!("<{}> has no `type` attribute", node.name)))?;
    let value = match kind.as_str() {
        "null" => Value::Null,
        "bool" => Value::Bool(parse_text(&node)?),
        "int" => Value::from(parse_text::<i64>(&node)?),
        "uint" => Value::from(parse_text::<u64>(&node)?),
        "float" => {
            let f = parse_text::<f64>(&node)?;
            Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| malformed(format!("<{}>: non-finite float", node.name)))?
        }
        "str" => Value::String(node.text),
        "list" => Value::Array(
            node.children
                .into_iter()
                .map(node_value)
                .collect::<Result<_, _>>()?,
        ),
        "map" => Value::Object(node_fields(node.children)?),
        other => {
            return Err(malformed(format!(
                "<{}> has unknown type `{other}`",
                node.name
            )));
        }
    };
    Ok(value)
}

fn node_fields(children: Vec<Node>) -> Result<Map<String, Value>, CodecError> {
    let mut map = Map::new();
    for child in children {
        let key = child.name.clone();
        map.insert(key, node_value(child)?);
    }
    Ok(map)
}

impl<C: 'static> ChunkSerializer<C> for XmlSerializer {
    fn format(&self) -> ChunkFormat {
        ChunkFormat::Xml
    }

    fn encode(
        &self,
        commands: &[Box<dyn Command<C>>],
        registry: &CommandRegistry<C>,
    ) -> Result<Vec<u8>, CodecError> {
        let mut writer = Writer::new(Vec::with_capacity(128 + 96 * commands.len()));
        emit(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
        )?;
        let mut root = BytesStart::new(ROOT_ELEMENT);
        root.push_attribute((VERSION_ATTR, CHUNK_FORMAT_VERSION));
        emit(&mut writer, Event::Start(root))?;
        for cmd in commands {
            write_command(&mut writer, &**cmd, registry)?;
        }
        emit(&mut writer, Event::End(BytesEnd::new(ROOT_ELEMENT)))?;

        let bytes = writer.into_inner();
        tracing::trace!(
            target: "pagedo.codec",
            format = "xml",
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
        let root = parse_document(bytes)?;
        if root.name != ROOT_ELEMENT {
            return Err(malformed(format!(
                "root element is <{}>, expected <{ROOT_ELEMENT}>",
                root.name
            )));
        }
        match root.attr(VERSION_ATTR) {
            Some(CHUNK_FORMAT_VERSION) => {}
            Some(other) => return Err(malformed(format!("unsupported version `{other}`"))),
            None => return Err(malformed("missing version attribute")),
        }

        let mut commands = Vec::with_capacity(root.children.len());
        for (index, child) in root.children.into_iter().enumerate() {
            let tag = registry.tag_for_element(&child.name)?.clone();
            let mut cmd = registry.construct(&tag)?;
            let fields = node_fields(child.children)?;
            cmd.populate_structured(Value::Object(fields))
                .map_err(|err| malformed(format!("command {index} (`{tag}`): {err}")))?;
            commands.push(cmd);
        }
        Ok(commands)
    }
}
