#![forbid(unsafe_code)]

//! Mixed-type chunks through every format.
//!
//! Each test builds a chunk of unrelated command types, executes it against a
//! sheet, round-trips it, and checks that the decoded chunk still undoes the
//! sheet back to where it started.

use pagedo_codec::{ChunkFormat, CodecError, CommandRegistry};
use pagedo_core::testing::{SetNumber, SetText, Sheet};
use pagedo_core::{Command, CommandType, FieldValue, SetFieldCmd};
use proptest::prelude::*;

fn registry() -> CommandRegistry<Sheet> {
    CommandRegistry::new()
        .with::<SetText>()
        .with::<SetNumber>()
        .with::<SetFieldCmd>()
}

fn mixed_chunk() -> Vec<Box<dyn Command<Sheet>>> {
    vec![
        Box::new(SetText::new("first")),
        Box::new(SetNumber::new(2).with_affected(["number"])),
        Box::new(SetFieldCmd::new("text", "third").with_affected(["title"])),
        Box::new(SetFieldCmd::new("number", 44)),
        Box::new(SetText::new("fifth & <last>")),
    ]
}

fn round_trip(
    format: ChunkFormat,
    chunk: &[Box<dyn Command<Sheet>>],
    registry: &CommandRegistry<Sheet>,
) -> Vec<Box<dyn Command<Sheet>>> {
    let serializer = format.serializer::<Sheet>();
    let bytes = serializer.encode(chunk, registry).unwrap();
    serializer.decode(&bytes, registry).unwrap()
}

#[test]
fn order_and_types_survive_every_format() {
    let registry = registry();
    let chunk = mixed_chunk();
    for format in ChunkFormat::ALL {
        let back = round_trip(format, &chunk, &registry);
        let tags: Vec<_> = back.iter().map(|c| c.type_tag()).collect();
        assert_eq!(
            tags,
            vec![
                SetText::TYPE_TAG,
                SetNumber::TYPE_TAG,
                SetFieldCmd::TYPE_TAG,
                SetFieldCmd::TYPE_TAG,
                SetText::TYPE_TAG,
            ],
            "{format}"
        );
        for (before, after) in chunk.iter().zip(&back) {
            assert_eq!(before.affected_fields(), after.affected_fields(), "{format}");
        }
    }
}

#[test]
fn decoded_chunk_undoes_executed_state() {
    let registry = registry();
    for format in ChunkFormat::ALL {
        let mut sheet = Sheet::new("start");
        sheet.number = 1;
        let mut chunk = mixed_chunk();
        for cmd in &mut chunk {
            cmd.execute(&mut sheet).unwrap();
        }
        assert_eq!(sheet.text, "fifth & <last>");
        assert_eq!(sheet.number, 44);

        let mut back = round_trip(format, &chunk, &registry);
        for cmd in back.iter_mut().rev() {
            cmd.undo(&mut sheet).unwrap();
        }
        assert_eq!(sheet, Sheet { text: "start".into(), number: 1 }, "{format}");

        for cmd in &mut back {
            cmd.execute(&mut sheet).unwrap();
        }
        assert_eq!(sheet.text, "fifth & <last>", "{format}");
        assert_eq!(sheet.number, 44, "{format}");
    }
}

#[test]
fn empty_chunk_round_trips_in_every_format() {
    let registry = registry();
    for format in ChunkFormat::ALL {
        assert!(round_trip(format, &[], &registry).is_empty(), "{format}");
    }
}

#[test]
fn missing_registration_fails_every_format() {
    let full = registry();
    let partial = CommandRegistry::<Sheet>::new()
        .with::<SetText>()
        .with::<SetFieldCmd>();
    for format in ChunkFormat::ALL {
        let serializer = format.serializer::<Sheet>();
        let bytes = serializer.encode(&mixed_chunk(), &full).unwrap();
        let err = serializer.decode(&bytes, &partial).unwrap_err();
        assert!(
            matches!(err, CodecError::TypeResolution { .. }),
            "{format}: {err}"
        );
    }
}

#[test]
fn payloads_are_not_interchangeable() {
    let registry = registry();
    let json = ChunkFormat::Json
        .serializer::<Sheet>()
        .encode(&mixed_chunk(), &registry)
        .unwrap();
    for format in [ChunkFormat::Binary, ChunkFormat::Xml] {
        let err = format
            .serializer::<Sheet>()
            .decode(&json, &registry)
            .unwrap_err();
        assert!(err.is_deserialization(), "{format}: {err}");
    }
}

fn float_command(value: f64) -> Box<dyn Command<Sheet>> {
    let mut cmd = SetFieldCmd::new("ratio", value);
    cmd.old_value = Some(FieldValue::Float(-value));
    Box::new(cmd)
}

fn float_bits(cmd: &dyn Command<Sheet>) -> (u64, u64) {
    let cmd = cmd.downcast_ref::<SetFieldCmd>().unwrap();
    let bits = |value: &FieldValue| match value {
        FieldValue::Float(f) => f.to_bits(),
        other => panic!("expected a float, got {other:?}"),
    };
    (bits(&cmd.new_value), bits(cmd.old_value.as_ref().unwrap()))
}

#[test]
fn special_floats_keep_their_bits() {
    let registry = registry();
    let values = [
        f64::NAN,
        -f64::NAN,
        f64::from_bits(0x7ff0_0000_0000_0001),
        f64::INFINITY,
        f64::NEG_INFINITY,
        0.0,
        -0.0,
        f64::MIN_POSITIVE,
        f64::from_bits(1),
        f64::MAX,
        0.1,
        1.0715660391465826e-75,
    ];
    let chunk: Vec<_> = values.iter().map(|&v| float_command(v)).collect();
    for format in ChunkFormat::ALL {
        let back = round_trip(format, &chunk, &registry);
        for (value, cmd) in values.iter().zip(&back) {
            assert_eq!(
                float_bits(&**cmd),
                (value.to_bits(), (-value).to_bits()),
                "{format}: {value:e}"
            );
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn floats_keep_their_bits(values in prop::collection::vec(any::<f64>(), 1..8)) {
        let registry = registry();
        let chunk: Vec<_> = values.iter().map(|&v| float_command(v)).collect();
        for format in ChunkFormat::ALL {
            let back = round_trip(format, &chunk, &registry);
            prop_assert_eq!(back.len(), chunk.len());
            for (value, cmd) in values.iter().zip(&back) {
                prop_assert_eq!(
                    float_bits(&**cmd),
                    (value.to_bits(), (-value).to_bits()),
                    "{}: {:e}", format, value
                );
            }
        }
    }

    #[test]
    fn text_and_numbers_survive(
        texts in prop::collection::vec("[a-zA-Z0-9 <>&'\"é€]{0,24}", 0..6),
        numbers in prop::collection::vec(any::<i64>(), 0..6),
    ) {
        let registry = registry();
        let mut chunk: Vec<Box<dyn Command<Sheet>>> = Vec::new();
        for text in &texts {
            chunk.push(Box::new(SetText::new(text.as_str())));
        }
        for n in &numbers {
            chunk.push(Box::new(SetNumber::new(*n)));
        }
        for format in ChunkFormat::ALL {
            let back = round_trip(format, &chunk, &registry);
            prop_assert_eq!(back.len(), chunk.len());
            for (text, cmd) in texts.iter().zip(&back) {
                prop_assert_eq!(&cmd.downcast_ref::<SetText>().unwrap().new_value, text);
            }
            for (n, cmd) in numbers.iter().zip(&back[texts.len()..]) {
                prop_assert_eq!(cmd.downcast_ref::<SetNumber>().unwrap().new_value, *n);
            }
        }
    }
}
