#![forbid(unsafe_code)]

//! End-to-end paging scenarios against a real folder.

use std::path::Path;

use pagedo::{ChunkFormat, ChunkKind, CommandRegistry, DiskHistory, PagingConfig};
use pagedo_core::{CommandError, FieldAccess, FieldValue, SetFieldCmd};
use pagedo_core::testing::{SetNumber, SetText, Sheet};

fn registry() -> CommandRegistry<Sheet> {
    CommandRegistry::new()
        .with::<SetText>()
        .with::<SetNumber>()
        .with::<SetFieldCmd>()
}

fn open(folder: &Path, capacity: usize, format: ChunkFormat) -> DiskHistory<Sheet> {
    let config = PagingConfig::new(folder)
        .with_window_capacity(capacity)
        .with_format(format);
    DiskHistory::open(config, registry())
        .unwrap()
        .with_context(Sheet::new("0"))
}

fn text(history: &DiskHistory<Sheet>) -> &str {
    &history.context().unwrap().text
}

fn do_text(history: &mut DiskHistory<Sheet>, value: &str) {
    history.execute(Box::new(SetText::new(value))).unwrap();
    assert_eq!(text(history), value);
}

#[test]
fn do_undo_redo_in_memory() {
    let dir = tempfile::tempdir().unwrap();
    let mut history = open(dir.path(), 1000, ChunkFormat::Json);

    for value in ["1", "2", "3", "4"] {
        do_text(&mut history, value);
    }

    history.undo().unwrap().unwrap();
    assert_eq!(text(&history), "3");
    history.undo().unwrap().unwrap();
    assert_eq!(text(&history), "2");

    assert!(history.redo().unwrap().is_some());
    assert_eq!(text(&history), "3");
    assert!(history.redo().unwrap().is_some());
    assert_eq!(text(&history), "4");
    assert!(history.redo().unwrap().is_none());
    assert_eq!(text(&history), "4");

    for _ in 0..4 {
        assert!(history.undo().unwrap().is_some());
    }
    assert!(history.undo().unwrap().is_none());
    assert_eq!(text(&history), "0");
}

fn cycle_through_disk(format: ChunkFormat) {
    let dir = tempfile::tempdir().unwrap();
    let mut history = open(dir.path(), 4, format);

    for _ in 0..10 {
        for value in ["1", "2", "3", "4"] {
            do_text(&mut history, value);
        }
    }
    assert!(history.resident_len() <= 12);
    assert!(!history.store().sequence_numbers(ChunkKind::Executed).unwrap().is_empty());

    for _ in 0..9 {
        for expected in ["3", "2", "1", "4"] {
            assert!(history.undo().unwrap().is_some(), "{format}");
            assert_eq!(text(&history), expected, "{format}");
        }
    }
    assert!(history.resident_len() <= 12);

    for _ in 0..9 {
        for expected in ["1", "2", "3", "4"] {
            assert!(history.redo().unwrap().is_some(), "{format}");
            assert_eq!(text(&history), expected, "{format}");
        }
    }
    assert!(!history.can_redo());
}

#[test]
fn cycles_through_disk_with_json() {
    cycle_through_disk(ChunkFormat::Json);
}

#[test]
fn cycles_through_disk_with_binary() {
    cycle_through_disk(ChunkFormat::Binary);
}

#[test]
fn cycles_through_disk_with_xml() {
    cycle_through_disk(ChunkFormat::Xml);
}

#[test]
fn full_unwind_and_replay() {
    let dir = tempfile::tempdir().unwrap();
    let mut history = open(dir.path(), 3, ChunkFormat::Binary);
    for n in 1..=20 {
        history.execute(Box::new(SetNumber::new(n))).unwrap();
    }

    let mut undone = 0;
    while history.undo().unwrap().is_some() {
        undone += 1;
    }
    assert_eq!(undone, 20);
    assert_eq!(history.context().unwrap().number, 0);
    assert!(history.store().sequence_numbers(ChunkKind::Executed).unwrap().is_empty());

    let mut redone = 0;
    while history.redo().unwrap().is_some() {
        redone += 1;
        assert_eq!(history.context().unwrap().number, redone);
    }
    assert_eq!(redone, 20);
    assert!(history.store().sequence_numbers(ChunkKind::Undone).unwrap().is_empty());
}

#[test]
fn do_after_undo_across_chunks_drops_redo_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut history = open(dir.path(), 2, ChunkFormat::Json);
    for n in 1..=10 {
        history.execute(Box::new(SetNumber::new(n))).unwrap();
    }
    for _ in 0..7 {
        history.undo().unwrap();
    }
    assert_eq!(history.context().unwrap().number, 3);
    assert!(!history.store().sequence_numbers(ChunkKind::Undone).unwrap().is_empty());

    history
        .execute(Box::new(SetFieldCmd::new("number", 42)))
        .unwrap();
    assert!(history.store().sequence_numbers(ChunkKind::Undone).unwrap().is_empty());
    assert!(!history.can_redo());

    let mut seen = Vec::new();
    while history.undo().unwrap().is_some() {
        seen.push(history.context().unwrap().number);
    }
    assert_eq!(seen, vec![3, 2, 1, 0]);
}

#[test]
fn fresh_history_purges_stale_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("E1"), b"stale").unwrap();
    std::fs::write(dir.path().join("U3"), b"stale").unwrap();
    std::fs::write(dir.path().join("readme"), b"keep").unwrap();

    let mut history = open(dir.path(), 2, ChunkFormat::Json);
    assert!(history.store().sequence_numbers(ChunkKind::Executed).unwrap().is_empty());
    assert!(history.store().sequence_numbers(ChunkKind::Undone).unwrap().is_empty());
    assert!(dir.path().join("readme").exists());
    assert!(history.undo().unwrap().is_none());
}

#[test]
fn preserved_files_survive_open_and_drop() {
    let dir = tempfile::tempdir().unwrap();
    let config = PagingConfig::new(dir.path())
        .with_window_capacity(1)
        .with_preserve_folder_state(true);
    {
        let mut history = DiskHistory::open(config.clone(), registry())
            .unwrap()
            .with_context(Sheet::default());
        for n in 1..=3 {
            history.execute(Box::new(SetNumber::new(n))).unwrap();
        }
    }
    assert!(dir.path().join("E1").exists());

    let history = DiskHistory::open(config, registry()).unwrap();
    assert_eq!(
        history.store().sequence_numbers(ChunkKind::Executed).unwrap(),
        vec![1]
    );
    assert_eq!(history.resident_len(), 0);
}

#[test]
fn affected_fields_reach_the_caller_after_paging() {
    let dir = tempfile::tempdir().unwrap();
    let mut history = open(dir.path(), 1, ChunkFormat::Xml);
    history
        .execute(Box::new(SetFieldCmd::new("text", "a").with_affected(["title"])))
        .unwrap();
    for n in 0..3 {
        history.execute(Box::new(SetNumber::new(n))).unwrap();
    }
    for _ in 0..3 {
        history.undo().unwrap();
    }
    let undone = history.undo().unwrap().unwrap();
    assert_eq!(undone.affected_fields().to_vec(), vec!["text", "title"]);
    assert_eq!(text(&history), "0");
}

#[derive(Debug, Default)]
struct Gauge {
    ratio: f64,
}

impl FieldAccess for Gauge {
    fn read_field(&self, name: &str) -> Result<FieldValue, CommandError> {
        match name {
            "ratio" => Ok(FieldValue::Float(self.ratio)),
            other => Err(CommandError::UnknownField(other.to_owned())),
        }
    }

    fn apply_field(&mut self, name: &str, value: FieldValue) -> Result<(), CommandError> {
        match (name, value) {
            ("ratio", FieldValue::Float(v)) => self.ratio = v,
            (_, other) => {
                return Err(CommandError::FieldType {
                    field: name.to_owned(),
                    kind: other.kind(),
                });
            }
        }
        Ok(())
    }
}

fn non_finite_floats_page_through(format: ChunkFormat) {
    let dir = tempfile::tempdir().unwrap();
    let config = PagingConfig::new(dir.path())
        .with_window_capacity(1)
        .with_format(format);
    let registry = CommandRegistry::new().with::<SetFieldCmd>();
    let mut history = DiskHistory::open(config, registry)
        .unwrap()
        .with_context(Gauge::default());

    let values = [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 2.5];
    for value in values {
        history
            .execute(Box::new(SetFieldCmd::new("ratio", value)))
            .unwrap();
    }
    assert!(!history.store().sequence_numbers(ChunkKind::Executed).unwrap().is_empty());

    let ratio = |h: &DiskHistory<Gauge>| h.context().unwrap().ratio.to_bits();
    for expected in [f64::NEG_INFINITY, f64::INFINITY, f64::NAN, 0.0] {
        assert!(history.undo().unwrap().is_some(), "{format}");
        assert_eq!(ratio(&history), expected.to_bits(), "{format}");
    }
    for expected in values {
        assert!(history.redo().unwrap().is_some(), "{format}");
        assert_eq!(ratio(&history), expected.to_bits(), "{format}");
    }
}

#[test]
fn non_finite_floats_page_through_every_format() {
    for format in ChunkFormat::ALL {
        non_finite_floats_page_through(format);
    }
}
