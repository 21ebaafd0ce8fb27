//! Integration tests for record, close, reopen and playback cycles

use std::path::PathBuf;

use tempfile::TempDir;

use padrec::config::{Config, Durability};
use padrec::storage::{
    RecordingFile, RecordingReader, CONTROLLER_INPUT_BYTES, FORMAT_VERSION, PORT_COUNT,
};
use padrec::{Button, CounterUpdate, PadData, PadrecError};

fn recording_path(dir: &TempDir) -> PathBuf {
    dir.path().join("run.p2m2")
}

fn counting_pad() -> PadData {
    let mut bytes = [0u8; CONTROLLER_INPUT_BYTES];
    for (i, b) in bytes.iter_mut().enumerate() {
        *b = i as u8 + 1;
    }
    PadData::from_bytes(bytes)
}

#[test]
fn test_record_close_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = recording_path(&temp_dir);

    // Phase 1: record one frame from a savestate
    {
        let mut store = RecordingFile::new();
        store.open_new(&path, true).unwrap();
        store.write_frame(0, 0, &counting_pad()).unwrap();
        assert_eq!(store.set_total_frames(1).unwrap(), CounterUpdate::Persisted);
        assert!(store.close());
    }

    // Phase 2: reopen and check everything survived
    {
        let mut store = RecordingFile::new();
        store.open_existing(&path).unwrap();
        assert_eq!(store.header().version, FORMAT_VERSION);
        assert_eq!(store.total_frames(), 1);
        assert!(store.from_snapshot());

        for byte_index in 0..CONTROLLER_INPUT_BYTES {
            assert_eq!(
                store.read_input_byte(0, 0, byte_index).unwrap(),
                byte_index as u8 + 1
            );
        }
        assert_eq!(store.read_frame(0, 0).unwrap(), counting_pad());
    }
}

#[test]
fn test_undo_count_persists() {
    let temp_dir = TempDir::new().unwrap();
    let path = recording_path(&temp_dir);

    let mut store = RecordingFile::new();
    store.open_new(&path, false).unwrap();

    let mut previous = store.undo_count();
    for _ in 0..3 {
        assert_eq!(
            store.increment_undo_count().unwrap(),
            CounterUpdate::Persisted
        );
        assert!(store.undo_count() > previous);
        previous = store.undo_count();
    }
    assert_eq!(store.undo_count(), 3);
    store.close();

    store.open_existing(&path).unwrap();
    assert_eq!(store.undo_count(), 3);
}

#[test]
fn test_unsupported_version_leaves_store_closed() {
    let temp_dir = TempDir::new().unwrap();
    let path = recording_path(&temp_dir);

    {
        let mut store = RecordingFile::new();
        store.open_new(&path, false).unwrap();
        store.header_mut().version = FORMAT_VERSION + 1;
        store.write_header_block().unwrap();
    }

    let mut store = RecordingFile::new();
    let err = store.open_existing(&path).unwrap_err();
    assert!(matches!(err, PadrecError::UnsupportedVersion(v) if v == FORMAT_VERSION + 1));
    assert!(!store.is_open());
    assert_eq!(store.path(), None);
    assert!(!store.close());
}

#[test]
fn test_rerecord_from_middle() {
    let temp_dir = TempDir::new().unwrap();
    let path = recording_path(&temp_dir);

    let mut store = RecordingFile::new();
    store.open_new(&path, false).unwrap();
    for frame in 0..10u32 {
        for port in 0..PORT_COUNT {
            store.write_frame(frame, port, &PadData::default()).unwrap();
        }
        store.set_total_frames(frame + 1).unwrap();
    }

    // Rewind to frame 4 and record a jump on port 1
    store.increment_undo_count().unwrap();
    let mut jump = PadData::default();
    jump.set_pressed(Button::Cross, true);
    store.write_frame(4, 1, &jump).unwrap();
    assert_eq!(store.set_total_frames(5).unwrap(), CounterUpdate::Unchanged);
    store.close();

    let reader = RecordingReader::open(&path).unwrap();
    assert_eq!(reader.total_frames(), 10);
    assert_eq!(reader.undo_count(), 1);

    let port_one = reader.bulk_read_frames(0, 10, 1).unwrap();
    assert_eq!(port_one.len(), 10);
    assert!(port_one[&4].is_pressed(Button::Cross));
    assert!(!port_one[&3].is_pressed(Button::Cross));

    let port_zero = reader.bulk_read_frames(0, 10, 0).unwrap();
    assert!(port_zero.values().all(|pad| *pad == PadData::default()));
}

#[test]
fn test_bulk_read_tolerates_gaps() {
    let temp_dir = TempDir::new().unwrap();
    let path = recording_path(&temp_dir);

    let mut store = RecordingFile::new();
    store.open_new(&path, false).unwrap();
    store.write_frame(2, 0, &counting_pad()).unwrap();

    let frames = store.bulk_read_frames(-10, 100, 0).unwrap();
    assert!(frames.len() <= 110);
    assert_eq!(frames.keys().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
    assert_eq!(frames[&2], counting_pad());
}

#[test]
fn test_config_driven_recording() {
    let temp_dir = TempDir::new().unwrap();
    let path = recording_path(&temp_dir);
    let config_path = temp_dir.path().join("padrec.toml");
    std::fs::write(
        &config_path,
        r#"
            [emulator]
            name = "PCSX2"
            version_major = 1
            version_minor = 7
            version_patch = 5

            [recording]
            author = "runner"
            durability = "sync"
        "#,
    )
    .unwrap();

    let config = Config::from_file(&config_path).unwrap();
    assert_eq!(config.recording.durability, Durability::Sync);

    let mut store = RecordingFile::from_config(&config);
    store.open_new(&path, false).unwrap();
    store.stamp(&config).unwrap();
    store.header_mut().set_title("Some Game");
    store.write_header_block().unwrap();
    store.write_frame(0, 0, &PadData::default()).unwrap();
    store.close();

    let reader = RecordingReader::open(&path).unwrap();
    assert_eq!(reader.header().emulator.to_string_lossy(), "PCSX2-1.7.5");
    assert_eq!(reader.header().author.to_string_lossy(), "runner");
    assert_eq!(reader.header().title.to_string_lossy(), "Some Game");
    assert_eq!(reader.recorded_frames(), 0);
    assert_eq!(reader.frame_input(0, 0).unwrap(), Some(PadData::default()));
}

#[test]
fn test_header_survives_metadata_restamp() {
    let temp_dir = TempDir::new().unwrap();
    let path = recording_path(&temp_dir);

    let mut store = RecordingFile::new();
    store.open_new(&path, true).unwrap();
    store.write_frame(0, 0, &counting_pad()).unwrap();
    store.set_total_frames(1).unwrap();
    store.increment_undo_count().unwrap();

    store.header_mut().set_author("someone else");
    store.write_header_block().unwrap();
    store.close();

    store.open_existing(&path).unwrap();
    assert_eq!(store.total_frames(), 1);
    assert_eq!(store.undo_count(), 1);
    assert!(store.from_snapshot());
    assert_eq!(store.read_frame(0, 0).unwrap(), counting_pad());
}
