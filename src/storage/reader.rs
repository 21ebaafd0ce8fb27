//! Read-only recording view for playback tools

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use super::format::{
    frame_record_offset, input_offset, CONTROLLER_INPUT_BYTES, FRAME_DATA_OFFSET,
    INPUT_BYTES_PER_FRAME, PORT_COUNT,
};
use super::header::{decode_header_block, RecordingHeader, SessionState};
use crate::pad::PadData;
use crate::{PadrecError, Result};

/// Memory-mapped reader for recording files
pub struct RecordingReader {
    _file: File,
    mmap: Mmap,
    header: RecordingHeader,
    session: SessionState,
}

impl RecordingReader {
    /// Open an existing recording file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be opened, mapped, or is invalid
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| PadrecError::ResourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        let len = file.metadata()?.len();
        if len < FRAME_DATA_OFFSET as u64 {
            return Err(PadrecError::TruncatedHeader { len });
        }

        // SAFETY: the mapping is read-only; writers modifying the file while it
        // is mapped are outside this reader's contract.
        let mmap = unsafe { Mmap::map(&file)? };
        let (header, session) = decode_header_block(&mmap)?;

        Ok(Self {
            _file: file,
            mmap,
            header,
            session,
        })
    }

    /// Recording descriptor
    #[must_use]
    pub fn header(&self) -> &RecordingHeader {
        &self.header
    }

    /// Session counters as stored in the header
    #[must_use]
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Committed frame count from the header
    #[must_use]
    pub fn total_frames(&self) -> u32 {
        self.session.total_frames
    }

    /// Undo count from the header
    #[must_use]
    pub fn undo_count(&self) -> u32 {
        self.session.undo_count
    }

    /// Whether the recording started from a savestate
    #[must_use]
    pub fn from_snapshot(&self) -> bool {
        self.session.from_snapshot
    }

    /// Complete frame records physically present in the file
    #[must_use]
    pub fn recorded_frames(&self) -> u64 {
        (self.mmap.len() - FRAME_DATA_OFFSET) as u64 / INPUT_BYTES_PER_FRAME as u64
    }

    /// Raw record for `frame` across all ports, if fully present
    #[must_use]
    pub fn frame_record(&self, frame: u32) -> Option<&[u8]> {
        let start = usize::try_from(frame_record_offset(frame)).ok()?;
        self.mmap.get(start..start.checked_add(INPUT_BYTES_PER_FRAME)?)
    }

    /// One port's input for one frame.
    ///
    /// Returns `Ok(None)` when the block lies past the end of the file.
    ///
    /// # Errors
    ///
    /// Returns error if `port` is out of range
    pub fn frame_input(&self, frame: u32, port: usize) -> Result<Option<PadData>> {
        let Ok(start) = usize::try_from(input_offset(frame, port, 0)?) else {
            return Ok(None);
        };
        let Some(bytes) = start
            .checked_add(CONTROLLER_INPUT_BYTES)
            .and_then(|end| self.mmap.get(start..end))
        else {
            return Ok(None);
        };

        let mut block = [0u8; CONTROLLER_INPUT_BYTES];
        block.copy_from_slice(bytes);
        Ok(Some(PadData::from_bytes(block)))
    }

    /// Read `port`'s input for frames `start..end`, leaving out frames that
    /// are not in the file
    ///
    /// # Errors
    ///
    /// Returns error if `port` is out of range
    pub fn bulk_read_frames(
        &self,
        start: i64,
        end: i64,
        port: usize,
    ) -> Result<BTreeMap<u32, PadData>> {
        if port >= PORT_COUNT {
            return Err(PadrecError::AddressOutOfRange {
                port,
                byte_index: 0,
            });
        }

        let mut frames = BTreeMap::new();
        for frame in start.max(0)..end {
            let Ok(frame) = u32::try_from(frame) else {
                break;
            };
            match self.frame_input(frame, port)? {
                Some(pad) => {
                    frames.insert(frame, pad);
                }
                None => break,
            }
        }
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{RecordingFile, FORMAT_VERSION};
    use tempfile::NamedTempFile;

    fn pad_with(value: u8) -> PadData {
        PadData::from_bytes([value; CONTROLLER_INPUT_BYTES])
    }

    #[test]
    fn test_roundtrip() {
        let file = NamedTempFile::new().unwrap();

        // Write
        {
            let mut store = RecordingFile::new();
            store.open_new(file.path(), true).unwrap();
            store.header_mut().set_title("Some Game");
            store.write_header_block().unwrap();

            for frame in 0..4u32 {
                store.write_frame(frame, 0, &pad_with(frame as u8)).unwrap();
                store.write_frame(frame, 1, &pad_with(0xF0)).unwrap();
            }
            store.set_total_frames(4).unwrap();
        }

        // Read
        {
            let reader = RecordingReader::open(file.path()).unwrap();
            assert_eq!(reader.header().version, FORMAT_VERSION);
            assert_eq!(reader.header().title.to_string_lossy(), "Some Game");
            assert_eq!(reader.total_frames(), 4);
            assert_eq!(reader.recorded_frames(), 4);
            assert!(reader.from_snapshot());

            assert_eq!(reader.frame_input(2, 0).unwrap(), Some(pad_with(2)));
            assert_eq!(reader.frame_input(2, 1).unwrap(), Some(pad_with(0xF0)));
            assert_eq!(reader.frame_input(4, 0).unwrap(), None);

            let record = reader.frame_record(3).unwrap();
            assert_eq!(record.len(), INPUT_BYTES_PER_FRAME);
            assert_eq!(record[0], 3);
            assert_eq!(record[CONTROLLER_INPUT_BYTES], 0xF0);
        }
    }

    #[test]
    fn test_bulk_read_matches_store() {
        let file = NamedTempFile::new().unwrap();
        let mut store = RecordingFile::new();
        store.open_new(file.path(), false).unwrap();
        for frame in 0..6u32 {
            store.write_frame(frame, 1, &pad_with(frame as u8)).unwrap();
        }

        let from_store = store.bulk_read_frames(-1, 9, 1).unwrap();
        let reader = RecordingReader::open(file.path()).unwrap();
        let from_reader = reader.bulk_read_frames(-1, 9, 1).unwrap();
        assert_eq!(from_store, from_reader);
        assert_eq!(from_reader.len(), 6);
    }

    #[test]
    fn test_rejects_short_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), [FORMAT_VERSION; 12]).unwrap();

        assert!(matches!(
            RecordingReader::open(file.path()),
            Err(PadrecError::TruncatedHeader { len: 12 })
        ));
    }

    #[test]
    fn test_rejects_unsupported_version() {
        let file = NamedTempFile::new().unwrap();
        let mut bytes = vec![0u8; FRAME_DATA_OFFSET + INPUT_BYTES_PER_FRAME];
        bytes[0] = 3;
        std::fs::write(file.path(), bytes).unwrap();

        assert!(matches!(
            RecordingReader::open(file.path()),
            Err(PadrecError::UnsupportedVersion(3))
        ));
    }

    #[test]
    fn test_last_frame_index_is_absent() {
        let file = NamedTempFile::new().unwrap();
        let mut store = RecordingFile::new();
        store.open_new(file.path(), false).unwrap();
        store.write_frame(0, 0, &pad_with(1)).unwrap();

        let reader = RecordingReader::open(file.path()).unwrap();
        assert_eq!(reader.frame_record(u32::MAX), None);
        assert_eq!(reader.frame_input(u32::MAX, 1).unwrap(), None);
        assert!(reader
            .bulk_read_frames(i64::from(u32::MAX), i64::from(u32::MAX) + 5, 0)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_invalid_port() {
        let file = NamedTempFile::new().unwrap();
        let mut store = RecordingFile::new();
        store.open_new(file.path(), false).unwrap();

        let reader = RecordingReader::open(file.path()).unwrap();
        assert_eq!(reader.recorded_frames(), 0);
        assert!(matches!(
            reader.frame_input(0, PORT_COUNT),
            Err(PadrecError::AddressOutOfRange { .. })
        ));
    }
}
