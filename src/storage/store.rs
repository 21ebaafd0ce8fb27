//! Read/write recording store

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::format::{input_offset, CONTROLLER_INPUT_BYTES, FRAME_DATA_OFFSET, PORT_COUNT};
use super::format::{TOTAL_FRAMES_OFFSET, UNDO_COUNT_OFFSET};
use super::header::{decode_header_block, encode_header_block, RecordingHeader, SessionState};
use crate::config::{Config, Durability};
use crate::pad::PadData;
use crate::{PadrecError, Result};

/// Outcome of a counter update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterUpdate {
    /// Value changed and was written to the file
    Persisted,
    /// Value would not increase; nothing written
    Unchanged,
    /// No file open; nothing written
    StoreClosed,
}

/// Recording file opened for recording, editing or playback.
///
/// Every write is flushed before returning, so the file stays usable if the
/// session dies between calls. Header and counters stay readable after
/// [`close`](Self::close).
#[derive(Debug, Default)]
pub struct RecordingFile {
    file: Option<File>,
    path: Option<PathBuf>,
    header: RecordingHeader,
    session: SessionState,
    durability: Durability,
}

impl RecordingFile {
    /// Closed store with default durability
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Closed store with the given durability
    #[must_use]
    pub fn with_durability(durability: Durability) -> Self {
        Self {
            durability,
            ..Self::default()
        }
    }

    /// Closed store configured from `config`
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::with_durability(config.recording.durability)
    }

    /// Create or truncate a recording at `path`.
    ///
    /// Resets the header and counters and writes the fresh header block.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be created for read/write or the
    /// header block cannot be written
    pub fn open_new(&mut self, path: &Path, from_snapshot: bool) -> Result<()> {
        self.close();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| open_failed(path, e))?;

        self.file = Some(file);
        self.path = Some(path.to_path_buf());
        self.header.init();
        self.session = SessionState {
            total_frames: 0,
            undo_count: 0,
            from_snapshot,
        };

        if let Err(e) = self.write_header_block() {
            self.close();
            return Err(e);
        }

        debug!(path = %path.display(), from_snapshot, "Created input recording");
        Ok(())
    }

    /// Open an existing recording at `path` and validate its header.
    ///
    /// On failure the store is left closed and the in-memory model untouched.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened, the header is short, or
    /// the version is unsupported
    pub fn open_existing(&mut self, path: &Path) -> Result<()> {
        self.close();

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| open_failed(path, e))?;

        let mut block = Vec::with_capacity(FRAME_DATA_OFFSET);
        Read::by_ref(&mut file)
            .take(FRAME_DATA_OFFSET as u64)
            .read_to_end(&mut block)
            .map_err(|e| open_failed(path, e))?;

        // Version mismatches are already logged by `validate_header`.
        let (header, session) = decode_header_block(&block).map_err(|e| {
            if let PadrecError::TruncatedHeader { .. } = e {
                warn!(path = %path.display(), "Input recording file header is invalid: {e}");
            }
            e
        })?;

        self.file = Some(file);
        self.path = Some(path.to_path_buf());
        self.header = header;
        self.session = session;

        debug!(
            path = %path.display(),
            total_frames = session.total_frames,
            undo_count = session.undo_count,
            "Opened input recording"
        );
        Ok(())
    }

    /// Release the file handle; returns false if nothing was open
    pub fn close(&mut self) -> bool {
        let Some(file) = self.file.take() else {
            return false;
        };
        drop(file);

        if let Some(path) = self.path.take() {
            debug!(path = %path.display(), "Closed input recording");
        }
        true
    }

    /// Whether a file is open
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Path of the open file
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Recording descriptor
    #[must_use]
    pub fn header(&self) -> &RecordingHeader {
        &self.header
    }

    /// Mutable descriptor; call [`write_header_block`](Self::write_header_block)
    /// to persist edits
    pub fn header_mut(&mut self) -> &mut RecordingHeader {
        &mut self.header
    }

    /// Session counters
    #[must_use]
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Highest frame count committed
    #[must_use]
    pub fn total_frames(&self) -> u32 {
        self.session.total_frames
    }

    /// Undo operations recorded
    #[must_use]
    pub fn undo_count(&self) -> u32 {
        self.session.undo_count
    }

    /// Whether the recording started from a savestate
    #[must_use]
    pub fn from_snapshot(&self) -> bool {
        self.session.from_snapshot
    }

    /// Stamp emulator identity and author from `config` and persist the header
    ///
    /// # Errors
    ///
    /// Returns error if the store is closed or the write fails
    pub fn stamp(&mut self, config: &Config) -> Result<()> {
        self.header.set_emulator(&config.emulator.identity());
        self.header.set_author(&config.recording.author);
        self.write_header_block()
    }

    /// Read one controller byte
    ///
    /// # Errors
    ///
    /// Returns error if the store is closed, the address is out of range, or
    /// nothing has been recorded at that position
    pub fn read_input_byte(&mut self, frame: u32, port: usize, byte_index: usize) -> Result<u8> {
        let file = self.file.as_mut().ok_or(PadrecError::NotOpen)?;
        let mut byte = [0u8; 1];
        read_at(file, input_offset(frame, port, byte_index)?, &mut byte)?;
        Ok(byte[0])
    }

    /// Write one controller byte and flush
    ///
    /// # Errors
    ///
    /// Returns error if the store is closed, the address is out of range, or
    /// the write fails
    pub fn write_input_byte(
        &mut self,
        frame: u32,
        port: usize,
        byte_index: usize,
        value: u8,
    ) -> Result<()> {
        if !self.is_open() {
            return Err(PadrecError::NotOpen);
        }
        let offset = input_offset(frame, port, byte_index)?;
        self.write_at(offset, &[value])
    }

    /// Write a port's whole input block for one frame.
    ///
    /// Bytes are written in order; on the first failure the rest of the block
    /// is left as it was.
    ///
    /// # Errors
    ///
    /// Returns the first byte write error
    pub fn write_frame(&mut self, frame: u32, port: usize, pad: &PadData) -> Result<()> {
        for (byte_index, &value) in pad.as_bytes().iter().enumerate() {
            self.write_input_byte(frame, port, byte_index, value)?;
        }
        Ok(())
    }

    /// Read a port's whole input block for one frame
    ///
    /// # Errors
    ///
    /// Returns error if the store is closed, the port is out of range, or the
    /// block is not fully recorded
    pub fn read_frame(&mut self, frame: u32, port: usize) -> Result<PadData> {
        let file = self.file.as_mut().ok_or(PadrecError::NotOpen)?;
        let mut bytes = [0u8; CONTROLLER_INPUT_BYTES];
        read_at(file, input_offset(frame, port, 0)?, &mut bytes)?;
        Ok(PadData::from_bytes(bytes))
    }

    /// Read `port`'s input for frames `start..end`.
    ///
    /// `start` is clamped to zero. Frames that cannot be read are left out of
    /// the map; a missing key means "no data", not failure.
    ///
    /// # Errors
    ///
    /// Returns error if the store is closed or `port` is out of range
    pub fn bulk_read_frames(
        &mut self,
        start: i64,
        end: i64,
        port: usize,
    ) -> Result<BTreeMap<u32, PadData>> {
        if !self.is_open() {
            return Err(PadrecError::NotOpen);
        }
        if port >= PORT_COUNT {
            return Err(PadrecError::AddressOutOfRange {
                port,
                byte_index: 0,
            });
        }

        let mut frames = BTreeMap::new();
        let mut skipped = 0u64;
        for frame in start.max(0)..end {
            let Ok(frame) = u32::try_from(frame) else {
                break;
            };
            match self.read_frame(frame, port) {
                Ok(pad) => {
                    frames.insert(frame, pad);
                }
                // Everything after the end of the file is unreadable too.
                Err(PadrecError::PositionUnsatisfiable { .. }) => {
                    skipped += (end - i64::from(frame)).unsigned_abs();
                    break;
                }
                Err(e) => {
                    warn!(frame, port, "Skipping unreadable frame: {e}");
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            debug!(start, end, port, skipped, "Bulk read left out unrecorded frames");
        }
        Ok(frames)
    }

    /// Raise the committed frame count to `frame` and persist it.
    ///
    /// Never lowers the count.
    ///
    /// # Errors
    ///
    /// Returns error if the counter write fails
    pub fn set_total_frames(&mut self, frame: u32) -> Result<CounterUpdate> {
        if !self.is_open() {
            return Ok(CounterUpdate::StoreClosed);
        }
        if frame <= self.session.total_frames {
            return Ok(CounterUpdate::Unchanged);
        }

        self.session.total_frames = frame;
        self.write_at(TOTAL_FRAMES_OFFSET as u64, &frame.to_le_bytes())?;
        Ok(CounterUpdate::Persisted)
    }

    /// Count one undo; persisted only while a file is open
    ///
    /// # Errors
    ///
    /// Returns error if the counter write fails
    pub fn increment_undo_count(&mut self) -> Result<CounterUpdate> {
        self.session.undo_count = self.session.undo_count.saturating_add(1);
        if !self.is_open() {
            return Ok(CounterUpdate::StoreClosed);
        }

        let undo_count = self.session.undo_count;
        self.write_at(UNDO_COUNT_OFFSET as u64, &undo_count.to_le_bytes())?;
        Ok(CounterUpdate::Persisted)
    }

    /// Persist header, counters and snapshot flag at the start of the file
    ///
    /// # Errors
    ///
    /// Returns error if the store is closed or the write fails
    pub fn write_header_block(&mut self) -> Result<()> {
        let block = encode_header_block(&self.header, &self.session);
        self.write_at(0, &block)
    }

    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        let durability = self.durability;
        let file = self.file.as_mut().ok_or(PadrecError::NotOpen)?;

        file.seek(SeekFrom::Start(offset))?;
        file.write_all(bytes)?;
        file.flush()?;
        if durability == Durability::Sync {
            file.sync_data()?;
        }
        Ok(())
    }
}

fn read_at(file: &mut File, offset: u64, buf: &mut [u8]) -> Result<()> {
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => PadrecError::PositionUnsatisfiable { offset },
        _ => PadrecError::Io(e),
    })
}

fn open_failed(path: &Path, source: io::Error) -> PadrecError {
    warn!(path = %path.display(), "Input recording file opening failed. Error - {source}");
    PadrecError::ResourceUnavailable {
        path: path.to_path_buf(),
        source,
    }
}
