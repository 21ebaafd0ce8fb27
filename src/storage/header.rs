//! Recording header and session counters

use std::fmt;

use bytemuck::{bytes_of, pod_read_unaligned, Pod, Zeroable};

use super::format::{
    FixedText, AUTHOR_CAPACITY, DESCRIPTOR_SIZE, EMULATOR_CAPACITY, FORMAT_VERSION,
    FRAME_DATA_OFFSET, SNAPSHOT_FLAG_OFFSET, TITLE_CAPACITY, TOTAL_FRAMES_OFFSET,
    UNDO_COUNT_OFFSET,
};
use crate::{PadrecError, Result};

/// Fixed-size recording descriptor (561 bytes, unaligned)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct RecordingHeader {
    /// Format version
    pub version: u8,

    /// Producing emulator name and version
    pub emulator: FixedText<EMULATOR_CAPACITY>,

    /// Who made the recording
    pub author: FixedText<AUTHOR_CAPACITY>,

    /// Target title the recording plays back against
    pub title: FixedText<TITLE_CAPACITY>,
}

static_assertions::const_assert_eq!(std::mem::size_of::<RecordingHeader>(), DESCRIPTOR_SIZE);
static_assertions::const_assert_eq!(std::mem::align_of::<RecordingHeader>(), 1);

impl Default for RecordingHeader {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            emulator: FixedText::new(),
            author: FixedText::new(),
            title: FixedText::new(),
        }
    }
}

impl RecordingHeader {
    /// Reset every field, dropping any loaded identity
    pub fn init(&mut self) {
        *self = Self::default();
    }

    /// Set the emulator identity string
    pub fn set_emulator_identity(&mut self, identity: &str) {
        self.emulator.set(identity);
    }

    /// Stamp the identity composed from a product name and version
    pub fn set_emulator(&mut self, identity: &EmulatorIdentity) {
        self.set_emulator_identity(&identity.to_string());
    }

    /// Set the author
    pub fn set_author(&mut self, author: &str) {
        self.author.set(author);
    }

    /// Set the target title
    pub fn set_title(&mut self, title: &str) {
        self.title.set(title);
    }
}

/// Product name and three-part version of the emulator writing a recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorIdentity {
    /// Product name
    pub name: String,
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
    /// Patch version
    pub patch: u32,
}

impl EmulatorIdentity {
    /// Identity of an arbitrary product
    pub fn new(name: impl Into<String>, major: u32, minor: u32, patch: u32) -> Self {
        Self {
            name: name.into(),
            major,
            minor,
            patch,
        }
    }

    /// Identity of this build
    #[must_use]
    pub fn current() -> Self {
        Self::new(
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0),
            env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0),
            env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0),
        )
    }
}

impl Default for EmulatorIdentity {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for EmulatorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}.{}.{}", self.name, self.major, self.minor, self.patch)
    }
}

/// Mutable counters stored right after the descriptor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Highest frame count ever committed
    pub total_frames: u32,
    /// Undo/rewind operations performed
    pub undo_count: u32,
    /// Recording began from a savestate rather than power-on
    pub from_snapshot: bool,
}

/// Serialize the header block exactly as it sits at the start of the file
#[must_use]
pub fn encode_header_block(
    header: &RecordingHeader,
    session: &SessionState,
) -> [u8; FRAME_DATA_OFFSET] {
    let mut block = [0u8; FRAME_DATA_OFFSET];
    block[..DESCRIPTOR_SIZE].copy_from_slice(bytes_of(header));
    block[TOTAL_FRAMES_OFFSET..UNDO_COUNT_OFFSET]
        .copy_from_slice(&session.total_frames.to_le_bytes());
    block[UNDO_COUNT_OFFSET..SNAPSHOT_FLAG_OFFSET]
        .copy_from_slice(&session.undo_count.to_le_bytes());
    block[SNAPSHOT_FLAG_OFFSET] = u8::from(session.from_snapshot);
    block
}

/// Parse and validate the header block at the start of `bytes`.
///
/// # Errors
///
/// Returns error if `bytes` is shorter than the header block or the version
/// is not [`FORMAT_VERSION`]
pub fn decode_header_block(bytes: &[u8]) -> Result<(RecordingHeader, SessionState)> {
    if bytes.len() < FRAME_DATA_OFFSET {
        return Err(PadrecError::TruncatedHeader {
            len: bytes.len() as u64,
        });
    }

    let header: RecordingHeader = pod_read_unaligned(&bytes[..DESCRIPTOR_SIZE]);
    super::validate_header(&header)?;

    let session = SessionState {
        total_frames: read_u32(bytes, TOTAL_FRAMES_OFFSET),
        undo_count: read_u32(bytes, UNDO_COUNT_OFFSET),
        from_snapshot: bytes[SNAPSHOT_FLAG_OFFSET] != 0,
    };

    Ok((header, session))
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(raw)
}
