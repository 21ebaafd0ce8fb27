//! Binary storage format for input recordings

mod format;
mod header;
mod reader;
mod store;

pub use format::{
    frame_record_offset, input_offset, FixedText, AUTHOR_CAPACITY, CONTROLLER_INPUT_BYTES,
    DESCRIPTOR_SIZE, EMULATOR_CAPACITY, FORMAT_VERSION, FRAME_DATA_OFFSET, HEADER_BLOCK_SIZE,
    INPUT_BYTES_PER_FRAME, PORT_COUNT, SNAPSHOT_FLAG_OFFSET, TITLE_CAPACITY, TOTAL_FRAMES_OFFSET,
    UNDO_COUNT_OFFSET,
};
pub use header::{
    decode_header_block, encode_header_block, EmulatorIdentity, RecordingHeader, SessionState,
};
pub use reader::RecordingReader;
pub use store::{CounterUpdate, RecordingFile};

use crate::Result;

/// Validate recording header version
///
/// # Errors
///
/// Returns error if version is not supported
pub fn validate_header(header: &RecordingHeader) -> Result<()> {
    if header.version != FORMAT_VERSION {
        tracing::warn!(
            version = header.version,
            "Input recording file is not a supported version - {}",
            header.version
        );
        return Err(crate::PadrecError::UnsupportedVersion(header.version));
    }

    Ok(())
}
