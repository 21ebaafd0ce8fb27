//! Binary format constants and frame addressing

use std::borrow::Cow;
use std::fmt;

use bytemuck::{Pod, Zeroable};

use crate::{PadrecError, Result};

/// Only header version this build reads or writes
pub const FORMAT_VERSION: u8 = 1;

/// Emulator identity field capacity, terminator included
pub const EMULATOR_CAPACITY: usize = 50;

/// Author field capacity, terminator included
pub const AUTHOR_CAPACITY: usize = 255;

/// Title field capacity, terminator included
pub const TITLE_CAPACITY: usize = 255;

/// Size of the fixed descriptor: version byte plus the three text fields
pub const DESCRIPTOR_SIZE: usize = 1 + EMULATOR_CAPACITY + AUTHOR_CAPACITY + TITLE_CAPACITY;

/// Offset of the total frame counter (u32, little-endian)
pub const TOTAL_FRAMES_OFFSET: usize = DESCRIPTOR_SIZE;

/// Offset of the undo counter (u32, little-endian)
pub const UNDO_COUNT_OFFSET: usize = TOTAL_FRAMES_OFFSET + 4;

/// Descriptor plus both session counters
pub const HEADER_BLOCK_SIZE: usize = UNDO_COUNT_OFFSET + 4;

/// Offset of the started-from-snapshot flag (one byte)
pub const SNAPSHOT_FLAG_OFFSET: usize = HEADER_BLOCK_SIZE;

/// Offset of the first frame record
pub const FRAME_DATA_OFFSET: usize = SNAPSHOT_FLAG_OFFSET + 1;

/// Controller ports recorded per frame
pub const PORT_COUNT: usize = 2;

/// Raw controller bytes per port per frame
pub const CONTROLLER_INPUT_BYTES: usize = 18;

/// Size of one frame record across all ports
pub const INPUT_BYTES_PER_FRAME: usize = PORT_COUNT * CONTROLLER_INPUT_BYTES;

static_assertions::const_assert_eq!(DESCRIPTOR_SIZE, 561);
static_assertions::const_assert_eq!(FRAME_DATA_OFFSET, 570);
static_assertions::const_assert_eq!(INPUT_BYTES_PER_FRAME, 36);

/// Absolute offset of the first byte of `frame`'s record
#[must_use]
pub const fn frame_record_offset(frame: u32) -> u64 {
    FRAME_DATA_OFFSET as u64 + frame as u64 * INPUT_BYTES_PER_FRAME as u64
}

/// Absolute offset of one controller byte.
///
/// Every read and write path addresses input through this function.
///
/// # Errors
///
/// Returns error if `port` or `byte_index` fall outside the frame layout
pub fn input_offset(frame: u32, port: usize, byte_index: usize) -> Result<u64> {
    if port >= PORT_COUNT || byte_index >= CONTROLLER_INPUT_BYTES {
        return Err(PadrecError::AddressOutOfRange { port, byte_index });
    }
    Ok(frame_record_offset(frame) + (port * CONTROLLER_INPUT_BYTES + byte_index) as u64)
}

/// Null-padded text field of fixed on-disk capacity.
///
/// Setting a value truncates it to `N - 1` bytes and zero-fills the rest, so
/// the field always holds a terminator.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct FixedText<const N: usize>([u8; N]);

// SAFETY: transparent wrapper over a byte array, every bit pattern is valid
// and there is no padding.
unsafe impl<const N: usize> Zeroable for FixedText<N> {}
// SAFETY: see above.
unsafe impl<const N: usize> Pod for FixedText<N> {}

impl<const N: usize> FixedText<N> {
    /// Empty (all zero) field
    #[must_use]
    pub const fn new() -> Self {
        Self([0; N])
    }

    /// Field capacity in bytes, terminator included
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Replace the contents, truncating to fit.
    ///
    /// Copying stops at an embedded NUL. Truncation never splits a UTF-8
    /// sequence.
    pub fn set(&mut self, text: &str) {
        let text = text.split('\0').next().unwrap_or_default();
        let mut len = text.len().min(N.saturating_sub(1));
        while !text.is_char_boundary(len) {
            len -= 1;
        }

        self.0 = [0; N];
        self.0[..len].copy_from_slice(&text.as_bytes()[..len]);
    }

    /// Zero the whole field
    pub fn clear(&mut self) {
        self.0 = [0; N];
    }

    /// Raw bytes as stored on disk
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }

    /// Text up to the first terminator
    #[must_use]
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(N);
        String::from_utf8_lossy(&self.0[..end])
    }

    /// Whether the field holds no text
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.first().map_or(true, |&b| b == 0)
    }
}

impl<const N: usize> Default for FixedText<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for FixedText<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.to_string_lossy(), f)
    }
}

impl<const N: usize> fmt::Display for FixedText<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}
