//! Error types for Padrec

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for Padrec operations
pub type Result<T> = std::result::Result<T, PadrecError>;

/// Errors that can occur in Padrec
#[derive(Debug, Error)]
pub enum PadrecError {
    /// Recording file could not be created or opened
    #[error("Cannot open recording {}: {source}", .path.display())]
    ResourceUnavailable {
        /// Path that was being opened
        path: PathBuf,
        /// Underlying OS error
        source: io::Error,
    },

    /// Header carries a version this build does not understand
    #[error("Input recording file is not a supported version - {0}")]
    UnsupportedVersion(u8),

    /// File ends before the header block does
    #[error("Input recording header is truncated: {len} bytes available")]
    TruncatedHeader {
        /// Bytes that were actually available
        len: u64,
    },

    /// Requested input lies beyond the readable part of the file
    #[error("No recorded input at offset {offset}")]
    PositionUnsatisfiable {
        /// Absolute byte offset that was requested
        offset: u64,
    },

    /// Port or byte index outside the fixed frame layout
    #[error("Input address out of range: port {port}, byte {byte_index}")]
    AddressOutOfRange {
        /// Requested port
        port: usize,
        /// Requested byte index within the port block
        byte_index: usize,
    },

    /// Operation needs an open recording file
    #[error("Input recording file is not open")]
    NotOpen,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl PadrecError {
    /// Whether the caller can keep going after this error.
    ///
    /// Reading a frame that was never recorded is part of normal forward
    /// recording, not a sign of a damaged file.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PositionUnsatisfiable { .. })
    }

    /// Whether the header was rejected as an unsupported or short file
    #[must_use]
    pub fn is_format_invalid(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedVersion(_) | Self::TruncatedHeader { .. }
        )
    }
}
