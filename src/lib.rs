//! Padrec - frame-indexed controller input recordings
//!
//! Stores per-frame raw controller bytes for every input port behind a fixed
//! header, for deterministic emulator replay. Supports sequential append while
//! recording, point reads/writes while re-recording, and ranged reads for
//! playback.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::cast_lossless,
    clippy::multiple_crate_versions
)]

pub mod config;
pub mod error;
pub mod pad;
pub mod storage;

pub use error::{PadrecError, Result};
pub use pad::{Button, PadData};
pub use storage::{CounterUpdate, RecordingFile, RecordingHeader, RecordingReader};
