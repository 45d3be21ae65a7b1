//! Streaming AVI Writer
//!
//! This crate writes AVI (Audio Video Interleave) files from frames and audio
//! blocks that were already encoded elsewhere. Samples are written to disk as
//! they arrive; only a small index entry per sample is kept in memory.
//!
//! # Features
//!
//! - One video stream (`00dc` chunks) and an optional PCM audio stream
//!   (`01wb` chunks)
//! - `idx1` index written on close
//! - Frame rate, codec and frame size can be changed until the file is closed
//! - Optional color table for palettized video
//! - Works on any `Write + Seek` sink, not just files
//!
//! Files are limited to the 32-bit RIFF size (OpenDML is not supported).
//!
//! # Example
//!
//! ```no_run
//! use transcode_avistream::{AviWriter, StreamParams};
//!
//! let mut writer = AviWriter::create("video.avi", StreamParams::new(4, 4, *b"XVID", 25)).unwrap();
//! writer.append_frame(&[0xAA, 0xAA, 0xAA]).unwrap();
//! writer.close().unwrap();
//! ```

mod chunks;
mod config;
mod error;
mod header;
mod index;
mod io;
mod types;
mod writer;

pub use chunks::{chunk_ids, padded_len, padding_for, ChunkKind, FourCC, CHUNK_ALIGNMENT};
pub use config::{frame_bytes, frame_delay_us, AudioSpec, StreamParams, MAX_PALETTE_ENTRIES};
pub use error::{AviError, Result};
pub use header::{AudioStream, AviHeaders};
pub use index::{IndexEntry, IndexRecord, IndexTable, INDEX_GROWTH};
pub use io::{RiffWriter, SizeMarker};
pub use types::{
    codec, AudioFormat, AviFlags, AviHeader, PaletteEntry, Rect, StreamHeader, StreamType,
    VideoFormat,
};
pub use writer::AviWriter;
