//! Streaming AVI writer
//!
//! ## Example
//!
//! ```no_run
//! use transcode_avistream::{AudioSpec, AviWriter, StreamParams};
//!
//! let params = StreamParams::new(320, 240, *b"MJPG", 25).with_audio(AudioSpec::cd_quality());
//! let mut writer = AviWriter::create("output.avi", params).unwrap();
//!
//! // let jpeg: Vec<u8> = encoder.encode(&frame);
//! // writer.append_frame(&jpeg).unwrap();
//! // writer.append_audio(&pcm_block).unwrap();
//!
//! writer.close().unwrap();
//! ```

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::chunks::{chunk_ids, padded_len, padding_for, ChunkKind, FourCC};
use crate::config::StreamParams;
use crate::error::{AviError, Result};
use crate::header::AviHeaders;
use crate::index::{IndexTable, CHUNK_HEADER_SIZE, INDEX_RECORD_SIZE};
use crate::io::RiffWriter;
use crate::types::{AudioFormat, AviHeader, StreamHeader, VideoFormat};

/// Offset of the RIFF size field from the start of the file
const RIFF_SIZE_OFFSET: u64 = 4;
/// Offset of the `hdrl` list from the start of the file
const HEADER_LIST_OFFSET: u64 = 12;
/// Largest file a 32-bit RIFF size field can describe
const MAX_RIFF_FILE_SIZE: u64 = u32::MAX as u64;

/// An AVI file being written.
///
/// Created by [`AviWriter::create`] or [`AviWriter::new`], fed with
/// [`append_frame`](AviWriter::append_frame) and
/// [`append_audio`](AviWriter::append_audio) in presentation order, and
/// finished with [`close`](AviWriter::close). Header fields whose final value
/// is only known at the end are written as placeholders and patched on
/// close.
///
/// If any call fails the file is left in an unknown state and the writer
/// should be dropped. Dropping a writer without closing it leaves an
/// incomplete file behind.
#[derive(Debug)]
pub struct AviWriter<W: Write + Seek> {
    sink: RiffWriter<W>,
    headers: AviHeaders,
    index: IndexTable,
    /// Absolute offset where the file starts in the sink
    origin: u64,
    /// Absolute offset of the `movi` list size field
    movi_size_offset: u64,
    /// Bytes taken by the `hdrl` list, identical on every rewrite
    header_len: u64,
}

impl AviWriter<BufWriter<File>> {
    /// Create (or truncate) `path` and write the file header.
    pub fn create<P: AsRef<Path>>(path: P, params: StreamParams) -> Result<Self> {
        let path = path.as_ref();
        params.validate()?;

        let file = File::create(path).map_err(|source| AviError::SinkCreation {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Created AVI output {}", path.display());

        Self::new(BufWriter::new(file), params)
    }
}

impl<W: Write + Seek> AviWriter<W> {
    /// Start an AVI file at the sink's current position.
    pub fn new(sink: W, params: StreamParams) -> Result<Self> {
        let headers = AviHeaders::from_params(&params)?;
        let mut sink = RiffWriter::new(sink)?;
        let origin = sink.position();

        sink.write_fourcc(chunk_ids::RIFF)?;
        sink.write_u32(0)?; // size, patched on close
        sink.write_fourcc(chunk_ids::AVI)?;

        let header_len = headers.write(&mut sink)?;

        sink.write_fourcc(chunk_ids::LIST)?;
        let movi_size = sink.reserve_size()?;
        sink.write_fourcc(chunk_ids::MOVI)?;

        let index = IndexTable::new()?;

        debug!(
            width = params.width,
            height = params.height,
            codec = %params.codec(),
            fps = params.fps,
            audio = params.audio.is_some(),
            "AVI header written, movi starts at {}",
            movi_size.offset() - 4
        );

        Ok(AviWriter {
            sink,
            headers,
            index,
            origin,
            movi_size_offset: movi_size.offset(),
            header_len,
        })
    }

    /// Append one encoded video frame as a `00dc` chunk.
    pub fn append_frame(&mut self, data: &[u8]) -> Result<()> {
        let length = self.check_chunk(data.len())?;

        self.index.push(ChunkKind::Video, length)?;
        self.headers.video.length += 1;

        self.write_chunk(ChunkKind::Video, data, length)
    }

    /// Append one block of audio samples as a `01wb` chunk.
    ///
    /// Fails with [`AviError::NoAudioStream`] if the file was opened without
    /// audio; nothing is written in that case.
    pub fn append_audio(&mut self, data: &[u8]) -> Result<()> {
        if self.headers.audio.is_none() {
            warn!("Audio block of {} bytes dropped: no audio stream", data.len());
            return Err(AviError::NoAudioStream);
        }
        let length = self.check_chunk(data.len())?;

        self.index.push(ChunkKind::Audio, length)?;
        if let Some(audio) = self.headers.audio.as_mut() {
            audio.header.length += length;
        }

        self.write_chunk(ChunkKind::Audio, data, length)
    }

    /// Padded length of a new chunk, provided the file stays within the
    /// 32-bit RIFF limit once the chunk and its index record are added.
    fn check_chunk(&self, len: usize) -> Result<u32> {
        let length = padded_len(len).ok_or(AviError::ChunkTooLarge { len })?;
        let projected = self.sink.position()
            + (CHUNK_HEADER_SIZE + INDEX_RECORD_SIZE) as u64
            + length as u64
            + self.index.idx1_len()
            + CHUNK_HEADER_SIZE as u64
            - self.origin;
        if projected > MAX_RIFF_FILE_SIZE {
            warn!("Chunk of {} bytes would exceed the RIFF size limit", len);
            return Err(AviError::FileTooLarge { size: projected });
        }
        Ok(length)
    }

    fn write_chunk(&mut self, kind: ChunkKind, data: &[u8], length: u32) -> Result<()> {
        trace!(
            chunk = %kind.chunk_id(),
            len = data.len(),
            offset = self.sink.position(),
            "Writing chunk"
        );
        self.sink.write_fourcc(kind.chunk_id())?;
        self.sink.write_u32(length)?;
        self.sink.write_bytes(data)?;
        self.sink.write_zeros(padding_for(data.len()))
    }

    /// Change the frame rate recorded in the headers.
    pub fn set_framerate(&mut self, fps: u32) -> Result<()> {
        self.headers.set_framerate(fps)
    }

    /// Change the video codec recorded in the headers.
    pub fn set_codec(&mut self, fourcc: impl Into<FourCC>) {
        self.headers.set_codec(fourcc.into())
    }

    /// Change the frame size recorded in the headers.
    pub fn set_size(&mut self, width: u32, height: u32) -> Result<()> {
        self.headers.set_size(width, height)
    }

    /// Finish the file and release the sink.
    pub fn close(self) -> Result<()> {
        self.finish().map(drop)
    }

    /// Finish the file and hand the sink back.
    ///
    /// Patches the `movi` size, appends the `idx1` index, rewrites the header
    /// list with the final frame count and patches the RIFF size. A failure
    /// part way leaves the earlier steps in place.
    pub fn finish(mut self) -> Result<W> {
        let movi_end = self.sink.position();
        let movi_size = movi_end - self.movi_size_offset - 8;
        self.sink.patch_u32(self.movi_size_offset, movi_size as u32)?;

        self.write_index()?;
        let chunk_count = self.index.len();
        self.index = IndexTable::default();

        self.headers.main.total_frames = self.headers.video.length;

        let file_end = self.sink.position();
        self.sink.seek_to(self.origin + HEADER_LIST_OFFSET)?;
        let rewritten = self.headers.write(&mut self.sink)?;
        debug_assert_eq!(rewritten, self.header_len);
        self.sink.seek_to(file_end)?;

        let riff_size = file_end - self.origin - 8;
        self.sink
            .patch_u32(self.origin + RIFF_SIZE_OFFSET, riff_size as u32)?;

        self.headers.video_format.palette = Vec::new();

        debug!(
            frames = self.headers.main.total_frames,
            chunks = chunk_count,
            "AVI finalized, total size: {}",
            file_end - self.origin
        );

        self.sink.into_inner()
    }

    /// Write idx1 index
    fn write_index(&mut self) -> Result<()> {
        self.sink.write_fourcc(chunk_ids::IDX1)?;
        let size = u32::try_from(self.index.idx1_len()).map_err(|_| AviError::FileTooLarge {
            size: self.index.idx1_len(),
        })?;
        self.sink.write_u32(size)?;

        for record in self.index.records() {
            self.sink.write_bytes(&record.to_bytes())?;
        }
        Ok(())
    }

    pub fn header(&self) -> &AviHeader {
        &self.headers.main
    }

    pub fn video_stream(&self) -> &StreamHeader {
        &self.headers.video
    }

    pub fn video_format(&self) -> &VideoFormat {
        &self.headers.video_format
    }

    pub fn audio_stream(&self) -> Option<&StreamHeader> {
        self.headers.audio.as_ref().map(|a| &a.header)
    }

    pub fn audio_format(&self) -> Option<&AudioFormat> {
        self.headers.audio.as_ref().map(|a| &a.format)
    }

    pub fn has_audio(&self) -> bool {
        self.headers.audio.is_some()
    }

    /// Chunks appended so far, video and audio
    pub fn chunk_count(&self) -> usize {
        self.index.len()
    }

    /// Video frames appended so far
    pub fn frame_count(&self) -> u32 {
        self.headers.video.length
    }

    pub fn index(&self) -> &IndexTable {
        &self.index
    }

    /// Absolute position of the next byte to be written
    pub fn position(&self) -> u64 {
        self.sink.position()
    }

    /// Absolute offset of the `movi` list size field
    pub fn movi_size_offset(&self) -> u64 {
        self.movi_size_offset
    }

    pub fn get_ref(&self) -> &W {
        self.sink.get_ref()
    }
}
