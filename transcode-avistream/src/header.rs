//! The `hdrl` header list.
//!
//! [`AviHeaders`] groups every header model of a file and knows how to lay
//! them out as
//!
//! ```text
//! LIST hdrl
//!   avih
//!   LIST strl (video)  strh strf
//!   LIST strl (audio)  strh strf   -- only with an audio stream
//! ```
//!
//! The list is written once with a zero frame count when the file is opened
//! and again, in place, when it is closed. Both passes produce the same
//! number of bytes.

use std::io::{Seek, Write};

use crate::chunks::{chunk_ids, FourCC};
use crate::config::{frame_bytes, frame_delay_us, AudioSpec, StreamParams};
use crate::error::Result;
use crate::io::RiffWriter;
use crate::types::{codec, AudioFormat, AviHeader, StreamHeader, StreamType, VideoFormat};

/// Header and format of the optional audio stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioStream {
    pub header: StreamHeader,
    pub format: AudioFormat,
}

impl AudioStream {
    fn from_spec(spec: &AudioSpec) -> Self {
        let bytes_per_second = spec.bytes_per_second();
        AudioStream {
            header: StreamHeader {
                stream_type: StreamType::Audio,
                handler: codec::PCM_HANDLER,
                scale: 1,
                rate: spec.samples_per_second,
                suggested_buffer_size: bytes_per_second,
                quality: -1,
                sample_size: spec.block_align() as u32,
                ..Default::default()
            },
            format: AudioFormat {
                format_tag: AudioFormat::PCM,
                channels: spec.channels,
                samples_per_sec: spec.samples_per_second,
                avg_bytes_per_sec: bytes_per_second,
                block_align: spec.block_align(),
                bits_per_sample: spec.bits,
                extra_size: 0,
            },
        }
    }
}

/// Every header model of one AVI file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AviHeaders {
    pub main: AviHeader,
    pub video: StreamHeader,
    pub video_format: VideoFormat,
    pub audio: Option<AudioStream>,
}

impl AviHeaders {
    /// Build the headers for a freshly opened file.
    pub fn from_params(params: &StreamParams) -> Result<Self> {
        params.validate()?;
        let frame_size = frame_bytes(params.width, params.height)?;
        let delay = frame_delay_us(params.fps)?;
        let codec = params.codec();

        let main = AviHeader {
            microseconds_per_frame: delay,
            max_bytes_per_sec: frame_size,
            streams: if params.audio.is_some() { 2 } else { 1 },
            suggested_buffer_size: frame_size,
            width: params.width,
            height: params.height,
            ..Default::default()
        };

        let video = StreamHeader {
            stream_type: StreamType::Video,
            handler: codec,
            scale: 1,
            rate: params.fps,
            suggested_buffer_size: frame_size,
            ..Default::default()
        };

        let video_format = VideoFormat {
            width: params.width,
            height: params.height,
            compression: codec.to_u32_le(),
            image_size: frame_size,
            colors_used: params.palette.len() as u32,
            palette: params.palette.clone(),
            ..Default::default()
        };

        Ok(AviHeaders {
            main,
            video,
            video_format,
            audio: params.audio.as_ref().map(AudioStream::from_spec),
        })
    }

    /// Change the frame rate (whole frames per second).
    pub fn set_framerate(&mut self, fps: u32) -> Result<()> {
        let delay = frame_delay_us(fps)?;
        self.video.rate = fps;
        self.main.microseconds_per_frame = delay;
        Ok(())
    }

    /// Change the video codec.
    pub fn set_codec(&mut self, fourcc: FourCC) {
        self.video.handler = fourcc;
        self.video_format.compression = fourcc.to_u32_le();
    }

    /// Change the frame dimensions and every size derived from them.
    pub fn set_size(&mut self, width: u32, height: u32) -> Result<()> {
        let size = frame_bytes(width, height)?;
        self.main.max_bytes_per_sec = size;
        self.main.width = width;
        self.main.height = height;
        self.main.suggested_buffer_size = size;
        self.video.suggested_buffer_size = size;
        self.video_format.width = width;
        self.video_format.height = height;
        self.video_format.image_size = size;
        Ok(())
    }

    /// Bytes [`AviHeaders::write`] emits, including the `LIST` header.
    pub fn encoded_len(&self) -> u64 {
        let chunk = |payload: u32| 8 + payload as u64;
        let video_strl = 12 + chunk(StreamHeader::SIZE) + chunk(self.video_format.chunk_size());
        let audio_strl = match self.audio {
            Some(_) => 12 + chunk(StreamHeader::SIZE) + chunk(AudioFormat::SIZE),
            None => 0,
        };
        12 + chunk(AviHeader::SIZE) + video_strl + audio_strl
    }

    /// Write the whole `hdrl` list at the writer's current position.
    ///
    /// Returns the number of bytes written.
    pub fn write<W: Write + Seek>(&self, w: &mut RiffWriter<W>) -> Result<u64> {
        let start = w.position();

        w.write_fourcc(chunk_ids::LIST)?;
        let hdrl = w.reserve_size()?;
        w.write_fourcc(chunk_ids::HDRL)?;

        write_avih(w, &self.main)?;

        w.write_fourcc(chunk_ids::LIST)?;
        let strl = w.reserve_size()?;
        w.write_fourcc(chunk_ids::STRL)?;
        write_strh(w, &self.video)?;
        write_video_strf(w, &self.video_format)?;
        w.patch_size(strl)?;

        if let Some(audio) = &self.audio {
            w.write_fourcc(chunk_ids::LIST)?;
            let strl = w.reserve_size()?;
            w.write_fourcc(chunk_ids::STRL)?;
            write_strh(w, &audio.header)?;
            write_audio_strf(w, &audio.format)?;
            w.patch_size(strl)?;
        }

        w.patch_size(hdrl)?;
        Ok(w.position() - start)
    }
}

/// Write avih chunk
fn write_avih<W: Write + Seek>(w: &mut RiffWriter<W>, header: &AviHeader) -> Result<()> {
    w.write_fourcc(chunk_ids::AVIH)?;
    let size = w.reserve_size()?;

    w.write_u32(header.microseconds_per_frame)?;
    w.write_u32(header.max_bytes_per_sec)?;
    w.write_u32(header.padding_granularity)?;
    w.write_u32(header.flags.to_u32())?;
    w.write_u32(header.total_frames)?;
    w.write_u32(header.initial_frames)?;
    w.write_u32(header.streams)?;
    w.write_u32(header.suggested_buffer_size)?;
    w.write_u32(header.width)?;
    w.write_u32(header.height)?;
    for reserved in header.reserved {
        w.write_u32(reserved)?;
    }

    w.patch_size(size)?;
    Ok(())
}

/// Write strh chunk
fn write_strh<W: Write + Seek>(w: &mut RiffWriter<W>, header: &StreamHeader) -> Result<()> {
    w.write_fourcc(chunk_ids::STRH)?;
    let size = w.reserve_size()?;

    w.write_fourcc(header.stream_type.to_fourcc())?;
    w.write_fourcc(header.handler)?;
    w.write_u32(header.flags)?;
    w.write_u16(header.priority)?;
    w.write_u16(header.language)?;
    w.write_u32(header.initial_frames)?;
    w.write_u32(header.scale)?;
    w.write_u32(header.rate)?;
    w.write_u32(header.start)?;
    w.write_u32(header.length)?;
    w.write_u32(header.suggested_buffer_size)?;
    w.write_i32(header.quality)?;
    w.write_u32(header.sample_size)?;
    w.write_i16(header.frame.left)?;
    w.write_i16(header.frame.top)?;
    w.write_i16(header.frame.right)?;
    w.write_i16(header.frame.bottom)?;

    w.patch_size(size)?;
    Ok(())
}

/// Write the video strf chunk (BITMAPINFOHEADER plus color table)
fn write_video_strf<W: Write + Seek>(w: &mut RiffWriter<W>, vf: &VideoFormat) -> Result<()> {
    w.write_fourcc(chunk_ids::STRF)?;
    let size = w.reserve_size()?;

    w.write_u32(vf.size)?;
    w.write_u32(vf.width)?;
    w.write_u32(vf.height)?;
    w.write_u16(vf.planes)?;
    w.write_u16(vf.bit_count)?;
    w.write_u32(vf.compression)?;
    w.write_u32(vf.image_size)?;
    w.write_i32(vf.x_pels_per_meter)?;
    w.write_i32(vf.y_pels_per_meter)?;
    w.write_u32(vf.colors_used)?;
    w.write_u32(vf.colors_important)?;
    for entry in &vf.palette {
        w.write_bytes(&entry.to_quad())?;
    }

    w.patch_size(size)?;
    Ok(())
}

/// Write the audio strf chunk (WAVEFORMATEX)
fn write_audio_strf<W: Write + Seek>(w: &mut RiffWriter<W>, af: &AudioFormat) -> Result<()> {
    w.write_fourcc(chunk_ids::STRF)?;
    let size = w.reserve_size()?;

    w.write_u16(af.format_tag)?;
    w.write_u16(af.channels)?;
    w.write_u32(af.samples_per_sec)?;
    w.write_u32(af.avg_bytes_per_sec)?;
    w.write_u16(af.block_align)?;
    w.write_u16(af.bits_per_sample)?;
    w.write_u16(af.extra_size)?;

    w.patch_size(size)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaletteEntry;
    use std::io::Cursor;

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn encode(headers: &AviHeaders) -> Vec<u8> {
        let mut w = RiffWriter::new(Cursor::new(Vec::new())).unwrap();
        let written = headers.write(&mut w).unwrap();
        let bytes = w.into_inner().unwrap().into_inner();
        assert_eq!(written, bytes.len() as u64);
        assert_eq!(written, headers.encoded_len());
        bytes
    }

    #[test]
    fn test_from_params_video_only() {
        let headers = AviHeaders::from_params(&StreamParams::new(4, 4, *b"XVID", 25)).unwrap();

        assert_eq!(headers.main.microseconds_per_frame, 40_000);
        assert_eq!(headers.main.max_bytes_per_sec, 48);
        assert_eq!(headers.main.suggested_buffer_size, 48);
        assert_eq!(headers.main.flags.to_u32(), 0x10);
        assert_eq!(headers.main.streams, 1);
        assert_eq!(headers.main.total_frames, 0);

        assert_eq!(headers.video.handler, FourCC(*b"XVID"));
        assert_eq!(headers.video.scale, 1);
        assert_eq!(headers.video.rate, 25);
        assert_eq!(headers.video_format.compression, 0x4449_5658);
        assert_eq!(headers.video_format.image_size, 48);
        assert!(headers.audio.is_none());
    }

    #[test]
    fn test_from_params_with_audio() {
        let params = StreamParams::new(320, 240, *b"MJPG", 30).with_audio(AudioSpec::new(2, 16, 44_100));
        let headers = AviHeaders::from_params(&params).unwrap();
        assert_eq!(headers.main.streams, 2);

        let audio = headers.audio.unwrap();
        assert_eq!(audio.header.handler, FourCC([1, 0, 0, 0]));
        assert_eq!(audio.header.rate, 44_100);
        assert_eq!(audio.header.quality, -1);
        assert_eq!(audio.header.sample_size, 4);
        assert_eq!(audio.header.suggested_buffer_size, 176_400);
        assert_eq!(audio.format.format_tag, 1);
        assert_eq!(audio.format.block_align, 4);
        assert_eq!(audio.format.avg_bytes_per_sec, 176_400);
        assert_eq!(audio.format.extra_size, 0);
    }

    #[test]
    fn test_layout_video_only() {
        let headers = AviHeaders::from_params(&StreamParams::new(4, 4, *b"XVID", 25)).unwrap();
        let bytes = encode(&headers);

        assert_eq!(&bytes[0..4], b"LIST");
        assert_eq!(u32_at(&bytes, 4) as usize, bytes.len() - 8);
        assert_eq!(&bytes[8..12], b"hdrl");

        assert_eq!(&bytes[12..16], b"avih");
        assert_eq!(u32_at(&bytes, 16), 56);
        assert_eq!(u32_at(&bytes, 20), 40_000);
        assert_eq!(u32_at(&bytes, 20 + 12), 0x10);

        // strl list follows the 64-byte avih chunk
        let strl = 12 + 64;
        assert_eq!(&bytes[strl..strl + 4], b"LIST");
        assert_eq!(u32_at(&bytes, strl + 4), 4 + 64 + 48);
        assert_eq!(&bytes[strl + 8..strl + 12], b"strl");
        assert_eq!(&bytes[strl + 12..strl + 16], b"strh");
        assert_eq!(u32_at(&bytes, strl + 16), 56);
        assert_eq!(&bytes[strl + 20..strl + 24], b"vids");
        assert_eq!(&bytes[strl + 24..strl + 28], b"XVID");

        let strf = strl + 12 + 64;
        assert_eq!(&bytes[strf..strf + 4], b"strf");
        assert_eq!(u32_at(&bytes, strf + 4), 40);
        assert_eq!(u32_at(&bytes, strf + 8), 40);
        assert_eq!(&bytes[strf + 8 + 16..strf + 8 + 20], b"XVID");
        assert_eq!(bytes.len(), strf + 48);
    }

    #[test]
    fn test_layout_with_audio() {
        let params = StreamParams::new(4, 4, *b"XVID", 25).with_audio(AudioSpec::cd_quality());
        let headers = AviHeaders::from_params(&params).unwrap();
        let bytes = encode(&headers);

        let audio_strl = 12 + 64 + 12 + 64 + 48;
        assert_eq!(&bytes[audio_strl..audio_strl + 4], b"LIST");
        assert_eq!(u32_at(&bytes, audio_strl + 4), 4 + 64 + 26);
        assert_eq!(&bytes[audio_strl + 20..audio_strl + 24], b"auds");

        let strf = audio_strl + 12 + 64;
        assert_eq!(&bytes[strf..strf + 4], b"strf");
        assert_eq!(u32_at(&bytes, strf + 4), 18);
        assert_eq!(bytes.len(), strf + 26);
    }

    #[test]
    fn test_palette_is_written_as_rgbquad() {
        let params = StreamParams::new(2, 2, *b"DIB ", 1)
            .with_palette(vec![PaletteEntry::new(0xAA, 0xBB, 0xCC), PaletteEntry::new(1, 2, 3)]);
        let headers = AviHeaders::from_params(&params).unwrap();
        assert_eq!(headers.video_format.colors_used, 2);

        let bytes = encode(&headers);
        let strf = 12 + 64 + 12 + 64;
        assert_eq!(u32_at(&bytes, strf + 4), 48);
        assert_eq!(&bytes[strf + 48..strf + 56], &[0xCC, 0xBB, 0xAA, 0, 3, 2, 1, 0]);
    }

    #[test]
    fn test_mutators_keep_length() {
        let mut headers = AviHeaders::from_params(&StreamParams::new(4, 4, *b"XVID", 25)).unwrap();
        let before = headers.encoded_len();

        headers.set_framerate(30).unwrap();
        headers.set_codec(FourCC(*b"MJPG"));
        headers.set_size(640, 480).unwrap();

        assert_eq!(headers.encoded_len(), before);
        assert_eq!(headers.main.microseconds_per_frame, 33_333);
        assert_eq!(headers.video.rate, 30);
        assert_eq!(headers.video.handler, FourCC(*b"MJPG"));
        assert_eq!(headers.video_format.codec(), FourCC(*b"MJPG"));
        assert_eq!(headers.main.width, 640);
        assert_eq!(headers.video_format.image_size, 921_600);
        assert_eq!(headers.video.suggested_buffer_size, 921_600);
    }

    #[test]
    fn test_rejected_mutators_change_nothing() {
        let mut headers = AviHeaders::from_params(&StreamParams::new(4, 4, *b"XVID", 25)).unwrap();
        let original = headers.clone();

        assert!(headers.set_framerate(0).is_err());
        assert!(headers.set_size(0, 10).is_err());
        assert_eq!(headers, original);
    }
}
