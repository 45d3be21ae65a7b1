//! AVI header models
//!
//! In-memory mirrors of the structures serialized into the `hdrl` list.
//! Field widths match the on-disk layout.

use crate::chunks::FourCC;

/// AVI main header (avih chunk)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AviHeader {
    /// Microseconds per frame
    pub microseconds_per_frame: u32,
    /// Maximum bytes per second
    pub max_bytes_per_sec: u32,
    /// Padding granularity
    pub padding_granularity: u32,
    /// AVI flags
    pub flags: AviFlags,
    /// Total number of video frames, set on close
    pub total_frames: u32,
    /// Initial frames (for interleaved files)
    pub initial_frames: u32,
    /// Number of streams
    pub streams: u32,
    /// Suggested buffer size
    pub suggested_buffer_size: u32,
    /// Video width
    pub width: u32,
    /// Video height
    pub height: u32,
    /// Reserved, always zero
    pub reserved: [u32; 4],
}

impl AviHeader {
    /// Size of the avih payload in bytes
    pub const SIZE: u32 = 56;

    /// Calculate frame rate in fps
    pub fn frame_rate(&self) -> f64 {
        if self.microseconds_per_frame > 0 {
            1_000_000.0 / self.microseconds_per_frame as f64
        } else {
            0.0
        }
    }

    /// Calculate duration in seconds
    pub fn duration(&self) -> f64 {
        (self.total_frames as f64 * self.microseconds_per_frame as f64) / 1_000_000.0
    }
}

impl Default for AviHeader {
    fn default() -> Self {
        AviHeader {
            microseconds_per_frame: 0,
            max_bytes_per_sec: 0,
            padding_granularity: 0,
            flags: AviFlags {
                has_index: true,
                ..Default::default()
            },
            total_frames: 0,
            initial_frames: 0,
            streams: 1,
            suggested_buffer_size: 0,
            width: 0,
            height: 0,
            reserved: [0; 4],
        }
    }
}

/// AVI header flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AviFlags {
    /// File has an index
    pub has_index: bool,
    /// File must use index
    pub must_use_index: bool,
    /// File is interleaved
    pub is_interleaved: bool,
    /// Trust chunk type for seeking
    pub trust_chunk_type: bool,
    /// File was captured
    pub was_captured: bool,
    /// File is copyrighted
    pub is_copyrighted: bool,
}

impl AviFlags {
    pub const HAS_INDEX: u32 = 0x10;
    pub const MUST_USE_INDEX: u32 = 0x20;
    pub const IS_INTERLEAVED: u32 = 0x100;
    pub const TRUST_CHUNK_TYPE: u32 = 0x800;
    pub const WAS_CAPTURED: u32 = 0x10000;
    pub const COPYRIGHTED: u32 = 0x20000;

    pub fn from_u32(value: u32) -> Self {
        AviFlags {
            has_index: (value & Self::HAS_INDEX) != 0,
            must_use_index: (value & Self::MUST_USE_INDEX) != 0,
            is_interleaved: (value & Self::IS_INTERLEAVED) != 0,
            trust_chunk_type: (value & Self::TRUST_CHUNK_TYPE) != 0,
            was_captured: (value & Self::WAS_CAPTURED) != 0,
            is_copyrighted: (value & Self::COPYRIGHTED) != 0,
        }
    }

    pub fn to_u32(self) -> u32 {
        let mut value = 0u32;
        if self.has_index {
            value |= Self::HAS_INDEX;
        }
        if self.must_use_index {
            value |= Self::MUST_USE_INDEX;
        }
        if self.is_interleaved {
            value |= Self::IS_INTERLEAVED;
        }
        if self.trust_chunk_type {
            value |= Self::TRUST_CHUNK_TYPE;
        }
        if self.was_captured {
            value |= Self::WAS_CAPTURED;
        }
        if self.is_copyrighted {
            value |= Self::COPYRIGHTED;
        }
        value
    }
}

/// Stream header (strh chunk)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    /// Stream type (vids, auds)
    pub stream_type: StreamType,
    /// FourCC handler/codec
    pub handler: FourCC,
    /// Stream flags
    pub flags: u32,
    /// Priority
    pub priority: u16,
    /// Language
    pub language: u16,
    /// Initial frames
    pub initial_frames: u32,
    /// Time scale
    pub scale: u32,
    /// Rate (samples per second = rate/scale)
    pub rate: u32,
    /// Start time
    pub start: u32,
    /// Running data length: frames for video, padded bytes for audio
    pub length: u32,
    /// Suggested buffer size
    pub suggested_buffer_size: u32,
    /// Quality, -1 for the codec default
    pub quality: i32,
    /// Sample size (0 for variable)
    pub sample_size: u32,
    /// Frame rectangle
    pub frame: Rect,
}

impl StreamHeader {
    /// Size of the strh payload in bytes
    pub const SIZE: u32 = 56;
}

impl Default for StreamHeader {
    fn default() -> Self {
        StreamHeader {
            stream_type: StreamType::Video,
            handler: FourCC::default(),
            flags: 0,
            priority: 0,
            language: 0,
            initial_frames: 0,
            scale: 1,
            rate: 0,
            start: 0,
            length: 0,
            suggested_buffer_size: 0,
            quality: 0,
            sample_size: 0,
            frame: Rect::default(),
        }
    }
}

/// Stream type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamType {
    Video,
    Audio,
}

impl StreamType {
    pub fn to_fourcc(self) -> FourCC {
        match self {
            StreamType::Video => FourCC(*b"vids"),
            StreamType::Audio => FourCC(*b"auds"),
        }
    }
}

/// Rectangle structure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub left: i16,
    pub top: i16,
    pub right: i16,
    pub bottom: i16,
}

/// One palette color, stored on disk as an `RGBQUAD` (blue, green, red, 0)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PaletteEntry {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl PaletteEntry {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        PaletteEntry { red, green, blue }
    }

    /// Bytes in `RGBQUAD` order
    pub fn to_quad(self) -> [u8; 4] {
        [self.blue, self.green, self.red, 0]
    }
}

/// Video format (BITMAPINFOHEADER)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFormat {
    /// Structure size, not counting the palette
    pub size: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Number of planes (always 1)
    pub planes: u16,
    /// Bits per pixel
    pub bit_count: u16,
    /// Compression FourCC packed little-endian
    pub compression: u32,
    /// Image size in bytes
    pub image_size: u32,
    /// Horizontal resolution
    pub x_pels_per_meter: i32,
    /// Vertical resolution
    pub y_pels_per_meter: i32,
    /// Colors used
    pub colors_used: u32,
    /// Important colors
    pub colors_important: u32,
    /// Optional color table, written after the header
    pub palette: Vec<PaletteEntry>,
}

impl VideoFormat {
    /// Size of the fixed part in bytes
    pub const HEADER_SIZE: u32 = 40;

    /// Size of the strf payload including the palette
    pub fn chunk_size(&self) -> u32 {
        Self::HEADER_SIZE + 4 * self.palette.len() as u32
    }

    /// Codec as a FourCC
    pub fn codec(&self) -> FourCC {
        FourCC(self.compression.to_le_bytes())
    }
}

impl Default for VideoFormat {
    fn default() -> Self {
        VideoFormat {
            size: Self::HEADER_SIZE,
            width: 0,
            height: 0,
            planes: 1,
            bit_count: 24,
            compression: 0,
            image_size: 0,
            x_pels_per_meter: 0,
            y_pels_per_meter: 0,
            colors_used: 0,
            colors_important: 0,
            palette: Vec::new(),
        }
    }
}

/// Audio format (WAVEFORMATEX)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFormat {
    /// Format tag
    pub format_tag: u16,
    /// Number of channels
    pub channels: u16,
    /// Samples per second
    pub samples_per_sec: u32,
    /// Average bytes per second
    pub avg_bytes_per_sec: u32,
    /// Block alignment
    pub block_align: u16,
    /// Bits per sample
    pub bits_per_sample: u16,
    /// Extra data size
    pub extra_size: u16,
}

impl AudioFormat {
    pub const PCM: u16 = 0x0001;

    /// Size of the strf payload in bytes
    pub const SIZE: u32 = 18;
}

impl Default for AudioFormat {
    fn default() -> Self {
        AudioFormat {
            format_tag: Self::PCM,
            channels: 2,
            samples_per_sec: 44100,
            avg_bytes_per_sec: 176400,
            block_align: 4,
            bits_per_sample: 16,
            extra_size: 0,
        }
    }
}

/// Common AVI codec FourCCs
pub mod codec {
    use crate::chunks::FourCC;

    /// Uncompressed RGB
    pub const DIB: FourCC = FourCC(*b"DIB ");
    /// MPEG-4 variants
    pub const DIVX: FourCC = FourCC(*b"DIVX");
    pub const XVID: FourCC = FourCC(*b"XVID");
    pub const FMP4: FourCC = FourCC(*b"FMP4");
    /// H.264
    pub const H264: FourCC = FourCC(*b"H264");
    /// Motion JPEG
    pub const MJPG: FourCC = FourCC(*b"MJPG");
    /// Handler written in the audio stream header for PCM
    pub const PCM_HANDLER: FourCC = FourCC([1, 0, 0, 0]);
}
