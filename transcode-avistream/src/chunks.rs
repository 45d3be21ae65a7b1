//! RIFF chunk vocabulary: FourCC codes, chunk ids and payload padding

use std::str::FromStr;

/// FourCC (Four Character Code) identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Create from bytes
    pub const fn new(bytes: [u8; 4]) -> Self {
        FourCC(bytes)
    }

    /// Get as string
    pub fn as_str(&self) -> String {
        String::from_utf8_lossy(&self.0).to_string()
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Pack the code into a 32-bit value, first byte in the low bits.
    ///
    /// This is how `BITMAPINFOHEADER.biCompression` stores a codec, so
    /// writing the result little-endian reproduces the original bytes.
    pub const fn to_u32_le(self) -> u32 {
        (self.0[3] as u32) << 24 | (self.0[2] as u32) << 16 | (self.0[1] as u32) << 8 | self.0[0] as u32
    }
}

impl FromStr for FourCC {
    type Err = String;

    /// Parse from a string of exactly 4 bytes
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| format!("FourCC must be 4 bytes, got {:?}", s))?;
        Ok(FourCC(bytes))
    }
}

impl std::fmt::Debug for FourCC {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FourCC(\"{}\")", self.as_str())
    }
}

impl std::fmt::Display for FourCC {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<[u8; 4]> for FourCC {
    fn from(bytes: [u8; 4]) -> Self {
        FourCC(bytes)
    }
}

impl From<&[u8; 4]> for FourCC {
    fn from(bytes: &[u8; 4]) -> Self {
        FourCC(*bytes)
    }
}

/// Well-known chunk IDs
pub mod chunk_ids {
    use super::FourCC;

    pub const RIFF: FourCC = FourCC(*b"RIFF");
    pub const AVI: FourCC = FourCC(*b"AVI ");
    pub const LIST: FourCC = FourCC(*b"LIST");
    pub const HDRL: FourCC = FourCC(*b"hdrl");
    pub const AVIH: FourCC = FourCC(*b"avih");
    pub const STRL: FourCC = FourCC(*b"strl");
    pub const STRH: FourCC = FourCC(*b"strh");
    pub const STRF: FourCC = FourCC(*b"strf");
    pub const MOVI: FourCC = FourCC(*b"movi");
    pub const IDX1: FourCC = FourCC(*b"idx1");
    /// Compressed video frame on stream 0
    pub const VIDEO_FRAME: FourCC = FourCC(*b"00dc");
    /// Audio block on stream 1
    pub const AUDIO_BLOCK: FourCC = FourCC(*b"01wb");
}

/// Kind of sample chunk stored in `movi`.
///
/// The video stream is always stream 0 and the optional audio stream is
/// stream 1, so the kind fully determines the chunk id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkKind {
    /// Encoded video frame (`00dc`)
    Video,
    /// Audio sample block (`01wb`)
    Audio,
}

impl ChunkKind {
    /// Chunk id written in front of the payload and in `idx1`
    pub fn chunk_id(self) -> FourCC {
        match self {
            ChunkKind::Video => chunk_ids::VIDEO_FRAME,
            ChunkKind::Audio => chunk_ids::AUDIO_BLOCK,
        }
    }

    pub fn is_audio(self) -> bool {
        self == ChunkKind::Audio
    }
}

/// Alignment of every sample chunk payload in `movi`.
pub const CHUNK_ALIGNMENT: usize = 4;

/// Number of zero bytes needed after a payload of `len` bytes.
pub fn padding_for(len: usize) -> usize {
    (CHUNK_ALIGNMENT - len % CHUNK_ALIGNMENT) % CHUNK_ALIGNMENT
}

/// Payload length rounded up to [`CHUNK_ALIGNMENT`], or `None` if it does
/// not fit a 32-bit size field.
pub fn padded_len(len: usize) -> Option<u32> {
    len.checked_add(padding_for(len))
        .and_then(|padded| u32::try_from(padded).ok())
}
