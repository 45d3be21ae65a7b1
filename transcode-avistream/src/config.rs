//! Stream parameters supplied when a file is opened.

use crate::chunks::FourCC;
use crate::error::{AviError, Result};
use crate::types::PaletteEntry;

/// Largest color table a `BITMAPINFOHEADER` can carry
pub const MAX_PALETTE_ENTRIES: usize = 256;

/// PCM audio stream description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AudioSpec {
    /// Number of interleaved channels
    pub channels: u16,
    /// Bits per sample, a multiple of 8
    pub bits: u16,
    /// Sample frames per second
    pub samples_per_second: u32,
}

impl AudioSpec {
    pub fn new(channels: u16, bits: u16, samples_per_second: u32) -> Self {
        AudioSpec {
            channels,
            bits,
            samples_per_second,
        }
    }

    /// 16-bit stereo at 44.1 kHz
    pub fn cd_quality() -> Self {
        Self::new(2, 16, 44_100)
    }

    /// Bytes in one sample of one channel
    pub fn bytes_per_sample(&self) -> u16 {
        self.bits / 8
    }

    /// Bytes in one sample frame across all channels
    pub fn block_align(&self) -> u16 {
        self.channels * self.bytes_per_sample()
    }

    /// Bytes of audio per second of playback
    pub fn bytes_per_second(&self) -> u32 {
        self.block_align() as u32 * self.samples_per_second
    }

    pub fn validate(&self) -> Result<()> {
        if self.channels == 0 {
            return Err(AviError::invalid("audio channel count must be non-zero"));
        }
        if self.bits == 0 || self.bits % 8 != 0 {
            return Err(AviError::invalid(format!(
                "audio bits per sample must be a non-zero multiple of 8, got {}",
                self.bits
            )));
        }
        if self.samples_per_second == 0 {
            return Err(AviError::invalid("audio sample rate must be non-zero"));
        }
        (self.channels as u32)
            .checked_mul(self.bytes_per_sample() as u32)
            .filter(|&align| align <= u16::MAX as u32)
            .and_then(|align| align.checked_mul(self.samples_per_second))
            .ok_or_else(|| AviError::invalid("audio byte rate overflows 32 bits"))?;
        Ok(())
    }
}

impl Default for AudioSpec {
    fn default() -> Self {
        Self::cd_quality()
    }
}

/// Parameters of the file being written.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamParams {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Video codec FourCC
    pub fourcc: [u8; 4],
    /// Whole frames per second
    pub fps: u32,
    /// Optional PCM audio stream
    #[cfg_attr(feature = "serde", serde(default))]
    pub audio: Option<AudioSpec>,
    /// Optional color table for palettized codecs
    #[cfg_attr(feature = "serde", serde(default))]
    pub palette: Vec<PaletteEntry>,
}

impl StreamParams {
    /// Video-only parameters
    pub fn new(width: u32, height: u32, fourcc: impl Into<FourCC>, fps: u32) -> Self {
        StreamParams {
            width,
            height,
            fourcc: fourcc.into().0,
            fps,
            audio: None,
            palette: Vec::new(),
        }
    }

    /// Add a PCM audio stream
    pub fn with_audio(mut self, audio: AudioSpec) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Attach a color table
    pub fn with_palette(mut self, palette: Vec<PaletteEntry>) -> Self {
        self.palette = palette;
        self
    }

    pub fn codec(&self) -> FourCC {
        FourCC(self.fourcc)
    }

    pub fn validate(&self) -> Result<()> {
        frame_bytes(self.width, self.height)?;
        frame_delay_us(self.fps)?;
        if let Some(audio) = &self.audio {
            audio.validate()?;
        }
        if self.palette.len() > MAX_PALETTE_ENTRIES {
            return Err(AviError::invalid(format!(
                "palette has {} entries, at most {} allowed",
                self.palette.len(),
                MAX_PALETTE_ENTRIES
            )));
        }
        Ok(())
    }
}

/// Bytes in one uncompressed 24-bit frame, used for the data rate and
/// buffer size fields.
pub fn frame_bytes(width: u32, height: u32) -> Result<u32> {
    if width == 0 || height == 0 {
        return Err(AviError::invalid(format!(
            "frame size must be non-zero, got {}x{}",
            width, height
        )));
    }
    width
        .checked_mul(height)
        .and_then(|pixels| pixels.checked_mul(3))
        .filter(|&bytes| bytes <= i32::MAX as u32)
        .ok_or_else(|| AviError::invalid(format!("frame size {}x{} is too large", width, height)))
}

/// Microseconds between frames.
///
/// Truncating integer division, used both when opening and by
/// `set_framerate`, so 30 fps yields 33333.
pub fn frame_delay_us(fps: u32) -> Result<u32> {
    if fps == 0 {
        return Err(AviError::invalid("frame rate must be non-zero"));
    }
    Ok(1_000_000 / fps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_spec_derived() {
        let spec = AudioSpec::new(2, 16, 44_100);
        assert_eq!(spec.bytes_per_sample(), 2);
        assert_eq!(spec.block_align(), 4);
        assert_eq!(spec.bytes_per_second(), 176_400);
        assert!(spec.validate().is_ok());
        assert_eq!(AudioSpec::default(), spec);
    }

    #[test]
    fn test_audio_spec_validation() {
        assert!(AudioSpec::new(0, 16, 44_100).validate().is_err());
        assert!(AudioSpec::new(2, 12, 44_100).validate().is_err());
        assert!(AudioSpec::new(2, 0, 44_100).validate().is_err());
        assert!(AudioSpec::new(2, 16, 0).validate().is_err());
        assert!(AudioSpec::new(u16::MAX, 32, 48_000).validate().is_err());
        assert!(AudioSpec::new(6, 24, 96_000).validate().is_ok());
    }

    #[test]
    fn test_stream_params_builder() {
        let params = StreamParams::new(640, 480, *b"XVID", 25).with_audio(AudioSpec::cd_quality());
        assert_eq!(params.codec().as_str(), "XVID");
        assert_eq!(params.audio, Some(AudioSpec::cd_quality()));
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_stream_params_validation() {
        assert!(StreamParams::new(0, 480, *b"XVID", 25).validate().is_err());
        assert!(StreamParams::new(640, 480, *b"XVID", 0).validate().is_err());
        assert!(StreamParams::new(65_536, 65_536, *b"XVID", 25).validate().is_err());

        let params = StreamParams::new(16, 16, *b"DIB ", 10)
            .with_palette(vec![PaletteEntry::default(); MAX_PALETTE_ENTRIES + 1]);
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_frame_delay_truncates() {
        assert_eq!(frame_delay_us(25).unwrap(), 40_000);
        assert_eq!(frame_delay_us(30).unwrap(), 33_333);
        assert_eq!(frame_delay_us(60).unwrap(), 16_666);
        assert!(frame_delay_us(0).is_err());
    }

    #[test]
    fn test_frame_bytes() {
        assert_eq!(frame_bytes(4, 4).unwrap(), 48);
        assert_eq!(frame_bytes(1920, 1080).unwrap(), 6_220_800);
        assert!(frame_bytes(4, 0).is_err());
    }
}
