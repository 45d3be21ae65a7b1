//! Little-endian primitives over a seekable sink.
//!
//! [`RiffWriter`] keeps track of its own absolute position so that appending
//! sample chunks never has to ask the sink where it is. Seeks are only issued
//! when a placeholder is patched.

use std::io::{Seek, SeekFrom, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::chunks::FourCC;
use crate::error::{AviError, Result};

/// Position of a reserved 32-bit size field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeMarker(u64);

impl SizeMarker {
    /// Absolute offset of the size field in the sink
    pub fn offset(self) -> u64 {
        self.0
    }
}

/// Writer for RIFF structures on a `Write + Seek` sink
#[derive(Debug)]
pub struct RiffWriter<W> {
    inner: W,
    pos: u64,
}

impl<W: Write + Seek> RiffWriter<W> {
    /// Wrap a sink, starting at whatever position it currently reports.
    pub fn new(mut inner: W) -> Result<Self> {
        let pos = inner.stream_position().map_err(AviError::PositionQuery)?;
        Ok(RiffWriter { inner, pos })
    }

    /// Current absolute position
    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes).map_err(AviError::Write)?;
        self.pos += bytes.len() as u64;
        Ok(())
    }

    pub fn write_fourcc(&mut self, fourcc: FourCC) -> Result<()> {
        self.write_bytes(fourcc.as_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.inner
            .write_u32::<LittleEndian>(value)
            .map_err(AviError::Write)?;
        self.pos += 4;
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.inner
            .write_i32::<LittleEndian>(value)
            .map_err(AviError::Write)?;
        self.pos += 4;
        Ok(())
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.inner
            .write_u16::<LittleEndian>(value)
            .map_err(AviError::Write)?;
        self.pos += 2;
        Ok(())
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.inner
            .write_i16::<LittleEndian>(value)
            .map_err(AviError::Write)?;
        self.pos += 2;
        Ok(())
    }

    /// Write `count` zero bytes
    pub fn write_zeros(&mut self, count: usize) -> Result<()> {
        const ZEROS: [u8; 16] = [0; 16];
        let mut remaining = count;
        while remaining > 0 {
            let n = remaining.min(ZEROS.len());
            self.write_bytes(&ZEROS[..n])?;
            remaining -= n;
        }
        Ok(())
    }

    /// Move to an absolute offset
    pub fn seek_to(&mut self, offset: u64) -> Result<()> {
        self.inner
            .seek(SeekFrom::Start(offset))
            .map_err(|source| AviError::Seek { offset, source })?;
        self.pos = offset;
        Ok(())
    }

    /// Write a zero size field to be filled in by [`RiffWriter::patch_size`].
    pub fn reserve_size(&mut self) -> Result<SizeMarker> {
        let marker = SizeMarker(self.pos);
        self.write_u32(0)?;
        Ok(marker)
    }

    /// Fill a reserved size field with the number of bytes written after it.
    pub fn patch_size(&mut self, marker: SizeMarker) -> Result<u32> {
        let size = self.pos - marker.0 - 4;
        let size = u32::try_from(size).map_err(|_| AviError::FileTooLarge { size })?;
        self.patch_u32(marker.0, size)?;
        Ok(size)
    }

    /// Overwrite a 32-bit field at `offset`, then return to the current
    /// position.
    pub fn patch_u32(&mut self, offset: u64, value: u32) -> Result<()> {
        let resume = self.pos;
        self.seek_to(offset)?;
        self.write_u32(value)?;
        self.seek_to(resume)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(AviError::Write)
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Flush and hand back the sink
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    #[test]
    fn test_little_endian_primitives() {
        let mut w = RiffWriter::new(Cursor::new(Vec::new())).unwrap();
        w.write_fourcc(FourCC(*b"RIFF")).unwrap();
        w.write_u32(0x0403_0201).unwrap();
        w.write_i32(-1).unwrap();
        w.write_u16(0x0201).unwrap();
        w.write_i16(-2).unwrap();
        assert_eq!(w.position(), 16);

        let bytes = w.into_inner().unwrap().into_inner();
        assert_eq!(
            bytes,
            [b'R', b'I', b'F', b'F', 1, 2, 3, 4, 0xFF, 0xFF, 0xFF, 0xFF, 1, 2, 0xFE, 0xFF]
        );
    }

    #[test]
    fn test_write_zeros() {
        let mut w = RiffWriter::new(Cursor::new(Vec::new())).unwrap();
        w.write_zeros(0).unwrap();
        w.write_zeros(37).unwrap();
        assert_eq!(w.position(), 37);
        let bytes = w.into_inner().unwrap().into_inner();
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_reserve_and_patch() {
        let mut w = RiffWriter::new(Cursor::new(Vec::new())).unwrap();
        w.write_fourcc(FourCC(*b"test")).unwrap();
        let marker = w.reserve_size().unwrap();
        assert_eq!(marker.offset(), 4);
        w.write_bytes(&[9; 10]).unwrap();

        assert_eq!(w.patch_size(marker).unwrap(), 10);
        assert_eq!(w.position(), 18);

        w.write_bytes(&[7]).unwrap();
        let bytes = w.into_inner().unwrap().into_inner();
        assert_eq!(&bytes[4..8], &10u32.to_le_bytes());
        assert_eq!(bytes.len(), 19);
        assert_eq!(bytes[18], 7);
    }

    #[test]
    fn test_starts_at_sink_position() {
        let mut cursor = Cursor::new(vec![0u8; 8]);
        cursor.set_position(8);
        let w = RiffWriter::new(cursor).unwrap();
        assert_eq!(w.position(), 8);
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for FailingSink {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            match pos {
                SeekFrom::Current(0) => Ok(0),
                _ => Err(io::Error::new(io::ErrorKind::Other, "not seekable")),
            }
        }
    }

    #[test]
    fn test_errors_are_classified() {
        let mut w = RiffWriter::new(FailingSink).unwrap();
        assert!(matches!(w.write_u32(1), Err(AviError::Write(_))));
        assert!(matches!(
            w.seek_to(12),
            Err(AviError::Seek { offset: 12, .. })
        ));
    }
}
