//! Running chunk index and the `idx1` records derived from it.
//!
//! The table only remembers the kind and padded length of each chunk in
//! `movi`. Offsets are not stored: they follow from the append order, so the
//! whole index is a pure function of the sequence of appends.

use byteorder::{ByteOrder, LittleEndian};

use crate::chunks::{ChunkKind, FourCC};
use crate::error::Result;

/// Capacity the table starts with and grows by.
pub const INDEX_GROWTH: usize = 1024;

/// Size of one `idx1` record in bytes
pub const INDEX_RECORD_SIZE: u32 = 16;

/// Bytes of chunk header (id + size) in front of each payload
pub const CHUNK_HEADER_SIZE: u32 = 8;

/// One appended sample chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Video frame or audio block
    pub kind: ChunkKind,
    /// Payload length including padding
    pub length: u32,
}

/// AVI index record (idx1 format)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRecord {
    /// Chunk ID
    pub chunk_id: FourCC,
    /// Flags
    pub flags: u32,
    /// Offset of the chunk header, counted from the `movi` list type
    pub offset: u32,
    /// Size of chunk data
    pub size: u32,
}

impl IndexRecord {
    /// Index flags
    pub const KEYFRAME: u32 = 0x10;

    /// On-disk form
    pub fn to_bytes(&self) -> [u8; INDEX_RECORD_SIZE as usize] {
        let mut buf = [0u8; INDEX_RECORD_SIZE as usize];
        buf[0..4].copy_from_slice(self.chunk_id.as_bytes());
        LittleEndian::write_u32(&mut buf[4..8], self.flags);
        LittleEndian::write_u32(&mut buf[8..12], self.offset);
        LittleEndian::write_u32(&mut buf[12..16], self.size);
        buf
    }

    /// Check if this is a keyframe
    pub fn is_keyframe(&self) -> bool {
        (self.flags & Self::KEYFRAME) != 0
    }
}

/// Ordered table of every chunk written to `movi`
#[derive(Debug, Clone, Default)]
pub struct IndexTable {
    entries: Vec<IndexEntry>,
}

impl IndexTable {
    /// Empty table with the initial capacity reserved
    pub fn new() -> Result<Self> {
        let mut entries = Vec::new();
        entries.try_reserve_exact(INDEX_GROWTH)?;
        Ok(IndexTable { entries })
    }

    /// Record a chunk, growing the table in steps of [`INDEX_GROWTH`].
    pub fn push(&mut self, kind: ChunkKind, length: u32) -> Result<()> {
        if self.entries.len() == self.entries.capacity() {
            self.entries.try_reserve_exact(INDEX_GROWTH)?;
        }
        self.entries.push(IndexEntry { kind, length });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Number of entries of one kind
    pub fn count(&self, kind: ChunkKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    /// Bytes occupied by all chunks (headers, payloads and padding)
    pub fn movi_payload_len(&self) -> u64 {
        self.entries
            .iter()
            .map(|e| CHUNK_HEADER_SIZE as u64 + e.length as u64)
            .sum()
    }

    /// Size of the `idx1` payload
    pub fn idx1_len(&self) -> u64 {
        self.entries.len() as u64 * INDEX_RECORD_SIZE as u64
    }

    /// The `idx1` records in append order.
    ///
    /// The first chunk sits right after the 4-byte `movi` list type, so its
    /// offset is 4; every following chunk starts 8 header bytes plus the
    /// previous padded length later. Every record carries the keyframe flag.
    pub fn records(&self) -> impl Iterator<Item = IndexRecord> + '_ {
        let mut offset = 4u32;
        self.entries.iter().map(move |entry| {
            let record = IndexRecord {
                chunk_id: entry.kind.chunk_id(),
                flags: IndexRecord::KEYFRAME,
                offset,
                size: entry.length,
            };
            offset = offset
                .wrapping_add(CHUNK_HEADER_SIZE)
                .wrapping_add(entry.length);
            record
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_capacity() {
        let table = IndexTable::new().unwrap();
        assert!(table.is_empty());
        assert!(table.capacity() >= INDEX_GROWTH);
    }

    #[test]
    fn test_grows_past_initial_capacity() {
        let mut table = IndexTable::new().unwrap();
        for _ in 0..(INDEX_GROWTH * 2 + 5) {
            table.push(ChunkKind::Video, 4).unwrap();
        }
        assert_eq!(table.len(), INDEX_GROWTH * 2 + 5);
        assert!(table.capacity() >= table.len());
    }

    #[test]
    fn test_records_offsets() {
        let mut table = IndexTable::new().unwrap();
        table.push(ChunkKind::Video, 4).unwrap();
        table.push(ChunkKind::Audio, 100).unwrap();
        table.push(ChunkKind::Video, 8).unwrap();

        let records: Vec<_> = table.records().collect();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].chunk_id, FourCC(*b"00dc"));
        assert_eq!(records[0].offset, 4);
        assert_eq!(records[0].size, 4);

        assert_eq!(records[1].chunk_id, FourCC(*b"01wb"));
        assert_eq!(records[1].offset, 4 + 8 + 4);
        assert_eq!(records[1].size, 100);

        assert_eq!(records[2].offset, 16 + 8 + 100);
        assert!(records.iter().all(|r| r.is_keyframe()));

        assert_eq!(table.movi_payload_len(), 12 + 108 + 16);
        assert_eq!(table.idx1_len(), 48);
        assert_eq!(table.count(ChunkKind::Video), 2);
        assert_eq!(table.count(ChunkKind::Audio), 1);
    }

    #[test]
    fn test_record_bytes() {
        let record = IndexRecord {
            chunk_id: FourCC(*b"00dc"),
            flags: IndexRecord::KEYFRAME,
            offset: 1000,
            size: 5000,
        };

        let buffer = record.to_bytes();
        assert_eq!(&buffer[0..4], b"00dc");
        assert_eq!(&buffer[4..8], &0x10u32.to_le_bytes());
        assert_eq!(&buffer[8..12], &1000u32.to_le_bytes());
        assert_eq!(&buffer[12..16], &5000u32.to_le_bytes());
    }
}
