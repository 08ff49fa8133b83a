//! PKG entry table
//!
//! The entry table is a run of fixed 32-byte big-endian records, each pointing
//! at a data blob elsewhere in the same file. Only a handful of entry kinds
//! carry metadata worth reporting; everything else is skipped.

use crate::sfo::SfoTable;
use crate::source::PkgSource;
use std::io::{Read, Seek};
use tracing::debug;

/// Size of one entry-table record
pub const ENTRY_RECORD_SIZE: u64 = 32;

/// Longest Content ID read from its entry
pub const CONTENT_ID_MAX_LEN: u32 = 64;

/// Longest Title ID read from its entry
pub const TITLE_ID_MAX_LEN: u32 = 16;

/// Cap on the embedded PARAM.SFO read, whatever size the entry claims
pub const SFO_MAX_SIZE: u32 = 0x10000;

/// Records fetched per entry-table read
const TABLE_CHUNK_RECORDS: u64 = 1024;

/// Known entry IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Digest table (0x0001), recognized but not decoded
    DigestTable,
    /// Content ID string (0x0100)
    ContentId,
    /// Title ID string (0x0103)
    TitleId,
    /// Embedded param.sfo (0x1000)
    ParamSfo,
    /// Anything else
    Other(u32),
}

impl From<u32> for EntryKind {
    fn from(value: u32) -> Self {
        match value {
            0x0001 => Self::DigestTable,
            0x0100 => Self::ContentId,
            0x0103 => Self::TitleId,
            0x1000 => Self::ParamSfo,
            other => Self::Other(other),
        }
    }
}

/// One entry-table record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PkgEntryRecord {
    pub entry_id: u32,
    pub entry_flags: u32,
    /// Absolute offset of the entry data
    pub data_offset: u32,
    pub data_size: u32,
}

impl PkgEntryRecord {
    /// Parse a record; the trailing 16 bytes are reserved
    pub fn parse(bytes: &[u8; ENTRY_RECORD_SIZE as usize]) -> Self {
        let field = |i: usize| u32::from_be_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Self {
            entry_id: field(0),
            entry_flags: field(4),
            data_offset: field(8),
            data_size: field(12),
        }
    }

    /// Entry kind selected by the ID
    pub fn kind(&self) -> EntryKind {
        self.entry_id.into()
    }
}

/// Location of the embedded PARAM.SFO, size already capped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SfoLocation {
    pub offset: u64,
    pub size: u64,
}

/// Metadata collected from the entry table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryTable {
    pub content_id: Option<String>,
    pub title_id: Option<String>,
    pub sfo_location: Option<SfoLocation>,
    /// Records actually read before the count or the file ran out
    pub records_read: u32,
}

/// Decode an identifier blob, dropping trailing NUL padding
pub fn trim_id(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_end_matches('\0').to_string()
}

fn read_id<R: Read + Seek>(source: &mut PkgSource<R>, record: &PkgEntryRecord, max_len: u32) -> Option<String> {
    let len = record.data_size.min(max_len) as usize;
    match source.read_at(record.data_offset as u64, len) {
        Ok(bytes) => Some(trim_id(&bytes)),
        Err(e) => {
            debug!("Skipping entry 0x{:04x}: {}", record.entry_id, e);
            None
        }
    }
}

impl EntryTable {
    /// Walk `entry_count` records starting at `table_offset`
    ///
    /// Only records that fit in the source are visited; a table that runs
    /// past the end keeps whatever was collected before it. Records are read
    /// in chunks, and entry data is read with absolute offsets, so the table
    /// position is unaffected by those reads.
    pub fn read<R: Read + Seek>(source: &mut PkgSource<R>, table_offset: u64, entry_count: u32) -> Self {
        let mut table = Self::default();

        let available = source.len().saturating_sub(table_offset) / ENTRY_RECORD_SIZE;
        let count = (entry_count as u64).min(available);
        if count < entry_count as u64 {
            debug!("Entry table truncated: {} of {} records in file", count, entry_count);
        }

        let mut index = 0u64;
        while index < count {
            let batch = (count - index).min(TABLE_CHUNK_RECORDS);
            let offset = table_offset + index * ENTRY_RECORD_SIZE;
            let chunk = match source.read_at(offset, (batch * ENTRY_RECORD_SIZE) as usize) {
                Ok(chunk) => chunk,
                Err(e) => {
                    debug!("Entry table unreadable at record {}: {}", index, e);
                    break;
                }
            };

            for raw in chunk.chunks_exact(ENTRY_RECORD_SIZE as usize) {
                let Ok(raw) = <&[u8; ENTRY_RECORD_SIZE as usize]>::try_from(raw) else {
                    break;
                };
                table.visit(source, &PkgEntryRecord::parse(raw));
            }
            index += batch;
        }

        debug!(
            "Entry table: {} records read, content_id={:?}, title_id={:?}, sfo={:?}",
            table.records_read, table.content_id, table.title_id, table.sfo_location
        );

        table
    }

    fn visit<R: Read + Seek>(&mut self, source: &mut PkgSource<R>, record: &PkgEntryRecord) {
        self.records_read += 1;

        match record.kind() {
            EntryKind::ContentId => {
                if let Some(id) = read_id(source, record, CONTENT_ID_MAX_LEN) {
                    self.content_id = Some(id);
                }
            }
            EntryKind::TitleId => {
                if let Some(id) = read_id(source, record, TITLE_ID_MAX_LEN) {
                    self.title_id = Some(id);
                }
            }
            EntryKind::ParamSfo => {
                self.sfo_location = Some(SfoLocation {
                    offset: record.data_offset as u64,
                    size: record.data_size.min(SFO_MAX_SIZE) as u64,
                });
            }
            EntryKind::DigestTable | EntryKind::Other(_) => {}
        }
    }

    /// Read and decode the embedded PARAM.SFO, if one was located and fits in the file
    pub fn read_sfo<R: Read + Seek>(&self, source: &mut PkgSource<R>) -> Option<SfoTable> {
        let location = self.sfo_location.filter(|loc| loc.size > 0)?;
        match source.read_at(location.offset, location.size as usize) {
            Ok(bytes) => {
                let sfo = SfoTable::decode(&bytes);
                debug!("param.sfo: {} bytes, {} entries", bytes.len(), sfo.len());
                Some(sfo)
            }
            Err(e) => {
                debug!("Skipping param.sfo: {}", e);
                None
            }
        }
    }
}
