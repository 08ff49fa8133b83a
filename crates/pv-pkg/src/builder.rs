//! Synthetic package writer
//!
//! Produces minimal PS4 packages: the fixed header, an entry table right
//! after it, the entry blobs, then an optional free-form payload. Useful for
//! tests and for checking the validator against hand-made files.

use crate::entries::ENTRY_RECORD_SIZE;
use crate::header::{offsets, PKG_MAGIC, PKG_MIN_SIZE};
use std::path::Path;

const ENTRY_CONTENT_ID: u32 = 0x0100;
const ENTRY_TITLE_ID: u32 = 0x0103;
const ENTRY_PARAM_SFO: u32 = 0x1000;

/// Padded Content ID blob size
const CONTENT_ID_BLOB_LEN: usize = 48;

/// Padded Title ID blob size
const TITLE_ID_BLOB_LEN: usize = 16;

/// Builder for synthetic PKG files
#[derive(Debug, Clone)]
pub struct PkgBuilder {
    magic: u32,
    pkg_type: u32,
    pkg_flags: u32,
    file_count: u32,
    body_offset: u64,
    body_size: u64,
    content_type: u32,
    content_flags: u32,
    entry_count: Option<u32>,
    entries: Vec<(u32, Vec<u8>)>,
    payload: Vec<u8>,
}

impl Default for PkgBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn padded(value: &str, len: usize) -> Vec<u8> {
    let mut bytes = value.as_bytes().to_vec();
    if bytes.len() < len {
        bytes.resize(len, 0);
    }
    bytes
}

fn put(data: &mut [u8], offset: usize, bytes: &[u8]) {
    data[offset..offset + bytes.len()].copy_from_slice(bytes);
}

impl PkgBuilder {
    /// A PS4 App package with no entries
    pub fn new() -> Self {
        Self {
            magic: PKG_MAGIC,
            pkg_type: 0x1,
            pkg_flags: 0,
            file_count: 0,
            body_offset: 0,
            body_size: 0,
            content_type: 0,
            content_flags: 0,
            entry_count: None,
            entries: Vec::new(),
            payload: Vec::new(),
        }
    }

    /// Override the magic
    pub fn magic(mut self, magic: u32) -> Self {
        self.magic = magic;
        self
    }

    pub fn pkg_type(mut self, pkg_type: u32) -> Self {
        self.pkg_type = pkg_type;
        self
    }

    pub fn pkg_flags(mut self, flags: u32) -> Self {
        self.pkg_flags = flags;
        self
    }

    pub fn file_count(mut self, count: u32) -> Self {
        self.file_count = count;
        self
    }

    /// Set body offset and size
    pub fn body(mut self, offset: u64, size: u64) -> Self {
        self.body_offset = offset;
        self.body_size = size;
        self
    }

    /// Set content type and flags
    pub fn content(mut self, content_type: u32, content_flags: u32) -> Self {
        self.content_type = content_type;
        self.content_flags = content_flags;
        self
    }

    /// Add a Content ID entry, NUL-padded to 48 bytes
    pub fn content_id(self, content_id: &str) -> Self {
        self.entry(ENTRY_CONTENT_ID, padded(content_id, CONTENT_ID_BLOB_LEN))
    }

    /// Add a Title ID entry, NUL-padded to 16 bytes
    pub fn title_id(self, title_id: &str) -> Self {
        self.entry(ENTRY_TITLE_ID, padded(title_id, TITLE_ID_BLOB_LEN))
    }

    /// Add a param.sfo entry
    pub fn param_sfo(self, sfo: Vec<u8>) -> Self {
        self.entry(ENTRY_PARAM_SFO, sfo)
    }

    /// Add an entry with an arbitrary ID
    pub fn entry(mut self, id: u32, data: Vec<u8>) -> Self {
        self.entries.push((id, data));
        self
    }

    /// Declare an entry count other than the number of entries written
    pub fn entry_count(mut self, count: u32) -> Self {
        self.entry_count = Some(count);
        self
    }

    /// Append free-form bytes after the entry data
    pub fn payload(mut self, payload: &[u8]) -> Self {
        self.payload.extend_from_slice(payload);
        self
    }

    /// Generate the package bytes
    pub fn build(&self) -> Vec<u8> {
        let table_offset = PKG_MIN_SIZE as usize;
        let record_size = ENTRY_RECORD_SIZE as usize;
        let mut data_offset = table_offset + self.entries.len() * record_size;

        let mut out = vec![0u8; data_offset];
        put(&mut out, offsets::MAGIC, &self.magic.to_be_bytes());
        put(&mut out, offsets::TYPE, &self.pkg_type.to_be_bytes());
        put(&mut out, offsets::FLAGS, &self.pkg_flags.to_be_bytes());
        put(&mut out, offsets::FILE_COUNT, &self.file_count.to_be_bytes());
        let entry_count = self.entry_count.unwrap_or(self.entries.len() as u32);
        put(&mut out, offsets::ENTRY_COUNT, &entry_count.to_be_bytes());
        put(&mut out, offsets::ENTRY_TABLE_OFFSET, &(table_offset as u32).to_be_bytes());
        put(&mut out, offsets::BODY_OFFSET, &self.body_offset.to_be_bytes());
        put(&mut out, offsets::BODY_SIZE, &self.body_size.to_be_bytes());
        put(&mut out, offsets::CONTENT_TYPE, &self.content_type.to_be_bytes());
        put(&mut out, offsets::CONTENT_FLAGS, &self.content_flags.to_be_bytes());

        for (index, (id, blob)) in self.entries.iter().enumerate() {
            let record = table_offset + index * record_size;
            put(&mut out, record, &id.to_be_bytes());
            put(&mut out, record + 8, &(data_offset as u32).to_be_bytes());
            put(&mut out, record + 12, &(blob.len() as u32).to_be_bytes());

            out.extend_from_slice(blob);
            // Keep blobs 16-byte aligned
            while out.len() % 16 != 0 {
                out.push(0);
            }
            data_offset = out.len();
        }

        out.extend_from_slice(&self.payload);
        out
    }

    /// Write the package to `path`
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_package_is_header_sized() {
        let data = PkgBuilder::new().build();
        assert_eq!(data.len(), PKG_MIN_SIZE as usize);
        assert_eq!(&data[..4], &PKG_MAGIC.to_be_bytes());
    }

    #[test]
    fn test_entry_layout() {
        let data = PkgBuilder::new().title_id("CUSA12345").build();

        // One record right after the header, blob right after the table
        assert_eq!(&data[0x14..0x18], &1u32.to_be_bytes());
        assert_eq!(&data[0xC0..0xC4], &ENTRY_TITLE_ID.to_be_bytes());
        assert_eq!(&data[0xC8..0xCC], &0xE0u32.to_be_bytes());
        assert_eq!(&data[0xCC..0xD0], &16u32.to_be_bytes());
        assert_eq!(&data[0xE0..0xE9], b"CUSA12345");
        assert_eq!(data.len(), 0xF0);
    }

    #[test]
    fn test_entry_count_override() {
        let data = PkgBuilder::new().entry_count(500).build();
        assert_eq!(&data[0x14..0x18], &500u32.to_be_bytes());
    }
}
