//! PARAM.SFO file format
//!
//! Layout (all little-endian):
//! - Header (20 bytes): magic, version, key table offset, data table offset, entry count
//! - Index table: 16 bytes per entry
//! - Key table: NUL-terminated key names
//! - Data table: values
//!
//! Decoding never fails. A structural problem ends or skips the affected
//! entry and everything decoded so far is kept.

use crate::source::bytes_at;
use std::collections::hash_map::{Entry, HashMap};
use tracing::debug;

/// SFO magic ("\0PSF" read little-endian)
pub const SFO_MAGIC: u32 = 0x46535000;

/// SFO header size
pub const SFO_HEADER_SIZE: u64 = 20;

/// SFO index entry size
pub const SFO_ENTRY_SIZE: u64 = 16;

/// Header version written by [`SfoBuilder`]
const SFO_VERSION: u32 = 0x0101;

/// Value format codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SfoFormat {
    /// NUL-terminated UTF-8 string (0x0004)
    Utf8,
    /// Little-endian `u32` (0x0404)
    Integer,
    /// Anything else, decoded as an empty value
    Other(u16),
}

impl From<u16> for SfoFormat {
    fn from(value: u16) -> Self {
        match value {
            0x0004 => Self::Utf8,
            0x0404 => Self::Integer,
            other => Self::Other(other),
        }
    }
}

impl SfoFormat {
    /// Raw format code
    pub fn code(&self) -> u16 {
        match self {
            Self::Utf8 => 0x0004,
            Self::Integer => 0x0404,
            Self::Other(code) => *code,
        }
    }
}

fn le_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

fn le_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

/// Bytes from `pos` up to (not including) the next NUL, if there is one
fn nul_terminated(buf: &[u8], pos: u64) -> Option<&[u8]> {
    let tail = bytes_at(buf, pos, (buf.len() as u64).checked_sub(pos)?)?;
    let end = tail.iter().position(|&b| b == 0)?;
    Some(&tail[..end])
}

/// SFO index entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SfoEntry {
    /// Offset of the key, relative to the key table
    pub key_offset: u16,
    pub format: SfoFormat,
    pub declared_length: u32,
    pub max_length: u32,
    /// Offset of the value, relative to the data table
    pub data_offset: u32,
}

impl SfoEntry {
    /// Parse an index entry from its raw bytes
    pub fn parse(raw: &[u8; SFO_ENTRY_SIZE as usize]) -> Self {
        Self {
            key_offset: le_u16(raw, 0),
            format: le_u16(raw, 2).into(),
            declared_length: le_u32(raw, 4),
            max_length: le_u32(raw, 8),
            data_offset: le_u32(raw, 12),
        }
    }

    /// Resolve the key name, or `None` if it is not NUL-terminated inside the buffer
    fn key(&self, buf: &[u8], key_table: u64) -> Option<String> {
        let pos = key_table + self.key_offset as u64;
        nul_terminated(buf, pos).map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Resolve the value as a string, or `None` if it starts outside the buffer
    fn value(&self, buf: &[u8], data_table: u64) -> Option<String> {
        let pos = data_table + self.data_offset as u64;
        let len = buf.len() as u64;
        if pos >= len {
            return None;
        }

        let value = match self.format {
            SfoFormat::Utf8 => {
                let bytes = match nul_terminated(buf, pos) {
                    Some(bytes) => bytes,
                    None => {
                        let end = pos.saturating_add(self.declared_length as u64).min(len);
                        bytes_at(buf, pos, end - pos)?
                    }
                };
                String::from_utf8_lossy(bytes).into_owned()
            }
            SfoFormat::Integer => bytes_at(buf, pos, 4)
                .map(|raw| le_u32(raw, 0))
                .unwrap_or(0)
                .to_string(),
            SfoFormat::Other(_) => String::new(),
        };
        Some(value)
    }
}

/// Decoded PARAM.SFO key/value table
///
/// Integer values are held in their decimal string form. When a key occurs
/// more than once, the first occurrence is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SfoTable {
    entries: HashMap<String, String>,
}

impl SfoTable {
    /// Decode a PARAM.SFO buffer
    pub fn decode(buf: &[u8]) -> Self {
        let mut table = Self::default();

        let Some(header) = bytes_at(buf, 0, SFO_HEADER_SIZE) else {
            debug!("param.sfo too small: {} bytes", buf.len());
            return table;
        };
        let magic = le_u32(header, 0);
        if magic != SFO_MAGIC {
            debug!("param.sfo bad magic: 0x{:08x}", magic);
            return table;
        }

        let key_table = le_u32(header, 8) as u64;
        let data_table = le_u32(header, 12) as u64;
        let entry_count = le_u32(header, 16);

        for index in 0..entry_count {
            let offset = SFO_HEADER_SIZE + index as u64 * SFO_ENTRY_SIZE;
            let raw = bytes_at(buf, offset, SFO_ENTRY_SIZE)
                .and_then(|raw| <&[u8; SFO_ENTRY_SIZE as usize]>::try_from(raw).ok());
            let Some(raw) = raw else {
                debug!("param.sfo index truncated at entry {}/{}", index, entry_count);
                break;
            };
            let entry = SfoEntry::parse(raw);

            let Some(key) = entry.key(buf, key_table) else {
                debug!("param.sfo entry {}: unterminated key", index);
                continue;
            };
            let Some(value) = entry.value(buf, data_table) else {
                debug!("param.sfo entry {} ({}): value outside buffer", index, key);
                continue;
            };
            if key.is_empty() || value.is_empty() {
                continue;
            }

            match table.entries.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
                Entry::Occupied(slot) => {
                    debug!("param.sfo duplicate key {} ignored", slot.key());
                }
            }
        }

        table
    }

    /// Get a value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of decoded entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was decoded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get title
    pub fn title(&self) -> Option<&str> {
        self.get("TITLE")
    }

    /// Get title ID
    pub fn title_id(&self) -> Option<&str> {
        self.get("TITLE_ID")
    }
}

/// Value written by [`SfoBuilder`]
#[derive(Debug, Clone)]
pub enum SfoValue {
    Utf8(String),
    Integer(u32),
    /// Arbitrary format code and payload
    Raw { format: u16, data: Vec<u8> },
}

/// Writer for PARAM.SFO buffers
///
/// Entries are written in insertion order; repeated keys are kept.
#[derive(Debug, Clone, Default)]
pub struct SfoBuilder {
    entries: Vec<(String, SfoValue)>,
}

impl SfoBuilder {
    /// Create a new SFO builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title
    pub fn title(self, title: &str) -> Self {
        self.add_string("TITLE", title)
    }

    /// Set the title ID (e.g., "CUSA12345")
    pub fn title_id(self, title_id: &str) -> Self {
        self.add_string("TITLE_ID", title_id)
    }

    /// Set the category (e.g., "gd" for a game, "gp" for a patch)
    pub fn category(self, category: &str) -> Self {
        self.add_string("CATEGORY", category)
    }

    /// Set the version string
    pub fn version(self, version: &str) -> Self {
        self.add_string("VERSION", version)
    }

    /// Set the app version
    pub fn app_ver(self, app_ver: &str) -> Self {
        self.add_string("APP_VER", app_ver)
    }

    /// Set the required system software version
    pub fn system_ver(self, system_ver: u32) -> Self {
        self.add_integer("SYSTEM_VER", system_ver)
    }

    /// Add a custom string entry
    pub fn add_string(mut self, key: &str, value: &str) -> Self {
        self.entries.push((key.to_string(), SfoValue::Utf8(value.to_string())));
        self
    }

    /// Add a custom integer entry
    pub fn add_integer(mut self, key: &str, value: u32) -> Self {
        self.entries.push((key.to_string(), SfoValue::Integer(value)));
        self
    }

    /// Add an entry with a raw format code
    pub fn add_raw(mut self, key: &str, format: u16, data: &[u8]) -> Self {
        self.entries.push((
            key.to_string(),
            SfoValue::Raw {
                format,
                data: data.to_vec(),
            },
        ));
        self
    }

    /// Generate PARAM.SFO binary data
    pub fn generate(&self) -> Vec<u8> {
        let entry_count = self.entries.len() as u32;
        let key_table_offset = SFO_HEADER_SIZE as u32 + entry_count * SFO_ENTRY_SIZE as u32;

        // Build key table and calculate offsets
        let mut key_table = Vec::new();
        let mut key_offsets = Vec::with_capacity(self.entries.len());
        for (key, _) in &self.entries {
            key_offsets.push(key_table.len() as u16);
            key_table.extend_from_slice(key.as_bytes());
            key_table.push(0);
        }

        // Align key table to 4 bytes
        while key_table.len() % 4 != 0 {
            key_table.push(0);
        }
        let data_table_offset = key_table_offset + key_table.len() as u32;

        let mut data = Vec::new();
        data.extend_from_slice(&SFO_MAGIC.to_le_bytes());
        data.extend_from_slice(&SFO_VERSION.to_le_bytes());
        data.extend_from_slice(&key_table_offset.to_le_bytes());
        data.extend_from_slice(&data_table_offset.to_le_bytes());
        data.extend_from_slice(&entry_count.to_le_bytes());

        let mut data_table = Vec::new();
        for ((_, value), key_offset) in self.entries.iter().zip(key_offsets) {
            let data_offset = data_table.len() as u32;

            let (format, mut value_bytes, data_len) = match value {
                SfoValue::Integer(v) => (SfoFormat::Integer.code(), v.to_le_bytes().to_vec(), 4u32),
                SfoValue::Utf8(s) => {
                    let mut bytes = s.as_bytes().to_vec();
                    bytes.push(0);
                    let len = bytes.len() as u32;
                    (SfoFormat::Utf8.code(), bytes, len)
                }
                SfoValue::Raw { format, data } => (*format, data.clone(), data.len() as u32),
            };
            while value_bytes.len() % 4 != 0 {
                value_bytes.push(0);
            }
            let data_max_len = value_bytes.len() as u32;

            data.extend_from_slice(&key_offset.to_le_bytes());
            data.extend_from_slice(&format.to_le_bytes());
            data.extend_from_slice(&data_len.to_le_bytes());
            data.extend_from_slice(&data_max_len.to_le_bytes());
            data.extend_from_slice(&data_offset.to_le_bytes());

            data_table.extend(value_bytes);
        }

        data.extend(key_table);
        data.extend(data_table);
        data
    }
}
