//! PKG file header
//!
//! Decoder for the fixed 0xC0-byte header at the start of a PS4 package.
//! All header fields are big-endian.

use crate::source::PkgSource;
use pv_core::error::PkgError;
use std::fmt;
use std::io::{Read, Seek};
use tracing::debug;

/// PKG file magic ("\x7FCNT")
pub const PKG_MAGIC: u32 = 0x7F434E54;

/// Size of the fixed header; anything shorter cannot be a package
pub const PKG_MIN_SIZE: u64 = 0xC0;

/// Absolute header field offsets
pub mod offsets {
    pub const MAGIC: usize = 0x00;
    pub const TYPE: usize = 0x04;
    pub const FLAGS: usize = 0x08;
    pub const FILE_COUNT: usize = 0x10;
    pub const ENTRY_COUNT: usize = 0x14;
    pub const ENTRY_TABLE_OFFSET: usize = 0x18;
    pub const BODY_OFFSET: usize = 0x20;
    pub const BODY_SIZE: usize = 0x28;
    pub const CONTENT_TYPE: usize = 0x70;
    pub const CONTENT_FLAGS: usize = 0x74;
}

/// PKG file types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PkgType {
    /// PS4 application
    App,
    /// PS4 application patch
    Patch,
    /// PS4 remaster
    Remaster,
    /// PS4 theme
    Theme,
    /// PS4 widget
    Widget,
    /// PS4 license
    License,
    /// PS Vita application
    VitaApp,
    /// PS Vita DLC
    VitaDlc,
    /// PS Vita theme
    VitaTheme,
    /// Unmapped type value
    Unknown(u32),
}

impl From<u32> for PkgType {
    fn from(value: u32) -> Self {
        match value {
            0x1 => Self::App,
            0x2 => Self::Patch,
            0x3 => Self::Remaster,
            0x4 => Self::Theme,
            0x5 => Self::Widget,
            0x6 => Self::License,
            0x7 => Self::VitaApp,
            0x8 => Self::VitaDlc,
            0x9 => Self::VitaTheme,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for PkgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::App => write!(f, "PS4 App"),
            Self::Patch => write!(f, "PS4 Patch"),
            Self::Remaster => write!(f, "PS4 Remaster"),
            Self::Theme => write!(f, "PS4 Theme"),
            Self::Widget => write!(f, "PS4 Widget"),
            Self::License => write!(f, "PS4 License"),
            Self::VitaApp => write!(f, "PS Vita App"),
            Self::VitaDlc => write!(f, "PS Vita DLC"),
            Self::VitaTheme => write!(f, "PS Vita Theme"),
            Self::Unknown(raw) => write!(f, "Unknown (0x{:X})", raw),
        }
    }
}

/// PKG file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkgHeader {
    /// Magic number (0x7F434E54)
    pub magic: u32,
    /// Package type
    pub pkg_type: PkgType,
    /// Package flags
    pub pkg_flags: u32,
    /// Number of files in the body
    pub file_count: u32,
    /// Number of entry-table records
    pub entry_count: u32,
    /// Absolute offset of the entry table
    pub entry_table_offset: u32,
    /// Body offset
    pub body_offset: u64,
    /// Body size
    pub body_size: u64,
    /// Content type
    pub content_type: u32,
    /// Content flags
    pub content_flags: u32,
}

fn be_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

fn be_u64(buf: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_be_bytes(bytes)
}

impl PkgHeader {
    /// Decode the header from the start of `source`
    ///
    /// The magic is checked before any other field is interpreted.
    pub fn decode<R: Read + Seek>(source: &mut PkgSource<R>) -> Result<Self, PkgError> {
        if source.len() < PKG_MIN_SIZE {
            return Err(PkgError::TooSmall {
                len: source.len(),
                min: PKG_MIN_SIZE,
            });
        }

        let data = source.read_array_at::<{ PKG_MIN_SIZE as usize }>(0)?;

        let magic = be_u32(&data, offsets::MAGIC);
        if magic != PKG_MAGIC {
            return Err(PkgError::BadMagic {
                found: magic,
                expected: PKG_MAGIC,
            });
        }

        let header = Self {
            magic,
            pkg_type: be_u32(&data, offsets::TYPE).into(),
            pkg_flags: be_u32(&data, offsets::FLAGS),
            file_count: be_u32(&data, offsets::FILE_COUNT),
            entry_count: be_u32(&data, offsets::ENTRY_COUNT),
            entry_table_offset: be_u32(&data, offsets::ENTRY_TABLE_OFFSET),
            body_offset: be_u64(&data, offsets::BODY_OFFSET),
            body_size: be_u64(&data, offsets::BODY_SIZE),
            content_type: be_u32(&data, offsets::CONTENT_TYPE),
            content_flags: be_u32(&data, offsets::CONTENT_FLAGS),
        };

        debug!(
            "PKG header: type={}, entries={}, table=0x{:x}, body=0x{:x}+0x{:x}",
            header.pkg_type,
            header.entry_count,
            header.entry_table_offset,
            header.body_offset,
            header.body_size
        );

        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header_bytes(magic: u32, pkg_type: u32) -> Vec<u8> {
        let mut data = vec![0u8; PKG_MIN_SIZE as usize];
        data[0x00..0x04].copy_from_slice(&magic.to_be_bytes());
        data[0x04..0x08].copy_from_slice(&pkg_type.to_be_bytes());
        data[0x08..0x0C].copy_from_slice(&0x8000_0000u32.to_be_bytes());
        data[0x10..0x14].copy_from_slice(&5u32.to_be_bytes());
        data[0x14..0x18].copy_from_slice(&3u32.to_be_bytes());
        data[0x18..0x1C].copy_from_slice(&0xC0u32.to_be_bytes());
        data[0x20..0x28].copy_from_slice(&0x1000u64.to_be_bytes());
        data[0x28..0x30].copy_from_slice(&0x10_0000u64.to_be_bytes());
        data[0x70..0x74].copy_from_slice(&0x1Au32.to_be_bytes());
        data[0x74..0x78].copy_from_slice(&0x0A00_0000u32.to_be_bytes());
        data
    }

    fn decode(data: Vec<u8>) -> Result<PkgHeader, PkgError> {
        let mut source = PkgSource::new(Cursor::new(data)).unwrap();
        PkgHeader::decode(&mut source)
    }

    #[test]
    fn test_pkg_type_conversion() {
        assert_eq!(PkgType::from(0x01), PkgType::App);
        assert_eq!(PkgType::from(0x02), PkgType::Patch);
        assert_eq!(PkgType::from(0x09), PkgType::VitaTheme);
        assert_eq!(PkgType::from(0xFF), PkgType::Unknown(0xFF));
    }

    #[test]
    fn test_pkg_type_names() {
        assert_eq!(PkgType::App.to_string(), "PS4 App");
        assert_eq!(PkgType::VitaDlc.to_string(), "PS Vita DLC");
        assert_eq!(PkgType::Unknown(0xFF).to_string(), "Unknown (0xFF)");
    }

    #[test]
    fn test_decode_fields() {
        let header = decode(header_bytes(PKG_MAGIC, 1)).unwrap();
        assert_eq!(header.magic, PKG_MAGIC);
        assert_eq!(header.pkg_type, PkgType::App);
        assert_eq!(header.pkg_flags, 0x8000_0000);
        assert_eq!(header.file_count, 5);
        assert_eq!(header.entry_count, 3);
        assert_eq!(header.entry_table_offset, 0xC0);
        assert_eq!(header.body_offset, 0x1000);
        assert_eq!(header.body_size, 0x10_0000);
        assert_eq!(header.content_type, 0x1A);
        assert_eq!(header.content_flags, 0x0A00_0000);
    }

    #[test]
    fn test_decode_too_small() {
        let err = decode(vec![0x7F, b'C', b'N', b'T']).unwrap_err();
        assert!(matches!(err, PkgError::TooSmall { len: 4, min: 0xC0 }));

        let mut data = header_bytes(PKG_MAGIC, 1);
        data.truncate(0xBF);
        assert!(matches!(decode(data), Err(PkgError::TooSmall { .. })));
    }

    #[test]
    fn test_decode_bad_magic() {
        let err = decode(header_bytes(0xDEADBEEF, 1)).unwrap_err();
        assert!(matches!(
            err,
            PkgError::BadMagic { found: 0xDEADBEEF, expected: PKG_MAGIC }
        ));
    }
}
