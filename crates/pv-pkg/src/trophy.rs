//! Trophy presence heuristic
//!
//! Looks for trophy file markers in the first few megabytes of the package.
//! A miss is not proof of absence: markers past the scan window are never
//! seen, and the body may be encrypted.

use crate::source::PkgSource;
use std::fmt;
use std::io::{Read, Seek};
use tracing::debug;

/// Bytes scanned from the start of the file
pub const TROPHY_SCAN_LIMIT: u64 = 8 * 1024 * 1024;

const TROPHY_MARKERS: [&[u8]; 3] = [b".trp", b"trophy", b"trophy.trp"];

/// Outcome of the trophy scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrophyPresence {
    /// A marker was found
    Yes,
    /// No marker in the scanned window
    No,
    /// The scan could not read the file
    Unknown,
}

impl fmt::Display for TrophyPresence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yes => write!(f, "Yes"),
            Self::No => write!(f, "No"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Case-insensitive search for any trophy marker
pub fn contains_marker(data: &[u8]) -> bool {
    TROPHY_MARKERS.iter().any(|marker| {
        data.windows(marker.len())
            .any(|window| window.eq_ignore_ascii_case(marker))
    })
}

/// Scan the start of `source` for trophy markers
pub fn presence<R: Read + Seek>(source: &mut PkgSource<R>) -> TrophyPresence {
    match source.read_prefix(TROPHY_SCAN_LIMIT) {
        Ok(data) if contains_marker(&data) => TrophyPresence::Yes,
        Ok(_) => TrophyPresence::No,
        Err(e) => {
            debug!("Trophy scan failed: {}", e);
            TrophyPresence::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, SeekFrom};

    fn source(data: Vec<u8>) -> PkgSource<Cursor<Vec<u8>>> {
        PkgSource::new(Cursor::new(data)).unwrap()
    }

    #[test]
    fn test_contains_marker() {
        assert!(contains_marker(b"xxTROPHY.TRPxx"));
        assert!(contains_marker(b"data/npbind.trp"));
        assert!(contains_marker(b"TrOpHy00"));
        assert!(!contains_marker(b"trp trop hy"));
        assert!(!contains_marker(b""));
    }

    #[test]
    fn test_presence() {
        let mut with = source(b"\x7FCNT....sce_sys/trophy/trophy00.trp".to_vec());
        assert_eq!(presence(&mut with), TrophyPresence::Yes);

        let mut without = source(vec![0u8; 4096]);
        assert_eq!(presence(&mut without), TrophyPresence::No);
    }

    #[test]
    fn test_marker_beyond_window_missed() {
        let mut data = vec![0u8; TROPHY_SCAN_LIMIT as usize];
        data.extend_from_slice(b"TROPHY.TRP");
        assert_eq!(presence(&mut source(data)), TrophyPresence::No);
    }

    #[test]
    fn test_marker_across_window_edge_missed() {
        let mut data = vec![0u8; TROPHY_SCAN_LIMIT as usize - 3];
        data.extend_from_slice(b".trp");
        assert_eq!(presence(&mut source(data)), TrophyPresence::No);
    }

    struct FailingReader {
        len: u64,
    }

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "device error"))
        }
    }

    impl Seek for FailingReader {
        fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
            Ok(match pos {
                SeekFrom::End(_) => self.len,
                SeekFrom::Start(n) => n,
                SeekFrom::Current(_) => 0,
            })
        }
    }

    #[test]
    fn test_read_failure_is_unknown() {
        let mut src = PkgSource::new(FailingReader { len: 0x1000 }).unwrap();
        assert_eq!(presence(&mut src), TrophyPresence::Unknown);
    }

    #[test]
    fn test_display() {
        assert_eq!(TrophyPresence::Yes.to_string(), "Yes");
        assert_eq!(TrophyPresence::No.to_string(), "No");
        assert_eq!(TrophyPresence::Unknown.to_string(), "Unknown");
    }
}
