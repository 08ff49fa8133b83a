//! Human-readable byte sizes

use std::path::Path;

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count with 1024-based units and two decimals
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} PB", size)
}

/// On-disk size of `path` for display, if it can be queried
pub fn file_size_display(path: &Path) -> Option<String> {
    std::fs::metadata(path).ok().map(|meta| format_size(meta.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.00 B");
        assert_eq!(format_size(1023), "1023.00 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(0x10_0000), "1.00 MB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.00 GB");
        assert_eq!(format_size(1 << 40), "1.00 TB");
        assert_eq!(format_size(1 << 50), "1.00 PB");
        assert_eq!(format_size(u64::MAX), "16384.00 PB");
    }

    #[test]
    fn test_file_size_display_missing() {
        assert!(file_size_display(Path::new("/nonexistent/file.pkg")).is_none());
    }
}
