//! Validation result handed to the presentation layer

use std::collections::BTreeMap;

/// Display names of the reported fields
pub mod field {
    pub const PKG_TYPE: &str = "PKG Type";
    pub const PKG_FLAGS: &str = "PKG Flags";
    pub const FILE_COUNT: &str = "File Count";
    pub const ENTRY_COUNT: &str = "Entry Count";
    pub const BODY_OFFSET: &str = "Body Offset";
    pub const BODY_SIZE: &str = "Body Size";
    pub const CONTENT_TYPE: &str = "Content Type";
    pub const CONTENT_FLAGS: &str = "Content Flags";
    pub const CONTENT_ID: &str = "Content ID";
    pub const TITLE_ID: &str = "Title ID";
    pub const TITLE: &str = "Title";
    pub const APP_VERSION: &str = "App Version";
    pub const VERSION: &str = "Version";
    pub const SYSTEM_VER: &str = "SYSTEM_VER";
    pub const CATEGORY: &str = "Category";
    pub const MINIMUM_FIRMWARE: &str = "Minimum Firmware";
    pub const TROPHIES_PRESENT: &str = "Trophies Present";
    pub const BACKPORT: &str = "Backport";
}

/// Field name to display string mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PkgFields {
    fields: BTreeMap<String, String>,
}

impl PkgFields {
    pub(crate) fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_string(), value.into());
    }

    /// Merge a later stage's fields; they replace earlier values of the same name
    pub(crate) fn merge(&mut self, later: PkgFields) {
        self.fields.extend(later.fields);
    }

    /// Get a field's display string
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Outcome of validating one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// The file is a package; decoded fields follow
    Valid(PkgFields),
    /// The file was rejected
    Invalid(String),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Decoded fields, if valid
    pub fn fields(&self) -> Option<&PkgFields> {
        match self {
            Self::Valid(fields) => Some(fields),
            Self::Invalid(_) => None,
        }
    }

    /// Failure reason, if invalid
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(reason) => Some(reason),
        }
    }

    /// Shorthand for a single field of a valid result
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields()?.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_later_wins() {
        let mut fields = PkgFields::default();
        fields.insert(field::TITLE_ID, "CUSA00001");
        fields.insert(field::CONTENT_ID, "EP0000-CUSA00001_00-X");

        let mut later = PkgFields::default();
        later.insert(field::TITLE_ID, "CUSA00002");
        fields.merge(later);

        assert_eq!(fields.get(field::TITLE_ID), Some("CUSA00002"));
        assert_eq!(fields.get(field::CONTENT_ID), Some("EP0000-CUSA00001_00-X"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_result_accessors() {
        let mut fields = PkgFields::default();
        fields.insert(field::PKG_TYPE, "PS4 App");
        let valid = ValidationResult::Valid(fields);
        assert!(valid.is_valid());
        assert_eq!(valid.field(field::PKG_TYPE), Some("PS4 App"));
        assert_eq!(valid.reason(), None);

        let invalid = ValidationResult::Invalid("File does not exist".to_string());
        assert!(!invalid.is_valid());
        assert!(invalid.fields().is_none());
        assert_eq!(invalid.field(field::PKG_TYPE), None);
        assert_eq!(invalid.reason(), Some("File does not exist"));
    }
}
