//! PS4 package decoding and validation
//!
//! Decodes the fixed PKG header, walks the entry table, decodes the embedded
//! PARAM.SFO block and folds everything into one [`ValidationResult`].

pub mod builder;
pub mod derived;
pub mod entries;
pub mod header;
pub mod result;
pub mod sfo;
pub mod size;
pub mod source;
pub mod trophy;
pub mod validator;

pub use builder::PkgBuilder;
pub use entries::{EntryKind, EntryTable, PkgEntryRecord};
pub use header::{PkgHeader, PkgType, PKG_MAGIC, PKG_MIN_SIZE};
pub use result::{PkgFields, ValidationResult};
pub use sfo::{SfoBuilder, SfoEntry, SfoFormat, SfoTable, SfoValue};
pub use size::{file_size_display, format_size};
pub use source::PkgSource;
pub use trophy::TrophyPresence;
pub use validator::{validate, validate_reader, PkgValidator};
