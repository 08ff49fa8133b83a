//! PKG validation pipeline
//!
//! One forward pass per file: header, entry table, embedded PARAM.SFO, then
//! derived fields. Only the header can reject a file; every later stage
//! degrades to missing fields instead.

use crate::derived::{backport_hint, firmware_version, strip_version_padding};
use crate::entries::EntryTable;
use crate::header::PkgHeader;
use crate::result::{field, PkgFields, ValidationResult};
use crate::sfo::SfoTable;
use crate::size::format_size;
use crate::source::PkgSource;
use crate::trophy::{self, TrophyPresence};
use pv_core::error::{PkgError, ValidationError};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use tracing::{info, trace};

/// Pipeline stages, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Start,
    HeaderDecoded,
    EntriesDecoded,
    SfoMerged,
    DerivedFieldsComputed,
}

fn advance(stage: &mut Stage, next: Stage) {
    trace!("validation stage {:?} -> {:?}", stage, next);
    *stage = next;
}

/// Validator for one package file
#[derive(Debug, Clone)]
pub struct PkgValidator {
    path: PathBuf,
}

impl PkgValidator {
    /// Create a validator for `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path being validated
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate the file
    ///
    /// The file is opened for the duration of this call only and closed
    /// before the result is returned.
    pub fn validate(&self) -> ValidationResult {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let result = match self.open() {
            Ok(file) => validate_reader(file, &file_name),
            Err(e) => ValidationResult::Invalid(e.to_string()),
        };

        match &result {
            ValidationResult::Valid(fields) => {
                info!("Valid PKG: {} ({} fields)", self.path.display(), fields.len())
            }
            ValidationResult::Invalid(reason) => {
                info!("Invalid PKG: {}: {}", self.path.display(), reason)
            }
        }
        result
    }

    fn open(&self) -> Result<File, ValidationError> {
        if !self.path.exists() {
            return Err(ValidationError::FileNotFound(self.path.clone()));
        }
        File::open(&self.path).map_err(|source| ValidationError::Open {
            path: self.path.clone(),
            source,
        })
    }
}

/// Validate the file at `path`
pub fn validate(path: impl AsRef<Path>) -> ValidationResult {
    PkgValidator::new(path.as_ref()).validate()
}

/// Validate an already-open source
///
/// `file_name` feeds the file-name heuristics only.
pub fn validate_reader<R: Read + Seek>(reader: R, file_name: &str) -> ValidationResult {
    match run(reader, file_name) {
        Ok(fields) => ValidationResult::Valid(fields),
        Err(e) => ValidationResult::Invalid(e.to_string()),
    }
}

fn run<R: Read + Seek>(reader: R, file_name: &str) -> Result<PkgFields, ValidationError> {
    let mut stage = Stage::Start;
    let mut source = PkgSource::new(reader).map_err(PkgError::from)?;

    let header = PkgHeader::decode(&mut source)?;
    advance(&mut stage, Stage::HeaderDecoded);

    let entries = EntryTable::read(&mut source, header.entry_table_offset as u64, header.entry_count);
    advance(&mut stage, Stage::EntriesDecoded);

    let sfo = entries.read_sfo(&mut source).unwrap_or_default();
    advance(&mut stage, Stage::SfoMerged);

    let trophies = trophy::presence(&mut source);
    let mut fields = header_fields(&header);
    fields.merge(entry_fields(&entries));
    fields.merge(sfo_fields(&sfo));
    fields.merge(derived_fields(&sfo, trophies, file_name));
    advance(&mut stage, Stage::DerivedFieldsComputed);

    Ok(fields)
}

fn header_fields(header: &PkgHeader) -> PkgFields {
    let mut fields = PkgFields::default();
    fields.insert(field::PKG_TYPE, header.pkg_type.to_string());
    fields.insert(field::PKG_FLAGS, format!("0x{:08X}", header.pkg_flags));
    fields.insert(field::FILE_COUNT, header.file_count.to_string());
    fields.insert(field::ENTRY_COUNT, header.entry_count.to_string());
    fields.insert(field::BODY_OFFSET, format!("0x{:08X}", header.body_offset));
    fields.insert(field::BODY_SIZE, format_size(header.body_size));
    fields.insert(field::CONTENT_TYPE, format!("0x{:08X}", header.content_type));
    fields.insert(field::CONTENT_FLAGS, format!("0x{:08X}", header.content_flags));
    fields
}

fn entry_fields(entries: &EntryTable) -> PkgFields {
    let mut fields = PkgFields::default();
    if let Some(content_id) = &entries.content_id {
        fields.insert(field::CONTENT_ID, content_id.as_str());
    }
    if let Some(title_id) = &entries.title_id {
        fields.insert(field::TITLE_ID, title_id.as_str());
    }
    fields
}

fn sfo_fields(sfo: &SfoTable) -> PkgFields {
    let mut fields = PkgFields::default();
    if let Some(title) = sfo.title() {
        fields.insert(field::TITLE, title);
    }
    if let Some(title_id) = sfo.title_id() {
        fields.insert(field::TITLE_ID, title_id);
    }
    if let Some(app_ver) = sfo.get("APP_VER") {
        fields.insert(field::APP_VERSION, strip_version_padding(app_ver));
    }
    if let Some(version) = sfo.get("VERSION") {
        fields.insert(field::VERSION, strip_version_padding(version));
    }
    if let Some(system_ver) = sfo.get("SYSTEM_VER") {
        fields.insert(field::SYSTEM_VER, system_ver);
    }
    if let Some(category) = sfo.get("CATEGORY") {
        fields.insert(field::CATEGORY, category);
    }
    fields
}

fn derived_fields(sfo: &SfoTable, trophies: TrophyPresence, file_name: &str) -> PkgFields {
    let mut fields = PkgFields::default();
    if let Some(firmware) = sfo.get("SYSTEM_VER").and_then(firmware_version) {
        fields.insert(field::MINIMUM_FIRMWARE, firmware);
    }
    fields.insert(field::TROPHIES_PRESENT, trophies.to_string());
    fields.insert(field::BACKPORT, backport_hint(file_name).to_string());
    fields
}
