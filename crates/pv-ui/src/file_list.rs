//! List of dropped package files and their validation state

use crate::jobs::JobId;
use pv_pkg::{file_size_display, ValidationResult};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Reasons a file is not added to the list
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AddError {
    #[error("'{0}' is already in the list.")]
    Duplicate(String),

    #[error("'{0}' is not a .pkg file.")]
    NotPkg(String),
}

impl AddError {
    /// Dialog title for this notice
    pub fn title(&self) -> &'static str {
        match self {
            AddError::Duplicate(_) => "Already Added",
            AddError::NotPkg(_) => "Invalid File",
        }
    }
}

/// Validation state of a listed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// Waiting for its worker
    Pending,
    Done(ValidationResult),
}

/// One listed file
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Validation job started for this entry
    pub id: JobId,
    pub path: PathBuf,
    pub name: String,
    /// On-disk size for display, queried when the file is added
    pub size: Option<String>,
    pub status: FileStatus,
}

impl FileEntry {
    /// List label with status marker
    pub fn label(&self) -> String {
        match &self.status {
            FileStatus::Pending => format!("… {}", self.name),
            FileStatus::Done(result) if result.is_valid() => format!("✓ {}", self.name),
            FileStatus::Done(_) => format!("✗ {}", self.name),
        }
    }

    /// Validation result, once available
    pub fn result(&self) -> Option<&ValidationResult> {
        match &self.status {
            FileStatus::Pending => None,
            FileStatus::Done(result) => Some(result),
        }
    }
}

/// Whether `path` has a `.pkg` extension, ignoring case
pub fn has_pkg_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pkg"))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// File list view state
pub struct FileList {
    entries: Vec<FileEntry>,
    selected: Option<usize>,
    pkg_extension_only: bool,
    /// Never reset, so ids stay unique across Clear All
    next_id: JobId,
}

impl FileList {
    /// Create an empty list
    pub fn new(pkg_extension_only: bool) -> Self {
        Self {
            entries: Vec::new(),
            selected: None,
            pkg_extension_only,
            next_id: 0,
        }
    }

    /// Add a file as pending and select it, returning its job id
    pub fn add(&mut self, path: PathBuf) -> Result<JobId, AddError> {
        let name = display_name(&path);
        if self.pkg_extension_only && !has_pkg_extension(&path) {
            return Err(AddError::NotPkg(name));
        }
        if self.entries.iter().any(|entry| entry.path == path) {
            return Err(AddError::Duplicate(name));
        }

        let id = self.next_id;
        self.next_id += 1;
        let size = file_size_display(&path);
        self.entries.push(FileEntry {
            id,
            path,
            name,
            size,
            status: FileStatus::Pending,
        });
        self.selected = Some(self.entries.len() - 1);
        Ok(id)
    }

    /// Record the result of job `id`; returns `false` if that job's entry is gone
    pub fn complete(&mut self, id: JobId, result: ValidationResult) -> bool {
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                entry.status = FileStatus::Done(result);
                true
            }
            None => false,
        }
    }

    /// Select an entry by index
    pub fn select(&mut self, index: usize) {
        if index < self.entries.len() {
            self.selected = Some(index);
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Currently selected entry
    pub fn selected(&self) -> Option<&FileEntry> {
        self.entries.get(self.selected?)
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of files still waiting for a result
    pub fn pending_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.status == FileStatus::Pending)
            .count()
    }

    /// Remove every entry and its result
    pub fn clear(&mut self) {
        self.entries.clear();
        self.selected = None;
    }
}
