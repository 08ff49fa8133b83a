//! User interface for pkg-validator

pub mod app;
pub mod detail;
pub mod file_list;
pub mod jobs;

pub use app::PkgValidatorApp;
pub use file_list::{FileEntry, FileList, FileStatus};
pub use jobs::ValidationJobs;
