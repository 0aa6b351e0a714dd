//! Tasks: one URL to fetch, where to write it, and where to archive it.

mod load;

pub use load::{load_url_set, parse_url_set, TaskListError};

use std::path::{Path, PathBuf};

/// One unit of fetch-and-store work. Identity is the task's position in the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub url: String,
    pub output_file_name: String,
    pub display_label: String,
    pub output_folder: PathBuf,
    pub destination_key_prefix: String,
}

impl Task {
    /// Task writing `file_name` into `folder`, labelled by its file name.
    pub fn new(url: impl Into<String>, folder: impl AsRef<Path>, file_name: impl Into<String>) -> Self {
        let output_file_name = file_name.into();
        Self {
            url: url.into(),
            display_label: output_file_name.clone(),
            output_file_name,
            output_folder: folder.as_ref().to_path_buf(),
            destination_key_prefix: String::new(),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_folder.join(&self.output_file_name)
    }

    /// True if the output file exists and is not empty (a previous run fetched it).
    pub fn has_existing_output(&self) -> bool {
        std::fs::metadata(self.output_path())
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false)
    }
}
