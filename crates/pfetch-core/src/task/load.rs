//! Url-set files: a JSON array of task records.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::Task;
use crate::url_model;

#[derive(Debug, thiserror::Error)]
pub enum TaskListError {
    #[error("failed to read url set {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid url set: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("entry {index}: url is empty")]
    EmptyUrl { index: usize },
    #[error("entry {index}: cannot derive a file name from {url}")]
    NoFileName { index: usize, url: String },
    #[error("entry {index}: file name {name:?} has no usable characters")]
    InvalidFileName { index: usize, name: String },
}

/// Record as written by url-set producers. Only `url` is required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UrlRecord {
    url: String,
    #[serde(default)]
    file_name: Option<String>,
    #[serde(default, alias = "identifier", alias = "displayId")]
    display_label: Option<String>,
    #[serde(default, alias = "scrapedHtmlFolderpath", alias = "htmlFolderPath")]
    output_folder: Option<PathBuf>,
    #[serde(default, alias = "s3KeyPrefix")]
    key_prefix: Option<String>,
}

/// Reads and parses a url-set file. Records without an output folder use `default_folder`.
pub fn load_url_set(path: &Path, default_folder: &Path) -> Result<Vec<Task>, TaskListError> {
    let text = std::fs::read_to_string(path).map_err(|source| TaskListError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let tasks = parse_url_set(&text, default_folder)?;
    tracing::debug!(path = %path.display(), count = tasks.len(), "loaded url set");
    Ok(tasks)
}

/// Parses url-set JSON, preserving record order.
pub fn parse_url_set(json: &str, default_folder: &Path) -> Result<Vec<Task>, TaskListError> {
    let records: Vec<UrlRecord> = serde_json::from_str(json)?;
    records
        .into_iter()
        .enumerate()
        .map(|(index, r)| {
            let url = r.url.trim().to_string();
            if url.is_empty() {
                return Err(TaskListError::EmptyUrl { index });
            }
            let output_file_name = match r.file_name.filter(|n| !n.trim().is_empty()) {
                Some(name) => {
                    let clean = url_model::sanitize_file_name(&name);
                    if clean.is_empty() {
                        return Err(TaskListError::InvalidFileName { index, name });
                    }
                    clean
                }
                None => url_model::file_name_for_url(&url)
                    .ok_or_else(|| TaskListError::NoFileName {
                        index,
                        url: url.clone(),
                    })?,
            };
            Ok(Task {
                display_label: r
                    .display_label
                    .unwrap_or_else(|| output_file_name.clone()),
                output_folder: r
                    .output_folder
                    .unwrap_or_else(|| default_folder.to_path_buf()),
                destination_key_prefix: r.key_prefix.unwrap_or_default(),
                url,
                output_file_name,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_full_records_in_order() {
        let json = r#"[
            {"url": "https://example.com/a", "fileName": "a.html", "identifier": "A",
             "scrapedHtmlFolderpath": "/data/html", "s3KeyPrefix": "html/2019"},
            {"url": "https://example.com/b", "fileName": "b.html", "displayLabel": "B",
             "outputFolder": "/other", "keyPrefix": "x"}
        ]"#;
        let tasks = parse_url_set(json, Path::new("/default")).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].url, "https://example.com/a");
        assert_eq!(tasks[0].display_label, "A");
        assert_eq!(tasks[0].output_path(), PathBuf::from("/data/html/a.html"));
        assert_eq!(tasks[0].destination_key_prefix, "html/2019");
        assert_eq!(tasks[1].display_label, "B");
        assert_eq!(tasks[1].output_folder, PathBuf::from("/other"));
    }

    #[test]
    fn fills_in_missing_fields() {
        let json = r#"[{"url": "https://example.com/players/abc"}]"#;
        let tasks = parse_url_set(json, Path::new("/default")).unwrap();
        assert_eq!(tasks[0].output_file_name, "example.com_players_abc.html");
        assert_eq!(tasks[0].display_label, "example.com_players_abc.html");
        assert_eq!(tasks[0].output_folder, PathBuf::from("/default"));
        assert_eq!(tasks[0].destination_key_prefix, "");
    }

    #[test]
    fn given_file_names_are_sanitized() {
        let json = r#"[{"url": "https://example.com/a", "fileName": "../etc/passwd"}]"#;
        let tasks = parse_url_set(json, Path::new("/d")).unwrap();
        assert_eq!(tasks[0].output_file_name, "etc_passwd");
    }

    #[test]
    fn file_name_without_usable_characters_rejected() {
        for name in ["...", "/", "__", "../"] {
            let json = format!(
                r#"[{{"url": "https://example.com/a"}}, {{"url": "https://x/a", "fileName": "{}"}}]"#,
                name
            );
            match parse_url_set(&json, Path::new("/out")) {
                Err(TaskListError::InvalidFileName { index: 1, name: n }) => assert_eq!(n, name),
                other => panic!("{:?} accepted: {:?}", name, other),
            }
        }
    }

    #[test]
    fn empty_url_rejected() {
        let json = r#"[{"url": "https://example.com/a"}, {"url": "  "}]"#;
        assert!(matches!(
            parse_url_set(json, Path::new("/d")),
            Err(TaskListError::EmptyUrl { index: 1 })
        ));
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(matches!(
            parse_url_set("{not json", Path::new("/d")),
            Err(TaskListError::Parse(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(br#"[{"url": "https://example.com/x.html"}]"#).unwrap();
        f.flush().unwrap();
        let tasks = load_url_set(f.path(), Path::new("/d")).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].output_file_name, "example.com_x.html");

        let missing = load_url_set(Path::new("/nonexistent/urls.json"), Path::new("/d"));
        assert!(matches!(missing, Err(TaskListError::Read { .. })));
    }

    #[test]
    fn existing_output_detection() {
        let dir = tempfile::tempdir().unwrap();
        let task = Task::new("https://example.com/", dir.path(), "page.html");
        assert!(!task.has_existing_output());
        std::fs::write(task.output_path(), b"").unwrap();
        assert!(!task.has_existing_output(), "empty file does not count");
        std::fs::write(task.output_path(), b"<html></html>").unwrap();
        assert!(task.has_existing_output());
    }
}
