//! Durable local writes of fetched content.
//!
//! Content goes to `<name>.part`, is fsynced, then atomically renamed to the
//! final name, so a crash never leaves a truncated file under the final name.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `page.html` → `page.html.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Writes `content` to `final_path`, creating the parent folder if needed.
/// Replaces an existing file at `final_path`.
pub fn write_output(final_path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = final_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output folder: {}", parent.display()))?;
    }

    let tmp = temp_path(final_path);
    let mut file = File::options()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp)
        .with_context(|| format!("failed to create temp file: {}", tmp.display()))?;
    file.write_all(content)
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    file.sync_all().context("storage sync failed")?;
    drop(file);

    std::fs::rename(&tmp, final_path).with_context(|| {
        format!(
            "failed to rename {} to {}",
            tmp.display(),
            final_path.display()
        )
    })?;
    Ok(())
}

/// Removes the `.part` file an interrupted write to `final_path` left behind.
/// Other files in the folder are never touched. Returns whether a file was removed.
pub fn remove_stale_part(final_path: &Path) -> Result<bool> {
    let tmp = temp_path(final_path);
    if !tmp.is_file() {
        return Ok(false);
    }
    std::fs::remove_file(&tmp)
        .with_context(|| format!("remove stale temp file: {}", tmp.display()))?;
    tracing::debug!(path = %tmp.display(), "removed stale .part");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_appends_part() {
        let p = temp_path(Path::new("page.html"));
        assert_eq!(p.to_string_lossy(), "page.html.part");
        let p2 = temp_path(Path::new("/tmp/box/201904100.shtml"));
        assert_eq!(p2.to_string_lossy(), "/tmp/box/201904100.shtml.part");
    }

    #[test]
    fn write_creates_folder_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("nested/deeper/page.html");
        write_output(&final_path, b"<html>hi</html>").unwrap();
        assert_eq!(std::fs::read(&final_path).unwrap(), b"<html>hi</html>");
        assert!(!temp_path(&final_path).exists());
    }

    #[test]
    fn write_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("page.html");
        write_output(&final_path, b"old content that is longer").unwrap();
        write_output(&final_path, b"new").unwrap();
        assert_eq!(std::fs::read(&final_path).unwrap(), b"new");
    }

    #[test]
    fn only_own_stale_part_removed() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("a.html");
        std::fs::write(temp_path(&final_path), b"x").unwrap();
        std::fs::write(dir.path().join("movie.mkv.part"), b"someone else's").unwrap();
        std::fs::write(dir.path().join("b.html"), b"y").unwrap();

        assert!(remove_stale_part(&final_path).unwrap());
        assert!(!temp_path(&final_path).exists());
        assert!(dir.path().join("movie.mkv.part").exists());
        assert!(dir.path().join("b.html").exists());
        assert!(!remove_stale_part(&final_path).unwrap());
        assert!(!remove_stale_part(&dir.path().join("missing/c.html")).unwrap());
    }
}
