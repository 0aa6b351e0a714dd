//! `pfetch checksum` – hash files, or verify the files a run stored.

use anyhow::{bail, Result};
use pfetch_core::checksum;
use pfetch_core::journal::{Journal, RunId};
use std::path::{Path, PathBuf};

/// Prints `<sha256>  <path>` for each of `paths`, or with `run` checks every
/// stored file of that run against the digest recorded when it was fetched.
pub async fn run_checksum(paths: &[PathBuf], run: Option<(&Journal, RunId)>) -> Result<()> {
    let Some((journal, run_id)) = run else {
        for path in paths {
            let digest = checksum::sha256_path(path)?;
            println!("{}  {}", digest, path.display());
        }
        return Ok(());
    };

    let records = journal.task_results(run_id).await?;
    let mut checked = 0usize;
    let mut bad = 0usize;
    for r in records.iter().filter(|r| r.outcome == "stored") {
        let (Some(path), Some(expected)) = (&r.path, &r.sha256) else {
            continue;
        };
        checked += 1;
        match verify(Path::new(path), expected) {
            Ok(true) => {}
            Ok(false) => {
                bad += 1;
                println!("MISMATCH  {}", path);
            }
            Err(e) => {
                bad += 1;
                println!("UNREADABLE  {}  ({:#})", path, e);
            }
        }
    }
    println!("{} file(s) checked, {} problem(s)", checked, bad);
    if bad > 0 {
        bail!("{} stored file(s) of run {} failed verification", bad, run_id);
    }
    Ok(())
}

fn verify(path: &Path, expected: &str) -> Result<bool> {
    Ok(checksum::sha256_path(path)?.eq_ignore_ascii_case(expected))
}
