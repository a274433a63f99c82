//! The three actions over the resolved candidate list: report, move, zap.

use crate::error::Error;
use crate::installer::PatchQuery;
use crate::resolver::{resolve_orphans, PatchCandidate};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

/// One invocation performs exactly one of these, selected by the command
/// surface. All three consume the same resolved candidate list.
#[derive(Debug, Clone)]
pub enum Action {
    /// Report the candidate count and total size, optionally per file.
    Check { list_files: bool },
    /// Move every candidate into the destination directory.
    MoveTo(PathBuf),
    /// Delete every candidate from the cache directory.
    Zap,
}

/// Running totals for a move/zap batch.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub count: usize,
    pub total_bytes: u64,
}

fn mebibytes(bytes: u64) -> f64 {
    bytes as f64 / (1u64 << 20) as f64
}

fn gibibytes(bytes: u64) -> f64 {
    bytes as f64 / (1u64 << 30) as f64
}

impl Action {
    /// Up-front argument validation. For a move this checks the destination
    /// once, before the installer query and before any candidate is touched.
    pub fn validate(&self) -> Result<(), Error> {
        if let Action::MoveTo(dest) = self {
            if !dest.is_dir() {
                return Err(Error::InvalidArgument(format!(
                    "{} is not a valid directory",
                    dest.display()
                )));
            }
        }
        Ok(())
    }
}

/// Validate, resolve the orphan list once, then execute the action over it.
pub fn run(action: &Action, cache_dir: &Path, query: &dyn PatchQuery) -> Result<(), Error> {
    action.validate()?;
    let candidates = resolve_orphans(cache_dir, query)?;

    match action {
        Action::Check { list_files } => check(&candidates, *list_files),
        Action::MoveTo(dest) => {
            let summary = move_candidates(cache_dir, dest, &candidates)?;
            println!(
                "{}",
                format!(
                    "Moved {} files with total size {:.2} GB",
                    summary.count,
                    gibibytes(summary.total_bytes)
                )
                .bold()
            );
        }
        Action::Zap => {
            let summary = delete_candidates(cache_dir, &candidates)?;
            println!(
                "{}",
                format!(
                    "Deleted {} files with total size {:.2} GB",
                    summary.count,
                    gibibytes(summary.total_bytes)
                )
                .bold()
            );
        }
    }

    Ok(())
}

/// Print the candidate count and total size; with `list_files`, each
/// candidate first, smallest to largest. Read-only.
fn check(candidates: &[PatchCandidate], list_files: bool) {
    if list_files {
        println!("The following files are safe to delete:");
        let mut by_size: Vec<&PatchCandidate> = candidates.iter().collect();
        by_size.sort_by_key(|c| c.size_bytes);
        for candidate in by_size {
            println!(
                "{:8.2} MB: {}",
                mebibytes(candidate.size_bytes),
                candidate.filename
            );
        }
    }

    let total_bytes: u64 = candidates.iter().map(|c| c.size_bytes).sum();
    println!(
        "{}",
        format!(
            "Safe to delete {} files with total size {:.2} GB",
            candidates.len(),
            gibibytes(total_bytes)
        )
        .bold()
    );
}

/// Move each candidate into `dest`, printing a progress line per file.
///
/// Aborts on the first failure; files already moved stay moved.
pub fn move_candidates(
    cache_dir: &Path,
    dest: &Path,
    candidates: &[PatchCandidate],
) -> Result<Summary, Error> {
    let mut summary = Summary::default();
    for candidate in candidates {
        println!(
            "Moving file {} ({:.2} MB)",
            candidate.filename,
            mebibytes(candidate.size_bytes)
        );
        move_file(
            &cache_dir.join(&candidate.filename),
            &dest.join(&candidate.filename),
        )?;
        summary.count += 1;
        summary.total_bytes += candidate.size_bytes;
    }
    Ok(summary)
}

/// Rename, falling back to copy-then-delete when the destination is on a
/// different volume.
fn move_file(from: &Path, to: &Path) -> Result<(), Error> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to).map_err(|source| Error::Filesystem {
        op: "failed to move",
        path: from.to_path_buf(),
        source,
    })?;
    fs::remove_file(from).map_err(|source| Error::Filesystem {
        op: "failed to remove",
        path: from.to_path_buf(),
        source,
    })
}

/// Delete each candidate from the cache directory, printing a progress line
/// per file. Same abort-on-first-failure contract as a move.
pub fn delete_candidates(
    cache_dir: &Path,
    candidates: &[PatchCandidate],
) -> Result<Summary, Error> {
    let mut summary = Summary::default();
    for candidate in candidates {
        println!(
            "Deleting file {} ({:.2} MB)",
            candidate.filename,
            mebibytes(candidate.size_bytes)
        );
        let path = cache_dir.join(&candidate.filename);
        fs::remove_file(&path).map_err(|source| Error::Filesystem {
            op: "failed to delete",
            path,
            source,
        })?;
        summary.count += 1;
        summary.total_bytes += candidate.size_bytes;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct FailingQuery;

    impl PatchQuery for FailingQuery {
        fn referenced_patch_paths(&self) -> Result<Vec<PathBuf>, Error> {
            Err(Error::Query("installer service unavailable".into()))
        }
    }

    fn candidate(filename: &str, size_bytes: u64) -> PatchCandidate {
        PatchCandidate {
            filename: filename.into(),
            size_bytes,
        }
    }

    fn write_file(dir: &Path, name: &str, len: usize) {
        fs::write(dir.join(name), vec![0u8; len]).unwrap();
    }

    // ============ size formatting ============

    #[test]
    fn test_mebibyte_rendering() {
        assert_eq!(format!("{:.2}", mebibytes(20 * 1024 * 1024)), "20.00");
        assert_eq!(format!("{:.2}", mebibytes(0)), "0.00");
    }

    #[test]
    fn test_gibibyte_rendering() {
        // 20 MiB is just under 0.02 GiB and must display as 0.02.
        assert_eq!(format!("{:.2}", gibibytes(20 * 1024 * 1024)), "0.02");
        assert_eq!(format!("{:.2}", gibibytes(0)), "0.00");
    }

    // ============ validation ============

    #[test]
    fn test_validate_rejects_missing_destination() {
        let dir = tempdir().unwrap();
        let action = Action::MoveTo(dir.path().join("no-such-dir"));
        assert!(matches!(
            action.validate(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_validate_rejects_file_destination() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "not-a-dir", 1);
        let action = Action::MoveTo(dir.path().join("not-a-dir"));
        assert!(matches!(
            action.validate(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_validate_accepts_existing_directory() {
        let dir = tempdir().unwrap();
        assert!(Action::MoveTo(dir.path().to_path_buf()).validate().is_ok());
        assert!(Action::Check { list_files: false }.validate().is_ok());
        assert!(Action::Zap.validate().is_ok());
    }

    // ============ move ============

    #[test]
    fn test_move_relocates_candidates_with_sizes_intact() {
        let cache = tempdir().unwrap();
        let dest = tempdir().unwrap();
        write_file(cache.path(), "a.msp", 3);
        write_file(cache.path(), "b.msp", 5);

        let candidates = [candidate("a.msp", 3), candidate("b.msp", 5)];
        let summary = move_candidates(cache.path(), dest.path(), &candidates).unwrap();

        assert_eq!(
            summary,
            Summary {
                count: 2,
                total_bytes: 8,
            }
        );
        assert!(!cache.path().join("a.msp").exists());
        assert!(!cache.path().join("b.msp").exists());
        assert_eq!(fs::metadata(dest.path().join("a.msp")).unwrap().len(), 3);
        assert_eq!(fs::metadata(dest.path().join("b.msp")).unwrap().len(), 5);
    }

    #[test]
    fn test_move_aborts_on_first_failure() {
        let cache = tempdir().unwrap();
        let dest = tempdir().unwrap();
        write_file(cache.path(), "real.msp", 5);

        // The ghost entry fails first; the real file must be left in place.
        let candidates = [candidate("ghost.msp", 1), candidate("real.msp", 5)];
        let err = move_candidates(cache.path(), dest.path(), &candidates).unwrap_err();

        assert!(matches!(err, Error::Filesystem { .. }));
        assert!(cache.path().join("real.msp").exists());
        assert!(!dest.path().join("real.msp").exists());
    }

    #[test]
    fn test_move_empty_list_is_a_no_op() {
        let cache = tempdir().unwrap();
        let dest = tempdir().unwrap();
        write_file(cache.path(), "a.msp", 3);

        let summary = move_candidates(cache.path(), dest.path(), &[]).unwrap();
        assert_eq!(summary, Summary::default());
        assert!(cache.path().join("a.msp").exists());
    }

    // ============ zap ============

    #[test]
    fn test_delete_removes_only_the_candidates() {
        let cache = tempdir().unwrap();
        write_file(cache.path(), "a.msp", 10);
        write_file(cache.path(), "b.msp", 20);

        let summary = delete_candidates(cache.path(), &[candidate("b.msp", 20)]).unwrap();
        assert_eq!(
            summary,
            Summary {
                count: 1,
                total_bytes: 20,
            }
        );
        assert!(cache.path().join("a.msp").exists());
        assert!(!cache.path().join("b.msp").exists());
    }

    #[test]
    fn test_delete_aborts_on_first_failure() {
        let cache = tempdir().unwrap();
        write_file(cache.path(), "real.msp", 5);

        let candidates = [candidate("ghost.msp", 1), candidate("real.msp", 5)];
        let err = delete_candidates(cache.path(), &candidates).unwrap_err();

        assert!(matches!(err, Error::Filesystem { .. }));
        assert!(cache.path().join("real.msp").exists());
    }

    // ============ fatal-fast ============

    #[test]
    fn test_query_failure_prevents_any_mutation() {
        let cache = tempdir().unwrap();
        write_file(cache.path(), "a.msp", 10);

        let err = run(&Action::Zap, cache.path(), &FailingQuery).unwrap_err();
        assert!(matches!(err, Error::Query(_)));
        assert!(cache.path().join("a.msp").exists());
    }
}
