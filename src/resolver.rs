//! Orphan resolution: diffs the cache directory against the referenced set.

use crate::error::Error;
use crate::installer::PatchQuery;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Extension of installer patch payloads, matched case-insensitively.
const PATCH_EXT: &str = ".msp";

/// A cached patch file no installed product references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchCandidate {
    /// Lowercased filename, no directory component.
    pub filename: String,
    pub size_bytes: u64,
}

/// Lowercased filenames of every reported patch that lives directly in
/// `cache_dir`. The collaborator should only report cache-resident patches,
/// but that is not trusted blindly: paths under any other directory are
/// discarded. Comparison is a literal lowercase string match, with no
/// canonicalization of symlinks or short paths.
fn referenced_filenames(cache_dir: &Path, reported: &[PathBuf]) -> HashSet<String> {
    let cache_dir_lower = cache_dir.to_string_lossy().to_lowercase();
    let mut referenced = HashSet::new();
    for path in reported {
        let parent = match path.parent() {
            Some(parent) => parent.to_string_lossy().to_lowercase(),
            None => continue,
        };
        if parent != cache_dir_lower {
            continue;
        }
        if let Some(name) = path.file_name() {
            referenced.insert(name.to_string_lossy().to_lowercase());
        }
    }
    referenced
}

/// Diff the cache directory's direct entries against the referenced set.
///
/// The installer is queried first, so a query failure propagates before any
/// filesystem access. Resolution itself only lists and stats; it never opens
/// or moves a file. Candidates come back in directory-listing order.
pub fn resolve_orphans(
    cache_dir: &Path,
    query: &dyn PatchQuery,
) -> Result<Vec<PatchCandidate>, Error> {
    let reported = query.referenced_patch_paths()?;
    let referenced = referenced_filenames(cache_dir, &reported);

    let entries = fs::read_dir(cache_dir).map_err(|source| Error::Filesystem {
        op: "failed to list",
        path: cache_dir.to_path_buf(),
        source,
    })?;

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| Error::Filesystem {
            op: "failed to read an entry in",
            path: cache_dir.to_path_buf(),
            source,
        })?;
        let filename = entry.file_name().to_string_lossy().to_lowercase();
        if !filename.ends_with(PATCH_EXT) || referenced.contains(&filename) {
            continue;
        }
        let metadata = entry.metadata().map_err(|source| Error::Filesystem {
            op: "failed to stat",
            path: entry.path(),
            source,
        })?;
        // Subdirectories are never candidates, even when named *.msp.
        if !metadata.is_file() {
            continue;
        }
        candidates.push(PatchCandidate {
            filename,
            size_bytes: metadata.len(),
        });
    }

    Ok(candidates)
}
