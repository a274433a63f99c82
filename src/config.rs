//! Resolution of the fixed installer cache directory.

use crate::error::Error;
use std::env;
use std::path::PathBuf;

/// Subdirectory of the Windows directory holding cached patch payloads.
const CACHE_SUBDIR: &str = "Installer";

/// Resolve `%WINDIR%\Installer` once at startup.
///
/// The result is passed explicitly into the resolver and executor; nothing
/// else reads the environment.
pub fn installer_cache_dir() -> Result<PathBuf, Error> {
    let windir = env::var_os("WINDIR").ok_or_else(|| {
        Error::Query("WINDIR is not set; the Windows Installer subsystem is unavailable".into())
    })?;
    Ok(PathBuf::from(windir).join(CACHE_SUBDIR))
}
