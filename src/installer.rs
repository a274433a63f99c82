//! Queries the Windows Installer subsystem for patches still in use.

use crate::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

/// VBScript payload that walks every installed product, then every patch
/// applied to it, and echoes each patch's local cache path, one per line.
const ENUM_SCRIPT: &str = r#"Option Explicit
Dim msi : Set msi = CreateObject("WindowsInstaller.Installer")
Dim products : Set products = msi.Products
Dim productCode
For Each productCode In products
    Dim patches : Set patches = msi.Patches(productCode)
    Dim patchCode
    For Each patchCode In patches
        Dim location : location = msi.PatchInfo(patchCode, "LocalPackage")
        WScript.Echo location
    Next
Next
"#;

/// The set of patch files currently referenced by any installed product.
///
/// Modeled as a capability rather than a concrete OS call so the resolver
/// and executor can be exercised against a substitute on hosts without the
/// installer service.
pub trait PatchQuery {
    /// Absolute cache paths, one per (product, patch) pair. Products that
    /// share a patch report its path more than once.
    fn referenced_patch_paths(&self) -> Result<Vec<PathBuf>, Error>;
}

/// Production binding: runs the enumeration script under `cscript`.
///
/// On hosts without `cscript` (any non-Windows machine) the spawn fails and
/// the query reports [`Error::Query`].
pub struct WindowsInstallerQuery;

impl PatchQuery for WindowsInstallerQuery {
    fn referenced_patch_paths(&self) -> Result<Vec<PathBuf>, Error> {
        // The scratch script file is removed when the handle drops, on every
        // exit path including query failure.
        let mut script = tempfile::Builder::new()
            .prefix("mspzap")
            .suffix(".vbs")
            .tempfile()
            .map_err(|err| Error::Query(format!("failed to create script file: {err}")))?;
        script
            .write_all(ENUM_SCRIPT.as_bytes())
            .map_err(|err| Error::Query(format!("failed to write script file: {err}")))?;

        let output = Command::new("cscript")
            .arg("//Nologo")
            .arg(script.path())
            .output()
            .map_err(|err| Error::Query(format!("failed to run cscript: {err}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Query(format!(
                "cscript exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect())
    }
}
