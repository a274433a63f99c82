//! Error taxonomy shared by the query, resolver, and executor layers.

use std::path::PathBuf;
use thiserror::Error;

/// Every error here is terminating: nothing is caught and retried.
#[derive(Debug, Error)]
pub enum Error {
    /// The Windows Installer subsystem could not be queried.
    ///
    /// This must never be downgraded to an empty reference set: an empty
    /// set would mark every cached patch as safe to delete.
    #[error("installer query failed: {0}")]
    Query(String),

    /// A filesystem operation on the cache directory or a candidate failed.
    #[error("{op} {}: {source}", .path.display())]
    Filesystem {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The requested action cannot be performed as invoked.
    #[error("{0}")]
    InvalidArgument(String),
}
