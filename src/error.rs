use std::path::PathBuf;

use thiserror::Error;

use crate::models::Ecosystem;

/// Errors the pipeline distinguishes by recovery strategy.
///
/// Parse failures ([`MalformedManifest`](DepledgerError::MalformedManifest),
/// [`UnsupportedManifest`](DepledgerError::UnsupportedManifest)) skip the
/// offending file and the run continues. A registry transport error
/// ([`ResolutionFailed`](DepledgerError::ResolutionFailed)) aborts the run —
/// an incomplete license report is worse than none. A corrupt cache
/// ([`CacheCorrupt`](DepledgerError::CacheCorrupt)) falls back to an empty
/// cache at the cost of re-resolving everything.
#[derive(Debug, Error)]
pub enum DepledgerError {
    #[error("malformed manifest {}: {reason}", path.display())]
    MalformedManifest { path: PathBuf, reason: String },

    #[error("no parser registered for manifest {}", path.display())]
    UnsupportedManifest { path: PathBuf },

    #[error("license resolution failed for {ecosystem} {name} {version}")]
    ResolutionFailed {
        ecosystem: Ecosystem,
        name: String,
        version: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("license cache {} is unreadable", path.display())]
    CacheCorrupt {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
