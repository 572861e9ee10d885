//! Idempotent bootstrap of the shared namespace structure
//!
//! Masters across history may race to bootstrap; two successful runs
//! must be indistinguishable from one. "Already exists" is therefore
//! success, and an ambiguous create of an empty node is safe to
//! retry as-is.

use crate::common::{Error, Result, STRUCTURE_PATHS};
use crate::session::{Lifetime, Naming, Session};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Ensure every structure placeholder exists.
///
/// A definitive failure on one path is logged and does not block the
/// remaining paths; the first such error is returned once all paths
/// were attempted.
pub async fn ensure_structure(session: &dyn Session, retry_delay: Duration) -> Result<()> {
    let mut first_err = None;
    for path in STRUCTURE_PATHS {
        if let Err(e) = ensure_exists(session, path, retry_delay).await {
            error!(%path, error = %e, "cannot create structure path");
            first_err.get_or_insert(e);
        }
    }
    match first_err {
        None => Ok(()),
        Some(e) => Err(e),
    }
}

async fn ensure_exists(session: &dyn Session, path: &str, retry_delay: Duration) -> Result<()> {
    loop {
        match session
            .create(path, &[], Lifetime::Persistent, Naming::Fixed)
            .await
        {
            Ok(_) => {
                info!(%path, "created structure path");
                return Ok(());
            }
            Err(Error::NodeExists(_)) => {
                debug!(%path, "structure path already present");
                return Ok(());
            }
            Err(e) if e.is_ambiguous() => {
                warn!(%path, error = %e, "structure create outcome unknown, retrying");
                tokio::time::sleep(retry_delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::STRUCTURE_PATHS;
    use crate::session::memory::{Fault, FaultKind, MemoryNamespace, OpKind};

    const DELAY: Duration = Duration::from_millis(1);

    #[tokio::test]
    async fn test_bootstrap_creates_all_paths() {
        let ns = MemoryNamespace::new();
        let s = ns.session(Duration::from_secs(15));
        ensure_structure(s.as_ref(), DELAY).await.unwrap();

        for path in STRUCTURE_PATHS {
            let (payload, stat) = s.read(path).await.unwrap();
            assert!(payload.is_empty());
            assert_eq!(stat.version, 0);
        }
    }

    #[tokio::test]
    async fn test_bootstrap_twice_is_success() {
        let ns = MemoryNamespace::new();
        let s = ns.session(Duration::from_secs(15));
        ensure_structure(s.as_ref(), DELAY).await.unwrap();
        ensure_structure(s.as_ref(), DELAY).await.unwrap();

        // Still exactly one node per path, no duplicates anywhere.
        assert_eq!(s.children("/tasks").await.unwrap().len(), 0);
        assert_eq!(s.children("/workers").await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_bootstrap_retries_through_lost_ack() {
        let ns = MemoryNamespace::new();
        let s = ns.session(Duration::from_secs(15));

        // First create commits but its ack is lost; the retry sees
        // "already exists", which is success.
        s.inject_fault(Fault::new(OpKind::Create, FaultKind::DropAck));
        ensure_structure(s.as_ref(), DELAY).await.unwrap();

        for path in STRUCTURE_PATHS {
            assert!(s.read(path).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_bootstrap_retries_through_dropped_create() {
        let ns = MemoryNamespace::new();
        let s = ns.session(Duration::from_secs(15));

        s.inject_fault(Fault::new(OpKind::Create, FaultKind::Drop));
        ensure_structure(s.as_ref(), DELAY).await.unwrap();

        for path in STRUCTURE_PATHS {
            assert!(s.read(path).await.is_ok());
        }
    }
}
