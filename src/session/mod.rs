//! Coordination service session layer
//!
//! The coordination service (a ZooKeeper-like hierarchical namespace
//! of versioned nodes with ephemeral/sequential creation, watches and
//! session-based liveness) is an external dependency. This module
//! defines the interface the rest of the crate consumes, plus
//! [`connect`] for endpoint resolution. The in-process backend lives
//! in [`memory`]; wire backends implement [`Session`] out of tree.

pub mod memory;

use crate::common::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};

/// Wildcard for [`Session::update`]: skip the version check.
pub const ANY_VERSION: i64 = -1;

/// Node lifetime mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Survives the creating session
    Persistent,
    /// Deleted automatically when the owning session ends
    Ephemeral,
}

/// Node naming mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Naming {
    /// The given path is the final path
    Fixed,
    /// The service appends a monotonic zero-padded counter to the
    /// given prefix; the final path is returned from create
    Sequential,
}

/// Node metadata returned by reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeStat {
    /// Data version; starts at 0 and bumps on every update
    pub version: i64,
    /// Creation time (Unix millis)
    pub ctime_ms: i64,
}

/// What happened to a watched path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    DataChanged,
    Deleted,
}

/// One-shot notification for a watched path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: String,
    pub kind: ChangeKind,
}

/// Session lifecycle notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Connected,
    Disconnected,
    /// The liveness window lapsed; all ephemerals owned by this
    /// session are gone and the session cannot be revived.
    Expired,
}

/// A live session with the coordination service.
///
/// Error contract shared by all operations: [`Error::ConnectionLoss`]
/// means the outcome is unknown (the operation may have committed);
/// every other error is definitive. Operations issued on one session
/// complete in submission order, which is what makes
/// verify-after-ambiguous-write sound.
#[async_trait]
pub trait Session: Send + Sync {
    /// Create a node. Returns the final path (which differs from
    /// `path` under [`Naming::Sequential`]).
    async fn create(
        &self,
        path: &str,
        payload: &[u8],
        lifetime: Lifetime,
        naming: Naming,
    ) -> Result<String>;

    /// Read a node's payload and metadata.
    async fn read(&self, path: &str) -> Result<(Vec<u8>, NodeStat)>;

    /// Replace a node's payload. `expected_version` of
    /// [`ANY_VERSION`] writes unconditionally. Returns the new
    /// version.
    async fn update(&self, path: &str, payload: &[u8], expected_version: i64) -> Result<i64>;

    /// List child names (not full paths), lexicographically ordered.
    async fn children(&self, path: &str) -> Result<Vec<String>>;

    /// Register a one-shot watch for the next change of `path`.
    /// Watching an absent path is allowed; the watch fires on its
    /// creation.
    async fn watch(&self, path: &str) -> Result<oneshot::Receiver<WatchEvent>>;

    /// Subscribe to session lifecycle events.
    fn events(&self) -> broadcast::Receiver<SessionEvent>;
}

impl std::fmt::Debug for dyn Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Session")
    }
}

/// Open a session against a coordination endpoint.
///
/// Supported schemes: `mem://<name>` attaches to the process-local
/// shared namespace of that name. Anything else is a definitive
/// configuration error; wire backends plug in behind [`Session`]
/// without going through this resolver.
pub async fn connect(endpoint: &str, timeout: Duration) -> Result<Arc<dyn Session>> {
    if let Some(name) = endpoint.strip_prefix("mem://") {
        if name.is_empty() {
            return Err(Error::InvalidConfig(
                "mem:// endpoint needs a namespace name".into(),
            ));
        }
        let ns = memory::MemoryNamespace::shared(name);
        return Ok(ns.session(timeout) as Arc<dyn Session>);
    }
    Err(Error::InvalidConfig(format!(
        "unsupported coordination endpoint: {}",
        endpoint
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_memory_scheme() {
        let session = connect("mem://connect-test", Duration::from_secs(15))
            .await
            .unwrap();
        let path = session
            .create("/probe", b"x", Lifetime::Persistent, Naming::Fixed)
            .await
            .unwrap();
        assert_eq!(path, "/probe");
    }

    #[tokio::test]
    async fn test_connect_shares_namespace_by_name() {
        let a = connect("mem://connect-shared", Duration::from_secs(15))
            .await
            .unwrap();
        let b = connect("mem://connect-shared", Duration::from_secs(15))
            .await
            .unwrap();
        a.create("/seen", b"1", Lifetime::Persistent, Naming::Fixed)
            .await
            .unwrap();
        assert!(b.read("/seen").await.is_ok());
    }

    #[tokio::test]
    async fn test_connect_rejects_unknown_scheme() {
        let err = connect("zk://localhost:2181", Duration::from_secs(15))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
