//! Worker presence and status
//!
//! A worker announces itself with one ephemeral record under
//! `/workers` and mutates that record's payload as its status
//! changes. Status propagation is last-write-wins: a retried update
//! for an older status must never clobber a newer one that was
//! already published. Every update attempt (first or retried) is
//! therefore guarded by an epoch check against the latest intended
//! status.

use crate::common::{worker_path, Error, Result};
use crate::session::{Lifetime, Naming, Session, ANY_VERSION};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Status a worker starts in.
pub const IDLE_STATUS: &str = "Idle";

struct Intended {
    epoch: u64,
    status: String,
}

struct Inner {
    session: Arc<dyn Session>,
    server_id: String,
    path: String,
    intended: Mutex<Intended>,
}

impl Inner {
    fn is_current(&self, epoch: u64) -> bool {
        self.intended.lock().unwrap().epoch == epoch
    }
}

/// Registers a worker's liveness and publishes its status.
#[derive(Clone)]
pub struct Registrar {
    inner: Arc<Inner>,
    retry_delay: Duration,
}

impl Registrar {
    pub fn new(session: Arc<dyn Session>, server_id: impl Into<String>) -> Self {
        let server_id = server_id.into();
        let path = worker_path(&server_id);
        Self {
            inner: Arc::new(Inner {
                session,
                server_id,
                path,
                intended: Mutex::new(Intended {
                    epoch: 0,
                    status: IDLE_STATUS.to_string(),
                }),
            }),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Shorten or stretch the pause between retries of ambiguously
    /// failed operations.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn server_id(&self) -> &str {
        &self.inner.server_id
    }

    /// Path of this worker's presence record.
    pub fn status_path(&self) -> &str {
        &self.inner.path
    }

    /// Last status handed to [`set_status`](Self::set_status).
    pub fn intended_status(&self) -> String {
        self.inner.intended.lock().unwrap().status.clone()
    }

    /// Create the presence record with an initial `"Idle"` payload.
    ///
    /// "Already exists" is non-fatal: either a stale record from a
    /// previous session of this identity has not expired yet, or an
    /// earlier retried create already succeeded. Both mean we are
    /// registered.
    pub async fn register(&self) -> Result<()> {
        loop {
            let attempt = self
                .inner
                .session
                .create(
                    &self.inner.path,
                    IDLE_STATUS.as_bytes(),
                    Lifetime::Ephemeral,
                    Naming::Fixed,
                )
                .await;
            match attempt {
                Ok(_) => {
                    info!(server_id = %self.inner.server_id, "worker registered");
                    return Ok(());
                }
                Err(Error::NodeExists(_)) => {
                    warn!(
                        server_id = %self.inner.server_id,
                        "worker record already present, proceeding as registered"
                    );
                    return Ok(());
                }
                Err(e) if e.is_ambiguous() => {
                    warn!(error = %e, "register outcome unknown, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Publish a new status, superseding any still-in-flight older
    /// one.
    ///
    /// The update runs on a spawned task; the returned handle
    /// completes once this status was durably applied or abandoned
    /// because a later `set_status` overtook it.
    pub fn set_status(&self, status: impl Into<String>) -> JoinHandle<()> {
        let status = status.into();
        let epoch = {
            let mut intended = self.inner.intended.lock().unwrap();
            intended.epoch += 1;
            intended.status = status.clone();
            intended.epoch
        };
        let inner = self.inner.clone();
        let retry_delay = self.retry_delay;
        tokio::spawn(async move {
            drive_update(inner, epoch, status, retry_delay).await;
        })
    }
}

async fn drive_update(inner: Arc<Inner>, epoch: u64, status: String, retry_delay: Duration) {
    loop {
        // Last-write-wins guard: checked before the first attempt
        // and before every retry.
        if !inner.is_current(epoch) {
            debug!(%status, "status superseded, abandoning update");
            return;
        }
        match inner
            .session
            .update(&inner.path, status.as_bytes(), ANY_VERSION)
            .await
        {
            Ok(version) => {
                debug!(%status, version, "status applied");
                return;
            }
            Err(e) if e.is_ambiguous() => {
                warn!(%status, error = %e, "status update outcome unknown, retrying");
                tokio::time::sleep(retry_delay).await;
            }
            Err(Error::NoNode(_)) => {
                warn!(%status, "worker record gone, dropping status update");
                return;
            }
            Err(e) => {
                error!(%status, error = %e, "status update failed");
                return;
            }
        }
    }
}
