//! Task submission
//!
//! Tasks are appended to `/tasks` as persistent, sequentially named
//! nodes; the assigned path is the caller's durable handle and the
//! queue order is the counter order.
//!
//! KNOWN LIMITATION: submission is at-least-once, not exactly-once.
//! Sequential naming assigns a fresh name on every create, so a
//! retry after an ambiguous failure whose original create committed
//! leaves a second, duplicate record for the same logical
//! submission, and there is no key to detect it by. The gap is
//! deliberate; deduplication would change the observable contract.

use crate::common::{Result, TASK_PREFIX};
use crate::session::{Lifetime, Naming, Session};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Appends task commands to the durable queue.
pub struct Submitter {
    session: Arc<dyn Session>,
    retry_delay: Duration,
}

impl Submitter {
    pub fn new(session: Arc<dyn Session>) -> Self {
        Self {
            session,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Enqueue `command` and return the assigned task path.
    ///
    /// Ambiguous failures are retried unconditionally (see the
    /// module-level duplicate note); definitive failures surface as
    /// `Err`.
    pub async fn submit(&self, command: &str) -> Result<String> {
        loop {
            let attempt = self
                .session
                .create(
                    TASK_PREFIX,
                    command.as_bytes(),
                    Lifetime::Persistent,
                    Naming::Sequential,
                )
                .await;
            match attempt {
                Ok(path) => {
                    info!(%path, "task enqueued");
                    return Ok(path);
                }
                Err(e) if e.is_ambiguous() => {
                    warn!(error = %e, "task create outcome unknown, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
