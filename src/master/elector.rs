//! Leader election over the exclusive master record
//!
//! Election is a single exclusive ephemeral create of `/master`. The
//! only non-idempotent step is that create; everything else is a pure
//! read. Correctness under connection loss therefore reduces to:
//! after an ambiguous create, re-read the record instead of assuming
//! failure — the create may have committed, and a blind re-attempt
//! would see "already exists" and wrongly conclude Follower.

use crate::common::{Error, Result, MASTER_PATH};
use crate::master::bootstrap;
use crate::session::{ChangeKind, Lifetime, Naming, Session, SessionEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Where this process stands in the election
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterState {
    /// Not yet contested
    Unknown,
    /// Contest in progress, outcome not yet certain
    Candidate,
    /// This process holds the master record
    Leader,
    /// Another process holds the master record
    Follower,
}

impl std::fmt::Display for MasterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MasterState::Unknown => write!(f, "unknown"),
            MasterState::Candidate => write!(f, "candidate"),
            MasterState::Leader => write!(f, "leader"),
            MasterState::Follower => write!(f, "follower"),
        }
    }
}

/// Runs and maintains this process's claim to mastership.
pub struct Elector {
    session: Arc<dyn Session>,
    server_id: String,
    state: RwLock<MasterState>,
    retry_delay: Duration,
}

impl Elector {
    pub fn new(session: Arc<dyn Session>, server_id: impl Into<String>) -> Self {
        Self {
            session,
            server_id: server_id.into(),
            state: RwLock::new(MasterState::Unknown),
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
        &self.server_id
    }

    pub async fn state(&self) -> MasterState {
        *self.state.read().await
    }

    async fn set_state(&self, state: MasterState) {
        *self.state.write().await = state;
    }

    /// Contest the master seat until the outcome is certain.
    ///
    /// Returns only `Leader` or `Follower`. Ambiguous failures are
    /// resolved internally by [`check_leader`](Self::check_leader)
    /// and retried without bound; a definitive environmental failure
    /// surfaces as `Err`. Winning triggers the structure bootstrap
    /// before returning.
    pub async fn run_for_leader(&self) -> Result<MasterState> {
        self.set_state(MasterState::Candidate).await;
        loop {
            let attempt = self
                .session
                .create(
                    MASTER_PATH,
                    self.server_id.as_bytes(),
                    Lifetime::Ephemeral,
                    Naming::Fixed,
                )
                .await;
            match attempt {
                Ok(_) => return self.settle(MasterState::Leader).await,
                Err(Error::NodeExists(_)) => return self.settle(MasterState::Follower).await,
                Err(e) if e.is_ambiguous() => {
                    // The create may have committed. Re-read before
                    // deciding anything.
                    warn!(error = %e, "master create outcome unknown, verifying");
                    match self.check_leader().await? {
                        Some(verdict) => return self.settle(verdict).await,
                        None => {
                            // Seat is empty: contest it again.
                            debug!("no master record found, re-contesting");
                            tokio::time::sleep(self.retry_delay).await;
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Resolve who holds the seat by reading the master record.
    ///
    /// `Some(Leader)` means our own earlier create committed even
    /// though we never saw its acknowledgment. `None` means the seat
    /// is empty and worth contesting. Reads are idempotent, so
    /// ambiguous failures here are simply retried.
    async fn check_leader(&self) -> Result<Option<MasterState>> {
        loop {
            match self.session.read(MASTER_PATH).await {
                Ok((payload, _)) => {
                    let verdict = if payload == self.server_id.as_bytes() {
                        MasterState::Leader
                    } else {
                        MasterState::Follower
                    };
                    return Ok(Some(verdict));
                }
                Err(Error::NoNode(_)) => return Ok(None),
                Err(e) if e.is_ambiguous() => {
                    warn!(error = %e, "master read outcome unknown, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Block until the master seat is vacant.
    ///
    /// Watches are one-shot and say nothing about current existence,
    /// so the record is re-read after every watch registration: a
    /// deletion landing between a previous notification and the new
    /// watch would otherwise leave every candidate waiting for a
    /// creation nobody will perform. Returns `Ok` when the record is
    /// gone; the caller should re-contest.
    pub async fn await_vacancy(&self) -> Result<()> {
        let mut events = self.session.events();
        loop {
            let watch = self.session.watch(MASTER_PATH).await?;
            match self.session.read(MASTER_PATH).await {
                Ok(_) => {}
                Err(Error::NoNode(_)) => return Ok(()),
                Err(e) if e.is_ambiguous() => {
                    warn!(error = %e, "master read outcome unknown, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                    continue;
                }
                Err(e) => return Err(e),
            }
            tokio::select! {
                event = watch => match event {
                    Ok(ev) if ev.kind == ChangeKind::Deleted => return Ok(()),
                    Ok(_) => {}
                    Err(_) => {
                        return Err(Error::ConnectionLoss("watch channel dropped".to_string()))
                    }
                },
                event = events.recv() => {
                    if matches!(event, Ok(SessionEvent::Expired)) {
                        return Err(Error::SessionExpired);
                    }
                }
            }
        }
    }

    async fn settle(&self, verdict: MasterState) -> Result<MasterState> {
        self.set_state(verdict).await;
        info!(server_id = %self.server_id, state = %verdict, "election settled");
        if verdict == MasterState::Leader {
            bootstrap::ensure_structure(self.session.as_ref(), self.retry_delay).await?;
        }
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::memory::MemoryNamespace;

    fn elector(ns: &Arc<MemoryNamespace>, id: &str) -> Elector {
        let session = ns.session(Duration::from_secs(15));
        Elector::new(session, id).with_retry_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_first_candidate_wins() {
        let ns = MemoryNamespace::new();
        let e = elector(&ns, "aaaa");
        assert_eq!(e.state().await, MasterState::Unknown);
        assert_eq!(e.run_for_leader().await.unwrap(), MasterState::Leader);
        assert_eq!(e.state().await, MasterState::Leader);
    }

    #[tokio::test]
    async fn test_second_candidate_follows() {
        let ns = MemoryNamespace::new();
        elector(&ns, "aaaa").run_for_leader().await.unwrap();

        let e = elector(&ns, "bbbb");
        assert_eq!(e.run_for_leader().await.unwrap(), MasterState::Follower);
    }

    #[tokio::test]
    async fn test_winner_bootstraps_structure() {
        let ns = MemoryNamespace::new();
        elector(&ns, "aaaa").run_for_leader().await.unwrap();

        let probe = ns.session(Duration::from_secs(15));
        for path in crate::common::STRUCTURE_PATHS {
            assert!(probe.read(path).await.is_ok(), "missing {}", path);
        }
    }
}
