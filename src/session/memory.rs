//! In-process coordination backend
//!
//! A [`MemoryNamespace`] is a single shared node tree; every
//! [`MemorySession`] opened against it gets its own identity,
//! ephemeral ownership, lifecycle events and fault queue. All
//! operations serialize under one lock, which gives the
//! submission-order completion guarantee the protocol layer relies
//! on.
//!
//! Fault injection exists so tests can exercise the two halves of an
//! ambiguous failure: [`FaultKind::Drop`] fails an operation before
//! it applies, [`FaultKind::DropAck`] applies it and then loses the
//! acknowledgment.

use crate::common::{timestamp_now_millis, Error, Result};
use crate::session::{
    ChangeKind, Lifetime, Naming, NodeStat, Session, SessionEvent, WatchEvent, ANY_VERSION,
};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};

pub type SessionId = u64;

/// Operation selector for fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Any,
    Create,
    Read,
    Update,
    Children,
}

/// How an injected fault manifests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Connection drops before the operation applies
    Drop,
    /// Operation applies, acknowledgment is lost
    DropAck,
}

/// A one-shot fault consumed by the next matching operation
#[derive(Debug, Clone, Copy)]
pub struct Fault {
    pub op: OpKind,
    pub kind: FaultKind,
}

impl Fault {
    pub fn new(op: OpKind, kind: FaultKind) -> Self {
        Self { op, kind }
    }

    fn matches(&self, op: OpKind) -> bool {
        self.op == OpKind::Any || self.op == op
    }
}

struct NodeEntry {
    payload: Vec<u8>,
    version: i64,
    ctime_ms: i64,
    owner: Option<SessionId>,
}

#[derive(Default)]
struct State {
    nodes: BTreeMap<String, NodeEntry>,
    /// Sequential counters, keyed by parent path
    seqs: HashMap<String, u64>,
    watches: HashMap<String, Vec<oneshot::Sender<WatchEvent>>>,
    next_session: SessionId,
}

/// A shared in-process node tree.
pub struct MemoryNamespace {
    state: Mutex<State>,
}

static REGISTRY: Lazy<Mutex<HashMap<String, Arc<MemoryNamespace>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

impl MemoryNamespace {
    /// Create a fresh, private namespace.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State::default()),
        })
    }

    /// Attach to (or create) the process-local namespace of this name.
    pub fn shared(name: &str) -> Arc<Self> {
        let mut registry = REGISTRY.lock().unwrap();
        registry
            .entry(name.to_string())
            .or_insert_with(MemoryNamespace::new)
            .clone()
    }

    /// Open a session against this namespace.
    pub fn session(self: &Arc<Self>, timeout: Duration) -> Arc<MemorySession> {
        let id = {
            let mut state = self.state.lock().unwrap();
            let id = state.next_session;
            state.next_session += 1;
            id
        };
        let (events, _) = broadcast::channel(16);
        Arc::new(MemorySession {
            ns: self.clone(),
            id,
            timeout,
            alive: AtomicBool::new(true),
            events,
            faults: Mutex::new(VecDeque::new()),
        })
    }

    fn fire_watches(state: &mut State, path: &str, kind: ChangeKind) {
        if let Some(senders) = state.watches.remove(path) {
            for tx in senders {
                // Receiver may be gone; that is its problem.
                let _ = tx.send(WatchEvent {
                    path: path.to_string(),
                    kind,
                });
            }
        }
    }
}

/// One client's session with a [`MemoryNamespace`].
pub struct MemorySession {
    ns: Arc<MemoryNamespace>,
    id: SessionId,
    #[allow(dead_code)]
    timeout: Duration,
    alive: AtomicBool,
    events: broadcast::Sender<SessionEvent>,
    faults: Mutex<VecDeque<Fault>>,
}

impl MemorySession {
    /// Session identity within the namespace.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Queue a one-shot fault for the next matching operation.
    pub fn inject_fault(&self, fault: Fault) {
        self.faults.lock().unwrap().push_back(fault);
    }

    /// End this session as if its liveness window lapsed: every
    /// ephemeral it owns is deleted, watches on those paths fire,
    /// and the session becomes unusable.
    pub fn expire(&self) {
        if !self.alive.swap(false, Ordering::SeqCst) {
            return;
        }
        let mut state = self.ns.state.lock().unwrap();
        let owned: Vec<String> = state
            .nodes
            .iter()
            .filter(|(_, e)| e.owner == Some(self.id))
            .map(|(p, _)| p.clone())
            .collect();
        for path in owned {
            state.nodes.remove(&path);
            MemoryNamespace::fire_watches(&mut state, &path, ChangeKind::Deleted);
        }
        drop(state);
        let _ = self.events.send(SessionEvent::Expired);
        tracing::debug!(session = self.id, "session expired");
    }

    fn check_alive(&self) -> Result<()> {
        if self.alive.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::SessionExpired)
        }
    }

    fn take_fault(&self, op: OpKind) -> Option<FaultKind> {
        let mut faults = self.faults.lock().unwrap();
        let pos = faults.iter().position(|f| f.matches(op))?;
        faults.remove(pos).map(|f| f.kind)
    }

    fn loss(op: &str, path: &str) -> Error {
        Error::ConnectionLoss(format!("{} {}", op, path))
    }
}

fn validate_path(path: &str) -> Result<()> {
    if !path.starts_with('/') || path.len() < 2 || path.ends_with('/') || path.contains("//") {
        return Err(Error::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Parent path of `path`; `""` means the root.
fn parent_of(path: &str) -> &str {
    let idx = path.rfind('/').unwrap_or(0);
    &path[..idx]
}

#[async_trait]
impl Session for MemorySession {
    async fn create(
        &self,
        path: &str,
        payload: &[u8],
        lifetime: Lifetime,
        naming: Naming,
    ) -> Result<String> {
        self.check_alive()?;
        validate_path(path)?;
        let fault = self.take_fault(OpKind::Create);
        if fault == Some(FaultKind::Drop) {
            return Err(Self::loss("create", path));
        }

        let result = {
            let mut state = self.ns.state.lock().unwrap();
            let parent = parent_of(path).to_string();
            if !parent.is_empty() && !state.nodes.contains_key(&parent) {
                return Err(Error::NoNode(parent));
            }
            let final_path = match naming {
                Naming::Fixed => path.to_string(),
                Naming::Sequential => {
                    let seq = state.seqs.entry(parent).or_insert(0);
                    let n = *seq;
                    *seq += 1;
                    format!("{}{:010}", path, n)
                }
            };
            if state.nodes.contains_key(&final_path) {
                return Err(Error::NodeExists(final_path));
            }
            let owner = match lifetime {
                Lifetime::Ephemeral => Some(self.id),
                Lifetime::Persistent => None,
            };
            state.nodes.insert(
                final_path.clone(),
                NodeEntry {
                    payload: payload.to_vec(),
                    version: 0,
                    ctime_ms: timestamp_now_millis(),
                    owner,
                },
            );
            MemoryNamespace::fire_watches(&mut state, &final_path, ChangeKind::Created);
            final_path
        };

        match fault {
            Some(FaultKind::DropAck) => Err(Self::loss("create", path)),
            _ => Ok(result),
        }
    }

    async fn read(&self, path: &str) -> Result<(Vec<u8>, NodeStat)> {
        self.check_alive()?;
        validate_path(path)?;
        if self.take_fault(OpKind::Read).is_some() {
            // Reads have no server-side effect; both fault kinds
            // collapse to a lost response.
            return Err(Self::loss("read", path));
        }
        let state = self.ns.state.lock().unwrap();
        let entry = state
            .nodes
            .get(path)
            .ok_or_else(|| Error::NoNode(path.to_string()))?;
        Ok((
            entry.payload.clone(),
            NodeStat {
                version: entry.version,
                ctime_ms: entry.ctime_ms,
            },
        ))
    }

    async fn update(&self, path: &str, payload: &[u8], expected_version: i64) -> Result<i64> {
        self.check_alive()?;
        validate_path(path)?;
        let fault = self.take_fault(OpKind::Update);
        if fault == Some(FaultKind::Drop) {
            return Err(Self::loss("update", path));
        }

        let version = {
            let mut state = self.ns.state.lock().unwrap();
            let entry = state
                .nodes
                .get_mut(path)
                .ok_or_else(|| Error::NoNode(path.to_string()))?;
            if expected_version != ANY_VERSION && entry.version != expected_version {
                return Err(Error::BadVersion {
                    path: path.to_string(),
                    expected: expected_version,
                    actual: entry.version,
                });
            }
            entry.payload = payload.to_vec();
            entry.version += 1;
            let version = entry.version;
            MemoryNamespace::fire_watches(&mut state, path, ChangeKind::DataChanged);
            version
        };

        match fault {
            Some(FaultKind::DropAck) => Err(Self::loss("update", path)),
            _ => Ok(version),
        }
    }

    async fn children(&self, path: &str) -> Result<Vec<String>> {
        self.check_alive()?;
        validate_path(path)?;
        if self.take_fault(OpKind::Children).is_some() {
            return Err(Self::loss("children", path));
        }
        let state = self.ns.state.lock().unwrap();
        if !state.nodes.contains_key(path) {
            return Err(Error::NoNode(path.to_string()));
        }
        let prefix = format!("{}/", path);
        let names = state
            .nodes
            .range(prefix.clone()..)
            .take_while(|(p, _)| p.starts_with(&prefix))
            .filter(|(p, _)| !p[prefix.len()..].contains('/'))
            .map(|(p, _)| p[prefix.len()..].to_string())
            .collect();
        Ok(names)
    }

    async fn watch(&self, path: &str) -> Result<oneshot::Receiver<WatchEvent>> {
        self.check_alive()?;
        validate_path(path)?;
        let (tx, rx) = oneshot::channel();
        let mut state = self.ns.state.lock().unwrap();
        let senders = state.watches.entry(path.to_string()).or_default();
        // Abandoned watches on never-changing paths would otherwise
        // pile up for the namespace's lifetime.
        senders.retain(|tx| !tx.is_closed());
        senders.push(tx);
        Ok(rx)
    }

    fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
