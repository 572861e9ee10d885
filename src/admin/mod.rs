//! Read-only administrative view of the cluster
//!
//! Snapshots the master identity, worker statuses and pending task
//! names. Performs no writes and degrades gracefully: an absent
//! master record reports "No master" and a cluster whose structure
//! was never bootstrapped simply reads as empty.

use crate::common::{Error, Result, MASTER_PATH, TASKS_PATH, WORKERS_PATH};
use crate::session::Session;
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

/// Identity and tenure of the current master
#[derive(Debug, Clone, Serialize)]
pub struct MasterInfo {
    pub server_id: String,
    pub since: DateTime<Utc>,
}

/// One worker's presence record
#[derive(Debug, Clone, Serialize)]
pub struct WorkerInfo {
    pub name: String,
    pub status: String,
}

/// Point-in-time snapshot of cluster state
#[derive(Debug, Clone, Serialize)]
pub struct ClusterState {
    pub master: Option<MasterInfo>,
    pub workers: Vec<WorkerInfo>,
    pub tasks: Vec<String>,
}

/// Read the current cluster state.
pub async fn cluster_state(session: &dyn Session) -> Result<ClusterState> {
    let master = match session.read(MASTER_PATH).await {
        Ok((payload, stat)) => Some(MasterInfo {
            server_id: String::from_utf8_lossy(&payload).into_owned(),
            since: Utc
                .timestamp_millis_opt(stat.ctime_ms)
                .single()
                .unwrap_or_else(Utc::now),
        }),
        Err(Error::NoNode(_)) => None,
        Err(e) => return Err(e),
    };

    let mut workers = Vec::new();
    for name in children_or_empty(session, WORKERS_PATH).await? {
        let path = format!("{}/{}", WORKERS_PATH, name);
        match session.read(&path).await {
            Ok((payload, _)) => workers.push(WorkerInfo {
                name,
                status: String::from_utf8_lossy(&payload).into_owned(),
            }),
            // The ephemeral vanished between list and read.
            Err(Error::NoNode(_)) => continue,
            Err(e) => return Err(e),
        }
    }

    let tasks = children_or_empty(session, TASKS_PATH).await?;

    Ok(ClusterState {
        master,
        workers,
        tasks,
    })
}

async fn children_or_empty(session: &dyn Session, path: &str) -> Result<Vec<String>> {
    match session.children(path).await {
        Ok(names) => Ok(names),
        // Structure not bootstrapped yet; an empty cluster, not an error.
        Err(Error::NoNode(_)) => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

impl std::fmt::Display for ClusterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.master {
            Some(m) => writeln!(
                f,
                "Master: {} since {}",
                m.server_id,
                m.since.format("%Y-%m-%d %H:%M:%S UTC")
            )?,
            None => writeln!(f, "No master")?,
        }
        writeln!(f, "Workers:")?;
        for w in &self.workers {
            writeln!(f, "\t{}: {}", w.name, w.status)?;
        }
        writeln!(f, "Tasks:")?;
        for t in &self.tasks {
            writeln!(f, "\t{}", t)?;
        }
        Ok(())
    }
}
