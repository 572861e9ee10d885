//! Fixed namespace layout
//!
//! Every persistent entity in the system lives under one of a small
//! set of well-known paths:
//! - `/master` — the elected master's ephemeral record
//! - `/workers/worker-<id>` — one ephemeral record per live worker
//! - `/tasks/task-<seq>` — the sequential task queue
//! - `/assign`, `/status` — reserved parents for task assignment

/// The master record: ephemeral, exclusive, payload = server id.
pub const MASTER_PATH: &str = "/master";

/// Parent of all worker presence records.
pub const WORKERS_PATH: &str = "/workers";

/// Parent of the task queue.
pub const TASKS_PATH: &str = "/tasks";

/// Reserved for task assignment (structure only, no assignment logic).
pub const ASSIGN_PATH: &str = "/assign";

/// Reserved for assignment status reporting.
pub const STATUS_PATH: &str = "/status";

/// Paths the elected master bootstraps, in creation order.
pub const STRUCTURE_PATHS: [&str; 4] = [ASSIGN_PATH, STATUS_PATH, TASKS_PATH, WORKERS_PATH];

/// Sequential-create prefix for task records.
pub const TASK_PREFIX: &str = "/tasks/task-";

/// Name prefix for worker records under [`WORKERS_PATH`].
pub const WORKER_PREFIX: &str = "worker-";

/// Deterministic presence path for a worker identity.
pub fn worker_path(server_id: &str) -> String {
    format!("{}/{}{}", WORKERS_PATH, WORKER_PREFIX, server_id)
}
