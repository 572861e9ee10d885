//! Common utilities and types shared across taskherd

pub mod config;
pub mod error;
pub mod ids;
pub mod layout;

pub use config::Config;
pub use error::{Error, Result};
pub use ids::{new_server_id, timestamp_now_millis};
pub use layout::{
    worker_path, ASSIGN_PATH, MASTER_PATH, STATUS_PATH, STRUCTURE_PATHS, TASKS_PATH, TASK_PREFIX,
    WORKERS_PATH, WORKER_PREFIX,
};
