//! # taskherd
//!
//! Master-worker cluster coordination on top of a ZooKeeper-style
//! coordination service:
//! - Leader election that stays correct under connection loss
//! - Idempotent bootstrap of the shared namespace structure
//! - Ephemeral worker presence with last-write-wins status updates
//! - At-least-once task submission to a sequential queue
//!
//! ## Architecture
//!
//! ```text
//!            ┌──────────────────────────────┐
//!            │    Coordination service      │
//!            │  (versioned node namespace,  │
//!            │   ephemerals, watches)       │
//!            └─────┬────────┬────────┬──────┘
//!                  │        │        │
//!        ┌─────────▼──┐ ┌───▼────┐ ┌─▼────────────┐
//!        │ Master     │ │ Worker │ │ CLI          │
//!        │ (elector + │ │ (reg + │ │ (submit +    │
//!        │ bootstrap) │ │ status)│ │ admin view)  │
//!        └────────────┘ └────────┘ └──────────────┘
//! ```
//!
//! The service itself is consumed behind [`session::Session`]; the
//! in-process backend in [`session::memory`] implements the full
//! contract for tests and single-process use.
//!
//! ## Usage
//!
//! ### Run for mastership
//! ```bash
//! taskherd-master --endpoint mem://demo
//! ```
//!
//! ### Register a worker
//! ```bash
//! taskherd-worker --endpoint mem://demo
//! ```
//!
//! ### Submit a task and inspect the cluster
//! ```bash
//! taskherd submit "echo hi" --endpoint mem://demo
//! taskherd status --json --endpoint mem://demo
//! ```

pub mod admin;
pub mod common;
pub mod master;
pub mod session;
pub mod tasks;
pub mod worker;

// Re-export commonly used types
pub use common::{Config, Error, Result};
pub use master::{Elector, MasterState};
pub use tasks::Submitter;
pub use worker::Registrar;

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
