//! Master role: leader election and structure bootstrap
//!
//! The elector decides whether this process is the unique master; the
//! winner then bootstraps the shared namespace structure. Both are
//! built around one rule: never assume an ambiguously failed write
//! did not commit.

pub mod bootstrap;
pub mod elector;

pub use bootstrap::ensure_structure;
pub use elector::{Elector, MasterState};
