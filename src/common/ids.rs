//! Server identities and timestamps

use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

/// Generate a process-lifetime server id (random 32-bit hex).
///
/// Stable for as long as the process lives; a restarted process gets
/// a fresh identity and thus a fresh set of ephemeral nodes.
pub fn new_server_id() -> String {
    format!("{:x}", rand::thread_rng().gen::<u32>())
}

/// Get current Unix timestamp (milliseconds)
pub fn timestamp_now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}
