mod ids;
pub use ids::{AccountId, TaskId, WorkerId};

mod env;
pub use env::Env;

/// Unix timestamp in milliseconds.
///
/// Used for assignment change markers and heartbeat times handed out by the control plane.
pub type Timestamp = i64;

/// Timeout value in milliseconds.
pub type TimeoutMs = u64;
