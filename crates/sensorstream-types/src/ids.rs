//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every streaming session gets its own ID so log lines from concurrent
//! sessions can be told apart. IDs use UUID v7 (time-ordered), so they
//! sort in the order sessions were opened.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Unique identifier for one subscriber's streaming session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SessionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SessionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}
