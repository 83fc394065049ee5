use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A consumed or inspected OAuth-style state token's stored payload.
///
/// Grounded on `original_source/tests/state/test_manager.py`'s
/// `StateData` assertions (`state`, `created_at`, `expires_at`, `metadata`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateData {
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub metadata: Value,
}
