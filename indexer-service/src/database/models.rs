use serde::{Deserialize, Serialize};

/// One row of the key-value table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct KvEntry {
    pub key: String,
    pub value: String,  // JSON document
    pub expires_at: i64, // unix seconds
    pub updated_at: String, // ISO8601 UTC timestamp
}
