use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    pub github_connected: bool,
    pub api_keys_count: i32,
    pub total_collections: i32,
    /// Pinned collection ids, in display order.
    pub top_collections: Vec<String>,
}
