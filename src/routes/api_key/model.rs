use serde::{Deserialize, Serialize};

use crate::database::models::ApiKey;

pub const MAX_API_KEYS: i64 = 3;
pub const MAX_KEY_NAME_LEN: usize = 50;

#[derive(Debug, Deserialize)]
pub struct CreateApiKeyRequest {
    pub name: String,
}

/// Returned once, at creation; only the hash is stored.
#[derive(Debug, Serialize)]
pub struct CreatedApiKey {
    #[serde(flatten)]
    pub key: ApiKey,
    pub secret: String,
}
