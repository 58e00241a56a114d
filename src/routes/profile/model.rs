use serde::Serialize;

use crate::database::models::{Collection, User};

/// Public face of a user. Never carries email or credentials.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub name: String,
    pub username: Option<String>,
    pub total_public_collections: usize,
    pub collections: Vec<Collection>,
}

impl PublicProfile {
    pub fn new(user: User, collections: Vec<Collection>) -> Self {
        Self {
            name: user.name,
            username: user.username,
            total_public_collections: collections.len(),
            collections,
        }
    }
}
