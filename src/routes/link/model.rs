use serde::{Deserialize, Serialize};

use crate::database::models::Link;

pub const MAX_LINK_TITLE_LEN: usize = 200;

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    pub title: Option<String>,
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedLink {
    #[serde(flatten)]
    pub link: Link,
    /// Link count of the collection after the insert.
    pub collection_total_links: i32,
}
