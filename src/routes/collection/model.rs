use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 50;

const VISIBILITIES: [&str; 3] = ["private", "public", "protected"];

#[derive(Debug, Deserialize)]
pub struct CreateCollectionRequest {
    pub title: String,
    pub description: Option<String>,
    pub visibility: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameCollectionRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub visibility: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCollectionsRequest {
    pub collection_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCollectionsResponse {
    pub top_collections: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PublicCollectionsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PublicCollectionsQuery {
    /// `(limit, offset)` after bounds checks.
    pub fn page(&self) -> Result<(i64, i64), AppError> {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(AppError::Validation(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        let offset = self.offset.unwrap_or(0);
        if offset < 0 {
            return Err(AppError::Validation("offset must not be negative".to_string()));
        }
        Ok((limit, offset))
    }
}

pub fn parse_visibility(raw: &str) -> Result<String, AppError> {
    let visibility = raw.trim().to_ascii_lowercase();
    if VISIBILITIES.contains(&visibility.as_str()) {
        Ok(visibility)
    } else {
        Err(AppError::Validation(
            "Visibility must be one of private, public or protected".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_bounds() {
        let query = PublicCollectionsQuery { limit: None, offset: None };
        assert_eq!(query.page().unwrap(), (20, 0));

        let query = PublicCollectionsQuery { limit: Some(51), offset: None };
        assert!(query.page().is_err());

        let query = PublicCollectionsQuery { limit: Some(10), offset: Some(-1) };
        assert!(query.page().is_err());
    }

    #[test]
    fn visibility_values() {
        assert_eq!(parse_visibility("Public").unwrap(), "public");
        assert!(parse_visibility("friends").is_err());
    }
}
