use serde::Deserialize;

pub const MAX_FAVORITE_TITLE_LEN: usize = 200;

#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub title: String,
    pub url: String,
}
