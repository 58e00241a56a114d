use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GithubSettings {
    pub user_id: String,
    pub repo_name: Option<String>,
    #[serde(skip_serializing)]
    pub github_access_token: String,
}
