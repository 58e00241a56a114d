use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubStatus {
    pub github_connected: bool,
    pub repo_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Disconnected {
    pub disconnected: bool,
}
