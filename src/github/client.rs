use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::json;

const USER_AGENT: &str = "cur8t-backend";
const ACCEPT: &str = "application/vnd.github+json";

#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    #[error("github request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("github returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed github response: {0}")]
    Decode(String),
}

/// Target repository and the credential used to reach it.
#[derive(Debug, Clone, Copy)]
pub struct Repo<'a> {
    pub token: &'a str,
    pub owner: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub content: String,
    pub sha: String,
}

#[async_trait]
pub trait GithubApi: Send + Sync {
    /// Login of the account owning `token`.
    async fn authenticated_login(&self, token: &str) -> Result<String, GithubError>;

    /// Creates the repository as private when it does not exist yet.
    async fn ensure_repo(&self, repo: Repo<'_>) -> Result<(), GithubError>;

    async fn file_content(&self, repo: Repo<'_>, path: &str) -> Result<Option<RemoteFile>, GithubError>;

    /// Creates or replaces a file; `sha` must name the current blob when
    /// replacing.
    async fn put_file(
        &self,
        repo: Repo<'_>,
        path: &str,
        content: &str,
        sha: Option<&str>,
        message: &str,
    ) -> Result<(), GithubError>;
}

/// GitHub REST v3 client.
#[derive(Clone)]
pub struct ReqwestGithub {
    client: Client,
    api_base: String,
}

#[derive(Deserialize)]
struct LoginResponse {
    login: String,
}

#[derive(Deserialize)]
struct ContentResponse {
    content: Option<String>,
    sha: String,
}

impl ReqwestGithub {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn request(&self, builder: RequestBuilder, token: &str) -> RequestBuilder {
        builder
            .bearer_auth(token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, ACCEPT)
    }

    async fn fail(response: reqwest::Response) -> GithubError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        GithubError::Status { status, message }
    }
}

#[async_trait]
impl GithubApi for ReqwestGithub {
    async fn authenticated_login(&self, token: &str) -> Result<String, GithubError> {
        let url = format!("{}/user", self.api_base);
        let response = self.request(self.client.get(url), token).send().await?;
        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }
        Ok(response.json::<LoginResponse>().await?.login)
    }

    async fn ensure_repo(&self, repo: Repo<'_>) -> Result<(), GithubError> {
        let url = format!("{}/repos/{}/{}", self.api_base, repo.owner, repo.name);
        let response = self.request(self.client.get(url), repo.token).send().await?;
        match response.status() {
            status if status.is_success() => return Ok(()),
            StatusCode::NOT_FOUND => {}
            _ => return Err(Self::fail(response).await),
        }

        tracing::info!("Creating repository {}/{}", repo.owner, repo.name);
        let url = format!("{}/user/repos", self.api_base);
        let body = json!({
            "name": repo.name,
            "description": "Collection of bookmarked links synced from Cur8t",
            "private": true,
            "auto_init": true,
        });
        let response = self
            .request(self.client.post(url), repo.token)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }
        Ok(())
    }

    async fn file_content(&self, repo: Repo<'_>, path: &str) -> Result<Option<RemoteFile>, GithubError> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, repo.owner, repo.name, path
        );
        let response = self.request(self.client.get(url), repo.token).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }

        let body = response.json::<ContentResponse>().await?;
        let encoded: String = body
            .content
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| GithubError::Decode(e.to_string()))?;
        let content = String::from_utf8(bytes).map_err(|e| GithubError::Decode(e.to_string()))?;

        Ok(Some(RemoteFile {
            content,
            sha: body.sha,
        }))
    }

    async fn put_file(
        &self,
        repo: Repo<'_>,
        path: &str,
        content: &str,
        sha: Option<&str>,
        message: &str,
    ) -> Result<(), GithubError> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, repo.owner, repo.name, path
        );
        let mut body = json!({
            "message": message,
            "content": STANDARD.encode(content),
        });
        if let Some(sha) = sha {
            body["sha"] = json!(sha);
        }

        let response = self
            .request(self.client.put(url), repo.token)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }
        Ok(())
    }
}
