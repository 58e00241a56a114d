use serde::Serialize;

use crate::database::models::{Collection, Link};

use super::client::{GithubApi, GithubError, Repo};
use super::markdown::{collection_file_name, render_collection};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub synced: usize,
    pub unchanged: usize,
    /// Titles of the collections that were written.
    pub collections: Vec<String>,
    pub message: String,
}

/// Writes every collection whose rendered markdown differs from the copy in
/// `repo_name`. Files already matching are left alone.
pub async fn sync_collections(
    api: &dyn GithubApi,
    token: &str,
    repo_name: &str,
    collections: &[(Collection, Vec<Link>)],
) -> Result<SyncReport, GithubError> {
    if collections.is_empty() {
        return Ok(SyncReport {
            synced: 0,
            unchanged: 0,
            collections: vec![],
            message: "No collections to sync".to_string(),
        });
    }

    let owner = api.authenticated_login(token).await?;
    let repo = Repo {
        token,
        owner: &owner,
        name: repo_name,
    };
    api.ensure_repo(repo).await?;

    let mut synced = Vec::new();
    let mut unchanged = 0;
    for (collection, links) in collections {
        let path = collection_file_name(&collection.title);
        let content = render_collection(collection, links);
        let remote = api.file_content(repo, &path).await?;

        if remote.as_ref().is_some_and(|file| file.content == content) {
            unchanged += 1;
            continue;
        }

        let message = format!("Sync collection {}", collection.title);
        api.put_file(
            repo,
            &path,
            &content,
            remote.as_ref().map(|file| file.sha.as_str()),
            &message,
        )
        .await?;
        synced.push(collection.title.clone());
    }

    let message = if synced.is_empty() {
        "All collections are already in sync".to_string()
    } else {
        format!("Successfully synced {} updated collections", synced.len())
    };
    tracing::info!("GitHub sync for {}: {}", owner, message);

    Ok(SyncReport {
        synced: synced.len(),
        unchanged,
        collections: synced,
        message,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    use super::*;
    use crate::github::RemoteFile;

    #[derive(Default)]
    struct FakeGithub {
        files: Mutex<HashMap<String, RemoteFile>>,
        created_repos: Mutex<Vec<String>>,
        writes: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl GithubApi for FakeGithub {
        async fn authenticated_login(&self, _token: &str) -> Result<String, GithubError> {
            Ok("ada".to_string())
        }

        async fn ensure_repo(&self, repo: Repo<'_>) -> Result<(), GithubError> {
            self.created_repos.lock().await.push(repo.name.to_string());
            Ok(())
        }

        async fn file_content(&self, _repo: Repo<'_>, path: &str) -> Result<Option<RemoteFile>, GithubError> {
            Ok(self.files.lock().await.get(path).cloned())
        }

        async fn put_file(
            &self,
            _repo: Repo<'_>,
            path: &str,
            content: &str,
            _sha: Option<&str>,
            _message: &str,
        ) -> Result<(), GithubError> {
            self.writes.lock().await.push(path.to_string());
            self.files.lock().await.insert(
                path.to_string(),
                RemoteFile {
                    content: content.to_string(),
                    sha: format!("sha-{}", path),
                },
            );
            Ok(())
        }
    }

    fn collection(title: &str) -> (Collection, Vec<Link>) {
        let now = Utc::now();
        let collection = Collection {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            user_id: "u1".into(),
            visibility: "private".into(),
            likes: 0,
            total_links: 0,
            created_at: now,
            updated_at: now,
        };
        (collection, vec![])
    }

    #[tokio::test]
    async fn only_changed_files_are_written() {
        let github = FakeGithub::default();
        let collections = vec![collection("Rust"), collection("Go Notes")];

        let first = sync_collections(&github, "t", "bookmarksCollection", &collections)
            .await
            .unwrap();
        assert_eq!(first.synced, 2);
        assert_eq!(first.unchanged, 0);

        let second = sync_collections(&github, "t", "bookmarksCollection", &collections)
            .await
            .unwrap();
        assert_eq!(second.synced, 0);
        assert_eq!(second.unchanged, 2);
        assert_eq!(second.message, "All collections are already in sync");

        assert_eq!(*github.writes.lock().await, vec!["rust.md", "go-notes.md"]);
    }

    #[tokio::test]
    async fn nothing_to_sync_skips_github() {
        let github = FakeGithub::default();
        let report = sync_collections(&github, "t", "bookmarksCollection", &[])
            .await
            .unwrap();

        assert_eq!(report.message, "No collections to sync");
        assert!(github.created_repos.lock().await.is_empty());
    }
}
