//! Mirrors a user's collections into a GitHub repository as markdown files.

mod client;
mod markdown;
mod sync;

pub use client::{GithubApi, GithubError, RemoteFile, Repo, ReqwestGithub};
pub use markdown::{collection_file_name, render_collection};
pub use sync::{SyncReport, sync_collections};
