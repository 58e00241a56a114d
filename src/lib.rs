use std::sync::Arc;

use config::Config;
use database::Store;
use github::GithubApi;
use ratelimit::RateLimiter;
use subscription::SnapshotProvider;

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod github;
pub mod middleware;
pub mod ratelimit;
pub mod result;
pub mod routes;
pub mod subscription;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub limiter: Arc<RateLimiter>,
    pub snapshots: Arc<SnapshotProvider>,
    pub github: Arc<dyn GithubApi>,
}
