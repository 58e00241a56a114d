//! Row types, repository ports with their Postgres implementation, and an
//! in-memory implementation of the same ports.

use sqlx::PgPool;

pub mod memory;
pub mod models;
pub mod repositories;
pub mod seed;

pub use memory::MemoryStore;
pub use repositories::{
    ApiKeyRepository, BillingRepository, CollectionRepository, FavoriteRepository,
    GithubRepository, LinkRepository, PlanRepository, UserRepository,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(sqlx::Error),
    #[error("{0}")]
    Conflict(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            _ => StoreError::Database(e),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Everything the handlers need from persistence.
pub trait Store:
    UserRepository
    + CollectionRepository
    + LinkRepository
    + FavoriteRepository
    + ApiKeyRepository
    + PlanRepository
    + BillingRepository
    + GithubRepository
{
}

impl<T> Store for T where
    T: UserRepository
        + CollectionRepository
        + LinkRepository
        + FavoriteRepository
        + ApiKeyRepository
        + PlanRepository
        + BillingRepository
        + GithubRepository
{
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pub(crate) pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
