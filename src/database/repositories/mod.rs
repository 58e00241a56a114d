pub mod api_key;
pub mod billing;
pub mod collection;
pub mod favorite;
pub mod github;
pub mod link;
pub mod plan;
pub mod user;

pub use api_key::ApiKeyRepository;
pub use billing::BillingRepository;
pub use collection::CollectionRepository;
pub use favorite::FavoriteRepository;
pub use github::GithubRepository;
pub use link::LinkRepository;
pub use plan::PlanRepository;
pub use user::UserRepository;
