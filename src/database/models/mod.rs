pub mod api_key;
pub mod collection;
pub mod favorite;
pub mod github;
pub mod link;
pub mod plan;
pub mod user;

pub use api_key::ApiKey;
pub use collection::{Collection, NewCollection};
pub use favorite::Favorite;
pub use github::GithubSettings;
pub use link::{Link, NewLink};
pub use plan::{Plan, Subscription, SubscriptionUpsert};
pub use user::User;
