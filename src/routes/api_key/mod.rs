mod handler;
mod model;

pub use handler::{create_api_key, delete_api_key, list_api_keys};
pub use model::MAX_API_KEYS;
