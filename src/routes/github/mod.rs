mod handler;
mod model;

pub use handler::{disconnect_github, get_github_status, sync_github};
