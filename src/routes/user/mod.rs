mod handler;
mod model;

pub use handler::{get_usage, get_user_info, update_username};
