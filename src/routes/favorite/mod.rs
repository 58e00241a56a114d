mod handler;
mod model;

pub use handler::{create_favorite, delete_favorite, list_favorites, update_favorite};
