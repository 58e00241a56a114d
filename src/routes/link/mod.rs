mod handler;
mod model;

pub use handler::{create_link, delete_link, list_links};
