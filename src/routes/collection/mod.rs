mod handler;
mod model;

pub use handler::{
    change_visibility, create_collection, delete_collection, get_collection, list_collections,
    list_public_collections, rename_collection, update_top_collections,
};
