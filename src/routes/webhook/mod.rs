mod handler;
mod model;

pub use handler::billing_webhook;
