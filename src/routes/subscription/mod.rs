mod handler;

pub use handler::get_subscription_status;
