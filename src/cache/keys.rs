//! Key layout shared by every process talking to the store.

pub fn window_key(prefix: &str, identifier: &str, window_index: u64) -> String {
    format!("{}:{}:{}", prefix, identifier, window_index)
}

pub fn subscription_snapshot_key(user_id: &str) -> String {
    format!("subsnap:{}", user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_scoped() {
        assert_eq!(
            window_key("ratelimit:create-link", "user:u1", 42),
            "ratelimit:create-link:user:u1:42"
        );
        assert_eq!(subscription_snapshot_key("u1"), "subsnap:u1");
    }
}
