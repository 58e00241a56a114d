use crate::cache::keys::window_key;

/// Counter keys for the current and previous fixed sub-window of one
/// identifier under one limiter. The first window has no predecessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowKeys {
    pub current: String,
    pub previous: Option<String>,
    pub window_index: u64,
}

impl WindowKeys {
    pub fn new(prefix: &str, identifier: &str, now_ms: u64, window_ms: u64) -> Self {
        let window_index = now_ms / window_ms.max(1);
        Self {
            current: window_key(prefix, identifier, window_index),
            previous: window_index
                .checked_sub(1)
                .map(|index| window_key(prefix, identifier, index)),
            window_index,
        }
    }

    /// Unix milliseconds at which the current sub-window ends.
    pub fn reset_at(&self, window_ms: u64) -> u64 {
        (self.window_index + 1).saturating_mul(window_ms)
    }
}

/// Share of the previous sub-window that still overlaps the sliding window.
pub fn weighted_previous(previous: u64, now_ms: u64, window_ms: u64) -> u64 {
    let window_ms = window_ms.max(1);
    let elapsed = (now_ms % window_ms) as f64 / window_ms as f64;
    ((1.0 - elapsed) * previous as f64).floor() as u64
}

/// Pure form of the decision both counter stores apply.
///
/// `None` means rejected, `Some(remaining)` means the hit was recorded.
pub fn apply_hit(current: u64, previous: u64, capacity: u32, now_ms: u64, window_ms: u64) -> Option<i64> {
    let weighted = weighted_previous(previous, now_ms, window_ms);
    if weighted + current >= u64::from(capacity) {
        return None;
    }
    Some(i64::from(capacity) - (current + 1 + weighted) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_roll_with_the_window() {
        let keys = WindowKeys::new("p", "id", 125_000, 60_000);
        assert_eq!(keys.window_index, 2);
        assert_eq!(keys.current, "p:id:2");
        assert_eq!(keys.previous.as_deref(), Some("p:id:1"));
        assert_eq!(keys.reset_at(60_000), 180_000);
    }

    #[test]
    fn first_window_has_no_previous_key() {
        let keys = WindowKeys::new("p", "id", 0, 60_000);
        assert_eq!(keys.current, "p:id:0");
        assert_eq!(keys.previous, None);
        assert_eq!(keys.reset_at(60_000), 60_000);
    }

    #[test]
    fn previous_window_decays_linearly() {
        assert_eq!(weighted_previous(10, 0, 1_000), 10);
        assert_eq!(weighted_previous(10, 500, 1_000), 5);
        assert_eq!(weighted_previous(10, 999, 1_000), 0);
    }

    #[test]
    fn hit_rejects_at_capacity() {
        assert_eq!(apply_hit(0, 0, 3, 0, 1_000), Some(2));
        assert_eq!(apply_hit(2, 0, 3, 0, 1_000), Some(0));
        assert_eq!(apply_hit(3, 0, 3, 0, 1_000), None);
        assert_eq!(apply_hit(1, 4, 3, 500, 1_000), None);
    }
}
