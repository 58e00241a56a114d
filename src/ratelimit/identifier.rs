use axum::http::HeaderMap;

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";

/// Derives the rate-limit identifier for a caller.
///
/// Authenticated callers are keyed by `user:<id>`. Anonymous callers are keyed
/// by the raw client address: the first `x-forwarded-for` entry, then
/// `x-real-ip`, then the literal `unknown`.
pub fn resolve_identifier(user_id: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(id) = user_id.filter(|id| !id.is_empty()) {
        return format!("user:{}", id);
    }

    client_address(headers)
}

pub fn client_address(headers: &HeaderMap) -> String {
    headers
        .get(FORWARDED_FOR)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| {
            headers
                .get(REAL_IP)
                .and_then(|h| h.to_str().ok())
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
        })
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn user_id_wins_over_headers() {
        let h = headers(&[(FORWARDED_FOR, "10.0.0.1")]);
        assert_eq!(resolve_identifier(Some("abc"), &h), "user:abc");
        assert_eq!(resolve_identifier(Some("abc"), &h), "user:abc");
    }

    #[test]
    fn first_forwarded_address_is_used() {
        let h = headers(&[
            (FORWARDED_FOR, " 203.0.113.7 , 10.0.0.1"),
            (REAL_IP, "198.51.100.2"),
        ]);
        assert_eq!(resolve_identifier(None, &h), "203.0.113.7");
    }

    #[test]
    fn falls_back_to_real_ip_then_unknown() {
        let h = headers(&[(REAL_IP, "198.51.100.2")]);
        assert_eq!(resolve_identifier(None, &h), "198.51.100.2");
        assert_eq!(resolve_identifier(None, &HeaderMap::new()), "unknown");
    }

    #[test]
    fn empty_user_id_is_anonymous() {
        let h = headers(&[(REAL_IP, "198.51.100.2")]);
        assert_eq!(resolve_identifier(Some(""), &h), "198.51.100.2");
    }
}
