use hmac::{Hmac, Mac};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const API_KEY_PREFIX: &str = "cur8t_api_";
const DISPLAY_PREFIX_LEN: usize = 14;

/// Session claims issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub exp: i64,
    pub iat: i64,
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;

    Ok(token_data.claims)
}

/// A fresh `cur8t_api_` key with 32 random bytes, hex encoded.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{}{}", API_KEY_PREFIX, hex::encode(bytes))
}

pub fn hash_api_key(pepper: &str, key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pepper.as_bytes());
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Leading characters shown in key listings.
pub fn api_key_display_prefix(key: &str) -> String {
    key.chars().take(DISPLAY_PREFIX_LEN).collect()
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Checks a hex HMAC-SHA256 signature of `body` in constant time.
pub fn verify_webhook_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    #[test]
    fn api_keys_have_prefix_and_64_hex_chars() {
        let key = generate_api_key();
        let body = key.strip_prefix(API_KEY_PREFIX).unwrap();
        assert_eq!(body.len(), 64);
        assert!(body.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, generate_api_key());
    }

    #[test]
    fn key_hash_depends_on_pepper() {
        let key = "cur8t_api_abc";
        assert_eq!(hash_api_key("p1", key), hash_api_key("p1", key));
        assert_ne!(hash_api_key("p1", key), hash_api_key("p2", key));
        assert_eq!(hash_api_key("p1", key).len(), 64);
    }

    #[test]
    fn webhook_signature_roundtrip() {
        let body = br#"{"meta":{"event_id":"evt_1"}}"#;
        let mut mac = Hmac::<Sha256>::new_from_slice(b"whsec").unwrap();
        mac.update(body);
        let signature = hex::encode(mac.finalize().into_bytes());

        assert!(verify_webhook_signature("whsec", body, &signature));
        assert!(!verify_webhook_signature("other", body, &signature));
        assert!(!verify_webhook_signature("whsec", body, "not-hex"));
        assert!(!verify_webhook_signature("", body, &signature));
    }

    #[test]
    fn tokens_signed_with_other_secret_are_rejected() {
        let claims = Claims {
            sub: "user_1".into(),
            exp: chrono::Utc::now().timestamp() + 600,
            iat: chrono::Utc::now().timestamp(),
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"s1")).unwrap();

        assert_eq!(verify_token(&token, "s1").unwrap().sub, "user_1");
        assert!(verify_token(&token, "s2").is_err());
    }
}
