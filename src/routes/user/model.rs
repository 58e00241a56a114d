use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct UpdateUsernameRequest {
    pub username: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Meter {
    pub used: i64,
    pub limit: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub plan: String,
    pub plan_name: String,
    pub collections: Meter,
    pub total_links: Meter,
    pub favorites: Meter,
    pub top_collections: Meter,
    pub api_keys: Meter,
}

/// 3 to 30 characters of ASCII letters, digits or underscores.
pub fn validate_username(raw: &str) -> Result<String, AppError> {
    let username = raw.trim();
    if !(3..=30).contains(&username.len()) {
        return Err(AppError::Validation(
            "Username must be between 3 and 30 characters".to_string(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AppError::Validation(
            "Username can only contain letters, numbers and underscores".to_string(),
        ));
    }
    Ok(username.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert_eq!(validate_username(" ada_99 ").unwrap(), "ada_99");
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(31)).is_err());
        assert!(validate_username("ada-lovelace").is_err());
        assert!(validate_username("adá").is_err());
    }
}
