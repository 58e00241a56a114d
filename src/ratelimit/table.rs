use std::collections::HashMap;
use std::time::Duration;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;

/// Every limited action in the service. Each maps to exactly one limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimiterName {
    Username,
    GetUserInfo,
    GetUsage,
    ProfileRead,
    SubscriptionStatus,
    CreateCollection,
    DeleteCollection,
    GetCollections,
    GetCollection,
    ChangeCollectionName,
    ChangeCollectionVisibility,
    FetchPublicCollections,
    UpdateTopCollections,
    CreateLink,
    DeleteLink,
    GetLinks,
    CreateFavorite,
    UpdateFavorite,
    DeleteFavorite,
    GetFavorites,
    CreateApiKey,
    DeleteApiKey,
    GetApiKeys,
    GithubStatus,
    GithubSync,
    GithubDisconnect,
    BillingWebhook,
}

impl LimiterName {
    pub const ALL: [LimiterName; 27] = [
        LimiterName::Username,
        LimiterName::GetUserInfo,
        LimiterName::GetUsage,
        LimiterName::ProfileRead,
        LimiterName::SubscriptionStatus,
        LimiterName::CreateCollection,
        LimiterName::DeleteCollection,
        LimiterName::GetCollections,
        LimiterName::GetCollection,
        LimiterName::ChangeCollectionName,
        LimiterName::ChangeCollectionVisibility,
        LimiterName::FetchPublicCollections,
        LimiterName::UpdateTopCollections,
        LimiterName::CreateLink,
        LimiterName::DeleteLink,
        LimiterName::GetLinks,
        LimiterName::CreateFavorite,
        LimiterName::UpdateFavorite,
        LimiterName::DeleteFavorite,
        LimiterName::GetFavorites,
        LimiterName::CreateApiKey,
        LimiterName::DeleteApiKey,
        LimiterName::GetApiKeys,
        LimiterName::GithubStatus,
        LimiterName::GithubSync,
        LimiterName::GithubDisconnect,
        LimiterName::BillingWebhook,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LimiterName::Username => "username",
            LimiterName::GetUserInfo => "get-user-info",
            LimiterName::GetUsage => "get-usage",
            LimiterName::ProfileRead => "profile-read",
            LimiterName::SubscriptionStatus => "subscription-status",
            LimiterName::CreateCollection => "create-collection",
            LimiterName::DeleteCollection => "delete-collection",
            LimiterName::GetCollections => "get-collections",
            LimiterName::GetCollection => "get-collection",
            LimiterName::ChangeCollectionName => "change-collection-name",
            LimiterName::ChangeCollectionVisibility => "change-collection-visibility",
            LimiterName::FetchPublicCollections => "fetch-public-collections",
            LimiterName::UpdateTopCollections => "update-top-collections",
            LimiterName::CreateLink => "create-link",
            LimiterName::DeleteLink => "delete-link",
            LimiterName::GetLinks => "get-links",
            LimiterName::CreateFavorite => "create-favorite",
            LimiterName::UpdateFavorite => "update-favorite",
            LimiterName::DeleteFavorite => "delete-favorite",
            LimiterName::GetFavorites => "get-favorites",
            LimiterName::CreateApiKey => "create-api-key",
            LimiterName::DeleteApiKey => "delete-api-key",
            LimiterName::GetApiKeys => "get-api-keys",
            LimiterName::GithubStatus => "github-status",
            LimiterName::GithubSync => "github-sync",
            LimiterName::GithubDisconnect => "github-disconnect",
            LimiterName::BillingWebhook => "billing-webhook",
        }
    }

    /// Capacity and window in seconds.
    fn budget(self) -> (u32, u64) {
        match self {
            LimiterName::Username => (5, 15 * MINUTE),
            LimiterName::GetUserInfo => (1000, HOUR),
            LimiterName::GetUsage => (1000, HOUR),
            LimiterName::ProfileRead => (500, HOUR),
            LimiterName::SubscriptionStatus => (100, HOUR),
            LimiterName::CreateCollection => (10, MINUTE),
            LimiterName::DeleteCollection => (10, MINUTE),
            LimiterName::GetCollections => (100, MINUTE),
            LimiterName::GetCollection => (200, MINUTE),
            LimiterName::ChangeCollectionName => (20, MINUTE),
            LimiterName::ChangeCollectionVisibility => (20, MINUTE),
            LimiterName::FetchPublicCollections => (1000, HOUR),
            LimiterName::UpdateTopCollections => (20, MINUTE),
            LimiterName::CreateLink => (30, MINUTE),
            LimiterName::DeleteLink => (30, MINUTE),
            LimiterName::GetLinks => (200, MINUTE),
            LimiterName::CreateFavorite => (20, MINUTE),
            LimiterName::UpdateFavorite => (20, MINUTE),
            LimiterName::DeleteFavorite => (20, MINUTE),
            LimiterName::GetFavorites => (100, MINUTE),
            LimiterName::CreateApiKey => (3, 15 * MINUTE),
            LimiterName::DeleteApiKey => (3, 15 * MINUTE),
            LimiterName::GetApiKeys => (50, HOUR),
            LimiterName::GithubStatus => (100, HOUR),
            LimiterName::GithubSync => (5, HOUR),
            LimiterName::GithubDisconnect => (3, 15 * MINUTE),
            LimiterName::BillingWebhook => (300, MINUTE),
        }
    }

    pub fn default_config(self) -> LimiterConfig {
        let (capacity, window_secs) = self.budget();
        LimiterConfig::new(
            format!("ratelimit:{}", self.as_str()),
            capacity,
            Duration::from_secs(window_secs),
        )
    }
}

/// A single limiter: at most `capacity` events per sliding `window`, counted
/// under its own key prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimiterConfig {
    pub prefix: String,
    pub capacity: u32,
    pub window: Duration,
}

impl LimiterConfig {
    pub fn new(prefix: impl Into<String>, capacity: u32, window: Duration) -> Self {
        Self {
            prefix: prefix.into(),
            capacity,
            window,
        }
    }

    pub fn window_millis(&self) -> u64 {
        u64::try_from(self.window.as_millis())
            .unwrap_or(u64::MAX)
            .max(1)
    }
}

/// Immutable map from action to limiter configuration.
#[derive(Debug, Clone)]
pub struct LimiterTable {
    entries: HashMap<LimiterName, LimiterConfig>,
}

impl Default for LimiterTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl LimiterTable {
    pub fn standard() -> Self {
        let entries = LimiterName::ALL
            .iter()
            .map(|name| (*name, name.default_config()))
            .collect();
        Self { entries }
    }

    /// Replaces capacity and window of one entry, keeping its prefix.
    pub fn with_budget(mut self, name: LimiterName, capacity: u32, window: Duration) -> Self {
        let prefix = self.config(name).prefix;
        self.entries
            .insert(name, LimiterConfig::new(prefix, capacity, window));
        self
    }

    pub fn config(&self, name: LimiterName) -> LimiterConfig {
        self.entries
            .get(&name)
            .cloned()
            .unwrap_or_else(|| name.default_config())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LimiterName, &LimiterConfig)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_action_has_a_distinct_prefix() {
        let table = LimiterTable::standard();
        assert_eq!(table.len(), LimiterName::ALL.len());

        let prefixes: HashSet<_> = table.iter().map(|(_, c)| c.prefix.clone()).collect();
        assert_eq!(prefixes.len(), LimiterName::ALL.len());
    }

    #[test]
    fn destructive_key_actions_are_tight() {
        let table = LimiterTable::standard();
        let create = table.config(LimiterName::CreateApiKey);
        assert_eq!(create.capacity, 3);
        assert_eq!(create.window, Duration::from_secs(15 * 60));
        assert_eq!(create.prefix, "ratelimit:create-api-key");
    }

    #[test]
    fn budget_override_keeps_prefix() {
        let table = LimiterTable::standard().with_budget(
            LimiterName::CreateLink,
            2,
            Duration::from_secs(5),
        );
        let config = table.config(LimiterName::CreateLink);
        assert_eq!(config.capacity, 2);
        assert_eq!(config.window_millis(), 5_000);
        assert_eq!(config.prefix, "ratelimit:create-link");
    }
}
