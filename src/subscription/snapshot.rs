use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

use crate::database::models::Plan;

pub const FREE_PLAN_SLUG: &str = "free";

/// Per-plan ceilings. All five fields must be present and numeric for a plan
/// record to be usable. Fractional ceilings round up, negative ones read as 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimits {
    #[serde(deserialize_with = "ceiling")]
    pub collections: i64,
    #[serde(deserialize_with = "ceiling")]
    pub links_per_collection: i64,
    #[serde(deserialize_with = "ceiling")]
    pub total_links: i64,
    #[serde(deserialize_with = "ceiling")]
    pub favorites: i64,
    #[serde(deserialize_with = "ceiling")]
    pub top_collections: i64,
}

/// Any JSON number, as the smallest whole count a usage figure must reach to
/// hit it.
fn ceiling<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = serde_json::Number::deserialize(deserializer)?;
    if let Some(n) = value.as_i64() {
        return Ok(n.max(0));
    }
    match value.as_f64() {
        Some(n) if n.is_finite() => Ok(n.ceil().clamp(0.0, i64::MAX as f64) as i64),
        _ => Err(D::Error::custom("limit out of range")),
    }
}

impl PlanLimits {
    /// Parses the stored `limits` document, rejecting anything with a missing
    /// or non-numeric field.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanInterval {
    #[default]
    None,
    Month,
    Year,
}

impl PlanInterval {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "month" => PlanInterval::Month,
            "year" => PlanInterval::Year,
            _ => PlanInterval::None,
        }
    }
}

/// Denormalised view of a user's current plan, cached for a bounded time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSnapshot {
    pub plan_id: String,
    pub plan_name: String,
    pub plan_slug: String,
    pub interval: PlanInterval,
    pub price_cents: i64,
    pub limits: PlanLimits,
}

impl SubscriptionSnapshot {
    pub fn from_plan(plan: &Plan) -> Option<Self> {
        let limits = PlanLimits::from_json(&plan.limits)?;
        Some(Self {
            plan_id: plan.id.to_string(),
            plan_name: plan.name.clone(),
            plan_slug: plan.slug.clone(),
            interval: PlanInterval::parse(&plan.interval),
            price_cents: i64::from(plan.price_cents),
            limits,
        })
    }

    /// Used when no plan record can be trusted.
    pub fn safety_net() -> Self {
        Self {
            plan_id: FREE_PLAN_SLUG.to_string(),
            plan_name: "Free".to_string(),
            plan_slug: FREE_PLAN_SLUG.to_string(),
            interval: PlanInterval::None,
            price_cents: 0,
            limits: PlanLimits {
                collections: 5,
                links_per_collection: 50,
                total_links: 250,
                favorites: 3,
                top_collections: 3,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn limits_require_every_field() {
        let full = json!({
            "collections": 5,
            "linksPerCollection": 50,
            "totalLinks": 250,
            "favorites": 3,
            "topCollections": 3
        });
        assert!(PlanLimits::from_json(&full).is_some());

        let missing = json!({ "collections": 5, "linksPerCollection": 50, "totalLinks": 250, "favorites": 3 });
        assert!(PlanLimits::from_json(&missing).is_none());

        let wrong_type = json!({
            "collections": "5",
            "linksPerCollection": 50,
            "totalLinks": 250,
            "favorites": 3,
            "topCollections": 3
        });
        assert!(PlanLimits::from_json(&wrong_type).is_none());
    }

    #[test]
    fn limits_accept_any_number() {
        let floats = json!({
            "collections": 3.0,
            "linksPerCollection": 50,
            "totalLinks": 100.0,
            "favorites": 2.5,
            "topCollections": -1
        });
        let limits = PlanLimits::from_json(&floats).unwrap();
        assert_eq!(limits.collections, 3);
        assert_eq!(limits.total_links, 100);
        assert_eq!(limits.favorites, 3);
        assert_eq!(limits.top_collections, 0);
    }

    #[test]
    fn cached_snapshot_round_trips() {
        let snapshot = SubscriptionSnapshot::safety_net();
        let raw = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(serde_json::from_str::<SubscriptionSnapshot>(&raw).unwrap(), snapshot);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let json = serde_json::to_value(SubscriptionSnapshot::safety_net()).unwrap();
        assert_eq!(json["planSlug"], "free");
        assert_eq!(json["interval"], "none");
        assert_eq!(json["limits"]["linksPerCollection"], 50);
    }
}
