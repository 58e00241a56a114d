use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::database::models::SubscriptionUpsert;

pub const SIGNATURE_HEADER: &str = "x-signature";

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    pub duplicate: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    pub id: Option<Value>,
    #[serde(default)]
    pub meta: Meta,
    pub data: Option<EventData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Meta {
    pub event_id: Option<Value>,
    pub id: Option<Value>,
    pub event_name: Option<String>,
    pub event: Option<String>,
    pub custom: Option<CustomData>,
    pub custom_data: Option<CustomData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomData {
    pub user_id: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventData {
    pub id: Option<Value>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub relationships: Relationships,
}

#[derive(Debug, Default, Deserialize)]
pub struct Attributes {
    pub status: Option<String>,
    pub period_ends_at: Option<String>,
    pub ends_at: Option<String>,
    pub cancelled: Option<bool>,
    pub cancelled_at: Option<String>,
    pub checkout_data: Option<CheckoutData>,
    pub custom: Option<CustomData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutData {
    pub custom: Option<CustomData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Relationships {
    pub variant: Option<Related>,
    pub product: Option<Related>,
    pub customer: Option<Related>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Related {
    pub data: Option<RelatedData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RelatedData {
    pub id: Option<Value>,
}

/// Provider ids arrive as strings or numbers.
fn id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn related_id(related: Option<&Related>) -> Option<String> {
    id_string(related?.data.as_ref()?.id.as_ref())
}

fn timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw?)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

impl WebhookPayload {
    pub fn event_id(&self) -> Option<String> {
        id_string(self.meta.event_id.as_ref())
            .or_else(|| id_string(self.meta.id.as_ref()))
            .or_else(|| id_string(self.id.as_ref()))
    }

    pub fn event_name(&self) -> &str {
        self.meta
            .event_name
            .as_deref()
            .or(self.meta.event.as_deref())
            .unwrap_or("unknown")
    }

    pub fn user_id(&self) -> Option<String> {
        let attributes = self.data.as_ref().map(|d| &d.attributes);
        [
            self.meta.custom.as_ref(),
            self.meta.custom_data.as_ref(),
            attributes
                .and_then(|a| a.checkout_data.as_ref())
                .and_then(|c| c.custom.as_ref()),
            attributes.and_then(|a| a.custom.as_ref()),
        ]
        .into_iter()
        .flatten()
        .find_map(|custom| id_string(custom.user_id.as_ref()))
    }

    /// The subscription row described by a `subscriptions` event, if any.
    pub fn subscription_upsert(&self) -> Option<SubscriptionUpsert> {
        let data = self.data.as_ref()?;
        if data.kind.as_deref() != Some("subscriptions") {
            return None;
        }
        let attributes = &data.attributes;

        Some(SubscriptionUpsert {
            user_id: self.user_id()?,
            subscription_id: id_string(data.id.as_ref()),
            customer_id: related_id(data.relationships.customer.as_ref()),
            product_id: related_id(data.relationships.product.as_ref()),
            variant_id: related_id(data.relationships.variant.as_ref()),
            status: attributes.status.clone().unwrap_or_else(|| "none".to_string()),
            current_period_end: timestamp(
                attributes
                    .period_ends_at
                    .as_deref()
                    .or(attributes.ends_at.as_deref()),
            ),
            cancel_at_period_end: attributes.cancelled.unwrap_or(false)
                || attributes.cancelled_at.is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn subscription_event_maps_to_upsert() {
        let payload: WebhookPayload = serde_json::from_value(json!({
            "meta": { "event_id": "evt_1", "event_name": "subscription_updated", "custom_data": { "user_id": "user_1" } },
            "data": {
                "id": 42,
                "type": "subscriptions",
                "attributes": { "status": "active", "ends_at": "2025-01-01T00:00:00Z", "cancelled": false },
                "relationships": {
                    "variant": { "data": { "id": "v_pro" } },
                    "product": { "data": { "id": 7 } }
                }
            }
        }))
        .unwrap();

        assert_eq!(payload.event_id().as_deref(), Some("evt_1"));
        assert_eq!(payload.event_name(), "subscription_updated");

        let upsert = payload.subscription_upsert().unwrap();
        assert_eq!(upsert.user_id, "user_1");
        assert_eq!(upsert.subscription_id.as_deref(), Some("42"));
        assert_eq!(upsert.variant_id.as_deref(), Some("v_pro"));
        assert_eq!(upsert.product_id.as_deref(), Some("7"));
        assert_eq!(upsert.status, "active");
        assert!(upsert.current_period_end.is_some());
        assert!(!upsert.cancel_at_period_end);
    }

    #[test]
    fn other_events_and_anonymous_subscriptions_are_skipped() {
        let order: WebhookPayload = serde_json::from_value(json!({
            "meta": { "event_id": "evt_2", "custom": { "user_id": "u" } },
            "data": { "id": "1", "type": "orders" }
        }))
        .unwrap();
        assert!(order.subscription_upsert().is_none());

        let anonymous: WebhookPayload = serde_json::from_value(json!({
            "data": { "id": "1", "type": "subscriptions", "attributes": { "status": "active" } }
        }))
        .unwrap();
        assert!(anonymous.subscription_upsert().is_none());
        assert!(anonymous.event_id().is_none());
    }
}
