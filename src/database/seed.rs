//! The plan catalog shipped with the service. `migrations/` seeds the same
//! rows into Postgres; `MemoryStore::seeded` loads them in-process.

use serde_json::json;
use uuid::Uuid;

use crate::database::models::Plan;

fn plan(
    name: &str,
    slug: &str,
    product_id: Option<&str>,
    interval: &str,
    price_cents: i32,
    limits: [i64; 5],
) -> Plan {
    let [collections, per_collection, total, favorites, top] = limits;
    Plan {
        id: Uuid::new_v4(),
        name: name.to_string(),
        slug: slug.to_string(),
        product_id: product_id.map(str::to_string),
        variant_id: None,
        interval: interval.to_string(),
        price_cents,
        limits: json!({
            "collections": collections,
            "linksPerCollection": per_collection,
            "totalLinks": total,
            "favorites": favorites,
            "topCollections": top,
        }),
    }
}

pub fn standard_plans() -> Vec<Plan> {
    const PRO: [i64; 5] = [25, 200, 2000, 100, 5];
    const BUSINESS: [i64; 5] = [100, 500, 10000, 500, 10];

    vec![
        plan("Free", "free", None, "none", 0, [3, 50, 100, 10, 1]),
        plan(
            "Pro Monthly",
            "pro-monthly",
            Some("52976f11-6817-41cd-8c1f-129adbb42824"),
            "month",
            499,
            PRO,
        ),
        plan(
            "Pro Yearly",
            "pro-yearly",
            Some("10ecf5bb-c644-47f1-8454-4314e0cd3233"),
            "year",
            4999,
            PRO,
        ),
        plan(
            "Business Monthly",
            "business-monthly",
            Some("b83bda1d-4980-4f8b-92f9-0353ee5e28b2"),
            "month",
            999,
            BUSINESS,
        ),
        plan(
            "Business Yearly",
            "business-yearly",
            Some("6d17aa6c-2834-4be5-92cd-518b4e8a15e2"),
            "year",
            9999,
            BUSINESS,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::{PlanLimits, SubscriptionSnapshot};

    const INIT_MIGRATION: &str = include_str!("../../migrations/20250101000000_init.sql");

    /// The `VALUES` row of the plans insert that seeds `slug`.
    fn seeded_row(slug: &str) -> &'static str {
        let needle = format!("'{}',", slug);
        INIT_MIGRATION
            .lines()
            .map(str::trim)
            .find(|line| line.starts_with('(') && line.contains(&needle))
            .unwrap_or_else(|| panic!("no seeded row for {}", slug))
    }

    #[test]
    fn migration_seeds_the_same_catalog() {
        for plan in standard_plans() {
            let row = seeded_row(&plan.slug);

            assert!(row.starts_with(&format!("('{}', '{}',", plan.name, plan.slug)), "{}", row);
            match &plan.product_id {
                Some(id) => assert!(row.contains(&format!("'{}'", id)), "{}", row),
                None => assert!(row.contains(", NULL, NULL,"), "{}", row),
            }
            assert!(
                row.contains(&format!("'{}', {}, ", plan.interval, plan.price_cents)),
                "{}",
                row
            );

            let start = row.find("'{").unwrap() + 1;
            let end = row.rfind("}'").unwrap() + 1;
            let seeded: serde_json::Value = serde_json::from_str(&row[start..end]).unwrap();
            assert_eq!(seeded, plan.limits, "limits of {}", plan.slug);
        }
    }

    #[test]
    fn free_plan_allows_a_hundred_links() {
        let plans = standard_plans();
        let free = plans.iter().find(|p| p.slug == "free").unwrap();
        let limits = PlanLimits::from_json(&free.limits).unwrap();

        assert_eq!(limits.collections, 3);
        assert_eq!(limits.links_per_collection, 50);
        assert_eq!(limits.total_links, 100);
        assert_eq!(limits.favorites, 10);
        assert_eq!(limits.top_collections, 1);
    }

    #[test]
    fn every_plan_has_usable_limits() {
        for plan in standard_plans() {
            let snapshot = SubscriptionSnapshot::from_plan(&plan);
            assert!(snapshot.is_some(), "{} has unusable limits", plan.slug);
            assert_ne!(snapshot, Some(SubscriptionSnapshot::safety_net()));
        }
    }
}
