//! Cupboard listing - per-pātaka summaries for map and list views.
//!
//! Each summary combines a location's display fields with its ledger-derived
//! inventory and status. All functions return structured data; formatting helpers
//! produce the short text used in list rows.

use crate::{
    core::{
        age,
        inventory::{self, InventoryLine, StockStatus},
        location::{self, Coordinates},
    },
    entities::location as location_entity,
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Everything a client needs to draw one pātaka.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CupboardSummary {
    /// Location id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Address parts joined with ", "
    pub address: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Derived stock status
    pub status: StockStatus,
    /// Relative age of the last posted transaction, e.g. "3 hours ago"
    pub last_updated: String,
    /// Items currently available
    pub inventory: Vec<InventoryLine>,
}

impl CupboardSummary {
    /// Position of the pātaka.
    #[must_use]
    pub const fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Builds the summary of an already-loaded location.
pub async fn build_cupboard_summary<C>(
    db: &C,
    location: location_entity::Model,
    now: DateTime<Utc>,
) -> Result<CupboardSummary>
where
    C: ConnectionTrait,
{
    let address = location::format_address(&location);
    let last_updated = age::format_relative_age(location.last_updated, now);
    let computed = inventory::inventory_for(db, location).await?;
    let location = computed.location;

    Ok(CupboardSummary {
        id: location.id,
        name: location.name,
        address,
        latitude: location.latitude,
        longitude: location.longitude,
        status: computed.view.status,
        last_updated,
        inventory: computed.view.inventory,
    })
}

/// Builds summaries for every listed pātaka, ordered by name.
#[instrument(skip(db))]
pub async fn build_cupboard_summaries<C>(
    db: &C,
    include_test: bool,
    now: DateTime<Utc>,
) -> Result<Vec<CupboardSummary>>
where
    C: ConnectionTrait,
{
    let locations = location::list_locations(db, include_test).await?;
    let mut summaries = Vec::with_capacity(locations.len());
    for location in locations {
        summaries.push(build_cupboard_summary(db, location, now).await?);
    }
    info!(
        "Built {} cupboard summaries (include_test: {})",
        summaries.len(),
        include_test
    );
    Ok(summaries)
}

/// The summary closest to `from`.
#[must_use]
pub fn nearest_cupboard(summaries: &[CupboardSummary], from: Coordinates) -> Option<&CupboardSummary> {
    location::nearest(summaries, from, CupboardSummary::coordinates)
}

/// Formats an inventory as `"Apples (5), Bread (2)"`, or `"No items listed"`.
#[must_use]
pub fn format_inventory_summary(inventory: &[InventoryLine]) -> String {
    if inventory.is_empty() {
        return "No items listed".to_string();
    }
    inventory
        .iter()
        .map(|line| format!("{} ({})", line.name, line.quantity))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Display colour for a status, as a CSS hex string.
#[must_use]
pub const fn status_color(status: StockStatus) -> &'static str {
    match status {
        StockStatus::Empty => "#f44336",
        StockStatus::Low => "#ff9800",
        StockStatus::WellStocked => "#289DA7",
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn line(name: &str, quantity: i64) -> InventoryLine {
        InventoryLine {
            name: name.to_string(),
            category: "Other".to_string(),
            quantity,
        }
    }

    #[test]
    fn test_format_inventory_summary() {
        assert_eq!(format_inventory_summary(&[]), "No items listed");
        assert_eq!(
            format_inventory_summary(&[line("Apples", 5), line("Bread", 2)]),
            "Apples (5), Bread (2)"
        );
    }

    #[test]
    fn test_status_color() {
        assert_eq!(status_color(StockStatus::Empty), "#f44336");
        assert_eq!(status_color(StockStatus::Low), "#ff9800");
        assert_eq!(status_color(StockStatus::WellStocked), "#289DA7");
    }

    #[tokio::test]
    async fn test_build_cupboard_summaries() -> Result<()> {
        let db = setup_test_db().await?;
        let bell = create_test_location(&db, "Bell Block Community Pātaka").await?;
        let marfell = create_test_location(&db, "Marfell Neighbourhood Pātaka").await?;
        create_custom_location(&db, "Test Pātaka", true).await?;

        donate_test_item(&db, bell.id, "Apples", 5).await?;
        donate_test_item(&db, bell.id, "Bread", 2).await?;
        donate_test_item(&db, bell.id, "Canned beans", 3).await?;

        let now = Utc::now();
        let summaries = build_cupboard_summaries(&db, false, now).await?;
        assert_eq!(summaries.len(), 2);

        let first = &summaries[0];
        assert_eq!(first.id, bell.id);
        assert_eq!(first.status, StockStatus::WellStocked);
        assert_eq!(first.address, "1 Test St, Testville, New Plymouth");
        assert_eq!(first.last_updated, "Just now");
        assert_eq!(
            format_inventory_summary(&first.inventory),
            "Apples (5), Bread (2), Canned beans (3)"
        );

        let second = &summaries[1];
        assert_eq!(second.id, marfell.id);
        assert_eq!(second.status, StockStatus::Empty);
        assert!(second.inventory.is_empty());

        assert_eq!(build_cupboard_summaries(&db, true, now).await?.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_summary_wire_format() -> Result<()> {
        let (db, location) = setup_with_location().await?;
        donate_custom_item(&db, location.id, "Bread", Some("Bakery"), 1).await?;
        let summary = build_cupboard_summary(&db, location, Utc::now()).await?;

        let json = serde_json::to_value(&summary)?;
        assert_eq!(json["status"], "low");
        assert_eq!(json["lastUpdated"], "Just now");
        assert_eq!(json["inventory"][0]["Name"], "Bread");
        assert_eq!(json["inventory"][0]["Category"], "Bakery");
        assert_eq!(json["inventory"][0]["Quantity"], 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_nearest_cupboard() -> Result<()> {
        let db = setup_test_db().await?;
        create_located(&db, "Marfell", -39.0421, 174.0523).await?;
        create_located(&db, "Waitara", -38.9985, 174.2341).await?;
        let summaries = build_cupboard_summaries(&db, false, Utc::now()).await?;

        let from = Coordinates {
            latitude: -39.05,
            longitude: 174.06,
        };
        assert_eq!(nearest_cupboard(&summaries, from).unwrap().name, "Marfell");
        assert!(nearest_cupboard(&[], from).is_none());
        Ok(())
    }
}
