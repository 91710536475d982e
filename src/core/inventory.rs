//! Inventory aggregation - Derives current stock from the transaction ledger.
//!
//! Stock is never stored. Every read groups a location's ledger entries by item,
//! nets donations against collections, drops anything that is no longer on the
//! shelf and classifies the result into a coarse [`StockStatus`]. The pure
//! functions here take already-fetched data; [`load_location_inventory`] is the
//! storage-backed entry point used by listings.

use crate::{
    core::{ingest, location},
    entities::{
        FoodCategory, FoodItem, FoodTransaction, TransactionType, food_category, food_item,
        food_transaction, location as location_entity,
    },
    errors::{Error, Result},
};
use sea_orm::{ConnectionTrait, QueryOrder, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, instrument};

/// Category shown for items whose category is missing or unresolvable.
pub const FALLBACK_CATEGORY: &str = "Other";

/// At or below this many distinct items a pātaka is considered low.
pub const LOW_ITEM_COUNT: usize = 2;

/// At or below this many total units a pātaka is considered low.
pub const LOW_TOTAL_QUANTITY: i64 = 5;

/// One validated ledger row: a signed movement of a positive quantity of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerEntry {
    item_id: i64,
    transaction_type: TransactionType,
    quantity: i64,
}

impl LedgerEntry {
    /// Builds a ledger entry, rejecting non-positive quantities.
    pub fn new(item_id: i64, transaction_type: TransactionType, quantity: i64) -> Result<Self> {
        if quantity <= 0 {
            return Err(Error::InvalidQuantity { quantity });
        }
        Ok(Self {
            item_id,
            transaction_type,
            quantity,
        })
    }

    /// Item this entry moves.
    #[must_use]
    pub const fn item_id(&self) -> i64 {
        self.item_id
    }

    /// Donation or collection.
    #[must_use]
    pub const fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    /// Unsigned quantity, always positive.
    #[must_use]
    pub const fn quantity(&self) -> i64 {
        self.quantity
    }

    /// Quantity with the sign of the transaction type applied.
    #[must_use]
    pub const fn signed_quantity(&self) -> i64 {
        self.transaction_type.signed(self.quantity)
    }
}

impl TryFrom<&food_transaction::Model> for LedgerEntry {
    type Error = Error;

    fn try_from(row: &food_transaction::Model) -> Result<Self> {
        let transaction_type = row.kind().ok_or(Error::UnknownTransactionType {
            code: i64::from(row.transaction_type),
        })?;
        Self::new(row.item_id, transaction_type, i64::from(row.quantity))
    }
}

/// Display metadata for an item, keyed by item id in an [`ItemLookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemInfo {
    /// Item display name
    pub name: String,
    /// Category display name, if the item has a resolvable category
    pub category: Option<String>,
}

/// Item metadata keyed by item id.
pub type ItemLookup = HashMap<i64, ItemInfo>;

/// One row of a location's current stock, in the wire shape the PWA expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLine {
    /// Item display name
    #[serde(rename = "Name")]
    pub name: String,
    /// Category display name, `"Other"` when unknown
    #[serde(rename = "Category")]
    pub category: String,
    /// Net units on the shelf, always positive
    #[serde(rename = "Quantity")]
    pub quantity: i64,
}

/// Coarse availability of a pātaka.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    /// Nothing on the shelf
    Empty,
    /// Few items or few units
    Low,
    /// Plenty to choose from
    WellStocked,
}

impl StockStatus {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Low => "low",
            Self::WellStocked => "well_stocked",
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current stock plus status, serialized as `{ "inventory": [...], "status": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryView {
    /// Items currently available, sorted by name
    pub inventory: Vec<InventoryLine>,
    /// Status derived from `inventory`
    pub status: StockStatus,
}

impl InventoryView {
    /// Builds a view from computed lines, deriving the status.
    #[must_use]
    pub fn new(inventory: Vec<InventoryLine>) -> Self {
        let status = derive_status(&inventory);
        Self { inventory, status }
    }
}

/// A location's inventory together with how many ledger rows had to be skipped.
#[derive(Debug, Clone)]
pub struct LocationInventory {
    /// The pātaka the inventory belongs to
    pub location: location_entity::Model,
    /// Stock and status
    pub view: InventoryView,
    /// Malformed ledger rows ignored while computing `view`
    pub skipped_rows: usize,
}

/// Nets a set of ledger entries into the items currently available.
///
/// Entries are grouped by item id and summed with their sign. Items whose net is
/// zero or negative are dropped. Categories come from `items`; an item missing from
/// the lookup still appears, named `Item <id>` and filed under [`FALLBACK_CATEGORY`].
/// The result is sorted by name case-insensitively, then by exact name, then by id,
/// so identical inputs always give identical output.
#[must_use]
pub fn compute_inventory(entries: &[LedgerEntry], items: &ItemLookup) -> Vec<InventoryLine> {
    let mut totals: BTreeMap<i64, i64> = BTreeMap::new();
    for entry in entries {
        let total = totals.entry(entry.item_id).or_insert(0);
        *total = total.saturating_add(entry.signed_quantity());
    }

    let mut lines: Vec<(i64, InventoryLine)> = totals
        .into_iter()
        .filter(|&(_, net)| net > 0)
        .map(|(item_id, net)| {
            let info = items.get(&item_id);
            let name = info.map_or_else(|| format!("Item {item_id}"), |i| i.name.clone());
            let category = info
                .and_then(|i| i.category.as_deref())
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(FALLBACK_CATEGORY)
                .to_string();
            (
                item_id,
                InventoryLine {
                    name,
                    category,
                    quantity: net,
                },
            )
        })
        .collect();

    lines.sort_by(|(a_id, a), (b_id, b)| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a_id.cmp(b_id))
    });

    lines.into_iter().map(|(_, line)| line).collect()
}

/// Classifies an inventory.
///
/// Empty when there are no items or no units, low at two or fewer items or five or
/// fewer units, well stocked otherwise.
#[must_use]
pub fn derive_status(inventory: &[InventoryLine]) -> StockStatus {
    let item_count = inventory.len();
    let total_quantity = inventory
        .iter()
        .fold(0_i64, |sum, line| sum.saturating_add(line.quantity));

    if item_count == 0 || total_quantity == 0 {
        StockStatus::Empty
    } else if item_count <= LOW_ITEM_COUNT || total_quantity <= LOW_TOTAL_QUANTITY {
        StockStatus::Low
    } else {
        StockStatus::WellStocked
    }
}

/// Net quantity of a single item in a set of entries, which may be zero or negative.
#[must_use]
pub fn net_quantity(entries: &[LedgerEntry], item_id: i64) -> i64 {
    entries
        .iter()
        .filter(|e| e.item_id == item_id)
        .fold(0_i64, |sum, e| sum.saturating_add(e.signed_quantity()))
}

/// Converts stored ledger rows into entries, counting rows that fail validation.
pub(crate) fn entries_from_rows(rows: &[food_transaction::Model]) -> (Vec<LedgerEntry>, usize) {
    let mut entries = Vec::with_capacity(rows.len());
    let mut skipped = 0;
    for row in rows {
        match LedgerEntry::try_from(row) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                skipped += 1;
                ingest::report_skipped(&format!("transaction {}", row.id), &e);
            }
        }
    }
    (entries, skipped)
}

/// Fetches every ledger row for a location, oldest first.
pub(crate) async fn fetch_ledger<C>(db: &C, location_id: i64) -> Result<Vec<food_transaction::Model>>
where
    C: ConnectionTrait,
{
    FoodTransaction::find()
        .filter(food_transaction::Column::LocationId.eq(location_id))
        .order_by_asc(food_transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Builds the item lookup for every item referenced by `rows`.
pub(crate) async fn fetch_item_lookup<C>(
    db: &C,
    rows: &[food_transaction::Model],
) -> Result<ItemLookup>
where
    C: ConnectionTrait,
{
    let item_ids: Vec<i64> = rows
        .iter()
        .map(|r| r.item_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    if item_ids.is_empty() {
        return Ok(ItemLookup::new());
    }

    let items = FoodItem::find()
        .filter(food_item::Column::Id.is_in(item_ids))
        .find_also_related(FoodCategory)
        .all(db)
        .await?;

    Ok(items
        .into_iter()
        .map(|(item, category): (food_item::Model, Option<food_category::Model>)| {
            (
                item.id,
                ItemInfo {
                    name: item.name,
                    category: category.map(|c| c.name),
                },
            )
        })
        .collect())
}

/// Computes the current inventory and status of one pātaka from its ledger.
///
/// # Errors
/// Returns [`Error::LocationNotFound`] when the location does not exist or is
/// soft-deleted. A missing location never produces an empty inventory.
#[instrument(skip(db))]
pub async fn load_location_inventory<C>(db: &C, location_id: i64) -> Result<LocationInventory>
where
    C: ConnectionTrait,
{
    let location = location::get_location(db, location_id).await?;
    inventory_for(db, location).await
}

/// Computes the inventory of an already-loaded location.
pub(crate) async fn inventory_for<C>(
    db: &C,
    location: location_entity::Model,
) -> Result<LocationInventory>
where
    C: ConnectionTrait,
{
    let rows = fetch_ledger(db, location.id).await?;
    let items = fetch_item_lookup(db, &rows).await?;
    let (entries, skipped_rows) = entries_from_rows(&rows);

    let view = InventoryView::new(compute_inventory(&entries, &items));
    debug!(
        location_id = location.id,
        items = view.inventory.len(),
        status = %view.status,
        skipped_rows,
        "Computed inventory"
    );

    Ok(LocationInventory {
        location,
        view,
        skipped_rows,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn donate(item_id: i64, quantity: i64) -> LedgerEntry {
        LedgerEntry::new(item_id, TransactionType::Donation, quantity).unwrap()
    }

    fn collect(item_id: i64, quantity: i64) -> LedgerEntry {
        LedgerEntry::new(item_id, TransactionType::Collection, quantity).unwrap()
    }

    fn lookup(entries: &[(i64, &str, Option<&str>)]) -> ItemLookup {
        entries
            .iter()
            .map(|&(id, name, category)| {
                (
                    id,
                    ItemInfo {
                        name: name.to_string(),
                        category: category.map(str::to_string),
                    },
                )
            })
            .collect()
    }

    fn line(name: &str, category: &str, quantity: i64) -> InventoryLine {
        InventoryLine {
            name: name.to_string(),
            category: category.to_string(),
            quantity,
        }
    }

    #[test]
    fn test_ledger_entry_rejects_non_positive_quantity() {
        assert!(matches!(
            LedgerEntry::new(1, TransactionType::Donation, 0),
            Err(Error::InvalidQuantity { quantity: 0 })
        ));
        assert!(matches!(
            LedgerEntry::new(1, TransactionType::Collection, -3),
            Err(Error::InvalidQuantity { quantity: -3 })
        ));
    }

    #[test]
    fn test_donation_minus_collection() {
        let items = lookup(&[(1, "Apples", Some("Fresh Produce"))]);
        let inventory = compute_inventory(&[donate(1, 5), collect(1, 2)], &items);
        assert_eq!(inventory, vec![line("Apples", "Fresh Produce", 3)]);
    }

    #[test]
    fn test_fully_collected_items_are_hidden() {
        let items = lookup(&[(1, "Apples", None), (2, "Bread", Some("Bakery"))]);
        let entries = [donate(1, 2), collect(1, 2), donate(2, 1), collect(2, 4)];
        assert!(compute_inventory(&entries, &items).is_empty());
    }

    #[test]
    fn test_sorted_case_insensitively() {
        let items = lookup(&[(1, "banana", Some("Fresh Produce")), (2, "Apple", Some("Fresh Produce"))]);
        let inventory = compute_inventory(&[donate(1, 1), donate(2, 1)], &items);
        let names: Vec<&str> = inventory.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Apple", "banana"]);
    }

    #[test]
    fn test_identical_names_ordered_by_item_id() {
        let items = lookup(&[(9, "Rice", Some("Pantry")), (3, "Rice", Some("Other"))]);
        let inventory = compute_inventory(&[donate(9, 1), donate(3, 2)], &items);
        assert_eq!(
            inventory,
            vec![line("Rice", "Other", 2), line("Rice", "Pantry", 1)]
        );
    }

    #[test]
    fn test_missing_metadata_falls_back_to_other() {
        let items = lookup(&[(1, "Milk", None), (2, "Cheese", Some("  "))]);
        let inventory = compute_inventory(&[donate(1, 1), donate(2, 1), donate(42, 3)], &items);
        assert_eq!(
            inventory,
            vec![
                line("Cheese", "Other", 1),
                line("Item 42", "Other", 3),
                line("Milk", "Other", 1),
            ]
        );
    }

    #[test]
    fn test_compute_inventory_is_idempotent() {
        let items = lookup(&[(1, "Pasta", Some("Packaged Foods")), (2, "eggs", Some("Dairy"))]);
        let entries = [donate(2, 6), donate(1, 3), collect(2, 1), donate(7, 2)];
        let first = compute_inventory(&entries, &items);
        let second = compute_inventory(&entries, &items);
        assert_eq!(first, second);
        assert!(first.iter().all(|l| l.quantity > 0));
    }

    #[test]
    fn test_status_empty_without_items() {
        assert_eq!(derive_status(&[]), StockStatus::Empty);
    }

    #[test]
    fn test_status_boundaries() {
        let three_six = vec![line("a", "Other", 2), line("b", "Other", 2), line("c", "Other", 2)];
        assert_eq!(derive_status(&three_six), StockStatus::WellStocked);

        let three_five = vec![line("a", "Other", 1), line("b", "Other", 2), line("c", "Other", 2)];
        assert_eq!(derive_status(&three_five), StockStatus::Low);

        let two_many = vec![line("a", "Other", 50), line("b", "Other", 50)];
        assert_eq!(derive_status(&two_many), StockStatus::Low);
    }

    #[test]
    fn test_view_wire_format() {
        let view = InventoryView::new(vec![line("Bread", "Bakery", 1)]);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "inventory": [{ "Name": "Bread", "Category": "Bakery", "Quantity": 1 }],
                "status": "low"
            })
        );
        let empty = serde_json::to_value(InventoryView::new(Vec::new())).unwrap();
        assert_eq!(empty, serde_json::json!({ "inventory": [], "status": "empty" }));
    }

    #[test]
    fn test_net_quantity() {
        let entries = [donate(1, 4), collect(1, 1), donate(2, 9), collect(1, 5)];
        assert_eq!(net_quantity(&entries, 1), -2);
        assert_eq!(net_quantity(&entries, 2), 9);
        assert_eq!(net_quantity(&entries, 3), 0);
    }

    #[tokio::test]
    async fn test_load_location_inventory_missing_location() -> Result<()> {
        let db = setup_test_db().await?;
        let result = load_location_inventory(&db, 404).await;
        assert!(matches!(result, Err(Error::LocationNotFound { id: 404 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_load_location_inventory_deleted_location() -> Result<()> {
        let db = setup_test_db().await?;
        let location = create_test_location(&db, "Closed Pātaka").await?;
        soft_delete_location(&db, location.id).await?;

        let result = load_location_inventory(&db, location.id).await;
        assert!(matches!(result, Err(Error::LocationNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_load_location_inventory_without_transactions() -> Result<()> {
        let (db, location) = setup_with_location().await?;
        let inventory = load_location_inventory(&db, location.id).await?;
        assert!(inventory.view.inventory.is_empty());
        assert_eq!(inventory.view.status, StockStatus::Empty);
        assert_eq!(inventory.skipped_rows, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_location_inventory_single_donation() -> Result<()> {
        let (db, location) = setup_with_location().await?;
        donate_custom_item(&db, location.id, "Bread", Some("Bakery"), 1).await?;

        let inventory = load_location_inventory(&db, location.id).await?;
        assert_eq!(inventory.view.inventory, vec![line("Bread", "Bakery", 1)]);
        assert_eq!(inventory.view.status, StockStatus::Low);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_location_inventory_well_stocked() -> Result<()> {
        let (db, location) = setup_with_location().await?;
        donate_test_item(&db, location.id, "Bread", 3).await?;
        donate_test_item(&db, location.id, "Milk", 3).await?;
        donate_test_item(&db, location.id, "Apples", 4).await?;

        let inventory = load_location_inventory(&db, location.id).await?;
        let total: i64 = inventory.view.inventory.iter().map(|l| l.quantity).sum();
        assert_eq!(inventory.view.inventory.len(), 3);
        assert_eq!(total, 10);
        assert_eq!(inventory.view.status, StockStatus::WellStocked);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_location_inventory_skips_corrupt_rows() -> Result<()> {
        let (db, location) = setup_with_location().await?;
        let bread = donate_custom_item(&db, location.id, "Bread", Some("Bakery"), 2).await?;
        insert_raw_transaction(&db, location.id, bread.item_id, TransactionType::Collection.code(), 0)
            .await?;

        let inventory = load_location_inventory(&db, location.id).await?;
        assert_eq!(inventory.skipped_rows, 1);
        assert_eq!(inventory.view.inventory, vec![line("Bread", "Bakery", 2)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_location_inventory_skips_unknown_type_codes() -> Result<()> {
        let (db, location) = setup_with_location().await?;
        let bread = donate_custom_item(&db, location.id, "Bread", Some("Bakery"), 2).await?;
        insert_raw_transaction(&db, location.id, bread.item_id, 3, 5).await?;

        let inventory = load_location_inventory(&db, location.id).await?;
        assert_eq!(inventory.skipped_rows, 1);
        assert_eq!(inventory.view.inventory, vec![line("Bread", "Bakery", 2)]);

        // A collection still sees the valid stock
        crate::core::transaction::record_collection(
            &db,
            location.id,
            &[crate::core::transaction::SubmittedItem::new("Bread", 2)],
            None,
            None,
        )
        .await?;
        let inventory = load_location_inventory(&db, location.id).await?;
        assert!(inventory.view.inventory.is_empty());
        Ok(())
    }

    #[test]
    fn test_unknown_type_code_is_rejected_as_entry() {
        let row = food_transaction::Model {
            id: 1,
            location_id: 1,
            item_id: 1,
            category_id: None,
            transaction_type: 3,
            quantity: 1,
            comment: None,
            photo_url: None,
            created_at: chrono::Utc::now(),
            is_test: false,
        };
        assert!(matches!(
            LedgerEntry::try_from(&row),
            Err(Error::UnknownTransactionType { code: 3 })
        ));
    }

    #[tokio::test]
    async fn test_load_location_inventory_ignores_other_locations() -> Result<()> {
        let (db, location) = setup_with_location().await?;
        let other = create_test_location(&db, "Other Pātaka").await?;
        donate_test_item(&db, other.id, "Rice", 8).await?;

        let inventory = load_location_inventory(&db, location.id).await?;
        assert!(inventory.view.inventory.is_empty());
        Ok(())
    }
}
