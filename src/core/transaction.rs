//! Transaction business logic - Appends donations and collections to the ledger.
//!
//! The ledger is append-only: this module only ever inserts rows. Each submission
//! runs inside a single database transaction so either every item posts or none
//! does. Collections are checked against ledger-derived stock inside that same
//! transaction, which keeps concurrent collectors from overdrawing an item.

use crate::{
    core::{catalog, inventory, location},
    entities::{FoodTransaction, TransactionType, food_item, food_transaction, location as location_entity},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// One line of a donation or collection as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedItem {
    /// Item name as typed or recognised
    pub name: String,
    /// Number of units
    pub quantity: i64,
    /// Optional category name suggested by the client
    #[serde(default)]
    pub category: Option<String>,
}

impl SubmittedItem {
    /// Creates an item without a category hint.
    #[must_use]
    pub fn new(name: impl Into<String>, quantity: i64) -> Self {
        Self {
            name: name.into(),
            quantity,
            category: None,
        }
    }

    fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && self.quantity > 0 && i32::try_from(self.quantity).is_ok()
    }
}

/// A complete request to move food in or out of a pātaka.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Target pātaka
    pub location_id: i64,
    /// Donation or collection
    pub transaction_type: TransactionType,
    /// Items moved
    pub items: Vec<SubmittedItem>,
    /// Optional free-text note
    #[serde(default)]
    pub comment: Option<String>,
    /// Optional reference to an already-uploaded photo
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    /// Ids of the ledger rows written, in item order
    pub transaction_ids: Vec<i64>,
    /// Number of items that posted
    pub items_processed: usize,
    /// Number of items ignored for a blank name or bad quantity
    pub items_skipped: usize,
    /// Whether the rows were written as test data
    pub is_test: bool,
}

/// Shared fields of every row written by one submission.
struct Posting<'a> {
    location: &'a location_entity::Model,
    transaction_type: TransactionType,
    comment: Option<String>,
    photo_url: Option<String>,
    at: DateTime<Utc>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_valid(items: &[SubmittedItem]) -> Result<(Vec<&SubmittedItem>, usize)> {
    if items.is_empty() {
        return Err(Error::EmptySubmission);
    }
    let valid: Vec<&SubmittedItem> = items.iter().filter(|i| i.is_valid()).collect();
    if valid.is_empty() {
        return Err(Error::EmptySubmission);
    }
    let skipped = items.len() - valid.len();
    Ok((valid, skipped))
}

async fn append<C>(
    db: &C,
    posting: &Posting<'_>,
    item: &food_item::Model,
    quantity: i64,
) -> Result<food_transaction::Model>
where
    C: ConnectionTrait,
{
    let quantity = i32::try_from(quantity).map_err(|_| Error::InvalidQuantity { quantity })?;
    food_transaction::ActiveModel {
        location_id: Set(posting.location.id),
        item_id: Set(item.id),
        category_id: Set(item.category_id),
        transaction_type: Set(posting.transaction_type.code()),
        quantity: Set(quantity),
        comment: Set(posting.comment.clone()),
        photo_url: Set(posting.photo_url.clone()),
        created_at: Set(posting.at),
        is_test: Set(posting.location.is_test),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Records a donation of one or more items.
///
/// Unknown item names are added to the pātaka's catalog. Items with a blank name or
/// a non-positive quantity are skipped and counted in the receipt.
///
/// # Errors
/// - [`Error::LocationNotFound`] if the pātaka does not exist or is deleted
/// - [`Error::EmptySubmission`] if no item is valid
#[instrument(skip(db, items, comment, photo_url))]
pub async fn record_donation(
    db: &DatabaseConnection,
    location_id: i64,
    items: &[SubmittedItem],
    comment: Option<String>,
    photo_url: Option<String>,
) -> Result<SubmissionReceipt> {
    let (valid, items_skipped) = split_valid(items)?;

    let txn = db.begin().await?;
    let location = location::get_location(&txn, location_id).await?;
    let categories = catalog::list_categories(&txn).await?;
    let posting = Posting {
        location: &location,
        transaction_type: TransactionType::Donation,
        comment: non_blank(comment),
        photo_url: non_blank(photo_url),
        at: Utc::now(),
    };

    let mut transaction_ids = Vec::with_capacity(valid.len());
    for submitted in &valid {
        let category =
            catalog::resolve_category(&categories, &submitted.name, submitted.category.as_deref());
        let item = catalog::find_or_create_item(&txn, location.id, &submitted.name, category).await?;
        let row = append(&txn, &posting, &item, submitted.quantity).await?;
        transaction_ids.push(row.id);
    }

    location::touch_last_updated(&txn, location.id, posting.at).await?;
    txn.commit().await?;

    info!(
        location_id,
        items = transaction_ids.len(),
        skipped = items_skipped,
        is_test = location.is_test,
        "Donation recorded"
    );
    Ok(SubmissionReceipt {
        items_processed: transaction_ids.len(),
        transaction_ids,
        items_skipped,
        is_test: location.is_test,
    })
}

/// Records a collection of one or more items.
///
/// Every item must already be on the shelf in at least the requested quantity,
/// counting repeated lines for the same item together. If any item falls short
/// nothing is written.
///
/// # Errors
/// - [`Error::LocationNotFound`] if the pātaka does not exist or is deleted
/// - [`Error::EmptySubmission`] if no item is valid
/// - [`Error::InsufficientStock`] if an item is unknown or short
#[instrument(skip(db, items, comment, photo_url))]
pub async fn record_collection(
    db: &DatabaseConnection,
    location_id: i64,
    items: &[SubmittedItem],
    comment: Option<String>,
    photo_url: Option<String>,
) -> Result<SubmissionReceipt> {
    let (valid, items_skipped) = split_valid(items)?;

    let txn = db.begin().await?;
    let location = location::get_location(&txn, location_id).await?;

    let mut resolved = Vec::with_capacity(valid.len());
    for submitted in &valid {
        let item = catalog::find_item(&txn, location.id, &submitted.name)
            .await?
            .ok_or_else(|| Error::InsufficientStock {
                item: submitted.name.trim().to_string(),
                available: 0,
                requested: submitted.quantity,
            })?;
        resolved.push((item, submitted.quantity));
    }

    let rows = inventory::fetch_ledger(&txn, location.id).await?;
    let (entries, _) = inventory::entries_from_rows(&rows);
    let mut requested: BTreeMap<i64, i64> = BTreeMap::new();
    for (item, quantity) in &resolved {
        let total = requested.entry(item.id).or_insert(0);
        *total = total.saturating_add(*quantity);
    }
    for (item, _) in &resolved {
        let wanted = requested.get(&item.id).copied().unwrap_or(0);
        let available = inventory::net_quantity(&entries, item.id).max(0);
        if wanted > available {
            return Err(Error::InsufficientStock {
                item: item.name.clone(),
                available,
                requested: wanted,
            });
        }
    }

    let posting = Posting {
        location: &location,
        transaction_type: TransactionType::Collection,
        comment: non_blank(comment),
        photo_url: non_blank(photo_url),
        at: Utc::now(),
    };
    let mut transaction_ids = Vec::with_capacity(resolved.len());
    for (item, quantity) in &resolved {
        let row = append(&txn, &posting, item, *quantity).await?;
        transaction_ids.push(row.id);
    }

    location::touch_last_updated(&txn, location.id, posting.at).await?;
    txn.commit().await?;

    info!(
        location_id,
        items = transaction_ids.len(),
        skipped = items_skipped,
        "Collection recorded"
    );
    Ok(SubmissionReceipt {
        items_processed: transaction_ids.len(),
        transaction_ids,
        items_skipped,
        is_test: location.is_test,
    })
}

/// Routes a submission to [`record_donation`] or [`record_collection`].
pub async fn submit(db: &DatabaseConnection, submission: Submission) -> Result<SubmissionReceipt> {
    match submission.transaction_type {
        TransactionType::Donation => {
            record_donation(
                db,
                submission.location_id,
                &submission.items,
                submission.comment,
                submission.photo_url,
            )
            .await
        }
        TransactionType::Collection => {
            record_collection(
                db,
                submission.location_id,
                &submission.items,
                submission.comment,
                submission.photo_url,
            )
            .await
        }
    }
}

/// Retrieves a location's ledger, newest first.
pub async fn get_transactions_for_location(
    db: &DatabaseConnection,
    location_id: i64,
) -> Result<Vec<food_transaction::Model>> {
    FoodTransaction::find()
        .filter(food_transaction::Column::LocationId.eq(location_id))
        .order_by_desc(food_transaction::Column::CreatedAt)
        .order_by_desc(food_transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
