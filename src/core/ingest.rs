//! Ingestion boundary for ledger rows coming from outside the crate.
//!
//! Different producers spell the same fields differently (`itemId`, `ItemId`,
//! `FoodItemId`) and encode the transaction type either as a word or as its numeric
//! id. All of that is absorbed here: [`RawTransaction`] accepts every known spelling
//! and [`normalize_transactions`] turns rows into [`LedgerEntry`] values. Bad rows are
//! skipped and counted so one broken row never hides the rest of a pātaka's stock.

use crate::{
    core::inventory::LedgerEntry,
    entities::TransactionType,
    errors::Result,
};
use serde::Deserialize;
use std::fmt::Display;
use thiserror::Error;
use tracing::warn;

/// Transaction type as it appears on the wire: a name or a numeric id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawKind {
    /// `"donation"` or `"collection"`, any case
    Name(String),
    /// `1` for donation, `2` for collection
    Code(i64),
}

/// A ledger row before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawTransaction {
    /// Item the row moves
    #[serde(default, alias = "itemId", alias = "ItemId", alias = "FoodItemId")]
    pub item_id: Option<i64>,
    /// Donation or collection
    #[serde(
        default,
        rename = "type",
        alias = "Type",
        alias = "transactionType",
        alias = "transaction_type",
        alias = "TransactionTypeId"
    )]
    pub kind: Option<RawKind>,
    /// Unsigned quantity
    #[serde(default, alias = "Quantity")]
    pub quantity: Option<i64>,
}

/// Why a raw row was left out of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    /// The row could not be read as a transaction at all
    #[error("unreadable row: {0}")]
    Unreadable(String),
    /// No item id
    #[error("missing item id")]
    MissingItemId,
    /// No type, or a type that is neither donation nor collection
    #[error("unknown transaction type {0:?}")]
    UnknownType(Option<RawKind>),
    /// Missing, zero or negative quantity
    #[error("invalid quantity {0:?}")]
    InvalidQuantity(Option<i64>),
}

/// Validated entries and the number of rows that were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    /// Rows that passed validation, in input order
    pub entries: Vec<LedgerEntry>,
    /// Rows that were skipped
    pub skipped: usize,
}

/// Resolves a wire transaction type.
#[must_use]
pub fn parse_kind(kind: &RawKind) -> Option<TransactionType> {
    match kind {
        RawKind::Name(name) => match name.trim().to_ascii_lowercase().as_str() {
            "donation" => Some(TransactionType::Donation),
            "collection" => Some(TransactionType::Collection),
            _ => None,
        },
        RawKind::Code(code) => TransactionType::from_code(*code),
    }
}

impl RawTransaction {
    /// Validates the row into a ledger entry.
    pub fn normalize(&self) -> std::result::Result<LedgerEntry, SkipReason> {
        let item_id = self.item_id.ok_or(SkipReason::MissingItemId)?;
        let transaction_type = self
            .kind
            .as_ref()
            .and_then(parse_kind)
            .ok_or_else(|| SkipReason::UnknownType(self.kind.clone()))?;
        let quantity = self
            .quantity
            .filter(|q| *q > 0)
            .ok_or(SkipReason::InvalidQuantity(self.quantity))?;
        LedgerEntry::new(item_id, transaction_type, quantity)
            .map_err(|_| SkipReason::InvalidQuantity(Some(quantity)))
    }
}

/// Logs a skipped row. Skips are expected data-quality noise, not failures.
pub(crate) fn report_skipped(row: &str, reason: &dyn Display) {
    warn!("Skipping {}: {}", row, reason);
}

/// Validates raw rows, keeping the good ones in order and counting the rest.
#[must_use]
pub fn normalize_transactions(raw: &[RawTransaction]) -> Normalized {
    let mut normalized = Normalized::default();
    for (index, row) in raw.iter().enumerate() {
        match row.normalize() {
            Ok(entry) => normalized.entries.push(entry),
            Err(reason) => {
                normalized.skipped += 1;
                report_skipped(&format!("row {index}"), &reason);
            }
        }
    }
    normalized
}

/// Parses a JSON array of loosely-typed ledger rows.
///
/// Each element is decoded on its own, so an element with the wrong shape (a
/// string quantity, say) is skipped rather than failing the whole array.
///
/// # Errors
/// Returns [`crate::errors::Error::Json`] when the input is not a JSON array.
pub fn parse_transactions(json: &str) -> Result<Normalized> {
    let values: Vec<serde_json::Value> = serde_json::from_str(json)?;
    let mut rows = Vec::with_capacity(values.len());
    let mut unreadable = 0;
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<RawTransaction>(value) {
            Ok(row) => rows.push(row),
            Err(e) => {
                unreadable += 1;
                report_skipped(&format!("row {index}"), &SkipReason::Unreadable(e.to_string()));
            }
        }
    }

    let mut normalized = normalize_transactions(&rows);
    normalized.skipped += unreadable;
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::Error;

    #[test]
    fn test_parse_kind() {
        assert_eq!(
            parse_kind(&RawKind::Name("Donation".to_string())),
            Some(TransactionType::Donation)
        );
        assert_eq!(
            parse_kind(&RawKind::Name(" collection ".to_string())),
            Some(TransactionType::Collection)
        );
        assert_eq!(parse_kind(&RawKind::Code(1)), Some(TransactionType::Donation));
        assert_eq!(parse_kind(&RawKind::Code(2)), Some(TransactionType::Collection));
        assert_eq!(parse_kind(&RawKind::Code(3)), None);
        assert_eq!(parse_kind(&RawKind::Name("gift".to_string())), None);
    }

    #[test]
    fn test_field_spellings_are_accepted() {
        let json = r#"[
            {"itemId": 1, "type": "donation", "quantity": 4},
            {"ItemId": 1, "Type": "collection", "Quantity": 1},
            {"FoodItemId": 2, "TransactionTypeId": 1, "Quantity": 7},
            {"item_id": 3, "transaction_type": "DONATION", "quantity": 2}
        ]"#;

        let normalized = parse_transactions(json).unwrap();
        assert_eq!(normalized.skipped, 0);
        assert_eq!(
            normalized.entries,
            vec![
                LedgerEntry::new(1, TransactionType::Donation, 4).unwrap(),
                LedgerEntry::new(1, TransactionType::Collection, 1).unwrap(),
                LedgerEntry::new(2, TransactionType::Donation, 7).unwrap(),
                LedgerEntry::new(3, TransactionType::Donation, 2).unwrap(),
            ]
        );
    }

    #[test]
    fn test_malformed_rows_are_skipped_not_fatal() {
        let json = r#"[
            {"type": "donation", "quantity": 4},
            {"itemId": 1, "type": "swap", "quantity": 4},
            {"itemId": 1, "quantity": 4},
            {"itemId": 1, "type": "donation", "quantity": 0},
            {"itemId": 1, "type": "donation", "quantity": -2},
            {"itemId": 1, "type": "donation"},
            {"itemId": 1, "type": "donation", "quantity": "lots"},
            {"itemId": 5, "type": "donation", "quantity": 3}
        ]"#;

        let normalized = parse_transactions(json).unwrap();
        assert_eq!(normalized.skipped, 7);
        assert_eq!(
            normalized.entries,
            vec![LedgerEntry::new(5, TransactionType::Donation, 3).unwrap()]
        );
    }

    #[test]
    fn test_skip_reasons() {
        let row = RawTransaction {
            item_id: None,
            kind: Some(RawKind::Code(1)),
            quantity: Some(1),
        };
        assert_eq!(row.normalize(), Err(SkipReason::MissingItemId));

        let row = RawTransaction {
            item_id: Some(1),
            kind: Some(RawKind::Code(9)),
            quantity: Some(1),
        };
        assert_eq!(
            row.normalize(),
            Err(SkipReason::UnknownType(Some(RawKind::Code(9))))
        );

        let row = RawTransaction {
            item_id: Some(1),
            kind: Some(RawKind::Code(2)),
            quantity: Some(0),
        };
        assert_eq!(row.normalize(), Err(SkipReason::InvalidQuantity(Some(0))));
    }

    #[test]
    fn test_non_array_input_is_an_error() {
        let result = parse_transactions(r#"{"itemId": 1}"#);
        assert!(matches!(result, Err(Error::Json(_))));
    }
}
