//! Food transaction entity - the append-only stock ledger.
//!
//! Each row records a donation (adds stock) or a collection (removes stock) of a
//! positive quantity of one item at one pātaka. Rows are never updated or deleted;
//! current stock is the signed sum of a location's rows.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Signed effect of a ledger entry. Stored as the integer ids 1 and 2.
///
/// The column itself stays a plain integer so a row carrying any other code can
/// still be read and skipped instead of failing the whole query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Food left at the pātaka
    Donation,
    /// Food taken from the pātaka
    Collection,
}

impl TransactionType {
    /// Stored integer id.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Donation => 1,
            Self::Collection => 2,
        }
    }

    /// Resolves a stored integer id.
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Donation),
            2 => Some(Self::Collection),
            _ => None,
        }
    }

    /// Applies the sign of this transaction type to a quantity.
    #[must_use]
    pub const fn signed(self, quantity: i64) -> i64 {
        match self {
            Self::Donation => quantity,
            Self::Collection => -quantity,
        }
    }
}

/// Food transaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "food_transactions")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Pātaka the food moved in or out of
    pub location_id: i64,
    /// Item that moved
    pub item_id: i64,
    /// Category of the item at the time of posting
    pub category_id: Option<i64>,
    /// Stored [`TransactionType`] code, 1 = donation, 2 = collection
    pub transaction_type: i32,
    /// Number of units, always positive
    pub quantity: i32,
    /// Optional free-text note from the donor or collector
    pub comment: Option<String>,
    /// Optional reference to an uploaded photo
    pub photo_url: Option<String>,
    /// When the entry was posted
    pub created_at: DateTimeUtc,
    /// Copied from the location when posted
    pub is_test: bool,
}

/// Defines relationships between `FoodTransaction` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one location
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::LocationId",
        to = "super::location::Column::Id"
    )]
    Location,
    /// Each entry references one item
    #[sea_orm(
        belongs_to = "super::food_item::Entity",
        from = "Column::ItemId",
        to = "super::food_item::Column::Id"
    )]
    FoodItem,
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::food_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FoodItem.def()
    }
}

impl Model {
    /// Decoded transaction type, `None` for an unknown code.
    #[must_use]
    pub fn kind(&self) -> Option<TransactionType> {
        TransactionType::from_code(i64::from(self.transaction_type))
    }
}

impl ActiveModelBehavior for ActiveModel {}
