//! Food item entity - catalog rows referenced by ledger entries.
//!
//! Items are created the first time a donation names them. A `location_id` of
//! `None` marks a row from the shared catalog; otherwise the item belongs to a
//! single pātaka. Items carry no quantity: stock is always derived from the ledger.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Food item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "food_items")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name as first entered by a donor
    pub name: String,
    /// Category, if one could be matched
    pub category_id: Option<i64>,
    /// Owning pātaka, or `None` for the shared catalog
    pub location_id: Option<i64>,
    /// Soft delete flag - items are never hard-deleted
    pub is_deleted: bool,
    /// When the item was first referenced
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `FoodItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each item may belong to one category
    #[sea_orm(
        belongs_to = "super::food_category::Entity",
        from = "Column::CategoryId",
        to = "super::food_category::Column::Id"
    )]
    FoodCategory,
    /// Each item may be scoped to one location
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::LocationId",
        to = "super::location::Column::Id"
    )]
    Location,
    /// One item appears in many ledger entries
    #[sea_orm(has_many = "super::food_transaction::Entity")]
    FoodTransactions,
}

impl Related<super::food_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FoodCategory.def()
    }
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::food_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FoodTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
