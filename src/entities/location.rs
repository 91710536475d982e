//! Location entity - Represents a pātaka (community food cupboard).
//!
//! Locations are provisioned administratively. The only field the service mutates
//! is `last_updated`, which moves forward whenever a transaction posts.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Location database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "locations")]
pub struct Model {
    /// Unique identifier for the pātaka
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Bell Block Community Pātaka")
    pub name: String,
    /// First address line, always present
    pub address_line1: String,
    /// Optional second address line
    pub address_line2: Option<String>,
    /// Optional suburb
    pub suburb: Option<String>,
    /// Optional city
    pub city: Option<String>,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Test locations are hidden from production listings
    pub is_test: bool,
    /// Soft delete flag - deleted locations behave as if they do not exist
    pub is_deleted: bool,
    /// When the last transaction was posted here
    pub last_updated: DateTimeUtc,
}

/// Defines relationships between Location and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One location has many ledger entries
    #[sea_orm(has_many = "super::food_transaction::Entity")]
    FoodTransactions,
    /// One location has many location-scoped items
    #[sea_orm(has_many = "super::food_item::Entity")]
    FoodItems,
    /// One location has many issue reports
    #[sea_orm(has_many = "super::issue::Entity")]
    Issues,
}

impl Related<super::food_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FoodTransactions.def()
    }
}

impl Related<super::food_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FoodItems.def()
    }
}

impl Related<super::issue::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Issues.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
