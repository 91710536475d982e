//! Food category entity - static reference data seeded from `config.toml`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Food category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "food_categories")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Bakery", "Canned Goods")
    #[sea_orm(unique)]
    pub name: String,
}

/// Defines relationships between `FoodCategory` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One category classifies many items
    #[sea_orm(has_many = "super::food_item::Entity")]
    FoodItems,
}

impl Related<super::food_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FoodItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
