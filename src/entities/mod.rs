//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.

pub mod food_category;
pub mod food_item;
pub mod food_transaction;
pub mod issue;
pub mod location;

// Re-export specific types to avoid conflicts
pub use food_category::{
    Column as FoodCategoryColumn, Entity as FoodCategory, Model as FoodCategoryModel,
};
pub use food_item::{Column as FoodItemColumn, Entity as FoodItem, Model as FoodItemModel};
pub use food_transaction::{
    Column as FoodTransactionColumn, Entity as FoodTransaction, Model as FoodTransactionModel,
    TransactionType,
};
pub use issue::{Column as IssueColumn, Entity as Issue, Model as IssueModel};
pub use location::{Column as LocationColumn, Entity as Location, Model as LocationModel};
