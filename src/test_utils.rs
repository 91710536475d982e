//! Shared test utilities for the pātaka inventory service.
//!
//! This module provides helpers for setting up in-memory databases and creating
//! locations, items and ledger rows with sensible defaults.

use crate::{
    config::settings::{CategoryConfig, Config},
    core::{
        catalog,
        location::{self, NewLocation},
        transaction::{self, SubmittedItem},
    },
    entities::{food_item, food_transaction, location as location_entity},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

/// Categories every test database starts with, in id order.
pub const TEST_CATEGORIES: [&str; 6] = [
    "Bakery",
    "Canned Goods",
    "Dairy",
    "Fresh Produce",
    "Packaged Foods",
    "Other",
];

/// Creates an in-memory `SQLite` database with all tables initialized and the
/// test categories seeded.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    let config = Config {
        categories: TEST_CATEGORIES
            .iter()
            .map(|name| CategoryConfig {
                name: (*name).to_string(),
            })
            .collect(),
        ..Default::default()
    };
    catalog::seed_categories(&db, &config).await?;
    Ok(db)
}

/// Creates a live production location.
///
/// # Defaults
/// * address: "1 Test St", suburb "Testville", city "New Plymouth"
/// * coordinates: -39.06, 174.1
pub async fn create_test_location(
    db: &DatabaseConnection,
    name: &str,
) -> Result<location_entity::Model> {
    location::create_location(
        db,
        NewLocation {
            name: name.to_string(),
            address_line1: "1 Test St".to_string(),
            suburb: Some("Testville".to_string()),
            city: Some("New Plymouth".to_string()),
            latitude: -39.06,
            longitude: 174.1,
            ..Default::default()
        },
    )
    .await
}

/// Creates a location with an explicit test flag.
pub async fn create_custom_location(
    db: &DatabaseConnection,
    name: &str,
    is_test: bool,
) -> Result<location_entity::Model> {
    location::create_location(
        db,
        NewLocation {
            name: name.to_string(),
            address_line1: "2 Sample Rd".to_string(),
            city: Some("New Plymouth".to_string()),
            latitude: -39.06,
            longitude: 174.1,
            is_test,
            ..Default::default()
        },
    )
    .await
}

/// Creates a location at the given coordinates.
pub async fn create_located(
    db: &DatabaseConnection,
    name: &str,
    latitude: f64,
    longitude: f64,
) -> Result<location_entity::Model> {
    location::create_location(
        db,
        NewLocation {
            name: name.to_string(),
            address_line1: "3 Map Pl".to_string(),
            latitude,
            longitude,
            ..Default::default()
        },
    )
    .await
}

/// Marks a location as deleted.
pub async fn soft_delete_location(db: &DatabaseConnection, location_id: i64) -> Result<()> {
    let found = location_entity::Entity::find_by_id(location_id)
        .one(db)
        .await?
        .ok_or(Error::LocationNotFound { id: location_id })?;
    let mut active: location_entity::ActiveModel = found.into();
    active.is_deleted = Set(true);
    active.update(db).await?;
    Ok(())
}

/// Sets up a seeded database with one production location.
/// Returns (db, location) for common test scenarios.
pub async fn setup_with_location() -> Result<(DatabaseConnection, location_entity::Model)> {
    let db = setup_test_db().await?;
    let location = create_test_location(&db, "Test Pātaka").await?;
    Ok((db, location))
}

/// Donates a single item through the normal ledger path and returns the row written.
pub async fn donate_test_item(
    db: &DatabaseConnection,
    location_id: i64,
    name: &str,
    quantity: i64,
) -> Result<food_transaction::Model> {
    donate_custom_item(db, location_id, name, None, quantity).await
}

/// Donates a single item with a category hint and returns the row written.
pub async fn donate_custom_item(
    db: &DatabaseConnection,
    location_id: i64,
    name: &str,
    category: Option<&str>,
    quantity: i64,
) -> Result<food_transaction::Model> {
    let item = SubmittedItem {
        category: category.map(str::to_string),
        ..SubmittedItem::new(name, quantity)
    };
    let receipt = transaction::record_donation(db, location_id, &[item], None, None).await?;
    let id = receipt
        .transaction_ids
        .first()
        .copied()
        .ok_or(Error::EmptySubmission)?;
    food_transaction::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::EmptySubmission)
}

/// Writes a ledger row directly, skipping every validation. Used to plant rows
/// that the aggregator must tolerate, such as zero quantities or unknown type codes.
pub async fn insert_raw_transaction(
    db: &DatabaseConnection,
    location_id: i64,
    item_id: i64,
    transaction_type: i32,
    quantity: i32,
) -> Result<food_transaction::Model> {
    food_transaction::ActiveModel {
        location_id: Set(location_id),
        item_id: Set(item_id),
        category_id: Set(None),
        transaction_type: Set(transaction_type),
        quantity: Set(quantity),
        comment: Set(None),
        photo_url: Set(None),
        created_at: Set(Utc::now()),
        is_test: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates an item in the shared catalog (no owning location, no category).
pub async fn create_shared_item(db: &DatabaseConnection, name: &str) -> Result<food_item::Model> {
    food_item::ActiveModel {
        name: Set(name.to_string()),
        category_id: Set(None),
        location_id: Set(None),
        is_deleted: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}
