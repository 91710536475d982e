//! Database configuration module.
//!
//! Handles `SQLite` connections and table creation using `SeaORM`. Tables are generated
//! from the entity definitions with `Schema::create_table_from_entity`, so the schema
//! always matches the Rust structs without hand-written DDL.

use crate::entities::{FoodCategory, FoodItem, FoodTransaction, Issue, Location};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, info, instrument};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/pataka_pal.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or returns the
/// default local `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables from the entity definitions if they do not already exist.
///
/// Parent tables are created before the tables that reference them.
#[instrument(skip(db))]
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut location_table = schema.create_table_from_entity(Location);
    let mut category_table = schema.create_table_from_entity(FoodCategory);
    let mut item_table = schema.create_table_from_entity(FoodItem);
    let mut transaction_table = schema.create_table_from_entity(FoodTransaction);
    let mut issue_table = schema.create_table_from_entity(Issue);

    for table in [
        &mut location_table,
        &mut category_table,
        &mut item_table,
        &mut transaction_table,
        &mut issue_table,
    ] {
        table.if_not_exists();
    }

    db.execute(builder.build(&location_table)).await?;
    db.execute(builder.build(&category_table)).await?;
    db.execute(builder.build(&item_table)).await?;
    db.execute(builder.build(&transaction_table)).await?;
    db.execute(builder.build(&issue_table)).await?;

    info!("Database tables ensured");
    Ok(())
}
