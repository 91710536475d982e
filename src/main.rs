use dotenvy::dotenv;
use pataka_pal::{
    config::{
        database,
        settings::{self, Config},
    },
    core::{catalog, report},
    errors::Result,
};
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Load config.toml, falling back to an empty configuration when absent
    let config = if Path::new(settings::DEFAULT_CONFIG_PATH).exists() {
        settings::load_default_config().inspect_err(|e| {
            error!("Failed to load {}: {}", settings::DEFAULT_CONFIG_PATH, e);
        })?
    } else {
        warn!(
            "{} not found, no categories will be seeded",
            settings::DEFAULT_CONFIG_PATH
        );
        Config::default()
    };

    // 4. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;

    // 5. Seed categories
    catalog::seed_categories(&db, &config).await?;

    // 6. Print the cupboard listing
    let summaries =
        report::build_cupboard_summaries(&db, config.listing.include_test, chrono::Utc::now())
            .await?;
    info!("Listing {} pātaka", summaries.len());
    println!("{}", serde_json::to_string_pretty(&summaries)?);

    Ok(())
}
