use dotenvy::dotenv;
use shipdesk::{
    config::{database, seed},
    core::status::StatusCatalog,
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the lookup seed configuration
    let seed_config = seed::load_default_config()
        .inspect(|_| info!("Loaded seed configuration."))
        .inspect_err(|e| error!("Failed to load seed configuration: {}", e))?;

    // 4. Connect and create any missing tables
    if database::get_database_url() == database::DEFAULT_DATABASE_URL {
        std::fs::create_dir_all("data")?;
    }
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database schema is up to date."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed statuses, permissions, roles and menus
    seed::seed_lookups(&db, &seed_config)
        .await
        .inspect_err(|e| error!("Failed to seed lookups: {}", e))?;

    // 6. Report the status catalog the order lifecycle will run against
    let catalog = StatusCatalog::load(&db).await?;
    for stage in shipdesk::core::status::ShipmentStage::ALL {
        match catalog.id_of(stage) {
            Some(id) => info!("Shipment stage {:?} -> status {}", stage, id),
            None => error!(
                "Shipment status '{}' is missing, related operations will fail",
                stage.display_name()
            ),
        }
    }

    Ok(())
}
