use sea_orm::DatabaseConnection;

use crate::server::{
    config::Config,
    error::Error,
    mapping::{Mapper, MappingConfiguration},
};

/// Connect to the database and run migrations
pub async fn connect_to_database(config: &Config) -> Result<DatabaseConnection, Error> {
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database};

    let mut opt = ConnectOptions::new(&config.database_url);
    opt.sqlx_logging(false);

    let db = Database::connect(opt).await?;

    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Build the mapper with the built-in entity and transport object profiles
pub fn build_mapper() -> Mapper {
    MappingConfiguration::configure(Vec::new())
}

/// Initialize tracing output, filtered by `RUST_LOG` (default `info`)
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
