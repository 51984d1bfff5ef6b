//! KYC Server: Application entry point.

use kyc_core::error::KycResult;
use kyc_db::repository::{
    SurrealEventRepository, SurrealOrganizationRepository, SurrealServiceAdminRepository,
    SurrealUserTagRepository,
};
use kyc_db::{DbConfig, DbManager};
use kyc_directory::{DirectoryConfig, KycService};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kyc=info")),
        )
        .json()
        .init();

    tracing::info!("Starting KYC server...");

    if let Err(e) = run().await {
        tracing::error!(error = %e, code = e.code(), "KYC server failed");
        std::process::exit(1);
    }

    tracing::info!("KYC server stopped.");
}

/// Connect, migrate and apply the configured genesis.
async fn run() -> KycResult<()> {
    let db_config = DbConfig::from_env();
    let directory_config = DirectoryConfig::from_env()?;

    let manager = DbManager::connect(&db_config).await?;
    let db = manager.client();
    kyc_db::run_migrations(db).await?;

    let service = KycService::new(
        SurrealOrganizationRepository::new(db.clone()),
        SurrealUserTagRepository::new(db.clone()),
        SurrealServiceAdminRepository::new(db.clone()),
        SurrealEventRepository::new(db.clone()),
        directory_config,
    );

    if service.bootstrap().await? {
        tracing::info!("Genesis applied");
    }

    match service.get_service_admin().await? {
        Some(admin) => tracing::info!(service_admin = %admin, "Service admin configured"),
        None => tracing::warn!("No service admin configured; set KYC_GENESIS to initialize"),
    }

    let orgs = service.get_orgs().await?;
    tracing::info!(
        orgs = orgs.len(),
        max_expression_len = service.config().max_expression_len,
        "KYC registry ready"
    );

    Ok(())
}
