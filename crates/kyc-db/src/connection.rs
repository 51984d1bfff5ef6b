//! SurrealDB connection management.

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;

/// Configuration for connecting to SurrealDB.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket URL (e.g., `127.0.0.1:8000`).
    pub url: String,
    /// SurrealDB namespace.
    pub namespace: String,
    /// SurrealDB database name.
    pub database: String,
    /// Root username for authentication.
    pub username: String,
    /// Root password for authentication.
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "kyc".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl DbConfig {
    /// Defaults overridden by `KYC_DB_URL`, `KYC_DB_NAMESPACE`,
    /// `KYC_DB_DATABASE`, `KYC_DB_USERNAME` and `KYC_DB_PASSWORD`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            url: lookup("KYC_DB_URL").unwrap_or(defaults.url),
            namespace: lookup("KYC_DB_NAMESPACE").unwrap_or(defaults.namespace),
            database: lookup("KYC_DB_DATABASE").unwrap_or(defaults.database),
            username: lookup("KYC_DB_USERNAME").unwrap_or(defaults.username),
            password: lookup("KYC_DB_PASSWORD").unwrap_or(defaults.password),
        }
    }
}

/// Owns the remote SurrealDB client the Tag Store repositories share.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Open a WebSocket session, sign in as root and select the
    /// configured namespace and database.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to kyc store"
        );

        let db = Surreal::new::<Ws>(config.url.as_str()).await?;

        // Root sign-in with the configured credentials.
        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;

        // Every repository query runs against this namespace/database pair.
        db.use_ns(config.namespace.as_str())
            .use_db(config.database.as_str())
            .await?;

        info!(namespace = %config.namespace, "kyc store connected");
        Ok(Self { db })
    }

    /// The client handed to each repository (cheap to clone).
    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}
