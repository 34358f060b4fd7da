//! # Database Provisioner
//!
//! Idempotent preparation of a tenant's backing storage: ensure the target
//! database exists, ensure the tenant's schema exists inside it, and hand
//! back a schema-scoped connection descriptor.
//!
//! ## Idempotency
//!
//! Both task redelivery and operator retries can invoke preparation more
//! than once for the same tenant, so every step treats "already exists" as
//! success. Database creation additionally treats a duplicate-database
//! error as success: two concurrent first-provisions for the same new
//! dedicated database can both pass the existence check, and only one
//! `CREATE DATABASE` can win.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{Connection, Executor, PgConnection};
use thiserror::Error;
use tracing::{debug, info, instrument};

/// SQLSTATE for "database already exists"
const DUPLICATE_DATABASE: &str = "42P04";

/// Errors raised while preparing tenant storage
#[derive(Debug, Error)]
pub enum ProvisionerError {
    #[error("invalid identifier {identifier:?}: {reason}")]
    InvalidIdentifier { identifier: String, reason: String },

    #[error("failed to connect to {database}: {source}")]
    Connect {
        database: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("storage preparation failed for {database}.{schema}: {source}")]
    Preparation {
        database: String,
        schema: String,
        #[source]
        source: sqlx::Error,
    },
}

/// Connection descriptor scoped to a database with a default search path,
/// so callers need no further schema qualification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    pub database: String,
    pub schema: String,
}

impl ConnectionDescriptor {
    pub fn new(database: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            schema: schema.into(),
        }
    }

    /// Connection URL for this descriptor, derived from a base server URL.
    /// The schema is applied as the connection's default search path.
    pub fn connection_url(&self, base_url: &str) -> String {
        format!(
            "{}/{}?options=-csearch_path%3D{}",
            server_root(base_url),
            self.database,
            self.schema
        )
    }
}

/// Strip any database path and query string from a server URL
fn server_root(url: &str) -> &str {
    let without_query = url.split('?').next().unwrap_or(url);
    // Look for a path separator after the scheme's "://"
    let authority_start = without_query.find("://").map_or(0, |idx| idx + 3);
    match without_query[authority_start..].find('/') {
        Some(idx) => &without_query[..authority_start + idx],
        None => without_query,
    }
}

/// Storage-preparation seam used by the orchestrator
#[async_trait]
pub trait StorageProvisioner: Send + Sync {
    /// Ensure `database` and `schema` exist and return a schema-scoped
    /// connection descriptor. Safe to call repeatedly with the same
    /// arguments.
    async fn prepare(
        &self,
        database: &str,
        schema: &str,
    ) -> Result<ConnectionDescriptor, ProvisionerError>;
}

/// PostgreSQL-backed storage provisioner
#[derive(Debug, Clone)]
pub struct DatabaseProvisioner {
    admin_url: String,
}

impl DatabaseProvisioner {
    /// Create a provisioner connecting through the given maintenance
    /// database URL.
    pub fn new(admin_url: impl Into<String>) -> Self {
        Self {
            admin_url: admin_url.into(),
        }
    }

    fn url_for_database(&self, database: &str) -> String {
        format!("{}/{}", server_root(&self.admin_url), database)
    }

    async fn ensure_database(&self, database: &str) -> Result<(), ProvisionerError> {
        let mut admin =
            PgConnection::connect(&self.admin_url)
                .await
                .map_err(|e| ProvisionerError::Connect {
                    database: "maintenance".to_string(),
                    source: e,
                })?;

        let exists: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM pg_database WHERE datname = $1")
                .bind(database)
                .fetch_optional(&mut admin)
                .await
                .map_err(|e| ProvisionerError::Preparation {
                    database: database.to_string(),
                    schema: String::new(),
                    source: e,
                })?;

        if exists.is_some() {
            debug!(database = database, "Database already exists");
            return Ok(());
        }

        // CREATE DATABASE cannot be parameterized; identifiers were
        // validated against the tenant-code alphabet above.
        let create = format!("CREATE DATABASE \"{database}\"");
        match admin.execute(create.as_str()).await {
            Ok(_) => {
                info!(database = database, "Created database");
                Ok(())
            }
            Err(e) if is_duplicate_database(&e) => {
                // Lost the check-then-create race to a concurrent provision
                debug!(database = database, "Database created concurrently");
                Ok(())
            }
            Err(e) => Err(ProvisionerError::Preparation {
                database: database.to_string(),
                schema: String::new(),
                source: e,
            }),
        }
    }

    async fn ensure_schema(&self, database: &str, schema: &str) -> Result<(), ProvisionerError> {
        let url = self.url_for_database(database);
        let mut conn =
            PgConnection::connect(&url)
                .await
                .map_err(|e| ProvisionerError::Connect {
                    database: database.to_string(),
                    source: e,
                })?;

        let create = format!("CREATE SCHEMA IF NOT EXISTS \"{schema}\"");
        conn.execute(create.as_str())
            .await
            .map_err(|e| ProvisionerError::Preparation {
                database: database.to_string(),
                schema: schema.to_string(),
                source: e,
            })?;

        debug!(database = database, schema = schema, "Schema ensured");
        Ok(())
    }
}

#[async_trait]
impl StorageProvisioner for DatabaseProvisioner {
    #[instrument(skip(self))]
    async fn prepare(
        &self,
        database: &str,
        schema: &str,
    ) -> Result<ConnectionDescriptor, ProvisionerError> {
        validate_identifier(database)?;
        validate_identifier(schema)?;

        self.ensure_database(database).await?;
        self.ensure_schema(database, schema).await?;

        info!(
            database = database,
            schema = schema,
            "Tenant storage prepared"
        );
        Ok(ConnectionDescriptor::new(database, schema))
    }
}

fn is_duplicate_database(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == DUPLICATE_DATABASE)
}

/// Identifiers are interpolated into DDL, so restrict them to the
/// tenant-code alphabet before any SQL is built.
fn validate_identifier(identifier: &str) -> Result<(), ProvisionerError> {
    if identifier.is_empty() {
        return Err(ProvisionerError::InvalidIdentifier {
            identifier: identifier.to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    if !crate::validation::is_valid_identifier(identifier) {
        return Err(ProvisionerError::InvalidIdentifier {
            identifier: identifier.to_string(),
            reason: "only alphanumerics, underscore, and dash are allowed".to_string(),
        });
    }

    Ok(())
}
