//! MySQL access through `sqlx`
//!
//! Every value reaches the server as a bound parameter. Statements that
//! select non-text columns cast them to `CHAR`, so rows decode uniformly
//! into optional strings.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow, MySqlSslMode};
use sqlx::query::Query;
use sqlx::{MySql, Row as _};
use stagehand_core::retry::{retry_fixed, RetryPolicy};
use stagehand_core::types::DatabaseSettings;
use stagehand_core::Error;
use tracing::{debug, info};

/// One result row; `None` is SQL `NULL`
pub type Row = Vec<Option<String>>;

/// Minimal SQL surface the deployment needs
///
/// `?` placeholders in `sql` are bound to `params` in order.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run a statement returning rows
    async fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<Row>>;

    /// Run a statement without result rows
    async fn execute(&self, sql: &str, params: &[&str]) -> Result<()>;

    /// True if the configured schema contains `table`
    async fn schema_has_table(&self, table: &str) -> Result<bool>;

    /// First column of the first row, if any
    async fn fetch_one(&self, sql: &str, params: &[&str]) -> Result<Option<String>> {
        let rows = self.query(sql, params).await?;
        Ok(rows.into_iter().next().and_then(|row| row.into_iter().next().flatten()))
    }
}

/// Whether the configured schema exists on the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStatus {
    Present,
    /// Not created yet; `system:install --create-database` creates it
    Missing,
}

impl SchemaStatus {
    /// Status from a `COUNT(*)` over `information_schema.SCHEMATA`
    pub fn from_count(count: i64) -> Self {
        if count > 0 {
            SchemaStatus::Present
        } else {
            SchemaStatus::Missing
        }
    }
}

/// [`Database`] backed by two lazily connecting pools
///
/// The server pool selects no schema and answers `information_schema`
/// questions even before the shop schema exists. The schema pool runs all
/// shop queries.
#[derive(Debug, Clone)]
pub struct MysqlClient {
    settings: DatabaseSettings,
    server: MySqlPool,
    schema: MySqlPool,
}

impl MysqlClient {
    /// Create a client without touching the network
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(settings: DatabaseSettings) -> Self {
        let server = pool_options().connect_lazy_with(connect_options(&settings, false));
        let schema = pool_options().connect_lazy_with(connect_options(&settings, true));
        Self {
            settings,
            server,
            schema,
        }
    }

    /// Create a client and wait until the server answers
    ///
    /// A missing schema is not a failure: it is created by the installer.
    pub async fn connect(settings: DatabaseSettings, policy: &RetryPolicy) -> Result<Self> {
        let client = Self::new(settings);

        retry_fixed(policy, "Database connection", || client.ping())
            .await
            .with_context(|| {
                format!(
                    "Could not connect to database at {}:{}",
                    client.settings.host, client.settings.port
                )
            })?;

        match client.schema_status().await? {
            SchemaStatus::Present => info!(
                "Connected to database {} at {}:{}",
                client.settings.database, client.settings.host, client.settings.port
            ),
            SchemaStatus::Missing => info!(
                "Connected to {}:{}, schema {} does not exist yet",
                client.settings.host, client.settings.port, client.settings.database
            ),
        }
        Ok(client)
    }

    pub fn settings(&self) -> &DatabaseSettings {
        &self.settings
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.server)
            .await
            .map_err(database_error)?;
        Ok(())
    }

    /// Look the configured schema up in `information_schema.SCHEMATA`
    pub async fn schema_status(&self) -> Result<SchemaStatus> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM information_schema.SCHEMATA WHERE SCHEMA_NAME = ?",
        )
        .bind(self.settings.database.as_str())
        .fetch_one(&self.server)
        .await
        .map_err(database_error)?;
        Ok(SchemaStatus::from_count(count))
    }
}

#[async_trait]
impl Database for MysqlClient {
    async fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<Row>> {
        debug!("SQL: {}", sql);
        let rows = bind_all(sqlx::query(sql), params)
            .fetch_all(&self.schema)
            .await
            .map_err(database_error)?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute(&self, sql: &str, params: &[&str]) -> Result<()> {
        debug!("SQL: {}", sql);
        bind_all(sqlx::query(sql), params)
            .execute(&self.schema)
            .await
            .map_err(database_error)?;
        Ok(())
    }

    async fn schema_has_table(&self, table: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM information_schema.TABLES WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?",
        )
        .bind(self.settings.database.as_str())
        .bind(table)
        .fetch_one(&self.server)
        .await
        .map_err(database_error)?;
        Ok(count > 0)
    }
}

fn pool_options() -> MySqlPoolOptions {
    MySqlPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(5))
}

/// Connection options for the server (`with_schema == false`) or the shop schema
pub fn connect_options(settings: &DatabaseSettings, with_schema: bool) -> MySqlConnectOptions {
    let mut options = MySqlConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .username(&settings.user)
        .charset("utf8mb4");

    if let Some(password) = &settings.password {
        options = options.password(password);
    }
    if with_schema {
        options = options.database(&settings.database);
    }
    if let Some(ca) = &settings.ssl_ca {
        options = options.ssl_mode(MySqlSslMode::VerifyCa).ssl_ca(ca);
    }
    if let Some(cert) = &settings.ssl_cert {
        options = options.ssl_client_cert(cert);
    }
    if let Some(key) = &settings.ssl_key {
        options = options.ssl_client_key(key);
    }
    options
}

fn bind_all<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    params: &[&str],
) -> Query<'q, MySql, MySqlArguments> {
    for param in params {
        query = query.bind(param.to_string());
    }
    query
}

fn decode_row(row: &MySqlRow) -> Result<Row> {
    (0..row.len())
        .map(|index| {
            row.try_get_unchecked::<Option<String>, _>(index)
                .map_err(database_error)
        })
        .collect()
}

fn database_error(err: sqlx::Error) -> anyhow::Error {
    Error::database(err.to_string()).into()
}
