//! SQL quota store backend.

use async_trait::async_trait;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row};
use time::{Date, OffsetDateTime};
use time::macros::format_description;
use tracing::debug;

use crate::error::EntitleError;
use crate::key::MeteredFeatureKind;
use crate::store::{Increment, QuotaStore, utc_day};

use super::config::SqlQuotaConfig;
use super::queries;

/// Database type enum for query selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    /// PostgreSQL database.
    PostgreSQL,
    /// MySQL/MariaDB database.
    MySQL,
    /// SQLite database.
    SQLite,
}

impl DatabaseType {
    /// Detect database type from URL.
    pub fn from_url(url: &str) -> Option<Self> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Some(Self::PostgreSQL)
        } else if url.starts_with("mysql://") || url.starts_with("mariadb://") {
            Some(Self::MySQL)
        } else if url.starts_with("sqlite:") {
            Some(Self::SQLite)
        } else {
            None
        }
    }
}

/// Render a day as stored in the `day` column (`YYYY-MM-DD`).
pub fn format_day(day: Date) -> String {
    format!("{:04}-{:02}-{:02}", day.year(), u8::from(day.month()), day.day())
}

/// Parse a `YYYY-MM-DD` day.
pub fn parse_day(s: &str) -> Result<Date, time::error::Parse> {
    Date::parse(s.trim(), format_description!("[year]-[month]-[day]"))
}

/// One stored counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRecord {
    pub kind: MeteredFeatureKind,
    pub day: Date,
    pub count: u32,
}

/// SQL-backed [`QuotaStore`].
///
/// `try_increment` runs in one transaction: the row is created at zero if
/// missing, then a conditional `UPDATE ... WHERE usage_count < limit` takes
/// the row lock. The increment is admitted iff that update touched a row, so
/// concurrent callers on the same key never exceed the limit.
pub struct SqlQuotaStore {
    pool: AnyPool,
    db_type: DatabaseType,
}

impl SqlQuotaStore {
    /// Connect to the database.
    pub async fn connect(config: SqlQuotaConfig) -> Result<Self, EntitleError> {
        // Install database drivers for the "any" pool
        sqlx::any::install_default_drivers();

        let db_type = DatabaseType::from_url(&config.database_url)
            .ok_or_else(|| EntitleError::backend("unsupported database URL scheme"))?;

        let pool = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .max_lifetime(config.max_lifetime)
            .idle_timeout(config.idle_timeout)
            .connect(&config.database_url)
            .await?;

        debug!(?db_type, max_connections = config.max_connections, "quota store connected");
        Ok(Self { pool, db_type })
    }

    /// Create the usage table if it does not exist.
    pub async fn init_schema(&self) -> Result<(), EntitleError> {
        let query = match self.db_type {
            DatabaseType::PostgreSQL => queries::CREATE_TABLE_PG,
            DatabaseType::MySQL => queries::CREATE_TABLE_MYSQL,
            DatabaseType::SQLite => queries::CREATE_TABLE_SQLITE,
        };
        sqlx::query(query).execute(&self.pool).await?;
        Ok(())
    }

    /// All counters of a user, optionally restricted to one day.
    pub async fn usage_for_user(
        &self,
        user_id: &str,
        day: Option<Date>,
    ) -> Result<Vec<UsageRecord>, EntitleError> {
        let rows = match day {
            Some(day) => {
                let query = match self.db_type {
                    DatabaseType::PostgreSQL => queries::SELECT_USER_DAY_PG,
                    DatabaseType::MySQL | DatabaseType::SQLite => queries::SELECT_USER_DAY_MYSQL,
                };
                sqlx::query(query)
                    .bind(user_id)
                    .bind(format_day(day))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let query = match self.db_type {
                    DatabaseType::PostgreSQL => queries::SELECT_USER_PG,
                    DatabaseType::MySQL | DatabaseType::SQLite => queries::SELECT_USER_MYSQL,
                };
                sqlx::query(query)
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter().map(Self::parse_usage_row).collect()
    }

    /// Delete counters for days strictly before `day`. Returns rows removed.
    ///
    /// `day` is capped at the current UTC day, so live counters are never deleted.
    pub async fn prune_before(&self, day: Date) -> Result<u64, EntitleError> {
        let day = day.min(utc_day(OffsetDateTime::now_utc()));
        let query = match self.db_type {
            DatabaseType::PostgreSQL => queries::DELETE_BEFORE_PG,
            DatabaseType::MySQL | DatabaseType::SQLite => queries::DELETE_BEFORE_MYSQL,
        };
        let result = sqlx::query(query)
            .bind(format_day(day))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Get the connection pool (for advanced usage).
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Get database type.
    pub fn database_type(&self) -> DatabaseType {
        self.db_type
    }

    fn parse_usage_row(row: AnyRow) -> Result<UsageRecord, EntitleError> {
        let kind: String = row.try_get("kind")?;
        let day: String = row.try_get("day")?;
        let count: i64 = row.try_get("usage_count")?;
        Ok(UsageRecord {
            kind: MeteredFeatureKind::new(kind),
            day: parse_day(&day).map_err(EntitleError::backend)?,
            count: to_count(count)?,
        })
    }

    fn select_count_query(&self) -> &'static str {
        match self.db_type {
            DatabaseType::PostgreSQL => queries::SELECT_COUNT_PG,
            DatabaseType::MySQL | DatabaseType::SQLite => queries::SELECT_COUNT_MYSQL,
        }
    }
}

fn to_count(value: i64) -> Result<u32, EntitleError> {
    u32::try_from(value).map_err(|_| EntitleError::backend(format!("counter out of range: {value}")))
}

#[async_trait]
impl QuotaStore for SqlQuotaStore {
    async fn current_usage(
        &self,
        user_id: &str,
        kind: &MeteredFeatureKind,
        day: Date,
    ) -> Result<u32, EntitleError> {
        let row = sqlx::query(self.select_count_query())
            .bind(user_id)
            .bind(kind.as_str())
            .bind(format_day(day))
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => to_count(row.try_get("usage_count")?),
            None => Ok(0),
        }
    }

    async fn try_increment(
        &self,
        user_id: &str,
        kind: &MeteredFeatureKind,
        day: Date,
        limit: u32,
    ) -> Result<Increment, EntitleError> {
        let day = format_day(day);
        let (ensure, increment) = match self.db_type {
            DatabaseType::PostgreSQL => (queries::ENSURE_ROW_PG, queries::INCREMENT_BELOW_LIMIT_PG),
            DatabaseType::MySQL => (queries::ENSURE_ROW_MYSQL, queries::INCREMENT_BELOW_LIMIT_MYSQL),
            DatabaseType::SQLite => (queries::ENSURE_ROW_SQLITE, queries::INCREMENT_BELOW_LIMIT_MYSQL),
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(ensure)
            .bind(user_id)
            .bind(kind.as_str())
            .bind(&day)
            .execute(&mut *tx)
            .await?;

        let updated = sqlx::query(increment)
            .bind(user_id)
            .bind(kind.as_str())
            .bind(&day)
            .bind(i64::from(limit))
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query(self.select_count_query())
            .bind(user_id)
            .bind(kind.as_str())
            .bind(&day)
            .fetch_one(&mut *tx)
            .await?;
        let count = to_count(row.try_get("usage_count")?)?;

        tx.commit().await?;

        Ok(Increment {
            count,
            admitted: updated.rows_affected() == 1,
        })
    }
}
