//! SQL queries for different databases.
//!
//! PostgreSQL uses `$n` placeholders; MySQL and SQLite use `?`.

/// Usage table (PostgreSQL).
pub const CREATE_TABLE_PG: &str = r#"
CREATE TABLE IF NOT EXISTS entitle_usage (
    user_id VARCHAR(255) NOT NULL,
    kind VARCHAR(128) NOT NULL,
    day VARCHAR(10) NOT NULL,
    usage_count BIGINT NOT NULL DEFAULT 0,
    PRIMARY KEY (user_id, kind, day)
)
"#;

/// Usage table (MySQL).
pub const CREATE_TABLE_MYSQL: &str = r#"
CREATE TABLE IF NOT EXISTS entitle_usage (
    user_id VARCHAR(255) NOT NULL,
    kind VARCHAR(128) NOT NULL,
    day CHAR(10) NOT NULL,
    usage_count BIGINT NOT NULL DEFAULT 0,
    PRIMARY KEY (user_id, kind, day)
)
"#;

/// Usage table (SQLite).
pub const CREATE_TABLE_SQLITE: &str = r#"
CREATE TABLE IF NOT EXISTS entitle_usage (
    user_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    day TEXT NOT NULL,
    usage_count INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (user_id, kind, day)
)
"#;

/// Create the counter row at zero if missing (PostgreSQL).
pub const ENSURE_ROW_PG: &str = r#"
INSERT INTO entitle_usage (user_id, kind, day, usage_count)
VALUES ($1, $2, $3, 0)
ON CONFLICT (user_id, kind, day) DO NOTHING
"#;

/// Create the counter row at zero if missing (MySQL).
pub const ENSURE_ROW_MYSQL: &str = r#"
INSERT IGNORE INTO entitle_usage (user_id, kind, day, usage_count)
VALUES (?, ?, ?, 0)
"#;

/// Create the counter row at zero if missing (SQLite).
pub const ENSURE_ROW_SQLITE: &str = r#"
INSERT INTO entitle_usage (user_id, kind, day, usage_count)
VALUES (?, ?, ?, 0)
ON CONFLICT (user_id, kind, day) DO NOTHING
"#;

/// Conditional increment (PostgreSQL). Affects one row iff admitted.
pub const INCREMENT_BELOW_LIMIT_PG: &str = r#"
UPDATE entitle_usage
SET usage_count = usage_count + 1
WHERE user_id = $1 AND kind = $2 AND day = $3 AND usage_count < $4
"#;

/// Conditional increment (MySQL/SQLite). Affects one row iff admitted.
pub const INCREMENT_BELOW_LIMIT_MYSQL: &str = r#"
UPDATE entitle_usage
SET usage_count = usage_count + 1
WHERE user_id = ? AND kind = ? AND day = ? AND usage_count < ?
"#;

/// Read one counter (PostgreSQL).
pub const SELECT_COUNT_PG: &str = r#"
SELECT usage_count FROM entitle_usage
WHERE user_id = $1 AND kind = $2 AND day = $3
"#;

/// Read one counter (MySQL/SQLite).
pub const SELECT_COUNT_MYSQL: &str = r#"
SELECT usage_count FROM entitle_usage
WHERE user_id = ? AND kind = ? AND day = ?
"#;

/// All counters of a user (PostgreSQL).
pub const SELECT_USER_PG: &str = r#"
SELECT kind, day, usage_count FROM entitle_usage
WHERE user_id = $1
ORDER BY day DESC, kind
"#;

/// All counters of a user (MySQL/SQLite).
pub const SELECT_USER_MYSQL: &str = r#"
SELECT kind, day, usage_count FROM entitle_usage
WHERE user_id = ?
ORDER BY day DESC, kind
"#;

/// Counters of a user on one day (PostgreSQL).
pub const SELECT_USER_DAY_PG: &str = r#"
SELECT kind, day, usage_count FROM entitle_usage
WHERE user_id = $1 AND day = $2
ORDER BY kind
"#;

/// Counters of a user on one day (MySQL/SQLite).
pub const SELECT_USER_DAY_MYSQL: &str = r#"
SELECT kind, day, usage_count FROM entitle_usage
WHERE user_id = ? AND day = ?
ORDER BY kind
"#;

/// Delete counters older than a day (PostgreSQL).
pub const DELETE_BEFORE_PG: &str = r#"
DELETE FROM entitle_usage WHERE day < $1
"#;

/// Delete counters older than a day (MySQL/SQLite).
pub const DELETE_BEFORE_MYSQL: &str = r#"
DELETE FROM entitle_usage WHERE day < ?
"#;
