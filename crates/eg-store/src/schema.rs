use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: i64 = 2;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;

    // Fresh databases get every column. Older files keep their tables, and
    // the ALTER TABLE steps below fill in what they lack.
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS levels (
            n        INTEGER PRIMARY KEY,
            complete INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS entries (
            n           INTEGER NOT NULL,
            hash        TEXT NOT NULL,
            edges       TEXT NOT NULL,
            eigenvalues TEXT NOT NULL,
            analytic    INTEGER NOT NULL,
            method      TEXT NOT NULL,
            reason      TEXT,
            family      TEXT,
            provenance  TEXT NOT NULL DEFAULT 'fresh',
            PRIMARY KEY (n, hash)
        );

        CREATE TABLE IF NOT EXISTS rejections (
            n      INTEGER NOT NULL,
            hash   TEXT NOT NULL,
            edges  TEXT NOT NULL,
            reason TEXT NOT NULL DEFAULT '',
            PRIMARY KEY (n, hash)
        );

        CREATE TABLE IF NOT EXISTS poly_cache (
            n              INTEGER NOT NULL,
            poly_hash      TEXT NOT NULL,
            classification TEXT NOT NULL,
            PRIMARY KEY (n, poly_hash)
        );

        CREATE TABLE IF NOT EXISTS products (
            n           INTEGER NOT NULL,
            hash        TEXT NOT NULL,
            kind        TEXT NOT NULL,
            left_hash   TEXT NOT NULL,
            right_hash  TEXT NOT NULL,
            edges       TEXT NOT NULL,
            eigenvalues TEXT NOT NULL,
            PRIMARY KEY (n, hash)
        );

        CREATE TABLE IF NOT EXISTS product_levels (
            n INTEGER PRIMARY KEY
        );
        ",
    )?;

    // v1 entries carried neither a family label nor a provenance
    if conn.prepare("SELECT family FROM entries LIMIT 0").is_err() {
        conn.execute_batch("ALTER TABLE entries ADD COLUMN family TEXT;")?;
    }
    if conn.prepare("SELECT provenance FROM entries LIMIT 0").is_err() {
        conn.execute_batch(
            "ALTER TABLE entries ADD COLUMN provenance TEXT NOT NULL DEFAULT 'fresh';",
        )?;
    }

    conn.execute_batch("CREATE INDEX IF NOT EXISTS idx_entries_analytic ON entries(n, analytic);")?;

    let previous = get_schema_version(conn)?;
    if previous.is_some_and(|v| v < SCHEMA_VERSION) {
        tracing::info!(from = ?previous, to = SCHEMA_VERSION, "migrated graph database schema");
    }
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT value FROM metadata WHERE key = 'schema_version'")?;
    let version = stmt
        .query_row([], |row| {
            let v: String = row.get(0)?;
            Ok(v.parse::<i64>().unwrap_or(0))
        })
        .ok();
    Ok(version)
}
