//! Database schema definitions

use rusqlite::Connection;

/// SQL schema for the taxon database
pub const SCHEMA_SQL: &str = r#"
-- One row per discovered taxon, keyed by the site's node id
CREATE TABLE IF NOT EXISTS taxa (
    id INTEGER PRIMARY KEY,
    level INTEGER NOT NULL,
    name TEXT NOT NULL,
    name_cs TEXT,
    parent INTEGER,
    to_visit INTEGER NOT NULL DEFAULT 0,
    discovered_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_taxa_parent ON taxa(parent);
CREATE INDEX IF NOT EXISTS idx_taxa_pending ON taxa(to_visit, level);
"#;

/// Creates all tables and indexes if they do not exist
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
