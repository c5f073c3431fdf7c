//! SQLite implementation of the taxon store

use crate::store::schema::initialize_schema;
use crate::store::traits::{Store, StoreResult};
use crate::store::{PendingTaxon, TaxonRecord};
use crate::tree::{Taxon, TaxonId};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite store backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn record_from_row(row: &Row<'_>) -> rusqlite::Result<TaxonRecord> {
        Ok(TaxonRecord {
            id: row.get(0)?,
            level: row.get(1)?,
            name: row.get(2)?,
            name_cs: row.get(3)?,
            parent: row.get(4)?,
            to_visit: row.get::<_, i64>(5)? != 0,
            discovered_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl Store for SqliteStore {
    fn find(&self, id: TaxonId) -> StoreResult<Option<TaxonRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, level, name, name_cs, parent, to_visit, discovered_at, updated_at
             FROM taxa WHERE id = ?1",
        )?;

        let record = stmt
            .query_row(params![id], Self::record_from_row)
            .optional()?;

        Ok(record)
    }

    fn upsert(&mut self, id: TaxonId, taxon: &Taxon) -> StoreResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO taxa (id, level, name, name_cs, parent, to_visit, discovered_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             ON CONFLICT(id) DO UPDATE SET
                 level = excluded.level,
                 name = excluded.name,
                 name_cs = excluded.name_cs,
                 parent = COALESCE(excluded.parent, taxa.parent),
                 to_visit = excluded.to_visit,
                 updated_at = excluded.updated_at",
            params![
                id,
                taxon.level,
                taxon.name,
                taxon.name_cs,
                taxon.parent,
                taxon.to_visit as i64,
                now,
            ],
        )?;
        Ok(())
    }

    fn clear_to_visit(&mut self, id: TaxonId) -> StoreResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE taxa SET to_visit = 0, updated_at = ?2 WHERE id = ?1",
            params![id, now],
        )?;
        Ok(())
    }

    fn pending_exploration(&self, level_below: i32) -> StoreResult<Vec<PendingTaxon>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, COUNT(c.id) AS children
             FROM taxa t
             LEFT JOIN taxa c ON c.parent = t.id
             WHERE t.to_visit = 1 AND t.level < ?1
             GROUP BY t.id
             ORDER BY children ASC, t.id ASC",
        )?;

        let rows = stmt
            .query_map(params![level_below], |row| {
                Ok(PendingTaxon {
                    id: row.get(0)?,
                    children: row.get::<_, i64>(1)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn count_taxa(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM taxa", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_pending(&self) -> StoreResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM taxa WHERE to_visit = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taxon(level: i32, parent: Option<TaxonId>, to_visit: bool) -> Taxon {
        Taxon {
            level,
            name: "Rosa".to_string(),
            name_cs: Some("růže".to_string()),
            parent,
            to_visit,
        }
    }

    #[test]
    fn test_find_missing() {
        let store = SqliteStore::new_in_memory().unwrap();
        assert!(store.find(1).unwrap().is_none());
    }

    #[test]
    fn test_upsert_inserts_and_finds() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store.upsert(10, &taxon(130, Some(3), true)).unwrap();

        let record = store.find(10).unwrap().unwrap();
        assert_eq!(record.level, 130);
        assert_eq!(record.name, "Rosa");
        assert_eq!(record.parent, Some(3));
        assert!(record.to_visit);
    }

    #[test]
    fn test_upsert_merges_by_id() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store.upsert(10, &taxon(130, Some(3), true)).unwrap();

        let mut second = taxon(130, Some(3), false);
        second.name = "Rosa L.".to_string();
        store.upsert(10, &second).unwrap();

        let record = store.find(10).unwrap().unwrap();
        assert_eq!(record.name, "Rosa L.");
        assert!(!record.to_visit);
        assert_eq!(store.count_taxa().unwrap(), 1);
    }

    #[test]
    fn test_merge_keeps_parent_when_absent() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store.upsert(10, &taxon(130, Some(3), true)).unwrap();

        // Re-discovery detached by a continuation marker has no parent
        store.upsert(10, &taxon(130, None, false)).unwrap();

        let record = store.find(10).unwrap().unwrap();
        assert_eq!(record.parent, Some(3));
    }

    #[test]
    fn test_merge_overwrites_parent_when_present() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store.upsert(10, &taxon(130, Some(3), true)).unwrap();
        store.upsert(10, &taxon(130, Some(7), false)).unwrap();

        let record = store.find(10).unwrap().unwrap();
        assert_eq!(record.parent, Some(7));
    }

    #[test]
    fn test_clear_to_visit() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store.upsert(10, &taxon(130, None, true)).unwrap();
        store.clear_to_visit(10).unwrap();
        assert!(!store.find(10).unwrap().unwrap().to_visit);

        // Unknown id is a no-op, not an error
        store.clear_to_visit(999).unwrap();
    }

    #[test]
    fn test_pending_exploration_orders_by_child_count() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        // Three unexplored broad groups with 5, 0 and 2 stored children
        store.upsert(1, &taxon(100, None, true)).unwrap();
        store.upsert(2, &taxon(100, None, true)).unwrap();
        store.upsert(3, &taxon(100, None, true)).unwrap();
        for (id, parent) in [(11, 1), (12, 1), (13, 1), (14, 1), (15, 1), (31, 3), (32, 3)] {
            store.upsert(id, &taxon(150, Some(parent), false)).unwrap();
        }

        let pending = store.pending_exploration(130).unwrap();
        let order: Vec<(TaxonId, u64)> = pending.iter().map(|p| (p.id, p.children)).collect();
        assert_eq!(order, vec![(2, 0), (3, 2), (1, 5)]);
    }

    #[test]
    fn test_pending_exploration_filters_level_and_flag() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store.upsert(1, &taxon(100, None, true)).unwrap();
        // Too narrow for reseeding despite the flag
        store.upsert(2, &taxon(140, None, true)).unwrap();
        // Broad but already explored
        store.upsert(3, &taxon(100, None, false)).unwrap();

        let pending = store.pending_exploration(130).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, 1);
    }

    #[test]
    fn test_counts() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store.upsert(1, &taxon(100, None, true)).unwrap();
        store.upsert(2, &taxon(150, Some(1), false)).unwrap();
        assert_eq!(store.count_taxa().unwrap(), 2);
        assert_eq!(store.count_pending().unwrap(), 1);
    }
}
