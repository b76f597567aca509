use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::Result;
use crate::models::{Dataset, ExportRecord, RecentFileEntry, ViewTemplate};

/// Persistence for loaded datasets and the bookkeeping around them.
pub trait DatasetStore {
    fn save(&mut self, name: &str, dataset: &Dataset) -> Result<()>;
    fn load(&self, name: &str) -> Result<Option<Dataset>>;
    /// Stored dataset names, sorted.
    fn list(&self) -> Result<Vec<String>>;
    fn remove(&mut self, name: &str) -> Result<bool>;

    /// Put `entry` at the front of the recent list, keeping an existing pin,
    /// then evict unpinned entries beyond `limit`.
    fn record_recent(&mut self, entry: RecentFileEntry, limit: usize) -> Result<()>;
    /// Pinned first, then newest first.
    fn recent(&self) -> Result<Vec<RecentFileEntry>>;
    fn set_pinned(&mut self, name: &str, pinned: bool) -> Result<bool>;
    /// Drops the entry and its stored dataset.
    fn remove_recent(&mut self, name: &str) -> Result<bool>;

    fn save_template(&mut self, template: &ViewTemplate) -> Result<()>;
    fn template(&self, name: &str) -> Result<Option<ViewTemplate>>;
    fn templates(&self) -> Result<Vec<ViewTemplate>>;
    fn remove_template(&mut self, name: &str) -> Result<bool>;

    fn record_export(&mut self, record: &ExportRecord) -> Result<()>;
    /// Export history, oldest first.
    fn exports(&self) -> Result<Vec<ExportRecord>>;

    /// Forget recent files, templates and export history. Stored datasets
    /// stay.
    fn clear(&mut self) -> Result<()>;

    fn search_recent(&self, term: &str) -> Result<Vec<RecentFileEntry>> {
        let needle = term.to_lowercase();
        Ok(self
            .recent()?
            .into_iter()
            .filter(|e| e.name.to_lowercase().contains(&needle))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Recent-file list rules
// ---------------------------------------------------------------------------

/// New list after recording `entry`, newest first.
pub fn push_recent(
    current: &[RecentFileEntry],
    mut entry: RecentFileEntry,
    limit: usize,
) -> Vec<RecentFileEntry> {
    if let Some(existing) = current.iter().find(|e| e.name == entry.name) {
        entry.is_pinned |= existing.is_pinned;
    }
    let rest = current.iter().filter(|e| e.name != entry.name).cloned();
    let mut unpinned = 0;
    std::iter::once(entry.clone())
        .chain(rest)
        .filter(|e| {
            if e.is_pinned {
                return true;
            }
            unpinned += 1;
            unpinned <= limit
        })
        .collect()
}

pub fn order_recent(mut entries: Vec<RecentFileEntry>) -> Vec<RecentFileEntry> {
    entries.sort_by(|a, b| b.is_pinned.cmp(&a.is_pinned).then_with(|| b.date.cmp(&a.date)));
    entries
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS datasets (
    name TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    saved_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS recent_files (
    name TEXT PRIMARY KEY,
    position INTEGER NOT NULL,
    date TEXT NOT NULL,
    size INTEGER NOT NULL,
    is_pinned INTEGER DEFAULT 0
);

CREATE TABLE IF NOT EXISTS templates (
    name TEXT PRIMARY KEY,
    settings TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS export_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    time TEXT NOT NULL,
    filename TEXT NOT NULL
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    if let Some(dir) = db_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = get_connection(db_path)?;
        init_db(&conn)?;
        debug!(path = %db_path.display(), "opened store");
        Ok(Self { conn })
    }

    /// Recent entries in stored (recording) order.
    fn recent_raw(&self) -> Result<Vec<RecentFileEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, date, size, is_pinned FROM recent_files ORDER BY position")?;
        let rows = stmt.query_map([], |row| {
            Ok(RecentFileEntry {
                name: row.get(0)?,
                date: row.get(1)?,
                size: row.get::<_, i64>(2)? as u64,
                is_pinned: row.get::<_, i64>(3)? != 0,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn write_recent(&mut self, entries: &[RecentFileEntry]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM recent_files", [])?;
        for (i, e) in entries.iter().enumerate() {
            tx.execute(
                "INSERT INTO recent_files (name, position, date, size, is_pinned) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![e.name, i as i64, e.date, e.size as i64, e.is_pinned as i64],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

impl DatasetStore for SqliteStore {
    fn save(&mut self, name: &str, dataset: &Dataset) -> Result<()> {
        let payload = serde_json::to_string(dataset)?;
        self.conn.execute(
            "INSERT INTO datasets (name, payload) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET payload = excluded.payload, saved_at = datetime('now')",
            params![name, payload],
        )?;
        info!(dataset = name, rows = dataset.len(), "stored dataset");
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Option<Dataset>> {
        let payload: Option<String> = self
            .conn
            .query_row("SELECT payload FROM datasets WHERE name = ?1", [name], |r| r.get(0))
            .optional()?;
        match payload {
            Some(p) => Ok(Some(serde_json::from_str(&p)?)),
            None => Ok(None),
        }
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM datasets ORDER BY name")?;
        let names = stmt.query_map([], |row| row.get(0))?;
        Ok(names.collect::<std::result::Result<Vec<String>, _>>()?)
    }

    fn remove(&mut self, name: &str) -> Result<bool> {
        let n = self.conn.execute("DELETE FROM datasets WHERE name = ?1", [name])?;
        Ok(n > 0)
    }

    fn record_recent(&mut self, entry: RecentFileEntry, limit: usize) -> Result<()> {
        let next = push_recent(&self.recent_raw()?, entry, limit);
        self.write_recent(&next)
    }

    fn recent(&self) -> Result<Vec<RecentFileEntry>> {
        Ok(order_recent(self.recent_raw()?))
    }

    fn set_pinned(&mut self, name: &str, pinned: bool) -> Result<bool> {
        let n = self.conn.execute(
            "UPDATE recent_files SET is_pinned = ?1 WHERE name = ?2",
            params![pinned as i64, name],
        )?;
        Ok(n > 0)
    }

    fn remove_recent(&mut self, name: &str) -> Result<bool> {
        let n = self.conn.execute("DELETE FROM recent_files WHERE name = ?1", [name])?;
        self.remove(name)?;
        Ok(n > 0)
    }

    fn save_template(&mut self, template: &ViewTemplate) -> Result<()> {
        let settings = serde_json::to_string(&template.settings)?;
        self.conn.execute(
            "INSERT INTO templates (name, settings) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET settings = excluded.settings",
            params![template.name, settings],
        )?;
        Ok(())
    }

    fn template(&self, name: &str) -> Result<Option<ViewTemplate>> {
        let settings: Option<String> = self
            .conn
            .query_row("SELECT settings FROM templates WHERE name = ?1", [name], |r| r.get(0))
            .optional()?;
        match settings {
            Some(s) => Ok(Some(ViewTemplate {
                name: name.to_string(),
                settings: serde_json::from_str(&s)?,
            })),
            None => Ok(None),
        }
    }

    fn templates(&self) -> Result<Vec<ViewTemplate>> {
        let mut stmt = self.conn.prepare("SELECT name, settings FROM templates ORDER BY name")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(name, s)| {
                Ok(ViewTemplate {
                    name,
                    settings: serde_json::from_str(&s)?,
                })
            })
            .collect()
    }

    fn remove_template(&mut self, name: &str) -> Result<bool> {
        let n = self.conn.execute("DELETE FROM templates WHERE name = ?1", [name])?;
        Ok(n > 0)
    }

    fn record_export(&mut self, record: &ExportRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO export_history (kind, time, filename) VALUES (?1, ?2, ?3)",
            params![record.kind, record.time, record.filename],
        )?;
        debug!(kind = %record.kind, filename = %record.filename, "recorded export");
        Ok(())
    }

    fn exports(&self) -> Result<Vec<ExportRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT kind, time, filename FROM export_history ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(ExportRecord {
                kind: row.get(0)?,
                time: row.get(1)?,
                filename: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn clear(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "DELETE FROM recent_files; DELETE FROM templates; DELETE FROM export_history;",
        )?;
        info!("cleared recent files, templates and export history");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryStore {
    datasets: BTreeMap<String, Dataset>,
    recent: Vec<RecentFileEntry>,
    templates: BTreeMap<String, ViewTemplate>,
    exports: Vec<ExportRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DatasetStore for MemoryStore {
    fn save(&mut self, name: &str, dataset: &Dataset) -> Result<()> {
        self.datasets.insert(name.to_string(), dataset.clone());
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Option<Dataset>> {
        Ok(self.datasets.get(name).cloned())
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(self.datasets.keys().cloned().collect())
    }

    fn remove(&mut self, name: &str) -> Result<bool> {
        Ok(self.datasets.remove(name).is_some())
    }

    fn record_recent(&mut self, entry: RecentFileEntry, limit: usize) -> Result<()> {
        self.recent = push_recent(&self.recent, entry, limit);
        Ok(())
    }

    fn recent(&self) -> Result<Vec<RecentFileEntry>> {
        Ok(order_recent(self.recent.clone()))
    }

    fn set_pinned(&mut self, name: &str, pinned: bool) -> Result<bool> {
        match self.recent.iter_mut().find(|e| e.name == name) {
            Some(e) => {
                e.is_pinned = pinned;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_recent(&mut self, name: &str) -> Result<bool> {
        let before = self.recent.len();
        self.recent.retain(|e| e.name != name);
        self.datasets.remove(name);
        Ok(self.recent.len() < before)
    }

    fn save_template(&mut self, template: &ViewTemplate) -> Result<()> {
        self.templates.insert(template.name.clone(), template.clone());
        Ok(())
    }

    fn template(&self, name: &str) -> Result<Option<ViewTemplate>> {
        Ok(self.templates.get(name).cloned())
    }

    fn templates(&self) -> Result<Vec<ViewTemplate>> {
        Ok(self.templates.values().cloned().collect())
    }

    fn remove_template(&mut self, name: &str) -> Result<bool> {
        Ok(self.templates.remove(name).is_some())
    }

    fn record_export(&mut self, record: &ExportRecord) -> Result<()> {
        self.exports.push(record.clone());
        Ok(())
    }

    fn exports(&self) -> Result<Vec<ExportRecord>> {
        Ok(self.exports.clone())
    }

    fn clear(&mut self) -> Result<()> {
        self.recent.clear();
        self.templates.clear();
        self.exports.clear();
        Ok(())
    }
}
