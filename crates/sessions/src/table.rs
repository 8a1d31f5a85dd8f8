//! A keyed JSON table persisted as a single file.
//!
//! The whole table is held in memory behind a `RwLock` and rewritten
//! atomically (temp file + rename) after every mutation. The lock only
//! protects the map; callers that read, decide and then write get no
//! isolation from each other.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use wv_domain::error::{Error, Result};

pub struct JsonTable<T> {
    path: Option<PathBuf>,
    rows: RwLock<BTreeMap<String, T>>,
}

impl<T> JsonTable<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Load or create the table at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let rows: BTreeMap<String, T> = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw).map_err(|e| {
                    Error::Other(format!("corrupt table {}: {e}", path.display()))
                })?
            }
        } else {
            BTreeMap::new()
        };

        tracing::info!(rows = rows.len(), path = %path.display(), "table loaded");

        Ok(Self {
            path: Some(path.to_path_buf()),
            rows: RwLock::new(rows),
        })
    }

    /// A table that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.rows.read().get(key).cloned()
    }

    /// Insert or replace a row, then persist.
    pub fn put(&self, key: &str, row: T) -> Result<()> {
        self.rows.write().insert(key.to_owned(), row);
        self.flush()
    }

    /// Mutate a row in place, then persist. Returns `false` when the key
    /// is absent.
    pub fn update(&self, key: &str, f: impl FnOnce(&mut T)) -> Result<bool> {
        let found = {
            let mut rows = self.rows.write();
            match rows.get_mut(key) {
                Some(row) => {
                    f(row);
                    true
                }
                None => false,
            }
        };
        if found {
            self.flush()?;
        }
        Ok(found)
    }

    /// Mutate a row, inserting `T::default()` first when absent.
    pub fn upsert(&self, key: &str, f: impl FnOnce(&mut T)) -> Result<()>
    where
        T: Default,
    {
        {
            let mut rows = self.rows.write();
            f(rows.entry(key.to_owned()).or_default());
        }
        self.flush()
    }

    /// Rows matching a predicate, in key order.
    pub fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows
            .read()
            .values()
            .filter(|row| pred(row))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Persist the current rows. A no-op for in-memory tables.
    pub fn flush(&self) -> Result<()> {
        let Some(ref path) = self.path else {
            return Ok(());
        };
        let json = {
            let rows = self.rows.read();
            serde_json::to_string_pretty(&*rows)
                .map_err(|e| Error::Other(format!("serializing table: {e}")))?
        };
        let dir = path.parent().unwrap_or(Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        {
            let table: JsonTable<u32> = JsonTable::open(&path).unwrap();
            table.put("a", 1).unwrap();
            table.put("b", 2).unwrap();
        }
        let table: JsonTable<u32> = JsonTable::open(&path).unwrap();
        assert_eq!(table.get("a"), Some(1));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn update_reports_missing_rows() {
        let table: JsonTable<u32> = JsonTable::in_memory();
        assert!(!table.update("x", |v| *v += 1).unwrap());
        table.put("x", 1).unwrap();
        assert!(table.update("x", |v| *v += 1).unwrap());
        assert_eq!(table.get("x"), Some(2));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(JsonTable::<u32>::open(&path).is_err());
    }
}
