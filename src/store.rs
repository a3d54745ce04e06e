// filepath: src/store.rs
//! Employee record store
//!
//! The application needs two statements against the employee table: a name
//! lookup by id and an update of the signature path column. `FileRecordStore`
//! keeps the table as a TOML document; `MemoryRecordStore` keeps it in process.

use chrono::{DateTime, Local};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store {} is not reachable", .0.display())]
    Unavailable(PathBuf),
    #[error("record store is corrupt: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("record store could not be serialized: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("record store I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One row of the employee table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_path: Option<String>,
    /// RFC 3339 modification time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

impl EmployeeRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            signature_path: None,
            modified: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EmployeeTable {
    #[serde(default, rename = "employee")]
    rows: Vec<EmployeeRecord>,
}

impl EmployeeTable {
    fn find_name(&self, id: &str) -> Option<String> {
        self.rows.iter().find(|r| r.id == id).map(|r| r.name.clone())
    }

    fn set_path(&mut self, id: &str, path: &Path, timestamp: DateTime<Local>) -> usize {
        let mut affected = 0;
        for row in self.rows.iter_mut().filter(|r| r.id == id) {
            row.signature_path = Some(path.to_string_lossy().into_owned());
            row.modified = Some(timestamp.to_rfc3339());
            affected += 1;
        }
        affected
    }
}

pub trait RecordStore {
    /// Check that the store can be opened
    fn ping(&self) -> Result<(), StoreError>;

    fn find_name_by_id(&self, id: &str) -> Result<Option<String>, StoreError>;

    /// Point the record at a new signature image, returning rows affected
    fn update_path(
        &mut self,
        id: &str,
        path: &Path,
        timestamp: DateTime<Local>,
    ) -> Result<usize, StoreError>;
}

/// Employee table stored as a TOML document on disk
pub struct FileRecordStore {
    path: PathBuf,
}

impl FileRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create the document with the given rows, replacing any existing one
    pub fn create(path: impl Into<PathBuf>, rows: Vec<EmployeeRecord>) -> Result<Self, StoreError> {
        let store = Self::new(path);
        if let Some(parent) = store.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        store.write(&EmployeeTable { rows })?;
        Ok(store)
    }

    /// All rows, in document order
    pub fn records(&self) -> Result<Vec<EmployeeRecord>, StoreError> {
        Ok(self.read()?.rows)
    }

    fn read(&self) -> Result<EmployeeTable, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::Unavailable(self.path.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(toml::from_str(&content)?)
    }

    fn write(&self, table: &EmployeeTable) -> Result<(), StoreError> {
        let content = toml::to_string_pretty(table)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl RecordStore for FileRecordStore {
    fn ping(&self) -> Result<(), StoreError> {
        let table = self.read()?;
        debug!(
            "Record store {} holds {} rows",
            self.path.display(),
            table.rows.len()
        );
        Ok(())
    }

    fn find_name_by_id(&self, id: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read()?.find_name(id))
    }

    fn update_path(
        &mut self,
        id: &str,
        path: &Path,
        timestamp: DateTime<Local>,
    ) -> Result<usize, StoreError> {
        let mut table = self.read()?;
        let affected = table.set_path(id, path, timestamp);
        if affected > 0 {
            self.write(&table)?;
        }
        info!("Updated signature path for {id}: {affected} row(s)");
        Ok(affected)
    }
}

/// A call made against a `MemoryRecordStore`
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    FindName(String),
    UpdatePath { id: String, path: PathBuf },
}

/// In-process employee table that remembers the calls made to it.
///
/// Meant for embedders without a database and for exercising `SigningApp`:
/// `calls` exposes the statement log, `offline` and `rejecting_updates`
/// simulate an unreachable store. Integration tests under `tests/` use these,
/// so they cannot sit behind `#[cfg(test)]`.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    table: EmployeeTable,
    calls: std::cell::RefCell<Vec<StoreCall>>,
    offline: bool,
    reject_updates: bool,
}

impl MemoryRecordStore {
    pub fn new(rows: Vec<EmployeeRecord>) -> Self {
        Self {
            table: EmployeeTable { rows },
            ..Self::default()
        }
    }

    /// A store whose every statement fails as unreachable
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    /// Lookups keep working but every update fails as unreachable
    pub fn rejecting_updates(mut self) -> Self {
        self.reject_updates = true;
        self
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.borrow().clone()
    }

    pub fn record(&self, id: &str) -> Option<&EmployeeRecord> {
        self.table.rows.iter().find(|r| r.id == id)
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline {
            return Err(StoreError::Unavailable(PathBuf::from(":memory:")));
        }
        Ok(())
    }
}

impl RecordStore for MemoryRecordStore {
    fn ping(&self) -> Result<(), StoreError> {
        self.check_online()
    }

    fn find_name_by_id(&self, id: &str) -> Result<Option<String>, StoreError> {
        self.calls.borrow_mut().push(StoreCall::FindName(id.to_string()));
        self.check_online()?;
        Ok(self.table.find_name(id))
    }

    fn update_path(
        &mut self,
        id: &str,
        path: &Path,
        timestamp: DateTime<Local>,
    ) -> Result<usize, StoreError> {
        self.calls.borrow_mut().push(StoreCall::UpdatePath {
            id: id.to_string(),
            path: path.to_path_buf(),
        });
        self.check_online()?;
        if self.reject_updates {
            return Err(StoreError::Unavailable(PathBuf::from(":memory:")));
        }
        Ok(self.table.set_path(id, path, timestamp))
    }
}
