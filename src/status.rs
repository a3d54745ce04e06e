// filepath: src/status.rs
//! Health checks for the tablet and the record store

use crate::device::DeviceBackend;
use crate::store::RecordStore;
use log::{info, warn};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusState {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub state: StatusState,
    pub message: String,
}

impl Status {
    fn ok(message: impl Into<String>) -> Self {
        let status = Self {
            state: StatusState::Ok,
            message: message.into(),
        };
        info!("{}", status);
        status
    }

    fn error(message: impl Into<String>) -> Self {
        let status = Self {
            state: StatusState::Error,
            message: message.into(),
        };
        warn!("{}", status);
        status
    }

    pub fn is_ok(&self) -> bool {
        self.state == StatusState::Ok
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = match self.state {
            StatusState::Ok => '✓',
            StatusState::Error => '✗',
        };
        write!(f, "{} {}", mark, self.message)
    }
}

pub fn check_device(backend: &dyn DeviceBackend) -> Status {
    match backend.enumerate() {
        Ok(devices) if !devices.is_empty() => Status::ok("Wacom STU Connected"),
        Ok(_) => Status::error("Wacom STU Not Found"),
        Err(e) => Status::error(format!("Device Error: {}", e)),
    }
}

pub fn check_database<S: RecordStore + ?Sized>(store: &S) -> Status {
    match store.ping() {
        Ok(()) => Status::ok("Database Connected"),
        Err(e) => Status::error(format!("Database Error: {}", e)),
    }
}

/// `v<major>.<minor>` of this build
pub fn version_label() -> String {
    format!(
        "v{}.{}",
        env!("CARGO_PKG_VERSION_MAJOR"),
        env!("CARGO_PKG_VERSION_MINOR")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::RecordedBackend;
    use crate::store::MemoryRecordStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_tablet_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let status = check_device(&RecordedBackend::new(dir.path()));
        assert_eq!(status.to_string(), "✗ Wacom STU Not Found");
    }

    #[test]
    fn database_status_reflects_ping() {
        assert!(check_database(&MemoryRecordStore::default()).is_ok());
        let status = check_database(&MemoryRecordStore::offline());
        assert_eq!(status.state, StatusState::Error);
        assert!(status.message.starts_with("Database Error:"));
    }

    #[test]
    fn version_label_has_major_and_minor() {
        assert_eq!(version_label(), "v0.1");
    }
}
