// filepath: src/device/mod.rs
//! Device layer for stu-signature
//!
//! Re-exports the backend traits and picks a backend from configuration.

pub mod interface;
pub mod recorded;

pub use interface::{
    Capture, CaptureOutcome, DeviceBackend, DeviceError, DeviceInfo, PenDataMode, Session,
};
pub use recorded::{Recording, RecordedBackend};

use crate::config::DeviceConfig;
use log::info;

/// Build the backend named in the configuration
pub fn backend_from_config(config: &DeviceConfig) -> Result<Box<dyn DeviceBackend>, DeviceError> {
    let name = config.backend.as_deref().unwrap_or("recorded");
    info!("Using device backend: {}", name);
    match name {
        "recorded" => Ok(Box::new(RecordedBackend::new(config.recordings_dir()))),
        // Add other backends here as needed
        other => Err(DeviceError::UnknownBackend(other.to_string())),
    }
}
