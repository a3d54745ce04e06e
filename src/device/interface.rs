// filepath: src/device/interface.rs
//! Device interface definitions
//!
//! This file defines the traits a signature tablet backend implements and
//! the data one capture session hands back.

use crate::raster::{Capability, PenSample};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Pen data layout the tablet reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenDataMode {
    #[default]
    None,
    TimeCount,
    SequenceNumber,
    TimeCountSequence,
}

/// An attached device as seen by enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: String,
    pub model: String,
}

/// Everything one completed capture produces
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub samples: Vec<PenSample>,
    pub capability: Capability,
    pub mode: PenDataMode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Completed(Capture),
    /// The user dismissed the capture without accepting it
    Cancelled,
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("unknown device backend '{0}'")]
    UnknownBackend(String),
    #[error("device '{0}' is no longer available")]
    Unavailable(String),
    #[error("capture session was already used")]
    SessionSpent,
    #[error("malformed recording {}: {}", .path.display(), .message)]
    Recording { path: PathBuf, message: String },
    #[error("device I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A source of signature tablets
pub trait DeviceBackend {
    /// Short name used in configuration
    fn name(&self) -> &str;

    /// List attached devices, possibly none
    fn enumerate(&self) -> Result<Vec<DeviceInfo>, DeviceError>;

    /// Open a capture session on one device
    fn open(&self, device: &DeviceInfo) -> Result<Box<dyn Session>, DeviceError>;
}

/// One modal capture interaction on an opened device
pub trait Session {
    /// Block until the user completes or cancels the capture.
    /// A session yields a single capture; later calls fail with `SessionSpent`.
    fn capture(&mut self) -> Result<CaptureOutcome, DeviceError>;

    fn close(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }
}
