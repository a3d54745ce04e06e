// filepath: src/app.rs
//! Main application logic for stu-signature
//!
//! Sequences one signing action: look up the employee, capture from the
//! first attached tablet, rasterize the pen data, save the PNG and record
//! its path. Every failure ends the action and is returned to the caller.

use crate::config::{FileNaming, SignatureConfig};
use crate::device::{CaptureOutcome, DeviceBackend, DeviceError, Recording};
use crate::raster::{Rasterizer, RenderError, Rendered};
use crate::store::{RecordStore, StoreError};
use chrono::{DateTime, Local};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid employee id '{0}'")]
    InvalidId(String),
    #[error("No STU devices attached")]
    NoDevice,
    #[error("no employee found with id '{0}'")]
    UnknownEmployee(String),
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Render(#[from] RenderError),
    /// The image, if named, was already written when the store failed
    #[error("database error: {source}")]
    Database {
        #[source]
        source: StoreError,
        image: Option<PathBuf>,
    },
}

/// How a signing action ended when nothing went wrong
#[derive(Debug, Clone, PartialEq)]
pub enum SigningOutcome {
    Saved {
        name: String,
        path: PathBuf,
        sample_count: usize,
        rows_affected: usize,
    },
    /// Capture finished without any pen-down sample; nothing was written
    NoSignature { sample_count: usize },
    Cancelled,
}

pub struct SigningApp<S: RecordStore> {
    config: SignatureConfig,
    backend: Box<dyn DeviceBackend>,
    store: S,
    rasterizer: Rasterizer,
}

impl<S: RecordStore> SigningApp<S> {
    pub fn new(config: SignatureConfig, backend: Box<dyn DeviceBackend>, store: S) -> Self {
        let rasterizer = Rasterizer::new(config.ink.style());
        Self {
            config,
            backend,
            store,
            rasterizer,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Where the signature for `id` is written at `now`
    pub fn output_path(&self, id: &str, now: DateTime<Local>) -> PathBuf {
        let file_name = match self.config.output.naming {
            FileNaming::Identifier => format!("{}.png", id),
            FileNaming::Timestamped => format!("{}_{}.png", id, now.format("%Y%m%d_%H%M%S")),
        };
        self.config.output.dir_resolved().join(file_name)
    }

    pub fn sign(&mut self, id: &str) -> Result<SigningOutcome, AppError> {
        validate_id(id)?;

        let devices = self.backend.enumerate()?;
        let Some(device) = devices.first() else {
            return Err(AppError::NoDevice);
        };

        let name = self
            .store
            .find_name_by_id(id)
            .map_err(|source| AppError::Database {
                source,
                image: None,
            })?
            .ok_or_else(|| AppError::UnknownEmployee(id.to_string()))?;
        info!("Capturing signature for {} ({})", name, id);

        let mut session = self.backend.open(device)?;
        let captured = session.capture();
        let closed = session.close();
        let capture = match captured? {
            CaptureOutcome::Completed(capture) => capture,
            CaptureOutcome::Cancelled => {
                closed?;
                info!("Capture cancelled for {}", id);
                return Ok(SigningOutcome::Cancelled);
            }
        };
        closed?;

        let sample_count = capture.samples.len();
        debug!(
            "Captured {} pen samples in {:?} mode",
            sample_count, capture.mode
        );

        let image = match self
            .rasterizer
            .rasterize(&capture.samples, capture.capability)?
        {
            Rendered::Image(image) => image,
            Rendered::NoSignature => {
                warn!("No signature data captured for {}", id);
                return Ok(SigningOutcome::NoSignature { sample_count });
            }
        };

        let now = Local::now();
        let path = self.output_path(id, now);
        image.save(&path)?;

        let rows_affected =
            self.store
                .update_path(id, &path, now)
                .map_err(|source| AppError::Database {
                    source,
                    image: Some(path.clone()),
                })?;
        if rows_affected == 0 {
            warn!("Signature path update for {} touched no rows", id);
        }

        Ok(SigningOutcome::Saved {
            name,
            path,
            sample_count,
            rows_affected,
        })
    }
}

/// How rendering a stored recording ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingOutcome {
    Saved,
    /// Nothing was written
    NoSignature,
    /// The recording was dismissed at capture time; nothing was written
    Cancelled,
}

/// Rasterize a stored recording straight to `out`
pub fn render_recording(
    recording: &Path,
    out: &Path,
    rasterizer: &Rasterizer,
) -> Result<RecordingOutcome, AppError> {
    let recording = Recording::load(recording)?;
    if recording.cancelled {
        info!("Recording was cancelled, not rendering");
        return Ok(RecordingOutcome::Cancelled);
    }
    match rasterizer.rasterize(&recording.samples, recording.capability)? {
        Rendered::Image(image) => {
            image.save(out)?;
            Ok(RecordingOutcome::Saved)
        }
        Rendered::NoSignature => Ok(RecordingOutcome::NoSignature),
    }
}

fn validate_id(id: &str) -> Result<(), AppError> {
    let invalid = id.trim().is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\', '\0']);
    if invalid {
        return Err(AppError::InvalidId(id.to_string()));
    }
    Ok(())
}
