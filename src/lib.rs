pub mod app;
pub mod config;
pub mod device;
pub mod raster;
pub mod status;
pub mod store;

// Re-export for embedders
pub use crate::app::{render_recording, AppError, RecordingOutcome, SigningApp, SigningOutcome};
pub use crate::config::SignatureConfig;
pub use crate::raster::{Capability, InkStyle, PenSample, Rasterizer, Rendered, SignatureImage};
