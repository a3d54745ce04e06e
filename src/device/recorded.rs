// filepath: src/device/recorded.rs
//! Replay backend
//!
//! Each `*.toml` file in the recordings directory stands in for one attached
//! tablet. Opening it and capturing replays the stored pen data once.

use super::interface::{
    Capture, CaptureOutcome, DeviceBackend, DeviceError, DeviceInfo, PenDataMode, Session,
};
use crate::raster::{Capability, PenSample};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

/// A stored capture, as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub mode: PenDataMode,
    /// Replay as if the user dismissed the dialog
    #[serde(default)]
    pub cancelled: bool,
    pub capability: Capability,
    #[serde(default, rename = "sample")]
    pub samples: Vec<PenSample>,
}

fn default_model() -> String {
    "STU-430".to_string()
}

impl Recording {
    pub fn load(path: &Path) -> Result<Self, DeviceError> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| DeviceError::Recording {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), DeviceError> {
        let content = toml::to_string_pretty(self).map_err(|e| DeviceError::Recording {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        fs::write(path, content)?;
        Ok(())
    }

    fn into_outcome(self) -> CaptureOutcome {
        if self.cancelled {
            return CaptureOutcome::Cancelled;
        }
        CaptureOutcome::Completed(Capture {
            samples: self.samples,
            capability: self.capability,
            mode: self.mode,
        })
    }
}

pub struct RecordedBackend {
    dir: PathBuf,
}

impl RecordedBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn recording_paths(&self) -> Result<Vec<PathBuf>, DeviceError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Recordings directory {} does not exist", self.dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

impl DeviceBackend for RecordedBackend {
    fn name(&self) -> &str {
        "recorded"
    }

    fn enumerate(&self) -> Result<Vec<DeviceInfo>, DeviceError> {
        let mut devices = Vec::new();
        for path in self.recording_paths()? {
            match Recording::load(&path) {
                Ok(recording) => devices.push(DeviceInfo {
                    id: path.to_string_lossy().into_owned(),
                    model: recording.model,
                }),
                Err(e) => warn!("Skipping recording: {}", e),
            }
        }
        info!("Found {} recorded device(s)", devices.len());
        Ok(devices)
    }

    fn open(&self, device: &DeviceInfo) -> Result<Box<dyn Session>, DeviceError> {
        let path = PathBuf::from(&device.id);
        if !path.is_file() {
            return Err(DeviceError::Unavailable(device.id.clone()));
        }
        info!("Opened {} ({})", device.model, path.display());
        Ok(Box::new(RecordedSession { path: Some(path) }))
    }
}

struct RecordedSession {
    path: Option<PathBuf>,
}

impl Session for RecordedSession {
    fn capture(&mut self) -> Result<CaptureOutcome, DeviceError> {
        let path = self.path.take().ok_or(DeviceError::SessionSpent)?;
        let recording = Recording::load(&path)?;
        debug!(
            "Replaying {} samples from {}",
            recording.samples.len(),
            path.display()
        );
        Ok(recording.into_outcome())
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        self.path = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn recording(samples: Vec<PenSample>) -> Recording {
        Recording {
            model: "STU-430".to_string(),
            mode: PenDataMode::None,
            cancelled: false,
            capability: Capability {
                tablet_max_x: 9600,
                tablet_max_y: 6000,
            },
            samples,
        }
    }

    #[test]
    fn missing_directory_has_no_devices() {
        let dir = tempfile::tempdir().unwrap();
        let backend = RecordedBackend::new(dir.path().join("absent"));
        assert!(backend.enumerate().unwrap().is_empty());
    }

    #[test]
    fn enumerates_sorted_and_skips_other_files() {
        let dir = tempfile::tempdir().unwrap();
        recording(vec![]).save(&dir.path().join("b.toml")).unwrap();
        recording(vec![]).save(&dir.path().join("a.toml")).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("broken.toml"), "capability = 3").unwrap();

        let backend = RecordedBackend::new(dir.path());
        let ids: Vec<String> = backend
            .enumerate()
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(
            ids,
            vec![
                dir.path().join("a.toml").to_string_lossy().into_owned(),
                dir.path().join("b.toml").to_string_lossy().into_owned(),
            ]
        );
    }

    #[test]
    fn session_replays_once_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let samples = vec![
            PenSample::new(10, 20, 1),
            PenSample::new(30, 40, 1),
            PenSample::new(50, 60, 0),
        ];
        recording(samples.clone())
            .save(&dir.path().join("pad.toml"))
            .unwrap();

        let backend = RecordedBackend::new(dir.path());
        let device = backend.enumerate().unwrap().remove(0);
        let mut session = backend.open(&device).unwrap();
        match session.capture().unwrap() {
            CaptureOutcome::Completed(capture) => assert_eq!(capture.samples, samples),
            CaptureOutcome::Cancelled => panic!("expected a completed capture"),
        }
        assert!(matches!(session.capture(), Err(DeviceError::SessionSpent)));
    }

    #[test]
    fn cancelled_recording_replays_as_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recording(vec![PenSample::new(1, 1, 1)]);
        rec.cancelled = true;
        rec.save(&dir.path().join("pad.toml")).unwrap();

        let backend = RecordedBackend::new(dir.path());
        let device = backend.enumerate().unwrap().remove(0);
        let mut session = backend.open(&device).unwrap();
        assert_eq!(session.capture().unwrap(), CaptureOutcome::Cancelled);
    }

    #[test]
    fn closed_session_cannot_capture() {
        let dir = tempfile::tempdir().unwrap();
        recording(vec![]).save(&dir.path().join("pad.toml")).unwrap();
        let backend = RecordedBackend::new(dir.path());
        let device = backend.enumerate().unwrap().remove(0);
        let mut session = backend.open(&device).unwrap();
        session.close().unwrap();
        assert!(matches!(session.capture(), Err(DeviceError::SessionSpent)));
    }

    #[test]
    fn parses_time_count_samples() {
        let text = r#"
model = "STU-530"
mode = "time_count_sequence"

[capability]
tablet_max_x = 10000
tablet_max_y = 7000

[[sample]]
x = 100
y = 200
sw = 1
time_count = 5
sequence = 0
"#;
        let rec: Recording = toml::from_str(text).unwrap();
        assert_eq!(rec.mode, PenDataMode::TimeCountSequence);
        assert_eq!(rec.samples[0].time_count, Some(5));
        assert_eq!(rec.samples[0].sequence, Some(0));
    }
}
