// filepath: src/raster.rs
//! Stroke rasterization for stu-signature
//!
//! Turns the ordered pen samples of one capture into an antialiased RGBA
//! image. Only segments whose two endpoints both have the pen down are
//! drawn, so separate pen-downs stay visually disconnected.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error;
use tiny_skia::{Color, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

/// One reading from the tablet, in device coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenSample {
    pub x: i32,
    pub y: i32,
    /// Switch state, nonzero while the pen tip touches the surface
    pub sw: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u32>,
}

impl PenSample {
    pub fn new(x: i32, y: i32, sw: u32) -> Self {
        Self {
            x,
            y,
            sw,
            time_count: None,
            sequence: None,
        }
    }

    pub fn is_down(&self) -> bool {
        self.sw != 0
    }
}

/// Addressable range reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub tablet_max_x: i32,
    pub tablet_max_y: i32,
}

/// Pen and canvas settings for one render
#[derive(Debug, Clone, PartialEq)]
pub struct InkStyle {
    pub scale: f64,
    pub width: f32,
    pub color: [u8; 4],
    /// `None` leaves the canvas transparent
    pub background: Option<[u8; 4]>,
}

impl Default for InkStyle {
    fn default() -> Self {
        Self {
            scale: 0.1,
            width: 2.0,
            color: [0, 0, 0, 255],
            background: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("scale must be a positive finite number, got {0}")]
    InvalidScale(f64),
    #[error("pen width must be a positive finite number, got {0}")]
    InvalidWidth(f32),
    #[error("tablet capability must be positive, got {0}x{1}")]
    InvalidCapability(i32, i32),
    #[error("canvas of {width}x{height} pixels cannot be allocated")]
    EmptyCanvas { width: u32, height: u32 },
    #[error("failed to encode PNG: {0}")]
    Encode(String),
    #[error("failed to write image: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a render request
#[derive(Debug)]
pub enum Rendered {
    Image(SignatureImage),
    /// No sample had the pen down, nothing worth saving
    NoSignature,
}

/// A finished signature canvas
#[derive(Debug, Clone)]
pub struct SignatureImage {
    pixmap: Pixmap,
}

impl SignatureImage {
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Alpha of the pixel at (x, y), `None` outside the canvas
    pub fn alpha_at(&self, x: u32, y: u32) -> Option<u8> {
        self.pixmap.pixel(x, y).map(|p| p.alpha())
    }

    /// Iterate the alpha channel in row-major order
    pub fn alphas(&self) -> impl Iterator<Item = u8> + '_ {
        self.pixmap.pixels().iter().map(|p| p.alpha())
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, RenderError> {
        self.pixmap
            .encode_png()
            .map_err(|e| RenderError::Encode(e.to_string()))
    }

    /// Encode and write the image, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<(), RenderError> {
        let bytes = self.encode_png()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, bytes)?;
        info!("Signature image written to {}", path.display());
        Ok(())
    }
}

/// True when at least one sample has the pen touching the surface
pub fn has_signature(samples: &[PenSample]) -> bool {
    samples.iter().any(PenSample::is_down)
}

/// Canvas size for a capability at the given scale
pub fn canvas_size(capability: Capability, scale: f64) -> Result<(u32, u32), RenderError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(RenderError::InvalidScale(scale));
    }
    if capability.tablet_max_x <= 0 || capability.tablet_max_y <= 0 {
        return Err(RenderError::InvalidCapability(
            capability.tablet_max_x,
            capability.tablet_max_y,
        ));
    }

    let width = (capability.tablet_max_x as f64 * scale).round();
    let height = (capability.tablet_max_y as f64 * scale).round();
    if width < 1.0 || height < 1.0 || width > u32::MAX as f64 || height > u32::MAX as f64 {
        return Err(RenderError::EmptyCanvas {
            width: width as u32,
            height: height as u32,
        });
    }
    Ok((width as u32, height as u32))
}

pub struct Rasterizer {
    style: InkStyle,
}

impl Rasterizer {
    pub fn new(style: InkStyle) -> Self {
        Self { style }
    }

    /// Render the samples onto a canvas sized from the capability
    pub fn rasterize(
        &self,
        samples: &[PenSample],
        capability: Capability,
    ) -> Result<Rendered, RenderError> {
        let scale = self.style.scale;
        let (width, height) = canvas_size(capability, scale)?;
        if !self.style.width.is_finite() || self.style.width <= 0.0 {
            return Err(RenderError::InvalidWidth(self.style.width));
        }

        if !has_signature(samples) {
            info!("No pen-down samples among {} captured", samples.len());
            return Ok(Rendered::NoSignature);
        }

        let mut pixmap =
            Pixmap::new(width, height).ok_or(RenderError::EmptyCanvas { width, height })?;
        if let Some([r, g, b, a]) = self.style.background {
            pixmap.fill(Color::from_rgba8(r, g, b, a));
        }

        let mut builder = PathBuilder::new();
        let mut pen_at: Option<(f32, f32)> = None;
        let mut segments = 0usize;

        for pair in samples.windows(2) {
            let (prev, curr) = (pair[0], pair[1]);
            if !(prev.is_down() && curr.is_down()) {
                pen_at = None;
                continue;
            }
            let from = scaled(prev, scale);
            let to = scaled(curr, scale);
            // Continue the current polyline so the join is rounded
            if pen_at != Some(from) {
                builder.move_to(from.0, from.1);
            }
            builder.line_to(to.0, to.1);
            pen_at = Some(to);
            segments += 1;
        }
        debug!("Rasterizing {segments} segments onto {width}x{height} canvas");

        if let Some(path) = builder.finish() {
            let [r, g, b, a] = self.style.color;
            let mut paint = Paint::default();
            paint.set_color_rgba8(r, g, b, a);
            paint.anti_alias = true;

            let stroke = Stroke {
                width: self.style.width,
                line_cap: LineCap::Round,
                line_join: LineJoin::Round,
                ..Stroke::default()
            };
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }

        Ok(Rendered::Image(SignatureImage { pixmap }))
    }
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new(InkStyle::default())
    }
}

fn scaled(sample: PenSample, scale: f64) -> (f32, f32) {
    ((sample.x as f64 * scale) as f32, (sample.y as f64 * scale) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cap(x: i32, y: i32) -> Capability {
        Capability {
            tablet_max_x: x,
            tablet_max_y: y,
        }
    }

    fn image(rendered: Rendered) -> SignatureImage {
        match rendered {
            Rendered::Image(img) => img,
            Rendered::NoSignature => panic!("expected an image"),
        }
    }

    #[test]
    fn empty_capture_is_no_signature() {
        let out = Rasterizer::default().rasterize(&[], cap(9600, 6000)).unwrap();
        assert!(matches!(out, Rendered::NoSignature));
    }

    #[test]
    fn pen_up_only_is_no_signature() {
        let samples = [PenSample::new(10, 10, 0), PenSample::new(500, 500, 0)];
        let out = Rasterizer::default()
            .rasterize(&samples, cap(9600, 6000))
            .unwrap();
        assert!(matches!(out, Rendered::NoSignature));
    }

    #[test]
    fn diagonal_line_is_drawn_at_scale() {
        let samples = [PenSample::new(0, 0, 1), PenSample::new(1000, 1000, 1)];
        let img = image(
            Rasterizer::default()
                .rasterize(&samples, cap(10000, 10000))
                .unwrap(),
        );
        assert_eq!((img.width(), img.height()), (1000, 1000));
        assert!(img.alpha_at(50, 50).unwrap() > 0);
        assert!(img.alpha_at(100, 100).unwrap() > 0);
        assert_eq!(img.alpha_at(900, 100), Some(0));
        assert_eq!(img.alpha_at(500, 500), Some(0));
        assert_eq!(img.alpha_at(20, 80), Some(0));
    }

    #[test]
    fn pen_up_gap_is_skipped() {
        let samples = [
            PenSample::new(1000, 1000, 1),
            PenSample::new(3000, 3000, 0),
            PenSample::new(5000, 1000, 1),
        ];
        let img = image(
            Rasterizer::default()
                .rasterize(&samples, cap(9600, 6000))
                .unwrap(),
        );
        assert!(img.alphas().all(|a| a == 0));
    }

    #[test]
    fn single_pen_down_sample_gives_blank_canvas() {
        let img = image(
            Rasterizer::default()
                .rasterize(&[PenSample::new(500, 500, 1)], cap(9600, 6000))
                .unwrap(),
        );
        assert_eq!((img.width(), img.height()), (960, 600));
        assert!(img.alphas().all(|a| a == 0));
    }

    #[test]
    fn one_pen_down_sample_is_enough_for_a_signature() {
        assert!(has_signature(&[PenSample::new(10, 10, 0), PenSample::new(20, 20, 1)]));
        assert!(!has_signature(&[PenSample::new(10, 10, 0)]));
        assert!(!has_signature(&[]));
    }

    #[test]
    fn non_positive_pen_width_is_rejected() {
        let samples = [PenSample::new(0, 0, 1), PenSample::new(1000, 1000, 1)];
        for width in [0.0, -2.0, f32::NAN, f32::INFINITY] {
            let style = InkStyle {
                width,
                ..InkStyle::default()
            };
            let err = Rasterizer::new(style)
                .rasterize(&samples, cap(10000, 10000))
                .unwrap_err();
            assert!(matches!(err, RenderError::InvalidWidth(_)), "{width}");
        }
    }

    #[test]
    fn background_fill_is_optional() {
        let style = InkStyle {
            background: Some([255, 255, 255, 255]),
            ..InkStyle::default()
        };
        let samples = [PenSample::new(0, 0, 1), PenSample::new(100, 0, 1)];
        let img = image(
            Rasterizer::new(style)
                .rasterize(&samples, cap(1000, 1000))
                .unwrap(),
        );
        assert_eq!(img.alpha_at(90, 90), Some(255));
    }

    #[test]
    fn invalid_capability_is_rejected() {
        let samples = [PenSample::new(0, 0, 1), PenSample::new(10, 10, 1)];
        let err = Rasterizer::default()
            .rasterize(&samples, cap(0, 6000))
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidCapability(0, 6000)));

        let err = Rasterizer::default()
            .rasterize(&[], cap(9600, -1))
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidCapability(9600, -1)));
    }

    #[test]
    fn tiny_capability_rounds_to_empty_canvas() {
        let err = canvas_size(cap(4, 4), 0.1).unwrap_err();
        assert!(matches!(err, RenderError::EmptyCanvas { width: 0, height: 0 }));
        assert_eq!(canvas_size(cap(5, 15), 0.1).unwrap(), (1, 2));
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        assert!(matches!(
            canvas_size(cap(100, 100), 0.0),
            Err(RenderError::InvalidScale(_))
        ));
        assert!(matches!(
            canvas_size(cap(100, 100), f64::NAN),
            Err(RenderError::InvalidScale(_))
        ));
    }

    #[test]
    fn rendering_is_deterministic() {
        let samples: Vec<PenSample> = (0..40)
            .map(|i| PenSample::new(200 + i * 150, 3000 + (i % 7) * 120, (i % 13 != 0) as u32))
            .collect();
        let raster = Rasterizer::default();
        let a = image(raster.rasterize(&samples, cap(9600, 6000)).unwrap());
        let b = image(raster.rasterize(&samples, cap(9600, 6000)).unwrap());
        assert_eq!(a.encode_png().unwrap(), b.encode_png().unwrap());
    }
}
