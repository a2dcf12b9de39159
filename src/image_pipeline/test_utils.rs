//! Synthetic captures and images for unit tests.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::image_pipeline::collaborator::{DustModel, ServiceError};
use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::common::types::{Image, Mask};
use crate::image_pipeline::orchestrator::{Decision, Operator, Stage};
use crate::image_pipeline::ser::types::{SER_FILE_ID, SER_HEADER_SIZE};

pub struct SerLayout {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u32,
    pub color_id: u32,
    /// 0 = big-endian, 1 = little-endian
    pub byte_order: u32,
    /// Overrides the frame count written into the header
    pub declared_frames: Option<u32>,
}

impl SerLayout {
    pub fn mono16(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bit_depth: 16,
            color_id: 0,
            byte_order: 1,
            declared_frames: None,
        }
    }
}

/// Builds a SER file image; each frame holds `planes * width * height` samples.
pub fn ser_bytes(layout: &SerLayout, frames: &[Vec<u16>]) -> Vec<u8> {
    let mut out = Vec::with_capacity(SER_HEADER_SIZE as usize);
    out.extend_from_slice(SER_FILE_ID);
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&layout.color_id.to_le_bytes());
    out.extend_from_slice(&layout.byte_order.to_le_bytes());
    out.extend_from_slice(&layout.width.to_le_bytes());
    out.extend_from_slice(&layout.height.to_le_bytes());
    out.extend_from_slice(&layout.bit_depth.to_le_bytes());
    let declared = layout.declared_frames.unwrap_or(frames.len() as u32);
    out.extend_from_slice(&declared.to_le_bytes());
    for field in ["observer", "instrument", "telescope"] {
        let mut block = [b' '; 40];
        block[..field.len()].copy_from_slice(field.as_bytes());
        out.extend_from_slice(&block);
    }
    out.extend_from_slice(&1u64.to_le_bytes());
    out.extend_from_slice(&2u64.to_le_bytes());
    assert_eq!(out.len() as u64, SER_HEADER_SIZE);

    for frame in frames {
        for &sample in frame {
            if layout.bit_depth <= 8 {
                out.push(sample as u8);
            } else if layout.byte_order == 0 {
                out.extend_from_slice(&sample.to_be_bytes());
            } else {
                out.extend_from_slice(&sample.to_le_bytes());
            }
        }
    }
    out
}

pub fn write_ser(dir: &Path, name: &str, layout: &SerLayout, frames: &[Vec<u16>]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, ser_bytes(layout, frames)).unwrap();
    path
}

/// Smooth radial falloff, mimicking a clean flat.
pub fn clean_flat(width: usize, height: usize) -> Image {
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let mut image = Image::filled(width, height, 0.0);
    for y in 0..height {
        for x in 0..width {
            let r2 = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)) / (cx * cx + cy * cy);
            image.set(x, y, 40_000.0 * (1.0 - 0.3 * r2));
        }
    }
    image
}

/// Centre of the dust shadow in [`synthetic_flat`].
pub fn dust_center(width: usize, height: usize) -> (f32, f32) {
    (width as f32 * 0.3, height as f32 * 0.3)
}

/// [`clean_flat`] with a dark dust shadow of radius 4 at [`dust_center`].
pub fn synthetic_flat(width: usize, height: usize) -> Image {
    let (dx0, dy0) = dust_center(width, height);
    let mut image = clean_flat(width, height);
    for y in 0..height {
        for x in 0..width {
            let dx = x as f32 - dx0;
            let dy = y as f32 - dy0;
            if dx * dx + dy * dy < 16.0 {
                image.set(x, y, image.get(x, y) * 0.8);
            }
        }
    }
    image
}

/// Writes `frames` noisy copies of [`synthetic_flat`]; the noise is symmetric
/// so the temporal median reproduces the flat after rounding.
pub fn write_flat_capture(dir: &Path, name: &str, width: usize, height: usize, frames: usize) -> PathBuf {
    let flat = synthetic_flat(width, height);
    let half = (frames / 2) as f32;
    let data: Vec<Vec<u16>> = (0..frames)
        .map(|k| {
            flat.data
                .iter()
                .map(|&v| (v.round() + (k as f32 - half) * 25.0) as u16)
                .collect()
        })
        .collect();
    write_ser(dir, name, &SerLayout::mono16(width as u32, height as u32), &data)
}

/// Scripted dust model: detection marks a disk around the dust, inpainting
/// restores the clean flat. Every call returns a slightly different result.
pub struct ScriptedModel {
    pub calls: Arc<Mutex<Vec<&'static str>>>,
    /// Errors returned, in order, by the next calls of either operation
    pub failures: VecDeque<ServiceError>,
    /// Produce outputs at this size instead of the input's
    pub output_size: Option<(usize, usize)>,
    detect_calls: usize,
    inpaint_calls: usize,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            failures: VecDeque::new(),
            output_size: None,
            detect_calls: 0,
            inpaint_calls: 0,
        }
    }

    pub fn failing_with<I: IntoIterator<Item = ServiceError>>(failures: I) -> Self {
        Self {
            failures: failures.into_iter().collect(),
            ..Self::new()
        }
    }

    pub fn with_output_size(width: usize, height: usize) -> Self {
        Self {
            output_size: Some((width, height)),
            ..Self::new()
        }
    }

    fn output_dimensions(&self, image: &Image) -> (usize, usize) {
        self.output_size.unwrap_or(image.dimensions())
    }

    fn record(&mut self, call: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        match self.failures.pop_front() {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

impl DustModel for ScriptedModel {
    fn detect(&mut self, image: &Image) -> Result<Mask> {
        self.record("detect")?;
        let radius = 5.0 + self.detect_calls as f32;
        self.detect_calls += 1;

        let (width, height) = self.output_dimensions(image);
        let (cx, cy) = dust_center(width, height);
        let mut mask = Image::filled(width, height, 0.0);
        for y in 0..height {
            for x in 0..width {
                if (x as f32 - cx).powi(2) + (y as f32 - cy).powi(2) <= radius * radius {
                    mask.set(x, y, 1.0);
                }
            }
        }
        Ok(mask)
    }

    fn inpaint(&mut self, image: &Image, _mask: &Mask) -> Result<Image> {
        self.record("inpaint")?;
        // Global drift the histogram matching has to undo.
        let gain = 1.1 + 0.05 * self.inpaint_calls as f32;
        self.inpaint_calls += 1;

        let (width, height) = self.output_dimensions(image);
        let mut out = clean_flat(width, height);
        out.data.iter_mut().for_each(|v| *v *= gain);
        Ok(out)
    }
}

/// Operator replaying scripted decisions, accepting once they run out.
pub struct ScriptedOperator {
    pub decisions: VecDeque<Decision>,
    pub seen: Arc<Mutex<Vec<(Stage, Image)>>>,
}

impl ScriptedOperator {
    pub fn new<I: IntoIterator<Item = Decision>>(decisions: I) -> Self {
        Self {
            decisions: decisions.into_iter().collect(),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn accepting() -> Self {
        Self::new([])
    }
}

impl Operator for ScriptedOperator {
    fn review(&mut self, stage: Stage, candidate: &Image) -> Result<Decision> {
        self.seen.lock().unwrap().push((stage, candidate.clone()));
        Ok(self.decisions.pop_front().unwrap_or(Decision::Accept))
    }
}
