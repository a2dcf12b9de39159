//! Presence-based checkpoint registry.
//!
//! An artifact counts as done when its file exists. Input content is not
//! hashed: changing the capture without deleting downstream artifacts reuses
//! stale results.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::image_pipeline::common::error::{FlatFieldError, Result};
use crate::image_pipeline::common::types::{CorrectionMap, Image};
use crate::image_pipeline::tiff::{
    SampleScaling, StandardTiffWriter, TiffConfig, TiffWriter, read_correction_map, read_image,
};

/// Files produced by the pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    Median,
    RawMask,
    ShapedMask,
    Inpainted,
    Normalized,
    FlatField,
}

impl Artifact {
    pub const ALL: [Artifact; 6] = [
        Artifact::Median,
        Artifact::RawMask,
        Artifact::ShapedMask,
        Artifact::Inpainted,
        Artifact::Normalized,
        Artifact::FlatField,
    ];

    fn prefix(self) -> &'static str {
        match self {
            Artifact::Median => "median_flatfield",
            Artifact::RawMask => "mask_0",
            Artifact::ShapedMask => "mask0_expanded",
            Artifact::Inpainted => "inpainted",
            Artifact::Normalized => "normalized",
            Artifact::FlatField => "final_flatfield",
        }
    }
}

pub struct CheckpointStore {
    dir: PathBuf,
    stem: String,
    writer: StandardTiffWriter,
}

impl CheckpointStore {
    /// Registry for artifacts of the capture named `stem`, stored in `dir`.
    pub fn new<P: AsRef<Path>>(dir: P, stem: impl Into<String>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| {
            FlatFieldError::OutputWriteError(format!("{}: {}", dir.display(), e))
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            stem: stem.into(),
            writer: StandardTiffWriter,
        })
    }

    pub fn path(&self, artifact: Artifact) -> PathBuf {
        self.dir
            .join(format!("{}_{}.tiff", artifact.prefix(), self.stem))
    }

    pub fn exists(&self, artifact: Artifact) -> bool {
        self.path(artifact).is_file()
    }

    pub fn load_image(&self, artifact: Artifact) -> Result<Image> {
        let path = self.path(artifact);
        let file = File::open(&path).map_err(|e| {
            FlatFieldError::InputReadError(format!("{}: {}", path.display(), e))
        })?;
        let image = read_image(BufReader::new(file), SampleScaling::Raw)?;
        info!(artifact = ?artifact, path = %path.display(), "Loaded checkpoint");
        Ok(image)
    }

    pub fn save_image(&self, artifact: Artifact, image: &Image) -> Result<PathBuf> {
        self.write_atomic(artifact, |out| self.writer.write_float_image(image, out, &TiffConfig::default()))
    }

    pub fn load_correction_map(&self) -> Result<CorrectionMap> {
        let path = self.path(Artifact::FlatField);
        let file = File::open(&path).map_err(|e| {
            FlatFieldError::InputReadError(format!("{}: {}", path.display(), e))
        })?;
        read_correction_map(BufReader::new(file))
    }

    pub fn save_correction_map(&self, map: &CorrectionMap, config: &TiffConfig) -> Result<PathBuf> {
        self.write_atomic(Artifact::FlatField, |out| {
            self.writer.write_correction_map(map, out, config)
        })
    }

    /// Deletes an artifact so the next run regenerates it.
    pub fn remove(&self, artifact: Artifact) -> Result<()> {
        match std::fs::remove_file(self.path(artifact)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes into a temp file in the same directory, then renames it over
    /// the artifact path so readers never observe a partial file.
    fn write_atomic<F>(&self, artifact: Artifact, encode: F) -> Result<PathBuf>
    where
        F: FnOnce(&mut dyn Write) -> Result<()>,
    {
        let path = self.path(artifact);
        let mut temp = NamedTempFile::new_in(&self.dir).map_err(|e| {
            FlatFieldError::OutputWriteError(format!("{}: {}", self.dir.display(), e))
        })?;
        encode(&mut temp)?;
        temp.as_file().sync_all()?;
        temp.persist(&path).map_err(|e| {
            FlatFieldError::OutputWriteError(format!("{}: {}", path.display(), e.error))
        })?;
        debug!(artifact = ?artifact, path = %path.display(), "Persisted checkpoint");
        Ok(path)
    }
}
