//! Dust model backed by an external program.
//!
//! Images are exchanged as float TIFF files in a scratch directory:
//!
//! ```text
//! <program> [args...] detect  <image.tiff> <out.tiff>
//! <program> [args...] inpaint <image.tiff> <mask.tiff> <out.tiff>
//! ```
//!
//! Exit status 0 means success; [`EXIT_TRANSIENT`], [`EXIT_REJECTED`] and
//! [`EXIT_QUOTA`] map onto the matching [`ServiceError`] kinds. The program
//! owns its own credentials.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::{debug, info, instrument};

use crate::image_pipeline::collaborator::model::{DustModel, ServiceError};
use crate::image_pipeline::collaborator::resample::{conform_mask_to, conform_to};
use crate::image_pipeline::common::error::{FlatFieldError, Result};
use crate::image_pipeline::common::types::{Image, Mask};
use crate::image_pipeline::tiff::{SampleScaling, StandardTiffWriter, TiffConfig, TiffWriter, read_image};

/// `EX_TEMPFAIL`
pub const EXIT_TRANSIENT: i32 = 75;
/// `EX_NOPERM`
pub const EXIT_REJECTED: i32 = 77;
/// `EX_UNAVAILABLE`
pub const EXIT_QUOTA: i32 = 69;

pub struct CommandModel {
    program: PathBuf,
    args: Vec<String>,
    writer: StandardTiffWriter,
}

impl CommandModel {
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            writer: StandardTiffWriter,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    fn write_input(&self, path: &Path, image: &Image) -> Result<()> {
        let mut file = File::create(path).map_err(|e| {
            FlatFieldError::OutputWriteError(format!("{}: {}", path.display(), e))
        })?;
        self.writer.write_float_image(image, &mut file, &TiffConfig::default())
    }

    fn invoke(&self, operation: &str, files: &[&Path]) -> Result<()> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(operation)
            .args(files)
            .output()
            .map_err(|e| {
                ServiceError::Rejected(format!("cannot launch {}: {}", self.program.display(), e))
            })?;
        debug!(operation, status = ?output.status, "Model program finished");
        classify(&output).map_err(FlatFieldError::from)
    }

    fn read_output(path: &Path, scaling: SampleScaling) -> Result<Image> {
        let file = File::open(path).map_err(|_| {
            ServiceError::Transient(format!("model produced no output at {}", path.display()))
        })?;
        read_image(BufReader::new(file), scaling)
    }
}

fn classify(output: &Output) -> std::result::Result<(), ServiceError> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let message = stderr.lines().last().unwrap_or("no diagnostic").trim().to_string();
    Err(match output.status.code() {
        Some(EXIT_TRANSIENT) => ServiceError::Transient(message),
        Some(EXIT_QUOTA) => ServiceError::QuotaExceeded(message),
        Some(EXIT_REJECTED) => ServiceError::Rejected(message),
        Some(code) => ServiceError::Rejected(format!("exit status {code}: {message}")),
        // Killed by a signal.
        None => ServiceError::Transient(message),
    })
}

impl DustModel for CommandModel {
    #[instrument(skip_all, fields(program = %self.program.display()))]
    fn detect(&mut self, image: &Image) -> Result<Mask> {
        let scratch = tempfile::tempdir()?;
        let input = scratch.path().join("image.tiff");
        let output = scratch.path().join("mask.tiff");

        self.write_input(&input, image)?;
        info!("Requesting dust mask");
        self.invoke("detect", &[input.as_path(), output.as_path()])?;
        conform_mask_to(image, Self::read_output(&output, SampleScaling::UnitRange)?)
    }

    #[instrument(skip_all, fields(program = %self.program.display()))]
    fn inpaint(&mut self, image: &Image, mask: &Mask) -> Result<Image> {
        let scratch = tempfile::tempdir()?;
        let input = scratch.path().join("image.tiff");
        let mask_path = scratch.path().join("mask.tiff");
        let output = scratch.path().join("inpainted.tiff");

        self.write_input(&input, image)?;
        self.write_input(&mask_path, mask)?;
        info!("Requesting inpainted image");
        self.invoke("inpaint", &[input.as_path(), mask_path.as_path(), output.as_path()])?;
        conform_to(image, Self::read_output(&output, SampleScaling::Raw)?)
    }
}
