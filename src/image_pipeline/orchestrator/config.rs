//! Pipeline configuration types

use std::path::{Path, PathBuf};

use crate::image_pipeline::collaborator::RetryPolicy;
use crate::image_pipeline::histogram::HistogramConfig;
use crate::image_pipeline::mask::ShapeConfig;
use crate::image_pipeline::tiff::{TiffCompression, TiffConfig};

/// Configuration for a flat-field run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// SER capture to process
    pub input: PathBuf,
    /// Where checkpoints and the final map are written; defaults to the
    /// capture's directory
    pub checkpoint_dir: Option<PathBuf>,
    /// Stack only the first N frames
    pub frame_limit: Option<usize>,
    pub shape: ShapeConfig,
    pub histogram: HistogramConfig,
    pub retry: RetryPolicy,
    /// Encoding of the final correction map
    pub output: TiffConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("input.ser"),
            checkpoint_dir: None,
            frame_limit: None,
            shape: ShapeConfig::default(),
            histogram: HistogramConfig::default(),
            retry: RetryPolicy::default(),
            output: TiffConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    pub fn checkpoint_dir(&self) -> PathBuf {
        match &self.checkpoint_dir {
            Some(dir) => dir.clone(),
            None => self
                .input
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    /// File stem used to name every artifact of this capture.
    pub fn capture_stem(&self) -> String {
        self.input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "capture".to_string())
    }
}

/// Builder for PipelineConfig
#[derive(Default)]
pub struct PipelineConfigBuilder {
    input: Option<PathBuf>,
    checkpoint_dir: Option<PathBuf>,
    frame_limit: Option<usize>,
    dilation_radius: Option<usize>,
    blur_sigma: Option<f32>,
    histogram: Option<HistogramConfig>,
    retry: Option<RetryPolicy>,
    compression: Option<TiffCompression>,
    predictor: Option<Option<u16>>,
}

impl PipelineConfigBuilder {
    pub fn input<P: Into<PathBuf>>(mut self, input: P) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn checkpoint_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.checkpoint_dir = Some(dir.into());
        self
    }

    pub fn frame_limit(mut self, limit: Option<usize>) -> Self {
        self.frame_limit = limit;
        self
    }

    pub fn dilation_radius(mut self, radius: usize) -> Self {
        self.dilation_radius = Some(radius);
        self
    }

    pub fn blur_sigma(mut self, sigma: f32) -> Self {
        self.blur_sigma = Some(sigma);
        self
    }

    pub fn histogram(mut self, histogram: HistogramConfig) -> Self {
        self.histogram = Some(histogram);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn predictor(mut self, predictor: Option<u16>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn build(self) -> PipelineConfig {
        let default = PipelineConfig::default();
        PipelineConfig {
            input: self.input.unwrap_or(default.input),
            checkpoint_dir: self.checkpoint_dir.or(default.checkpoint_dir),
            frame_limit: self.frame_limit.or(default.frame_limit),
            shape: ShapeConfig {
                dilation_radius: self.dilation_radius.unwrap_or(default.shape.dilation_radius),
                blur_sigma: self.blur_sigma.unwrap_or(default.shape.blur_sigma),
            },
            histogram: self.histogram.unwrap_or(default.histogram),
            retry: self.retry.unwrap_or(default.retry),
            output: TiffConfig {
                compression: self.compression.unwrap_or(default.output.compression),
                predictor: self.predictor.unwrap_or(default.output.predictor),
            },
        }
    }
}
