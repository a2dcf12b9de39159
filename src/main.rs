use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use dustflat_rs::image_pipeline::{
    CommandModel, ConsoleOperator, FlatFieldPipeline, PipelineConfig, PipelineOutcome,
    TiffCompression,
};
use dustflat_rs::logger;

use tracing::{info, warn};

#[derive(Clone, Copy, ValueEnum)]
enum Compression {
    None,
    Lzw,
    DeflateFast,
    Deflate,
    DeflateBest,
}

impl From<Compression> for TiffCompression {
    fn from(value: Compression) -> Self {
        match value {
            Compression::None => TiffCompression::None,
            Compression::Lzw => TiffCompression::Lzw,
            Compression::DeflateFast => TiffCompression::DeflateFast,
            Compression::Deflate => TiffCompression::DeflateBalanced,
            Compression::DeflateBest => TiffCompression::DeflateBest,
        }
    }
}

#[derive(Parser)]
#[command(name = "dustflat", about = "Builds a dust flat-field correction map from a SER capture")]
struct Cli {
    /// SER capture of an evenly illuminated field
    input: PathBuf,

    /// Stack only the first N frames
    #[arg(short, long)]
    frames: Option<usize>,

    /// Directory for checkpoints and the correction map (defaults to the capture's)
    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,

    /// Program implementing the detect/inpaint protocol
    #[arg(long, env = "DUSTFLAT_MODEL", default_value = "dustflat-model")]
    model: PathBuf,

    #[arg(long, default_value_t = 10)]
    dilation_radius: usize,

    #[arg(long, default_value_t = 3.0)]
    blur_sigma: f32,

    #[arg(long, value_enum, default_value = "none")]
    compression: Compression,
}

fn main() -> anyhow::Result<()> {
    logger::init();
    let cli = Cli::parse();

    info!("Starting dustflat...");

    let mut builder = PipelineConfig::builder()
        .input(&cli.input)
        .frame_limit(cli.frames)
        .dilation_radius(cli.dilation_radius)
        .blur_sigma(cli.blur_sigma)
        .compression(cli.compression.into());
    if let Some(dir) = &cli.checkpoint_dir {
        builder = builder.checkpoint_dir(dir);
    }
    let config = builder.build();

    let model = CommandModel::new(&cli.model);
    let operator = ConsoleOperator::new(io::stdin().lock(), io::stdout());
    let mut pipeline = FlatFieldPipeline::new(config, model, operator)
        .context("failed to prepare checkpoint directory")?;

    info!(model = %cli.model.display(), "Pipeline initialized");
    info!("Checkpoints: {}", pipeline.config().checkpoint_dir().display());

    match pipeline
        .run()
        .with_context(|| format!("processing {} failed", cli.input.display()))?
    {
        PipelineOutcome::Completed { output, report } => {
            info!(
                computed = report.computed.len(),
                resumed = report.resumed.len(),
                "Correction map written to {}",
                output.display()
            );
        }
        PipelineOutcome::Aborted { stage, .. } => {
            warn!(%stage, "Run aborted; rerun to resume from the last confirmed checkpoint");
        }
    }

    Ok(())
}
