//! Flat-field correction pipeline module
//!
//! This module turns a SER capture of a flat field into a 16-bit dust
//! correction map, with separate modules for capture reading, stacking,
//! mask shaping, histogram normalization, synthesis and orchestration.

pub mod checkpoint;
pub mod collaborator;
pub mod common;
pub mod flatfield;
pub mod histogram;
pub mod mask;
pub mod orchestrator;
pub mod ser;
pub mod stacking;
pub mod tiff;

#[cfg(test)]
pub(crate) mod test_utils;

pub use common::{
    CorrectionMap,
    FlatFieldError,
    Image,
    Mask,
    Result,
};

pub use ser::{
    SerHeader,
    SerReader,
};

pub use checkpoint::{
    Artifact,
    CheckpointStore,
};

pub use collaborator::{
    CommandModel,
    DustModel,
    RetryPolicy,
    RetryingModel,
    ServiceError,
};

pub use self::tiff::{
    TiffCompression,
    TiffConfig,
};

pub use orchestrator::{
    ConsoleOperator,
    Decision,
    FlatFieldPipeline,
    Operator,
    PipelineConfig,
    PipelineConfigBuilder,
    PipelineOutcome,
    Stage,
};
