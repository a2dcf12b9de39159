//! Pipeline orchestration module
//!
//! A checkpointed state machine that sequences the processing stages and
//! blocks on operator confirmation around every dust model call.

mod config;
mod operator;
mod pipeline;
mod state;


pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use operator::{ConsoleOperator, Operator};
pub use pipeline::{FlatFieldPipeline, PipelineOutcome, RunReport};
pub use state::{Decision, Event, Stage, transition};
