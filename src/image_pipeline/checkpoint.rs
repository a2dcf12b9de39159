//! Checkpoint persistence module

mod store;


pub use store::{Artifact, CheckpointStore};
