//! Pipeline state machine.
//!
//! [`transition`] is pure; the driver in `pipeline.rs` performs the stage work
//! and owns all blocking interaction.

use std::fmt;

use crate::image_pipeline::checkpoint::Artifact;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    LoadFrames,
    ComputeMedian,
    AwaitMaskConfirmation,
    ShapeMask,
    AwaitInpaintConfirmation,
    NormalizeHistogram,
    Synthesize,
    Done,
    Aborted,
}

/// Operator verdict on a model candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Retry,
    Abort,
}

/// What happened while a stage was active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The stage produced its result.
    Completed,
    /// The stage's checkpoint already existed; nothing was computed.
    Resumed,
    /// The operator decided on a candidate.
    Decided(Decision),
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Aborted)
    }

    pub fn awaits_confirmation(self) -> bool {
        matches!(self, Stage::AwaitMaskConfirmation | Stage::AwaitInpaintConfirmation)
    }

    /// Checkpoint whose presence lets the stage be skipped.
    pub fn artifact(self) -> Option<Artifact> {
        match self {
            Stage::ComputeMedian => Some(Artifact::Median),
            Stage::AwaitMaskConfirmation => Some(Artifact::RawMask),
            Stage::ShapeMask => Some(Artifact::ShapedMask),
            Stage::AwaitInpaintConfirmation => Some(Artifact::Inpainted),
            Stage::NormalizeHistogram => Some(Artifact::Normalized),
            Stage::Synthesize => Some(Artifact::FlatField),
            Stage::LoadFrames | Stage::Done | Stage::Aborted => None,
        }
    }

    fn successor(self) -> Stage {
        match self {
            Stage::LoadFrames => Stage::ComputeMedian,
            Stage::ComputeMedian => Stage::AwaitMaskConfirmation,
            Stage::AwaitMaskConfirmation => Stage::ShapeMask,
            Stage::ShapeMask => Stage::AwaitInpaintConfirmation,
            Stage::AwaitInpaintConfirmation => Stage::NormalizeHistogram,
            Stage::NormalizeHistogram => Stage::Synthesize,
            Stage::Synthesize => Stage::Done,
            Stage::Done => Stage::Done,
            Stage::Aborted => Stage::Aborted,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::LoadFrames => "load_frames",
            Stage::ComputeMedian => "compute_median",
            Stage::AwaitMaskConfirmation => "await_mask_confirmation",
            Stage::ShapeMask => "shape_mask",
            Stage::AwaitInpaintConfirmation => "await_inpaint_confirmation",
            Stage::NormalizeHistogram => "normalize_histogram",
            Stage::Synthesize => "synthesize",
            Stage::Done => "done",
            Stage::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Next stage after `event` happened in `stage`. Terminal stages absorb every event.
pub fn transition(stage: Stage, event: Event) -> Stage {
    if stage.is_terminal() {
        return stage;
    }
    match event {
        Event::Completed | Event::Resumed | Event::Decided(Decision::Accept) => stage.successor(),
        Event::Decided(Decision::Retry) => stage,
        Event::Decided(Decision::Abort) => Stage::Aborted,
    }
}
