use std::io::{BufRead, Write};

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::common::types::Image;
use crate::image_pipeline::orchestrator::state::{Decision, Stage};

/// The human at the confirmation checkpoints.
pub trait Operator {
    /// Blocks until the operator accepts, retries or aborts `candidate`.
    fn review(&mut self, stage: Stage, candidate: &Image) -> Result<Decision>;
}

/// Summary printed in place of a preview.
fn describe(stage: Stage, candidate: &Image) -> String {
    let n = candidate.data.len() as f64;
    match stage {
        Stage::AwaitMaskConfirmation => {
            let covered = candidate.data.iter().filter(|&&v| v > 0.0).count();
            format!(
                "dust mask {}x{}: {:.2}% of pixels covered",
                candidate.width,
                candidate.height,
                100.0 * covered as f64 / n
            )
        }
        _ => {
            let (min, max, sum) = candidate.data.iter().fold(
                (f32::INFINITY, f32::NEG_INFINITY, 0.0f64),
                |(lo, hi, s), &v| (lo.min(v), hi.max(v), s + v as f64),
            );
            format!(
                "image {}x{}: min {:.1}, max {:.1}, mean {:.1}",
                candidate.width,
                candidate.height,
                min,
                max,
                sum / n
            )
        }
    }
}

/// Line-oriented operator: `a` accepts, `r` retries, `q` aborts.
/// End of input aborts.
pub struct ConsoleOperator<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Operator for ConsoleOperator<R, W> {
    fn review(&mut self, stage: Stage, candidate: &Image) -> Result<Decision> {
        writeln!(self.output, "[{stage}] {}", describe(stage, candidate))?;
        loop {
            write!(self.output, "Accept, retry or abort? [a/r/q] ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(Decision::Abort);
            }
            match line.trim().to_ascii_lowercase().as_str() {
                "a" | "accept" => return Ok(Decision::Accept),
                "r" | "retry" => return Ok(Decision::Retry),
                "q" | "abort" => return Ok(Decision::Abort),
                other => writeln!(self.output, "Unrecognized answer {other:?}")?,
            }
        }
    }
}
