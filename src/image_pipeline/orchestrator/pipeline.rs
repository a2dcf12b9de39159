use std::path::PathBuf;

use tracing::{info, info_span, instrument, warn};

use crate::image_pipeline::{
    checkpoint::{Artifact, CheckpointStore},
    collaborator::{DustModel, RetryingModel, conform_mask_to, conform_to},
    common::{
        error::Result,
        types::{Image, Mask},
    },
    flatfield::synthesize,
    histogram::match_histogram,
    mask::shape_mask,
    orchestrator::{
        config::PipelineConfig,
        operator::Operator,
        state::{Decision, Event, Stage, transition},
    },
    ser::SerReader,
    stacking::median_stack,
};

/// How a run ended when no error occurred.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Completed { output: PathBuf, report: RunReport },
    /// The operator aborted while `stage` was awaiting confirmation.
    Aborted { stage: Stage, report: RunReport },
}

/// Which stages did work and which were satisfied by checkpoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub computed: Vec<Stage>,
    pub resumed: Vec<Stage>,
    /// Candidates the operator sent back to the model
    pub retries: usize,
}

/// In-memory results of the current run. Artifacts restored from checkpoints
/// are only read when a later stage needs them.
#[derive(Default)]
struct Session {
    reader: Option<SerReader>,
    median: Option<Image>,
    raw_mask: Option<Mask>,
    shaped_mask: Option<Mask>,
    inpainted: Option<Image>,
    normalized: Option<Image>,
}

fn load_cached<'a>(
    slot: &'a mut Option<Image>,
    store: &CheckpointStore,
    artifact: Artifact,
) -> Result<&'a Image> {
    let image = match slot.take() {
        Some(image) => image,
        None => store.load_image(artifact)?,
    };
    Ok(slot.insert(image))
}

/// Drives a capture through median, mask, inpaint, normalization and
/// synthesis, checkpointing after each stage.
pub struct FlatFieldPipeline<M: DustModel, O: Operator> {
    config: PipelineConfig,
    model: RetryingModel<M>,
    operator: O,
    store: CheckpointStore,
}

impl<M: DustModel, O: Operator> FlatFieldPipeline<M, O> {
    pub fn new(config: PipelineConfig, model: M, operator: O) -> Result<Self> {
        config.shape.validate()?;
        let store = CheckpointStore::new(config.checkpoint_dir(), config.capture_stem())?;
        Ok(Self {
            model: RetryingModel::new(model, config.retry.clone()),
            config,
            operator,
            store,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Runs from the first stage whose checkpoint is missing until the
    /// correction map is written or the operator aborts.
    #[instrument(skip(self), fields(input = %self.config.input.display()))]
    pub fn run(&mut self) -> Result<PipelineOutcome> {
        info!("Starting flat-field pipeline");

        let mut session = Session::default();
        let mut report = RunReport::default();
        let mut stage = Stage::LoadFrames;

        while !stage.is_terminal() {
            let event = {
                let _span = info_span!("stage", %stage).entered();
                self.step(stage, &mut session)?
            };

            match event {
                Event::Resumed => report.resumed.push(stage),
                Event::Completed | Event::Decided(Decision::Accept) => report.computed.push(stage),
                Event::Decided(Decision::Retry) => report.retries += 1,
                Event::Decided(Decision::Abort) => {}
            }

            let next = transition(stage, event);
            if next == Stage::Aborted {
                warn!(%stage, "Aborted by operator, keeping confirmed checkpoints");
                return Ok(PipelineOutcome::Aborted { stage, report });
            }
            stage = next;
        }

        let output = self.store.path(Artifact::FlatField);
        info!(
            output = %output.display(),
            computed = report.computed.len(),
            resumed = report.resumed.len(),
            "Flat field complete"
        );
        Ok(PipelineOutcome::Completed { output, report })
    }

    fn step(&mut self, stage: Stage, session: &mut Session) -> Result<Event> {
        if let Some(artifact) = stage.artifact() {
            if self.store.exists(artifact) {
                info!(%stage, path = %self.store.path(artifact).display(), "Checkpoint present, skipping");
                return Ok(Event::Resumed);
            }
        }

        match stage {
            Stage::LoadFrames => self.load_frames(session),
            Stage::ComputeMedian => self.compute_median(session),
            Stage::AwaitMaskConfirmation => self.await_mask(session),
            Stage::ShapeMask => self.shape(session),
            Stage::AwaitInpaintConfirmation => self.await_inpaint(session),
            Stage::NormalizeHistogram => self.normalize(session),
            Stage::Synthesize => self.synthesize(session),
            Stage::Done | Stage::Aborted => Ok(Event::Completed),
        }
    }

    fn load_frames(&self, session: &mut Session) -> Result<Event> {
        if self.store.exists(Artifact::Median) {
            info!("Median checkpoint present, capture not opened");
            return Ok(Event::Resumed);
        }
        let reader = SerReader::open(&self.config.input, self.config.frame_limit)?;
        let header = reader.header();
        info!(
            width = header.width,
            height = header.height,
            bit_depth = header.bit_depth,
            frames = reader.frame_count(),
            "Capture opened"
        );
        session.reader = Some(reader);
        Ok(Event::Completed)
    }

    fn compute_median(&self, session: &mut Session) -> Result<Event> {
        let reader = match session.reader.take() {
            Some(reader) => reader,
            None => SerReader::open(&self.config.input, self.config.frame_limit)?,
        };
        let median = median_stack(reader.frames()?, reader.frame_count())?;
        // Frames are no longer needed once the median exists.
        drop(reader);

        self.store.save_image(Artifact::Median, &median)?;
        session.median = Some(median);
        Ok(Event::Completed)
    }

    fn await_mask(&mut self, session: &mut Session) -> Result<Event> {
        let median = load_cached(&mut session.median, &self.store, Artifact::Median)?;
        let candidate = conform_mask_to(median, self.model.detect(median)?)?;

        let decision = self.operator.review(Stage::AwaitMaskConfirmation, &candidate)?;
        info!(?decision, "Mask reviewed");
        if decision == Decision::Accept {
            self.store.save_image(Artifact::RawMask, &candidate)?;
            session.raw_mask = Some(candidate);
        }
        Ok(Event::Decided(decision))
    }

    fn shape(&self, session: &mut Session) -> Result<Event> {
        let raw = load_cached(&mut session.raw_mask, &self.store, Artifact::RawMask)?;
        let shaped = shape_mask(raw, &self.config.shape)?;
        self.store.save_image(Artifact::ShapedMask, &shaped)?;
        session.shaped_mask = Some(shaped);
        Ok(Event::Completed)
    }

    fn await_inpaint(&mut self, session: &mut Session) -> Result<Event> {
        let median = load_cached(&mut session.median, &self.store, Artifact::Median)?;
        let mask = load_cached(&mut session.shaped_mask, &self.store, Artifact::ShapedMask)?;
        let candidate = conform_to(median, self.model.inpaint(median, mask)?)?;

        let decision = self.operator.review(Stage::AwaitInpaintConfirmation, &candidate)?;
        info!(?decision, "Inpainting reviewed");
        if decision == Decision::Accept {
            self.store.save_image(Artifact::Inpainted, &candidate)?;
            session.inpainted = Some(candidate);
        }
        Ok(Event::Decided(decision))
    }

    fn normalize(&self, session: &mut Session) -> Result<Event> {
        let median = load_cached(&mut session.median, &self.store, Artifact::Median)?;
        let inpainted = load_cached(&mut session.inpainted, &self.store, Artifact::Inpainted)?;
        let mask = load_cached(&mut session.shaped_mask, &self.store, Artifact::ShapedMask)?;

        let normalized = match_histogram(median, inpainted, mask, &self.config.histogram)?;
        self.store.save_image(Artifact::Normalized, &normalized)?;
        session.normalized = Some(normalized);
        Ok(Event::Completed)
    }

    fn synthesize(&self, session: &mut Session) -> Result<Event> {
        let median = load_cached(&mut session.median, &self.store, Artifact::Median)?;
        let normalized = load_cached(&mut session.normalized, &self.store, Artifact::Normalized)?;
        let mask = load_cached(&mut session.shaped_mask, &self.store, Artifact::ShapedMask)?;

        let (map, stats) = synthesize(median, normalized, mask)?;
        info!(
            untouched = stats.untouched,
            ratio_fallbacks = stats.ratio_fallbacks,
            "Correction map synthesized"
        );
        self.store.save_correction_map(&map, &self.config.output)?;
        Ok(Event::Completed)
    }
}
