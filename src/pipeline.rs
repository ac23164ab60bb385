//! Incremental distance field generation, advanced one tick at a time.
//!
//! A [`PipelineRun`] owns everything a generation needs: the source and target
//! images, both distance grids and the composited output. The caller decides
//! when to advance it, typically once per frame of a host loop:
//!
//! ```rust
//! # use sequential_distance_field::prelude::*;
//! # fn run(pixels: image::GrayImage) -> Result<(), PipelineError> {
//! let request = GenerationRequest::new(MemorySource::new(pixels, false), MemoryTarget::new(false));
//! let mut run: PipelineRun<_, _> = PipelineRun::start(request)?;
//!
//! loop {
//!     match run.step(&mut IgnoreProgress)? {
//!         RunStatus::Completed | RunStatus::Cancelled => break,
//!         RunStatus::Waiting(Precondition::TargetMissing) => break,
//!         RunStatus::Working(_) | RunStatus::Waiting(_) => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Each tick performs exactly one phase, or one chunk of rows of a phase when
//! [`GeneratorConfig::chunk_rows`] is set. Phases always follow each other in
//! the order of [`Phase`]; cancellation skips ahead to [`Phase::RestoringSource`].

use std::fmt;

use log::{debug, info, trace, warn};

use crate::binary_image::GrayscaleImage;
use crate::classify::classify_rows;
use crate::config::GeneratorConfig;
use crate::distance_field::{DistanceStorage, F32DistanceStorage, SignedDistanceImage};
use crate::distance_grid::{DistanceGrid, MAX_DIMENSION};
use crate::error::PipelineError;
use crate::host::{Control, HostImage, ProgressObserver, SourceImage, TargetImage};
use crate::transform::SweepCursor;


/// The phases of a run, in the order they are executed.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Phase {
    /// No work left. The final phase of every run.
    Idle,

    /// Waiting for a target and for both images to become readable.
    PreparingSource,

    /// Seeding the inside and the outside grid from the mask.
    ClassifyingMask,

    /// Transforming the inside-seeded grid.
    TransformingA,

    /// Transforming the outside-seeded grid.
    TransformingB,

    /// Combining both grids into the normalized output.
    Compositing,

    /// Handing the encoded output to the target.
    Persisting,

    /// Switching the readable flags back to what they were before the run.
    RestoringSource,
}

impl Phase {
    pub const fn name(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::PreparingSource => "preparing source",
            Phase::ClassifyingMask => "classifying mask",
            Phase::TransformingA => "transforming inside grid",
            Phase::TransformingB => "transforming outside grid",
            Phase::Compositing => "compositing",
            Phase::Persisting => "persisting",
            Phase::RestoringSource => "restoring source",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}


/// How much of a run is done, in work units.
/// Classification, transformation and compositing each contribute one unit per pixel.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Progress {
    pub phase: Phase,
    pub current: u64,
    pub total: u64,
}

impl Progress {
    /// The completed share of the run, within `0.0..=1.0`.
    pub fn fraction(&self) -> f32 {
        if self.total == 0 { 1.0 }
        else { (self.current as f64 / self.total as f64) as f32 }
    }
}


/// Something the host has to provide before the run can continue.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Precondition {
    /// No target image exists yet. See [`PipelineRun::provide_target`].
    TargetMissing,

    /// Readable access to the source was requested but is not granted yet.
    SourceNotReadable,

    /// Readable access to the target was requested but is not granted yet.
    TargetNotReadable,
}

/// The state of a run after a tick.
#[must_use]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RunStatus {
    /// The run made progress and has more work to do.
    Working(Progress),

    /// The run cannot continue until the host satisfies the precondition.
    /// Readability is re-checked on the next tick.
    Waiting(Precondition),

    /// The distance field was stored and the images were restored.
    Completed,

    /// The run was cancelled. Nothing was stored and the images were restored.
    Cancelled,
}

impl RunStatus {
    pub const fn is_finished(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Cancelled)
    }
}


/// Everything needed to start a run. Either image may be absent,
/// but only a missing target is recoverable.
pub struct GenerationRequest<S, T> {
    pub source: Option<S>,
    pub target: Option<T>,
    pub config: GeneratorConfig,
}

impl<S, T> GenerationRequest<S, T> {
    pub fn new(source: S, target: T) -> Self {
        GenerationRequest { source: Some(source), target: Some(target), config: GeneratorConfig::default() }
    }

    pub fn with_config(self, config: GeneratorConfig) -> Self {
        GenerationRequest { config, ..self }
    }
}


/// One generation of a distance field, from a source mask into a target image.
///
/// The run owns its images for its whole lifetime,
/// so no other run can read or write them concurrently.
/// Call [`PipelineRun::into_images`] to get them back.
pub struct PipelineRun<S, T, D = F32DistanceStorage> where D: DistanceStorage {
    source: S,
    target: Option<T>,
    config: GeneratorConfig,

    width: u32,
    height: u32,
    phase: Phase,

    inside: DistanceGrid,
    outside: DistanceGrid,
    output: SignedDistanceImage<D>,

    classified_rows: u32,
    inside_sweep: SweepCursor,
    outside_sweep: SweepCursor,
    composited_rows: u32,

    source_was_readable: bool,
    target_was_readable: Option<bool>,

    cancel_requested: bool,
    cancelled: bool,
}

impl<S, T, D> PipelineRun<S, T, D>
    where S: SourceImage, T: TargetImage, D: DistanceStorage
{

    /// Validate the request. The run starts in [`Phase::PreparingSource`]
    /// and allocates its grids once both images are readable.
    pub fn start(request: GenerationRequest<S, T>) -> Result<Self, PipelineError> {
        request.config.validate()?;

        let source = request.source.ok_or(PipelineError::MissingSource)?;
        let (width, height) = source.dimensions();

        if width == 0 || height == 0 {
            return Err(PipelineError::EmptySource { width, height });
        }

        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(PipelineError::SourceTooLarge { width, height });
        }

        info!("starting distance field run for a {}x{} source", width, height);

        Ok(PipelineRun {
            source_was_readable: source.is_readable(),
            target_was_readable: request.target.as_ref().map(HostImage::is_readable),

            source,
            target: request.target,
            config: request.config,

            width, height,
            phase: Phase::PreparingSource,

            inside: DistanceGrid::new(0, 0),
            outside: DistanceGrid::new(0, 0),
            output: SignedDistanceImage::new(0, 0),

            classified_rows: 0,
            inside_sweep: SweepCursor::new(),
            outside_sweep: SweepCursor::new(),
            composited_rows: 0,

            cancel_requested: false,
            cancelled: false,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn target(&self) -> Option<&T> {
        self.target.as_ref()
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_requested
    }

    /// Hand the images back once the run is no longer needed.
    pub fn into_images(self) -> (S, Option<T>) {
        (self.source, self.target)
    }

    /// Supply the target of a run that is waiting for one.
    /// Returns the given target back if the run already has one.
    pub fn provide_target(&mut self, target: T) -> Result<(), T> {
        if self.target.is_some() {
            return Err(target);
        }

        debug!("target provided");
        self.target_was_readable = Some(target.is_readable());
        self.target = Some(target);
        Ok(())
    }

    /// Stop the run at the start of the next tick. Has no effect once the
    /// output has been persisted, as only restoring the images remains.
    pub fn cancel(&mut self) {
        if !matches!(self.phase, Phase::RestoringSource | Phase::Idle) {
            self.cancel_requested = true;
        }
    }

    /// The work units done so far. Both transforms together count as one unit per pixel.
    pub fn progress(&self) -> Progress {
        let width = u64::from(self.width);
        let height = u64::from(self.height);
        let pixels = width * height;

        let classified = width * u64::from(self.classified_rows);
        let swept = u64::from(self.inside_sweep.rows_swept()) + u64::from(self.outside_sweep.rows_swept());
        let transformed = pixels * swept / (4 * height);
        let composited = width * u64::from(self.composited_rows);

        Progress {
            phase: self.phase,
            current: classified + transformed + composited,
            total: pixels * 3,
        }
    }

    /// Perform one tick of work. The observer sees the progress before the work is done
    /// and may cancel the run. Stepping an idle run does nothing and repeats its outcome.
    ///
    /// Errors leave the run in its current phase; the caller may retry the tick,
    /// or [cancel](Self::cancel) and keep stepping to restore the images.
    pub fn step(&mut self, observer: &mut impl ProgressObserver) -> Result<RunStatus, PipelineError> {
        if self.phase == Phase::Idle {
            return Ok(self.outcome());
        }

        if observer.on_progress(&self.progress()) == Control::Cancel {
            self.cancel();
        }

        if self.cancel_requested && !self.cancelled {
            info!("cancelling distance field run during {}", self.phase);
            self.cancelled = true;
            self.release_buffers();
            self.enter(Phase::RestoringSource);
        }

        match self.phase {
            Phase::Idle => Ok(self.outcome()),
            Phase::PreparingSource => self.prepare(),
            Phase::ClassifyingMask => self.classify(),
            Phase::TransformingA => Ok(self.transform_inside()),
            Phase::TransformingB => Ok(self.transform_outside()),
            Phase::Compositing => Ok(self.composite()),
            Phase::Persisting => self.persist(),
            Phase::RestoringSource => self.restore(),
        }
    }

    /// Step until the run finishes or waits for a target.
    /// Does not return while a host never grants readable access.
    pub fn run_to_end(&mut self, observer: &mut impl ProgressObserver) -> Result<RunStatus, PipelineError> {
        loop {
            let status = self.step(observer)?;

            if status.is_finished() || status == RunStatus::Waiting(Precondition::TargetMissing) {
                return Ok(status);
            }
        }
    }


    fn prepare(&mut self) -> Result<RunStatus, PipelineError> {
        let Some(target) = self.target.as_mut() else {
            return Ok(RunStatus::Waiting(Precondition::TargetMissing));
        };

        let source_readable = self.source.is_readable();
        let target_readable = target.is_readable();

        if source_readable && target_readable {
            // a source that lost readability mid-classification keeps its partial grids
            if self.classified_rows == 0 {
                self.allocate_buffers();
            }

            self.enter(Phase::ClassifyingMask);
            return Ok(self.working());
        }

        if !target_readable {
            debug!("requesting readable target");
            target.set_readable(true)?;
        }

        if !source_readable {
            debug!("requesting readable source");
            self.source.set_readable(true)?;
            return Ok(RunStatus::Waiting(Precondition::SourceNotReadable));
        }

        Ok(RunStatus::Waiting(Precondition::TargetNotReadable))
    }

    fn classify(&mut self) -> Result<RunStatus, PipelineError> {
        let Some(pixels) = self.source.pixels() else {
            warn!("source lost readable access during {}", self.phase);
            self.enter(Phase::PreparingSource);
            return Ok(RunStatus::Waiting(Precondition::SourceNotReadable));
        };

        let actual = (pixels.width(), pixels.height());
        if actual != (self.width, self.height) {
            return Err(PipelineError::SourceSizeChanged { expected: (self.width, self.height), actual });
        }

        let start = self.classified_rows;
        let end = start.saturating_add(self.config.rows_per_tick()).min(self.height);

        classify_rows(&mut self.inside, &mut self.outside, pixels, self.config.threshold, start..end);
        self.classified_rows = end;
        trace!("classified rows {}..{}", start, end);

        if end == self.height {
            self.enter(Phase::TransformingA);
        }

        Ok(self.working())
    }

    fn transform_inside(&mut self) -> RunStatus {
        let swept = self.inside_sweep.advance(&mut self.inside, self.config.rows_per_tick());
        trace!("swept {} rows of the inside grid", swept);

        if self.inside_sweep.is_complete(self.height) {
            if !self.inside.has_seed() {
                warn!("mask has no pixels inside the shape, distances saturate");
            }

            self.enter(Phase::TransformingB);
        }

        self.working()
    }

    fn transform_outside(&mut self) -> RunStatus {
        let swept = self.outside_sweep.advance(&mut self.outside, self.config.rows_per_tick());
        trace!("swept {} rows of the outside grid", swept);

        if self.outside_sweep.is_complete(self.height) {
            if !self.outside.has_seed() {
                warn!("mask has no pixels outside the shape, distances saturate");
            }

            self.enter(Phase::Compositing);
        }

        self.working()
    }

    fn composite(&mut self) -> RunStatus {
        let start = self.composited_rows;
        let end = start.saturating_add(self.config.rows_per_tick()).min(self.height);

        self.output.composite_rows(&self.inside, &self.outside, self.config.normalization(), start..end);
        self.composited_rows = end;
        trace!("composited rows {}..{}", start, end);

        if end == self.height {
            self.enter(Phase::Persisting);
        }

        self.working()
    }

    fn persist(&mut self) -> Result<RunStatus, PipelineError> {
        let png = self.output.encode_png()?;

        if let Some(target) = self.target.as_mut() {
            target.store(&png)?;
            info!("stored {}x{} distance field ({} bytes)", self.width, self.height, png.len());
        }

        self.release_buffers();
        self.enter(Phase::RestoringSource);
        Ok(self.working())
    }

    fn restore(&mut self) -> Result<RunStatus, PipelineError> {
        let mut pending = false;

        if self.source.is_readable() != self.source_was_readable {
            self.source.set_readable(self.source_was_readable)?;
            pending = true;
        }

        if let (Some(target), Some(was_readable)) = (self.target.as_mut(), self.target_was_readable) {
            if target.is_readable() != was_readable {
                target.set_readable(was_readable)?;
                pending = true;
            }
        }

        if pending {
            return Ok(self.working());
        }

        self.enter(Phase::Idle);
        info!("distance field run {}", if self.cancelled { "cancelled" } else { "completed" });
        Ok(self.outcome())
    }


    fn enter(&mut self, phase: Phase) {
        debug!("{} -> {}", self.phase, phase);
        self.phase = phase;
    }

    fn working(&self) -> RunStatus {
        RunStatus::Working(self.progress())
    }

    fn outcome(&self) -> RunStatus {
        if self.cancelled { RunStatus::Cancelled } else { RunStatus::Completed }
    }

    fn allocate_buffers(&mut self) {
        self.inside = DistanceGrid::new(self.width, self.height);
        self.outside = DistanceGrid::new(self.width, self.height);
        self.output = SignedDistanceImage::new(self.width, self.height);
    }

    fn release_buffers(&mut self) {
        self.inside = DistanceGrid::new(0, 0);
        self.outside = DistanceGrid::new(0, 0);
        self.output = SignedDistanceImage::new(0, 0);
    }
}
