use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::calc::config::EngineConfig;
use crate::calc::engine::PictureRequest;
use crate::calc::handle::{CalculationOutput, CalculationState, RunShared};
use crate::calc::listener::Fanout;
use crate::calc::pool::WorkerPool;
use crate::calc::progress::{RunProgress, TargetProgress};
use crate::compile::compiler::GraphCompiler;
use crate::foundation::error::{PixelflowError, PixelflowResult};
use crate::render::picture::{AllocationError, Picture, RowsMut, buffer_len};
use crate::render::renderer::{PixelRegion, RenderError, Renderer};
use crate::render::slices;
use crate::synth::emit::synthesize;

/// Everything the coordinator thread owns for one run.
pub(crate) struct RunJob {
    pub(crate) requests: Vec<PictureRequest>,
    pub(crate) buffers: Vec<Option<Picture>>,
    pub(crate) config: EngineConfig,
    pub(crate) pool: WorkerPool,
    pub(crate) compiler: Arc<dyn GraphCompiler>,
    pub(crate) events: Fanout,
    pub(crate) shared: Arc<RunShared>,
}

/// Buffers of one request.
#[derive(Debug)]
struct Target {
    picture: Picture,
    preview: Option<Picture>,
}

/// Read-only context shared by the picture and slice tasks of the rendering phase.
struct RenderCtx<'a> {
    events: &'a Fanout,
    progress: &'a RunProgress,
    failed: &'a [AtomicBool],
}

impl RenderCtx<'_> {
    fn has_failed(&self, picture: usize) -> bool {
        self.failed
            .get(picture)
            .is_some_and(|f| f.load(Ordering::Acquire))
    }

    /// Abort `picture`: its renderer is stopped so sibling slices return early, and the
    /// first failure of the picture is reported.
    fn fail(&self, picture: usize, renderer: &dyn Renderer, err: PixelflowError, context: &str) {
        renderer.stop();
        let first = self
            .failed
            .get(picture)
            .is_some_and(|f| !f.swap(true, Ordering::AcqRel));
        if first {
            tracing::error!(picture, error = %err, "{context} failed");
            let description = format!("picture {picture}, {context}: {err}");
            self.events.error(err.summary(), &description, &err);
        }
    }
}

/// Coordinate one run from allocation to the final event.
///
/// A panic that escapes the phases (a listener failing in `on_ready`, for one) still
/// settles the run as [`CalculationState::Failed`] with one error event.
pub(crate) fn execute(job: RunJob) -> PixelflowResult<CalculationOutput> {
    let events = job.events.clone();
    let shared = Arc::clone(&job.shared);
    let payload = match std::panic::catch_unwind(AssertUnwindSafe(|| run_phases(job))) {
        Ok(result) => return result,
        Err(payload) => payload,
    };
    let message = panic_message(payload.as_ref());
    let err = PixelflowError::Other(anyhow::anyhow!("calculation panicked: {message}"));
    tracing::error!(error = %err, "calculation aborted");
    let reported = std::panic::catch_unwind(AssertUnwindSafe(|| {
        events.error(err.summary(), &err.to_string(), &err);
    }));
    if reported.is_err() {
        tracing::error!("a listener panicked while receiving the abort error");
    }
    shared.enter(CalculationState::Failed, "calculation panicked");
    Err(err)
}

fn run_phases(job: RunJob) -> PixelflowResult<CalculationOutput> {
    let RunJob {
        requests,
        buffers,
        config,
        pool,
        compiler,
        events,
        shared,
    } = job;
    let count = requests.len();

    shared.enter(CalculationState::Allocating, "allocating pictures");
    let mut targets = match allocate(&requests, buffers, &config) {
        Ok(targets) => targets,
        Err(err) => {
            let err = PixelflowError::Allocation(err);
            tracing::error!(error = %err, pictures = count, "allocation failed, run aborted");
            let description = format!(
                "{err}. All {count} pictures and previews of the run were discarded; \
                 free memory or request smaller pictures and start again."
            );
            events.error(err.summary(), &description, &err);
            shared.enter(CalculationState::Failed, "not enough memory");
            return Err(err);
        }
    };

    let workers = pool.workers();
    let steps = config
        .progress_steps
        .unwrap_or_else(|| slices::progress_steps(workers));
    let per_picture = config
        .slices_per_picture
        .unwrap_or_else(|| slices::slices_per_picture(workers, count));
    let failed: Vec<AtomicBool> = (0..count).map(|_| AtomicBool::new(false)).collect();

    shared.enter(
        CalculationState::Compiling,
        format!("compiling {count} pictures"),
    );
    let compiled: Vec<Option<Arc<dyn Renderer>>> = pool.install(|| {
        requests
            .par_iter()
            .map(|r| {
                std::panic::catch_unwind(AssertUnwindSafe(|| {
                    compile_one(compiler.as_ref(), r, steps)
                }))
                .unwrap_or_else(|payload| {
                    let message = panic_message(payload.as_ref());
                    let err = PixelflowError::Other(anyhow::anyhow!(
                        "compile task panicked: {message}"
                    ));
                    let description = err.to_string();
                    Err((err, description))
                })
            })
            .collect::<Vec<_>>()
    })
    .into_iter()
    .enumerate()
    .map(|(i, result)| match result {
        Ok(renderer) => {
            shared.register(Arc::clone(&renderer));
            Some(renderer)
        }
        Err((err, description)) => {
            tracing::warn!(picture = i, error = %err, "picture did not compile");
            failed[i].store(true, Ordering::Release);
            events.error(err.summary(), &format!("picture {i}: {description}"), &err);
            None
        }
    })
    .collect();

    let progress = Arc::new(RunProgress::new(
        targets
            .iter()
            .enumerate()
            .map(|(i, t)| {
                compiled[i]
                    .as_ref()
                    .map(|_| target_progress(&t.picture, per_picture))
            })
            .collect(),
        targets
            .iter()
            .enumerate()
            .map(|(i, t)| {
                compiled[i]
                    .as_ref()
                    .and(t.preview.as_ref())
                    .map(|p| target_progress(p, per_picture))
            })
            .collect(),
        config.track_preview_progress,
    ));
    shared.set_progress(Arc::clone(&progress));

    if !shared.is_stopped() {
        shared.enter(
            CalculationState::Rendering,
            format!("rendering {count} pictures in up to {per_picture} slices each"),
        );
        let ctx = RenderCtx {
            events: &events,
            progress: &progress,
            failed: &failed,
        };
        let ctx = &ctx;
        let compiled = &compiled;
        pool.install(|| {
            rayon::scope(|s| {
                for (i, target) in targets.iter_mut().enumerate() {
                    let Some(renderer) = compiled[i].as_deref() else {
                        continue;
                    };
                    s.spawn(move |_| {
                        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
                            render_picture(ctx, i, target, renderer)
                        }));
                        if let Err(payload) = outcome {
                            let err = RenderError::Panicked(panic_message(payload.as_ref()));
                            ctx.fail(i, renderer, err.into(), "picture task");
                        }
                    });
                }
            })
        });
    }

    let stopped = shared.is_stopped();
    let mut output = CalculationOutput::default();
    for (i, target) in targets.into_iter().enumerate() {
        if failed[i].load(Ordering::Acquire) {
            output.failed.push(i);
            output.pictures.push(None);
            output.previews.push(None);
        } else {
            output.pictures.push(Some(target.picture));
            output.previews.push(target.preview);
        }
    }

    if stopped {
        tracing::info!(progress = progress.fraction(), "calculation stopped");
        shared.enter(CalculationState::Stopped, "stopped");
    } else if !output.failed.is_empty() {
        tracing::warn!(failed = ?output.failed, "calculation finished with failed pictures");
        shared.enter(
            CalculationState::Failed,
            format!("{} of {count} pictures failed", output.failed.len()),
        );
    } else {
        events.progress(progress.fraction());
        events.ready(&output.pictures);
        tracing::info!(pictures = count, "calculation completed");
        shared.enter(CalculationState::Completed, "completed");
    }
    Ok(output)
}

/// Reserve every buffer of the batch, or none.
fn allocate(
    requests: &[PictureRequest],
    buffers: Vec<Option<Picture>>,
    config: &EngineConfig,
) -> Result<Vec<Target>, AllocationError> {
    let mut buffers: Vec<Option<Picture>> = buffers;
    buffers.resize_with(requests.len(), || None);

    let mut reused: Vec<Option<Picture>> = Vec::with_capacity(requests.len());
    let mut fresh_bytes = 0usize;
    for (r, buffer) in requests.iter().zip(buffers) {
        let names = r.container.channel_names();
        let buffer = buffer.filter(|b| b.fits(r.width, r.height, &names));
        if buffer.is_none() {
            fresh_bytes = fresh_bytes.saturating_add(bytes(r.width, r.height, names.len())?);
        }
        if r.preview
            && let Some((w, h)) = preview_dims(r, config)
        {
            fresh_bytes = fresh_bytes.saturating_add(bytes(w, h, names.len())?);
        }
        reused.push(buffer);
    }
    if let Some(budget) = config.memory_budget_bytes {
        let budget = usize::try_from(budget).unwrap_or(usize::MAX);
        if fresh_bytes > budget {
            return Err(AllocationError::BudgetExceeded {
                requested: fresh_bytes,
                budget,
            });
        }
    }
    tracing::debug!(fresh_bytes, "allocating picture buffers");

    let mut targets = Vec::with_capacity(requests.len());
    for (r, buffer) in requests.iter().zip(reused) {
        let picture = match buffer {
            Some(mut b) => {
                b.reset();
                b
            }
            None => Picture::try_new(r.width, r.height, r.container.channel_names())?,
        };
        let preview = match preview_dims(r, config) {
            Some((w, h)) if r.preview => Some(Picture::try_new(w, h, r.container.channel_names())?),
            _ => None,
        };
        targets.push(Target { picture, preview });
    }
    Ok(targets)
}

fn bytes(width: usize, height: usize, channels: usize) -> Result<usize, AllocationError> {
    Ok(buffer_len(width, height, channels)? * size_of::<f32>())
}

fn preview_dims(r: &PictureRequest, config: &EngineConfig) -> Option<(usize, usize)> {
    slices::preview_size(
        r.width,
        r.height,
        config.preview_scale,
        config.preview_min_size,
    )
}

fn target_progress(picture: &Picture, count: usize) -> TargetProgress {
    let rows = slices::partition_rows(picture.height(), count)
        .iter()
        .map(|r| r.len())
        .collect();
    TargetProgress::new(picture.width(), rows)
}

fn compile_one(
    compiler: &dyn GraphCompiler,
    request: &PictureRequest,
    steps: usize,
) -> Result<Arc<dyn Renderer>, (PixelflowError, String)> {
    let source = synthesize(&request.container, steps).map_err(|e| {
        let err = PixelflowError::from(e);
        let description = err.to_string();
        (err, description)
    })?;
    compiler.compile(&source).map_err(|e| {
        let description = format!(
            "{e}\n\n{}\n\ngenerated source:\n{}",
            e.explanation, e.generated_source
        );
        (PixelflowError::from(e), description)
    })
}

/// Render the preview of picture `idx`, then the picture itself.
fn render_picture(ctx: &RenderCtx<'_>, idx: usize, target: &mut Target, renderer: &dyn Renderer) {
    if let Some(preview) = target.preview.as_mut()
        && let Some(progress) = ctx.progress.preview(idx)
        && render_target(ctx, idx, true, preview, renderer, progress)
    {
        tracing::debug!(picture = idx, "preview ready");
        ctx.events.preview_ready(idx, preview);
    }
    if ctx.has_failed(idx) {
        return;
    }
    if let Some(progress) = ctx.progress.picture(idx)
        && render_target(ctx, idx, false, &mut target.picture, renderer, progress)
    {
        tracing::debug!(picture = idx, "picture ready");
        ctx.events.picture_ready(idx, &target.picture);
    }
}

/// Render every slice of one buffer and wait for them. Returns whether the buffer is
/// complete.
fn render_target(
    ctx: &RenderCtx<'_>,
    idx: usize,
    preview: bool,
    picture: &mut Picture,
    renderer: &dyn Renderer,
    progress: &TargetProgress,
) -> bool {
    let width = picture.width();
    let height = picture.height();
    let names = picture.channel_names().to_vec();
    let names = names.as_slice();
    let ranges = slices::partition_rows(height, progress.slice_count());
    let bands = picture.split_rows(&ranges);
    rayon::scope(|s| {
        for (slice, rows) in bands.into_iter().enumerate() {
            let task = SliceTask {
                picture: idx,
                preview,
                slice,
                width,
                height,
                names,
            };
            s.spawn(move |_| task.run(ctx, rows, renderer, progress));
        }
    });
    !ctx.has_failed(idx) && progress.is_complete()
}

struct SliceTask<'a> {
    picture: usize,
    preview: bool,
    slice: usize,
    width: usize,
    height: usize,
    names: &'a [String],
}

impl SliceTask<'_> {
    fn run(
        self,
        ctx: &RenderCtx<'_>,
        rows: RowsMut<'_>,
        renderer: &dyn Renderer,
        progress: &TargetProgress,
    ) {
        if ctx.has_failed(self.picture) {
            return;
        }
        let region = PixelRegion::rows(self.width, rows.first_row(), rows.row_range().end);
        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| -> Result<(), RenderError> {
            renderer.calculate_pixels(
                self.width,
                self.height,
                self.names,
                rows,
                region,
                &mut |done| {
                    progress.report(self.slice, done);
                    ctx.events.progress(ctx.progress.fraction());
                },
                self.slice,
            )?;
            if progress.is_slice_complete(self.slice) {
                tracing::debug!(
                    picture = self.picture,
                    preview = self.preview,
                    slice = self.slice,
                    rows = region.row_count(),
                    "slice ready"
                );
                ctx.events
                    .slice_ready(self.picture, self.preview, self.slice, region.row_count());
            }
            Ok(())
        }));
        let result = match outcome {
            Ok(result) => result,
            Err(payload) => Err(RenderError::Panicked(panic_message(payload.as_ref()))),
        };
        match result {
            Ok(()) => {}
            Err(err) => {
                let context = if self.preview { "preview slice" } else { "slice" };
                let context = format!("{context} {}", self.slice);
                ctx.fail(self.picture, renderer, err.into(), &context);
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/calc/run.rs"]
mod tests;
