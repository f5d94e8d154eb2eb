use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::compile::error::CompileErrorKind;
use crate::foundation::core::Value;
use crate::program::error::{ProgramError, VmError};
use crate::program::resolve::ProgramTemplate;
use crate::program::vm::{self, Env, Frame, Slot};
use crate::render::picture::RowsMut;
use crate::render::renderer::{PixelRegion, RenderError, Renderer};
use crate::render::slices;

/// A program template bound to its construction parameters, with fields evaluated.
#[derive(Debug)]
pub(crate) struct ProgramRenderer {
    template: Arc<ProgramTemplate>,
    fields: Vec<Slot>,
    stop: AtomicBool,
}

/// Bind `params` to `template` and run its `@fields` section.
pub(crate) fn instantiate(
    template: Arc<ProgramTemplate>,
    params: &[Value],
) -> Result<ProgramRenderer, ProgramError> {
    if params.len() != template.params {
        return Err(ProgramError::unlocated(
            CompileErrorKind::Instantiation,
            format!(
                "program `{}` expects {} parameters, {} supplied",
                template.name,
                template.params,
                params.len()
            ),
        ));
    }
    let params: Vec<Slot> = params.iter().map(Slot::from).collect();
    let mut fields = vec![Slot::default(); template.field_count];
    if !template.fields.is_empty() {
        let frame = Frame {
            consts: &template.consts,
            params: &params,
            fields: &[],
            env: Env::default(),
        };
        let mut stack = Vec::new();
        vm::run(&template.fields, &frame, &mut fields, &mut stack, &mut []).map_err(|e| {
            ProgramError::unlocated(
                CompileErrorKind::Construction,
                format!("evaluating fields of `{}` failed: {}", template.name, e.message),
            )
        })?;
    }
    Ok(ProgramRenderer {
        template,
        fields,
        stop: AtomicBool::new(false),
    })
}

impl ProgramRenderer {
    fn check_call(
        &self,
        width: usize,
        height: usize,
        channel_names: &[String],
        rows: &RowsMut<'_>,
        region: PixelRegion,
    ) -> Result<(), RenderError> {
        let channels = self.template.channels;
        if channel_names.len() != channels {
            return Err(RenderError::ChannelCount {
                expected: channels,
                found: channel_names.len(),
            });
        }
        if region.start_x > region.end_x
            || region.start_y > region.end_y
            || region.end_x > width
            || region.end_y > height
        {
            return Err(RenderError::Region(format!(
                "{region:?} does not fit a {width}x{height} picture"
            )));
        }
        let covered = rows.row_range();
        if region.row_count() > 0
            && (rows.row_len() != width * channels
                || covered.start > region.start_y
                || covered.end < region.end_y)
        {
            return Err(RenderError::Region(format!(
                "buffer rows {covered:?} of {} floats cannot hold {region:?}",
                rows.row_len()
            )));
        }
        Ok(())
    }

    fn frame(&self, env: Env) -> Frame<'_> {
        Frame {
            consts: &self.template.consts,
            params: &[],
            fields: &self.fields,
            env,
        }
    }
}

impl Renderer for ProgramRenderer {
    fn channel_count(&self) -> usize {
        self.template.channels
    }

    fn calculate_pixels(
        &self,
        width: usize,
        height: usize,
        channel_names: &[String],
        mut rows: RowsMut<'_>,
        region: PixelRegion,
        progress: &mut dyn FnMut(usize),
        slice_id: usize,
    ) -> Result<(), RenderError> {
        self.check_call(width, height, channel_names, &rows, region)?;

        let t = &*self.template;
        let eval = |e: VmError| RenderError::Evaluation {
            program: t.name.clone(),
            message: e.message,
        };
        let ch = t.channels;
        let mut env = Env {
            width_f: width as f64,
            height_f: height as f64,
            slice_id: slice_id as f64,
            ..Env::default()
        };
        let mut locals = vec![Slot::default(); t.local_count];
        let mut stack = Vec::with_capacity(16);

        if !t.before_loop.is_empty() {
            vm::run(&t.before_loop, &self.frame(env), &mut locals, &mut stack, &mut [])
                .map_err(eval)?;
        }

        let total = region.row_count();
        let stride = slices::progress_stride(total, t.progress_steps);
        for (i, y) in (region.start_y..region.end_y).enumerate() {
            if self.is_stopped() {
                return Ok(());
            }
            env.y = y as f64;
            env.y_norm = y as f64 / height as f64;
            if !t.before_line.is_empty() {
                vm::run(&t.before_line, &self.frame(env), &mut locals, &mut stack, &mut [])
                    .map_err(eval)?;
            }

            let row = rows
                .row_mut(y)
                .ok_or_else(|| RenderError::Region(format!("row {y} is not in the buffer")))?;
            for x in region.start_x..region.end_x {
                if self.is_stopped() {
                    return Ok(());
                }
                env.x = x as f64;
                env.x_norm = x as f64 / width as f64;
                let px = &mut row[x * ch..(x + 1) * ch];
                vm::run(&t.pixel, &self.frame(env), &mut locals, &mut stack, px).map_err(eval)?;
            }

            if !t.after_line.is_empty() {
                vm::run(&t.after_line, &self.frame(env), &mut locals, &mut stack, &mut [])
                    .map_err(eval)?;
            }
            let done = i + 1;
            if done % stride == 0 || done == total {
                progress(done);
            }
        }

        if !t.after_loop.is_empty() {
            vm::run(&t.after_loop, &self.frame(env), &mut locals, &mut stack, &mut [])
                .map_err(eval)?;
        }
        Ok(())
    }

    fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/program/exec.rs"]
mod tests;
