//! Work-splitting heuristics for the slice scheduler.

use std::ops::Range;

/// Split `0..height` into `count` contiguous row bands of `height / count` rows, the last
/// band absorbing the remainder. `count` is clamped to `1..=height`; a zero-height picture
/// yields no bands.
pub fn partition_rows(height: usize, count: usize) -> Vec<Range<usize>> {
    if height == 0 {
        return Vec::new();
    }
    let count = count.clamp(1, height);
    let base = height / count;
    (0..count)
        .map(|i| {
            let start = i * base;
            let end = if i + 1 == count { height } else { start + base };
            start..end
        })
        .collect()
}

/// Slices per picture when `workers` threads share `pictures` pictures.
pub fn slices_per_picture(workers: usize, pictures: usize) -> usize {
    1 + workers / pictures.max(1)
}

/// Progress reports a renderer should emit per slice: fewer per slice as more slices run.
pub fn progress_steps(workers: usize) -> usize {
    (50 / workers.max(1)).max(2)
}

/// Rows between two progress reports of a slice with `rows` rows.
pub fn progress_stride(rows: usize, steps: usize) -> usize {
    (rows / steps.max(2)).max(1)
}

/// Dimensions of the preview rendered before a `width x height` picture, or `None` when
/// either scaled side falls below `min_size`. Scaled sides are truncated.
pub fn preview_size(
    width: usize,
    height: usize,
    scale: f64,
    min_size: usize,
) -> Option<(usize, usize)> {
    if !(scale.is_finite() && scale > 0.0) {
        return None;
    }
    let w = (width as f64 * scale).floor() as usize;
    let h = (height as f64 * scale).floor() as usize;
    (w >= min_size.max(1) && h >= min_size.max(1)).then_some((w, h))
}

#[cfg(test)]
#[path = "../../tests/unit/render/slices.rs"]
mod tests;
