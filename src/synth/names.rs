//! Identifier conventions of synthesized programs.
//!
//! Every identifier an effect introduces is `<prefix>_<namespace>_<name>`, and namespaces are
//! unique per effect, so flattened composites never collide. The loop variables below are
//! provided by the renderer and may not be declared by effects.

/// Absolute column of the current pixel.
pub const X: &str = "x";
/// Absolute row of the current pixel.
pub const Y: &str = "y";
/// `x / width`.
pub const X_NORM: &str = "x_norm";
/// `y / height`.
pub const Y_NORM: &str = "y_norm";
pub const WIDTH_F: &str = "width_f";
pub const HEIGHT_F: &str = "height_f";
/// Index of the slice being rendered.
pub const SLICE_ID: &str = "slice_id";

/// Names bound by the renderer itself.
pub const RESERVED: [&str; 7] = [X, Y, X_NORM, Y_NORM, WIDTH_F, HEIGHT_F, SLICE_ID];

/// Statement keyword for channel writes; never usable as a variable name.
pub const CHANNEL: &str = "channel";

/// Effect output values.
pub const OUTPUT_PREFIX: &str = "v";
/// Construction parameters read back in `@fields`.
pub const PARAM_PREFIX: &str = "p";
/// Scratch values private to one effect.
pub const TEMP_PREFIX: &str = "t";
/// Values of the root container's inputs.
pub const CONTAINER_INPUT_PREFIX: &str = "ci";

/// Namespace of the effect at `position` inside a container namespaced `parent`.
pub fn effect_namespace(parent: Option<&str>, position: usize) -> String {
    match parent {
        Some(p) => format!("{p}_{position}"),
        None => format!("e{position}"),
    }
}

/// Map an arbitrary display name to `[a-z0-9_]+`.
pub fn sanitize(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if out.is_empty() {
        out.push('_');
    }
    out
}

pub fn is_reserved(name: &str) -> bool {
    name == CHANNEL || RESERVED.contains(&name)
}

#[cfg(test)]
#[path = "../../tests/unit/synth/names.rs"]
mod tests;
