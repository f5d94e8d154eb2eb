use super::*;
use crate::render::picture::Picture;

fn renderer(src: &str, params: &[Value]) -> ProgramRenderer {
    let t = Arc::new(ProgramTemplate::compile(src).unwrap());
    instantiate(t, params).unwrap()
}

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("c{i}")).collect()
}

fn render_full(r: &ProgramRenderer, w: usize, h: usize) -> Picture {
    let mut p = Picture::try_new(w, h, names(r.channel_count())).unwrap();
    let names = p.channel_names().to_vec();
    r.calculate_pixels(w, h, &names, p.rows_mut(), PixelRegion::rows(w, 0, h), &mut |_| {}, 0)
        .unwrap();
    p
}

const GRADIENT: &str = "use math; channels 2; params 1;\n\
    @fields let p_gain = param(0);\n\
    @before_line let v_row = y_norm * p_gain;\n\
    @at_pixel channel[0] = x_norm; channel[1] = v_row + slice_id;";

#[test]
fn fields_are_bound_from_parameters() {
    let r = renderer(GRADIENT, &[Value::Float(2.0)]);
    let p = render_full(&r, 4, 2);
    assert_eq!(p.pixel(1, 0).unwrap(), &[0.25, 0.0]);
    assert_eq!(p.pixel(3, 1).unwrap(), &[0.75, 1.0]);
}

#[test]
fn parameter_count_must_match() {
    let t = Arc::new(ProgramTemplate::compile(GRADIENT).unwrap());
    let err = instantiate(t, &[]).unwrap_err();
    assert_eq!(err.kind, CompileErrorKind::Instantiation);
}

#[test]
fn failing_fields_are_construction_errors() {
    let t = Arc::new(
        ProgramTemplate::compile("params 1; @fields let f = param(0) + 1.0;").unwrap(),
    );
    let err = instantiate(t, &[Value::Bool(true)]).unwrap_err();
    assert_eq!(err.kind, CompileErrorKind::Construction);
}

#[test]
fn split_calls_match_a_single_call() {
    let r = renderer(GRADIENT, &[Value::Float(1.0)]);
    let (w, h) = (7, 9);
    let whole = render_full(&r, w, h);

    let mut split = Picture::try_new(w, h, names(2)).unwrap();
    let names = split.channel_names().to_vec();
    for rows in split.split_rows(&[0..4, 4..9]) {
        let region = PixelRegion::rows(w, rows.row_range().start, rows.row_range().end);
        r.calculate_pixels(w, h, &names, rows, region, &mut |_| {}, 0).unwrap();
    }
    assert_eq!(whole, split);
}

#[test]
fn line_state_accumulates_across_pixels() {
    let r = renderer(
        "channels 1;\n\
         @before_line let v_sum = 0.0;\n\
         @at_pixel v_sum = v_sum + 1.0; channel[0] = v_sum;",
        &[],
    );
    let p = render_full(&r, 3, 2);
    assert_eq!(p.row(0).unwrap(), &[1.0, 2.0, 3.0]);
    assert_eq!(p.row(1).unwrap(), &[1.0, 2.0, 3.0]);
}

#[test]
fn progress_is_reported_for_the_final_row() {
    let r = renderer("channels 1; progress 2; @at_pixel channel[0] = 1.0;", &[]);
    let mut p = Picture::try_new(2, 5, names(1)).unwrap();
    let names = p.channel_names().to_vec();
    let mut seen = Vec::new();
    let region = PixelRegion::rows(2, 0, 5);
    r.calculate_pixels(2, 5, &names, p.rows_mut(), region, &mut |n| seen.push(n), 0)
        .unwrap();
    assert_eq!(seen, vec![2, 4, 5]);
}

#[test]
fn stopped_renderer_leaves_pixels_untouched() {
    let r = renderer("channels 1; @at_pixel channel[0] = 1.0;", &[]);
    r.stop();
    assert!(r.is_stopped());
    let p = render_full(&r, 3, 3);
    assert!(p.data().iter().all(|v| *v == 0.0));
}

#[test]
fn mismatched_calls_are_rejected() {
    let r = renderer("channels 2; @at_pixel channel[0] = 1.0;", &[]);
    let mut p = Picture::try_new(2, 2, names(1)).unwrap();
    let one = p.channel_names().to_vec();
    let err = r
        .calculate_pixels(2, 2, &one, p.rows_mut(), PixelRegion::rows(2, 0, 2), &mut |_| {}, 0)
        .unwrap_err();
    assert_eq!(err, RenderError::ChannelCount { expected: 2, found: 1 });

    let mut p = Picture::try_new(2, 2, names(2)).unwrap();
    let two = p.channel_names().to_vec();
    let err = r
        .calculate_pixels(2, 2, &two, p.rows_mut(), PixelRegion::rows(2, 0, 3), &mut |_| {}, 0)
        .unwrap_err();
    assert!(matches!(err, RenderError::Region(_)));
}
