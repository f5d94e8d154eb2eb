use super::*;
use crate::compile::{GraphCompiler, ProgramCompiler};
use crate::foundation::core::{Color, Gradient, Value};
use crate::foundation::ids::{EffectId, OutputId};
use crate::graph::container::EffectContainer;
use crate::graph::effect::EffectKind;
use crate::render::picture::Picture;
use crate::render::renderer::PixelRegion;
use crate::synth::emit::synthesize;
use crate::synth::error::SynthError;

fn render(c: &EffectContainer, w: usize, h: usize) -> Picture {
    let source = synthesize(c, 2).unwrap();
    let renderer = ProgramCompiler::new()
        .compile(&source)
        .unwrap_or_else(|e| panic!("{e}\n{}\n{}", e.explanation, e.generated_source));
    let mut p = Picture::try_new(w, h, c.channel_names()).unwrap();
    let names = c.channel_names();
    renderer
        .calculate_pixels(w, h, &names, p.rows_mut(), PixelRegion::rows(w, 0, h), &mut |_| {}, 0)
        .unwrap();
    p
}

fn single(
    effect: impl crate::graph::effect::ExpressionGenerator + 'static,
) -> (EffectContainer, EffectId) {
    let mut c = EffectContainer::with_channels("t", ["v"]).unwrap();
    let e = c.push_effect(EffectKind::leaf(effect));
    (c, e)
}

fn route(c: &mut EffectContainer, e: EffectId, output: &str) -> OutputId {
    let out = c.effect_output(e, output).unwrap();
    c.bind_channel("v", Some(out)).unwrap();
    out
}

fn set(c: &mut EffectContainer, e: EffectId, input: &str, v: f64) {
    let id = c.effect_input(e, input).unwrap();
    c.bind_to_constant(id, Value::Float(v)).unwrap();
}

fn at(p: &Picture, x: usize, y: usize) -> f32 {
    p.pixel(x, y).unwrap()[0]
}

#[test]
fn linear_ramp_defaults_to_x_norm() {
    let (mut c, e) = single(LinearRamp);
    route(&mut c, e, "value");
    let p = render(&c, 4, 2);
    for x in 0..4 {
        assert!((at(&p, x, 1) - x as f32 / 4.0).abs() < 1e-6);
    }

    set(&mut c, e, "angle", 90.0);
    let p = render(&c, 2, 4);
    assert!((at(&p, 1, 3) - 0.75).abs() < 1e-6);
}

#[test]
fn radial_ramp_is_zero_at_center_and_clamped() {
    let (mut c, e) = single(RadialRamp);
    route(&mut c, e, "value");
    let p = render(&c, 4, 4);
    assert_eq!(at(&p, 2, 2), 0.0);
    assert_eq!(at(&p, 0, 0), 1.0);
}

#[test]
fn checker_alternates_squares() {
    let (mut c, e) = single(Checker);
    set(&mut c, e, "size", 2.0);
    route(&mut c, e, "value");
    let p = render(&c, 4, 4);
    assert_eq!(at(&p, 0, 0), 0.0);
    assert_eq!(at(&p, 2, 0), 1.0);
    assert_eq!(at(&p, 3, 3), 0.0);

    set(&mut c, e, "size", -1.0);
    assert!(matches!(synthesize(&c, 2), Err(SynthError::Generator { .. })));
}

#[test]
fn noise_is_deterministic_and_varied() {
    let (mut c, e) = single(Noise);
    route(&mut c, e, "value");
    let a = render(&c, 16, 16);
    let b = render(&c, 16, 16);
    assert_eq!(a, b);
    assert!(a.data().iter().all(|v| (-0.5..=1.5).contains(v)));
    assert!(a.data().iter().any(|v| (*v - a.data()[0]).abs() > 1e-4));
}

#[test]
fn arithmetic_operations() {
    for (op, expected) in [
        (ArithmeticOp::Add, 9.0),
        (ArithmeticOp::Sub, 3.0),
        (ArithmeticOp::Mul, 18.0),
        (ArithmeticOp::Div, 2.0),
        (ArithmeticOp::Min, 3.0),
        (ArithmeticOp::Max, 6.0),
        (ArithmeticOp::Mix, 4.5),
    ] {
        let (mut c, e) = single(Arithmetic::new(op));
        set(&mut c, e, "a", 6.0);
        set(&mut c, e, "b", 3.0);
        route(&mut c, e, "value");
        assert_eq!(at(&render(&c, 1, 1), 0, 0), expected, "{op:?}");
    }
}

#[test]
fn constants_of_any_type_pass_through() {
    let mut c = EffectContainer::with_channels("t", ["v"]).unwrap();
    let k = c.push_effect(EffectKind::leaf(Constant::new(Value::Int(4))));
    let add = c.push_effect(EffectKind::leaf(Arithmetic::new(ArithmeticOp::Add)));
    let k_out = c.effect_output(k, "value").unwrap();
    c.bind_to_variable(c.effect_input(add, "a").unwrap(), k_out).unwrap();
    route(&mut c, add, "value");
    assert_eq!(at(&render(&c, 1, 1), 0, 0), 4.0);
}

#[test]
fn colors_compose_and_split() {
    let mut c = EffectContainer::with_channels("t", ["v"]).unwrap();
    let compose = c.push_effect(EffectKind::leaf(ColorCompose));
    set(&mut c, compose, "g", 0.25);
    let split = c.push_effect(EffectKind::leaf(ColorSplit));
    let color = c.effect_output(compose, "color").unwrap();
    c.bind_to_variable(c.effect_input(split, "color").unwrap(), color)
        .unwrap();
    route(&mut c, split, "g");
    assert_eq!(at(&render(&c, 1, 1), 0, 0), 0.25);

    route(&mut c, split, "a");
    assert_eq!(at(&render(&c, 1, 1), 0, 0), 1.0);
}

#[test]
fn gradient_map_samples_parameter_gradients() {
    let mut c = EffectContainer::with_channels("t", ["v"]).unwrap();
    let ramp = c.push_effect(EffectKind::leaf(LinearRamp));
    let map = c.push_effect(EffectKind::leaf(GradientMap));
    let gradient = Gradient::linear(Color::BLACK, Color::rgba(0.0, 1.0, 0.0, 1.0));
    c.bind_to_constant(c.effect_input(map, "gradient").unwrap(), Value::Gradient(gradient))
        .unwrap();
    let t = c.effect_output(ramp, "value").unwrap();
    c.bind_to_variable(c.effect_input(map, "t").unwrap(), t).unwrap();
    let split = c.push_effect(EffectKind::leaf(ColorSplit));
    let color = c.effect_output(map, "color").unwrap();
    c.bind_to_variable(c.effect_input(split, "color").unwrap(), color)
        .unwrap();
    route(&mut c, split, "g");

    let p = render(&c, 4, 1);
    assert!((at(&p, 2, 0) - 0.5).abs() < 1e-6);
}

#[test]
fn expression_substitutes_inputs() {
    let (mut c, e) = single(Expression::new("a * 2 + clamp(x, 0, 1) - b"));
    set(&mut c, e, "a", 0.5);
    set(&mut c, e, "b", -1.0);
    route(&mut c, e, "value");
    let p = render(&c, 3, 1);
    assert_eq!(at(&p, 0, 0), 2.0);
    assert_eq!(at(&p, 2, 0), 3.0);
}

#[test]
fn expression_rejects_unknown_names_and_bad_syntax() {
    for formula in ["a + foo", "frob(a)", "a +", "param(0)"] {
        let (mut c, e) = single(Expression::new(formula));
        route(&mut c, e, "value");
        assert!(
            matches!(synthesize(&c, 2), Err(SynthError::Generator { .. })),
            "{formula}"
        );
    }
}
