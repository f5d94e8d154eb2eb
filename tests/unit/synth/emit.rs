use super::*;
use crate::effects::{Arithmetic, ArithmeticOp, Constant, GradientMap, LinearRamp};
use crate::foundation::core::{Color, Gradient};
use crate::graph::variable::VariableSpec;
use crate::program::resolve::ProgramTemplate;

fn add(c: &mut EffectContainer) -> crate::foundation::ids::EffectId {
    c.push_effect(EffectKind::leaf(Arithmetic::new(ArithmeticOp::Add)))
}

#[test]
fn empty_graph_declares_channels_only() {
    let c = EffectContainer::with_channels("empty", ["r", "g", "b", "a"]).unwrap();
    let src = synthesize(&c, 5).unwrap();
    assert_eq!(src.channel_names.len(), 4);
    assert!(src.params.is_empty());
    assert!(src.text.contains("channels 4;"));
    assert!(src.text.contains("progress 5;"));
    assert!(!src.text.contains("channel["));
    let t = ProgramTemplate::compile(&src.text).unwrap();
    assert!(t.pixel.is_empty());
}

#[test]
fn values_without_literals_become_parameters() {
    let mut c = EffectContainer::with_channels("p", ["v"]).unwrap();
    let map = c.push_effect(EffectKind::leaf(GradientMap));
    let gradient = Value::Gradient(Gradient::linear(Color::BLACK, Color::WHITE));
    c.bind_to_constant(c.effect_input(map, "gradient").unwrap(), gradient.clone())
        .unwrap();
    let src = synthesize(&c, 2).unwrap();
    assert_eq!(&*src.params, &[gradient]);
    assert!(src.text.contains("@fields"));
    assert!(src.text.contains("= param(0);"));
    assert!(src.text.contains("use color;"));
    ProgramTemplate::compile(&src.text).unwrap();
}

#[test]
fn pixel_values_are_declared_per_pixel_and_uniform_values_hoisted() {
    let mut c = EffectContainer::with_channels("s", ["v"]).unwrap();
    let ramp = c.push_effect(EffectKind::leaf(LinearRamp));
    let k = c.push_effect(EffectKind::leaf(Constant::new(Value::Float(2.0))));
    let sum = add(&mut c);
    let k_out = c.effect_output(k, "value").unwrap();
    let ramp_out = c.effect_output(ramp, "value").unwrap();
    c.bind_to_variable(c.effect_input(sum, "a").unwrap(), ramp_out)
        .unwrap();
    c.bind_to_variable(c.effect_input(sum, "b").unwrap(), k_out)
        .unwrap();
    c.bind_channel("v", c.effect_output(sum, "value")).unwrap();

    let src = synthesize(&c, 2).unwrap();
    let text = &*src.text;
    let loop_at = text.find("@before_loop").unwrap();
    let pixel_at = text.find("@at_pixel").unwrap();
    let k_decl = text.find("let v_e1_value = 2.0;").unwrap();
    let sum_decl = text.find("let v_e2_value = v_e0_value + v_e1_value;").unwrap();
    assert!(loop_at < k_decl && k_decl < pixel_at);
    assert!(pixel_at < sum_decl);
    assert!(text.trim_end().ends_with("channel[0] = v_e2_value;"));
}

#[test]
fn root_container_inputs_become_fields() {
    let mut c = EffectContainer::with_channels("ci", ["v"]).unwrap();
    let offset = c
        .add_container_input(
            VariableSpec::new("Offset X", ValueType::Float).with_default(Value::Float(-0.5)),
        )
        .unwrap();
    let sum = add(&mut c);
    c.bind_to_variable(c.effect_input(sum, "a").unwrap(), offset)
        .unwrap();
    c.bind_channel("v", c.effect_output(sum, "value")).unwrap();
    let src = synthesize(&c, 2).unwrap();
    assert!(src.text.contains("let ci_offset_x = (-0.5);"), "{}", src.text);
}

#[test]
fn composites_are_flattened_under_their_namespace() {
    let mut inner = EffectContainer::new("inner");
    let k = inner
        .add_container_input(
            VariableSpec::new("k", ValueType::Float).with_default(Value::Float(1.0)),
        )
        .unwrap();
    let sum = add(&mut inner);
    inner
        .bind_to_variable(inner.effect_input(sum, "a").unwrap(), k)
        .unwrap();
    let total = inner
        .add_container_output(VariableSpec::new("total", ValueType::Float))
        .unwrap();
    inner
        .bind_to_variable(total, inner.effect_output(sum, "value").unwrap())
        .unwrap();

    let mut c = EffectContainer::with_channels("outer", ["v"]).unwrap();
    let three = c.push_effect(EffectKind::leaf(Constant::new(Value::Float(3.0))));
    let comp = c.push_effect(EffectKind::composite(inner));
    let three_out = c.effect_output(three, "value").unwrap();
    c.bind_to_variable(c.effect_input(comp, "k").unwrap(), three_out)
        .unwrap();
    c.bind_channel("v", c.effect_output(comp, "total")).unwrap();

    let src = synthesize(&c, 2).unwrap();
    assert!(src.text.contains("let v_e1_0_value = v_e0_value + 0.0;"), "{}", src.text);
    assert!(src.text.contains("let v_e1_total = v_e1_0_value;"), "{}", src.text);
    ProgramTemplate::compile(&src.text).unwrap();
}

#[test]
fn unbound_composite_outputs_fall_back_to_their_default() {
    let mut inner = EffectContainer::new("inner");
    inner
        .add_container_output(
            VariableSpec::new("level", ValueType::Float).with_default(Value::Float(0.25)),
        )
        .unwrap();
    let mut c = EffectContainer::with_channels("outer", ["v"]).unwrap();
    let comp = c.push_effect(EffectKind::composite(inner));
    c.bind_channel("v", c.effect_output(comp, "level")).unwrap();
    let src = synthesize(&c, 2).unwrap();
    assert!(src.text.contains("let v_e0_level = 0.25;"), "{}", src.text);
}
