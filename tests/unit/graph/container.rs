use std::sync::{Arc, Mutex};

use super::*;
use crate::effects::{Arithmetic, ArithmeticOp, ColorSplit, Constant};
use crate::foundation::core::Color;

fn constant(c: &mut EffectContainer, v: f64) -> EffectId {
    c.push_effect(EffectKind::leaf(Constant::new(Value::Float(v))))
}

fn add(c: &mut EffectContainer) -> EffectId {
    c.push_effect(EffectKind::leaf(Arithmetic::new(ArithmeticOp::Add)))
}

fn out(c: &EffectContainer, e: EffectId) -> OutputId {
    c.effect_output(e, "value").unwrap()
}

fn input(c: &EffectContainer, e: EffectId, name: &str) -> InputId {
    c.effect_input(e, name).unwrap()
}

/// offset -> a, constant 2 -> b, sum -> channel "v", sum -> container output "total"
fn sample_graph() -> EffectContainer {
    let mut c = EffectContainer::with_channels("sample", ["v"]).unwrap();
    let offset = c
        .add_container_input(
            VariableSpec::new("offset", ValueType::Float).with_default(Value::Float(0.5)),
        )
        .unwrap();
    let k = constant(&mut c, 2.0);
    let sum = add(&mut c);
    c.bind_to_variable(input(&c, sum, "a"), offset).unwrap();
    c.bind_to_variable(input(&c, sum, "b"), out(&c, k)).unwrap();
    c.bind_channel("v", Some(out(&c, sum))).unwrap();
    let total = c
        .add_container_output(VariableSpec::new("total", ValueType::Float))
        .unwrap();
    c.bind_to_variable(total, out(&c, sum)).unwrap();
    c
}

#[test]
fn copy_never_references_the_original_arena() {
    let original = sample_graph();
    let copy = original.copy();
    assert_ne!(copy.id(), original.id());

    for var in copy.input_variables() {
        assert_eq!(var.id().graph(), copy.id());
        if let Some(src) = var.bound_output() {
            assert_eq!(src.graph(), copy.id());
            assert!(copy.output(src).is_some());
        }
    }
    for ch in copy.channels() {
        if let Some(src) = ch.source() {
            assert_eq!(src.graph(), copy.id());
        }
    }
    copy.validate().unwrap();
}

#[test]
fn copy_preserves_binding_structure() {
    let original = sample_graph();
    let copy = original.copy();
    assert_eq!(copy.len(), original.len());

    // Compare bindings by (owner position, variable name) -> (source owner position, name).
    fn describe(c: &EffectContainer) -> Vec<(String, Option<String>)> {
        let source_name = |o: OutputId| {
            let v = c.output(o).unwrap();
            match v.owner() {
                VariableOwner::Effect(e) => format!("{}:{}", c.position_of(e).unwrap(), v.name()),
                VariableOwner::Container => format!("container:{}", v.name()),
            }
        };
        let mut rows = Vec::new();
        for (pos, e) in c.effects().enumerate() {
            for i in e.inputs() {
                let v = c.input(*i).unwrap();
                rows.push((format!("{pos}:{}", v.name()), v.bound_output().map(source_name)));
            }
        }
        for v in c.container_outputs() {
            rows.push((format!("out:{}", v.name()), v.bound_output().map(source_name)));
        }
        for ch in c.channels() {
            rows.push((format!("channel:{}", ch.name()), ch.source().map(source_name)));
        }
        rows
    }

    assert_eq!(describe(&copy), describe(&original));
}

#[test]
fn copy_recurses_into_composites() {
    let inner = sample_graph();
    let inner_id = inner.id();
    let mut outer = EffectContainer::new("outer");
    let comp = outer.push_effect(EffectKind::composite(inner));
    assert!(outer.effect_output(comp, "total").is_some());
    assert!(outer.effect_input(comp, "offset").is_some());

    let copy = outer.copy();
    let copied = copy.nested(copy.effect_ids()[0]).unwrap();
    assert_ne!(copied.id(), inner_id);
    for var in copied.input_variables() {
        if let Some(src) = var.bound_output() {
            assert_eq!(src.graph(), copied.id());
        }
    }
}

#[test]
fn removing_an_effect_unbinds_its_users_and_channels() {
    let mut c = EffectContainer::with_channels("g", ["v"]).unwrap();
    let k = constant(&mut c, 3.0);
    let sum = add(&mut c);
    let a = input(&c, sum, "a");
    c.bind_to_variable(a, out(&c, k)).unwrap();
    c.bind_channel("v", Some(out(&c, k))).unwrap();

    c.remove_effect(k).unwrap();

    let var = c.input(a).unwrap();
    assert_eq!(var.bound_output(), None);
    assert_eq!(var.constant(), Some(var.default_value()));
    assert_eq!(c.channels()[0].source(), None);
    assert!(c.effect(k).is_none());
    for v in c.input_variables() {
        assert!(v.bound_output().is_none());
    }
}

#[test]
fn bind_rejects_incompatible_types() {
    let mut c = EffectContainer::new("g");
    let k = constant(&mut c, 1.0);
    let split = c.push_effect(EffectKind::leaf(ColorSplit));
    let err = c
        .bind_to_variable(input(&c, split, "color"), out(&c, k))
        .unwrap_err();
    assert!(matches!(
        err,
        GraphError::TypeMismatch {
            expected: ValueType::Color,
            found: ValueType::Float,
            ..
        }
    ));

    let err = c
        .bind_to_constant(input(&c, split, "color"), Value::Float(1.0))
        .unwrap_err();
    assert!(matches!(err, GraphError::ConstantType { .. }));
    c.bind_to_constant(input(&c, split, "color"), Value::Color(Color::WHITE))
        .unwrap();
}

#[test]
fn float_inputs_accept_int_outputs() {
    let mut c = EffectContainer::new("g");
    let k = c.push_effect(EffectKind::leaf(Constant::new(Value::Int(4))));
    let sum = add(&mut c);
    c.bind_to_variable(input(&c, sum, "a"), out(&c, k)).unwrap();
}

#[test]
fn forward_references_are_rejected() {
    let mut c = EffectContainer::new("g");
    let sum = add(&mut c);
    let k = constant(&mut c, 1.0);
    let err = c
        .bind_to_variable(input(&c, sum, "a"), out(&c, k))
        .unwrap_err();
    assert!(matches!(err, GraphError::ForwardReference { .. }));
}

#[test]
fn foreign_variables_are_rejected() {
    let mut a = EffectContainer::new("a");
    let mut b = EffectContainer::new("b");
    let ka = constant(&mut a, 1.0);
    let sum = add(&mut b);
    let err = b
        .bind_to_variable(input(&b, sum, "a"), out(&a, ka))
        .unwrap_err();
    assert!(matches!(err, GraphError::ForeignVariable(_)));
}

#[test]
fn available_outputs_lists_inputs_and_earlier_effects_only() {
    let mut c = EffectContainer::new("g");
    let ci = c
        .add_container_input(VariableSpec::new("t", ValueType::Float))
        .unwrap();
    let k = constant(&mut c, 1.0);
    let sum = add(&mut c);
    let later = constant(&mut c, 2.0);

    let avail = c.available_outputs_for(sum).unwrap();
    assert!(avail.contains(&ci));
    assert!(avail.contains(&out(&c, k)));
    assert!(!avail.contains(&out(&c, sum)));
    assert!(!avail.contains(&out(&c, later)));

    let mut other = EffectContainer::new("other");
    let stranger = constant(&mut other, 0.0);
    assert!(matches!(
        c.available_outputs_for(stranger),
        Err(GraphError::UnknownEffect(_))
    ));
}

#[test]
fn remove_all_users_tolerates_inputs_that_moved_on() {
    let mut c = EffectContainer::new("g");
    let k1 = constant(&mut c, 1.0);
    let k2 = constant(&mut c, 2.0);
    let sum = add(&mut c);
    let a = input(&c, sum, "a");
    let b = input(&c, sum, "b");
    c.bind_to_variable(a, out(&c, k1)).unwrap();
    c.bind_to_variable(b, out(&c, k1)).unwrap();
    c.bind_to_variable(b, out(&c, k2)).unwrap();
    c.bind_to_constant(a, Value::Float(9.0)).unwrap();

    assert_eq!(c.remove_all_users(out(&c, k1)).unwrap(), 0);
    assert_eq!(c.input(b).unwrap().bound_output(), Some(out(&c, k2)));
    assert_eq!(c.remove_all_users(out(&c, k2)).unwrap(), 1);
    assert_eq!(c.output(out(&c, k2)).unwrap().users().count(), 0);
}

#[test]
fn rebinding_moves_the_input_between_user_sets() {
    let mut c = EffectContainer::new("g");
    let k1 = constant(&mut c, 1.0);
    let k2 = constant(&mut c, 2.0);
    let sum = add(&mut c);
    let a = input(&c, sum, "a");
    c.bind_to_variable(a, out(&c, k1)).unwrap();
    assert_eq!(c.output(out(&c, k1)).unwrap().users().collect::<Vec<_>>(), vec![a]);
    c.bind_to_variable(a, out(&c, k2)).unwrap();
    assert_eq!(c.output(out(&c, k1)).unwrap().users().count(), 0);
    assert_eq!(c.output(out(&c, k2)).unwrap().users().collect::<Vec<_>>(), vec![a]);
    c.unbind(a).unwrap();
    assert_eq!(c.output(out(&c, k2)).unwrap().users().count(), 0);
}

#[test]
fn move_effect_refuses_to_break_ordering() {
    let mut c = EffectContainer::new("g");
    let k = constant(&mut c, 1.0);
    let sum = add(&mut c);
    let spare = constant(&mut c, 5.0);
    c.bind_to_variable(input(&c, sum, "a"), out(&c, k)).unwrap();

    let err = c.move_effect(sum, 0).unwrap_err();
    assert!(matches!(err, GraphError::ForwardReference { .. }));
    assert_eq!(c.effect_ids(), &[k, sum, spare]);

    c.move_effect(spare, 0).unwrap();
    assert_eq!(c.effect_ids(), &[spare, k, sum]);
    assert!(matches!(
        c.move_effect(spare, 3),
        Err(GraphError::Position { position: 3, len: 3 })
    ));
}

#[test]
fn channels_reject_duplicates_and_unknown_names() {
    let mut c = EffectContainer::with_channels("g", ["r", "g"]).unwrap();
    assert!(matches!(c.add_channel("r"), Err(GraphError::DuplicateName(_))));
    assert!(matches!(c.remove_channel("b"), Err(GraphError::UnknownChannel(_))));
    assert!(matches!(c.bind_channel("b", None), Err(GraphError::UnknownChannel(_))));
    c.remove_channel("r").unwrap();
    assert_eq!(c.channel_names(), vec!["g".to_owned()]);
}

#[test]
fn container_surface_names_are_unique() {
    let mut c = EffectContainer::new("g");
    c.add_container_input(VariableSpec::new("t", ValueType::Float))
        .unwrap();
    assert!(matches!(
        c.add_container_input(VariableSpec::new("t", ValueType::Int)),
        Err(GraphError::DuplicateName(_))
    ));
    c.add_container_output(VariableSpec::new("o", ValueType::Float))
        .unwrap();
    assert!(matches!(
        c.add_container_output(VariableSpec::new("o", ValueType::Float)),
        Err(GraphError::DuplicateName(_))
    ));
}

#[test]
fn removing_a_container_input_unbinds_readers() {
    let mut c = EffectContainer::new("g");
    let t = c
        .add_container_input(VariableSpec::new("t", ValueType::Float))
        .unwrap();
    let sum = add(&mut c);
    let a = input(&c, sum, "a");
    c.bind_to_variable(a, t).unwrap();
    c.remove_container_input(t).unwrap();
    assert_eq!(c.input(a).unwrap().bound_output(), None);
    assert!(c.container_input_named("t").is_none());
}

#[test]
fn edit_nested_resyncs_the_composite_surface() {
    let mut inner = EffectContainer::new("inner");
    inner
        .add_container_input(VariableSpec::new("keep", ValueType::Float))
        .unwrap();
    let dropped = inner
        .add_container_input(VariableSpec::new("drop", ValueType::Float))
        .unwrap();

    let mut outer = EffectContainer::new("outer");
    let k = constant(&mut outer, 1.0);
    let comp = outer.push_effect(EffectKind::composite(inner));
    let keep_in = input(&outer, comp, "keep");
    let drop_in = input(&outer, comp, "drop");
    outer.bind_to_variable(keep_in, out(&outer, k)).unwrap();
    outer.bind_to_variable(drop_in, out(&outer, k)).unwrap();

    outer
        .edit_nested(comp, |inner| {
            inner.remove_container_input(dropped).unwrap();
            inner
                .add_container_output(VariableSpec::new("result", ValueType::Float))
                .unwrap();
        })
        .unwrap();

    assert_eq!(outer.effect_input(comp, "keep"), Some(keep_in));
    assert_eq!(outer.input(keep_in).unwrap().bound_output(), Some(out(&outer, k)));
    assert!(outer.effect_input(comp, "drop").is_none());
    assert!(outer.input(drop_in).is_none());
    assert!(outer.effect_output(comp, "result").is_some());
    assert_eq!(
        outer.output(out(&outer, k)).unwrap().users().collect::<Vec<_>>(),
        vec![keep_in]
    );

    assert!(matches!(
        outer.edit_nested(k, |_| ()),
        Err(GraphError::NotComposite(_))
    ));
}

#[test]
fn edits_fire_events_and_bump_revisions() {
    let mut c = EffectContainer::with_channels("g", ["v"]).unwrap();
    let seen: Arc<Mutex<Vec<GraphEvent>>> = Arc::default();
    let sink = Arc::clone(&seen);
    let sub = c.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

    let k = constant(&mut c, 1.0);
    let sum = add(&mut c);
    let a = input(&c, sum, "a");
    c.bind_to_variable(a, out(&c, k)).unwrap();
    c.bind_channel("v", Some(out(&c, sum))).unwrap();
    assert_eq!(c.effect(sum).unwrap().revision(), 1);

    assert!(c.unsubscribe(sub));
    c.remove_effect(k).unwrap();

    let events = seen.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            GraphEvent::EffectAdded(k),
            GraphEvent::EffectAdded(sum),
            GraphEvent::VariableChanged {
                effect: Some(sum),
                input: a
            },
            GraphEvent::ChannelsChanged,
        ]
    );
}
