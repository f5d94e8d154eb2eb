use super::*;
use crate::program::bytecode::ConstIdx;
use crate::program::resolve::ProgramTemplate;

fn eval_pixel(src: &str, env: Env) -> Result<Vec<f32>, VmError> {
    let t = ProgramTemplate::compile(src).unwrap();
    let frame = Frame {
        consts: &t.consts,
        params: &[],
        fields: &[],
        env,
    };
    let mut locals = vec![Slot::default(); t.local_count];
    let mut stack = Vec::new();
    let mut px = vec![0.0; t.channels];
    run(&t.pixel, &frame, &mut locals, &mut stack, &mut px)?;
    Ok(px)
}

#[test]
fn arithmetic_and_select() {
    let px = eval_pixel(
        "channels 3; @at_pixel channel[0] = 1.0 + 2.0 * 3.0; channel[1] = -7.0 % 3.0; \
         channel[2] = x > 2.0 && !(y == 1.0) ? 1.0 : 0.5;",
        Env {
            x: 3.0,
            y: 2.0,
            ..Env::default()
        },
    )
    .unwrap();
    assert_eq!(px, vec![7.0, 2.0, 1.0]);
}

#[test]
fn builtins_compute_expected_values() {
    let px = eval_pixel(
        "use math; use color; channels 6; @at_pixel \
         channel[0] = clamp(5.0, 0.0, 1.0); \
         channel[1] = step(0.5, 0.25); \
         channel[2] = smoothstep(0.0, 1.0, 0.5); \
         channel[3] = fract(-0.25); \
         channel[4] = green(mix(rgba(0.0, 0.0, 0.0, 1.0), rgba(1.0, 1.0, 1.0, 1.0), 0.25)); \
         channel[5] = x_norm < 0.5;",
        Env {
            x_norm: 0.25,
            ..Env::default()
        },
    )
    .unwrap();
    assert_eq!(px, vec![1.0, 0.0, 0.5, 0.75, 0.25, 1.0]);
}

#[test]
fn type_errors_are_reported() {
    let err =
        eval_pixel("channels 1; @at_pixel channel[0] = true + 1.0;", Env::default()).unwrap_err();
    assert!(err.message.contains("expected number"), "{err}");

    let err = eval_pixel("channels 1; @at_pixel channel[0] = 1.0 ? 2.0 : 3.0;", Env::default())
        .unwrap_err();
    assert!(err.message.contains("expected bool"), "{err}");
}

#[test]
fn tables_and_gradients_come_from_values() {
    let table = Slot::from(&Value::Table(vec![0.0, 10.0]));
    let grad = Slot::from(&Value::Gradient(Gradient::linear(Color::BLACK, Color::WHITE)));
    assert_eq!(
        call_builtin(BuiltinId::Lookup, &[table, Slot::Num(0.5)]).unwrap(),
        Slot::Num(5.0)
    );
    let Slot::Color(c) = call_builtin(BuiltinId::Sample, &[grad, Slot::Num(1.0)]).unwrap() else {
        panic!("sample must yield a color");
    };
    assert_eq!(c, Color::WHITE);
    assert!(call_builtin(BuiltinId::Lookup, &[Slot::Num(1.0), Slot::Num(0.5)]).is_err());
}

#[test]
fn stores_update_locals() {
    let code = Code {
        ops: vec![
            Op::PushConst(ConstIdx(0)),
            Op::StoreLocal(1),
            Op::LoadLocal(1),
            Op::Neg,
            Op::StoreLocal(0),
        ],
    };
    let consts = [ConstVal::F64(4.0)];
    let frame = Frame {
        consts: &consts,
        params: &[],
        fields: &[],
        env: Env::default(),
    };
    let mut locals = vec![Slot::default(); 2];
    run(&code, &frame, &mut locals, &mut Vec::new(), &mut []).unwrap();
    assert_eq!(locals, vec![Slot::Num(-4.0), Slot::Num(4.0)]);
}
