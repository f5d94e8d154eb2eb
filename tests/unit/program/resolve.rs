use super::*;

fn kind_of(src: &str) -> CompileErrorKind {
    ProgramTemplate::compile(src).unwrap_err().kind
}

#[test]
fn lowers_sections_into_separate_code() {
    let t = ProgramTemplate::compile(
        "use math; channels 2; params 1;\n\
         @fields let p_scale = param(0);\n\
         @before_loop let v_k = width_f * p_scale;\n\
         @before_line let v_row = y_norm;\n\
         @at_pixel channel[0] = clamp(x_norm + v_row, 0.0, v_k);\n\
         @after_pixel channel[1] = 1.0;",
    )
    .unwrap();
    assert_eq!((t.channels, t.params, t.field_count, t.local_count), (2, 1, 1, 2));
    assert_eq!(t.fields.ops, vec![Op::LoadParam(0), Op::StoreLocal(0)]);
    assert!(t.before_loop.ops.contains(&Op::LoadField(0)));
    assert!(t.pixel.ops.contains(&Op::WriteChannel(0)));
    assert!(t.pixel.ops.contains(&Op::WriteChannel(1)));
    assert!(t.after_line.is_empty() && t.after_loop.is_empty());
}

#[test]
fn repeated_literals_share_a_constant() {
    let t =
        ProgramTemplate::compile("channels 1; @at_pixel channel[0] = 0.5 + 0.5 * 0.5;").unwrap();
    assert_eq!(t.consts, vec![ConstVal::F64(0.5)]);
}

#[test]
fn loop_variables_follow_section_visibility() {
    assert_eq!(kind_of("@fields let a = x;"), CompileErrorKind::Access);
    assert_eq!(kind_of("@fields let a = width_f;"), CompileErrorKind::Access);
    assert_eq!(kind_of("@before_loop let a = y;"), CompileErrorKind::Access);
    assert_eq!(kind_of("@before_line let a = x_norm;"), CompileErrorKind::Access);
    assert_eq!(kind_of("@after_loop let a = y_norm;"), CompileErrorKind::Access);
    ProgramTemplate::compile("@after_line let a = y + slice_id;").unwrap();
}

#[test]
fn variables_are_scoped_to_their_section_chain() {
    assert_eq!(
        kind_of("@at_pixel let a = 1.0; @after_line let b = a;"),
        CompileErrorKind::Access
    );
    assert_eq!(
        kind_of("@before_line let a = 1.0; @after_loop let b = a;"),
        CompileErrorKind::Access
    );
    let src = "@before_loop let a = 0.0; @at_pixel a = a + 1.0; @after_loop let b = a;";
    ProgramTemplate::compile(src).unwrap();
}

#[test]
fn declarations_are_checked() {
    assert_eq!(kind_of("@at_pixel let x = 1.0;"), CompileErrorKind::Access);
    assert_eq!(kind_of("@at_pixel let channel = 1.0;"), CompileErrorKind::Access);
    assert_eq!(
        kind_of("@before_loop let a = 1.0; @at_pixel let a = 2.0;"),
        CompileErrorKind::Access
    );
    assert_eq!(kind_of("@at_pixel y = 1.0;"), CompileErrorKind::Access);
    assert_eq!(
        kind_of("@fields let f = 1.0; @at_pixel f = 2.0;"),
        CompileErrorKind::Access
    );
    assert_eq!(kind_of("@at_pixel let a = b;"), CompileErrorKind::MissingType);
    assert_eq!(kind_of("@at_pixel let a = a;"), CompileErrorKind::MissingType);
}

#[test]
fn functions_need_their_module() {
    assert_eq!(kind_of("@at_pixel let a = sin(x);"), CompileErrorKind::MissingType);
    assert_eq!(kind_of("use math; @at_pixel let a = frob(x);"), CompileErrorKind::MissingType);
    assert_eq!(kind_of("use physics; @at_pixel let a = x;"), CompileErrorKind::MissingType);
    assert_eq!(kind_of("use math; @at_pixel let a = sin(x, y);"), CompileErrorKind::Syntax);
    ProgramTemplate::compile("use noise; @at_pixel let a = fbm(x, y, 4.0, 1.0);").unwrap();
}

#[test]
fn params_and_channels_are_bounded() {
    assert_eq!(kind_of("params 1; @fields let a = param(1);"), CompileErrorKind::Resource);
    assert_eq!(kind_of("params 1; @fields let a = param(0.5);"), CompileErrorKind::Syntax);
    assert_eq!(kind_of("params 1; @at_pixel let a = param(0);"), CompileErrorKind::Access);
    assert_eq!(kind_of("channels 1; @at_pixel channel[1] = 0.0;"), CompileErrorKind::Resource);
    assert_eq!(kind_of("channels 1; @after_line channel[0] = 0.0;"), CompileErrorKind::Access);
    assert_eq!(kind_of("channels 5000;"), CompileErrorKind::Resource);
}

#[test]
fn too_many_variables_is_a_resource_failure() {
    let mut src = String::from("@at_pixel\n");
    for i in 0..=MAX_SLOTS {
        src.push_str(&format!("let v{i} = 0.0;\n"));
    }
    assert_eq!(kind_of(&src), CompileErrorKind::Resource);
}
