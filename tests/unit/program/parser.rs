use super::*;

const SAMPLE: &str = r#"program "demo";
use math;
channels 3;
params 1;
progress 8;
@fields
let p_e0_tint = param(0);
@at_pixel
let v_e0_value = clamp(x_norm * 2.0, 0.0, 1.0);
channel[2] = v_e0_value > 0.5 ? 1.0 : 0.0;
"#;

#[test]
fn parses_header_and_sections() {
    let ast = parse_program(SAMPLE).unwrap();
    assert_eq!(ast.name, "demo");
    assert_eq!(ast.uses.len(), 1);
    assert_eq!(ast.uses[0].0, "math");
    assert_eq!((ast.channels, ast.params, ast.progress_steps), (3, 1, 8));
    assert_eq!(ast.sections.len(), 2);
    assert_eq!(ast.sections[0].location, Location::Fields);
    assert_eq!(ast.sections[1].location, Location::AtPixel);
    match &ast.sections[1].body[1] {
        Stmt::Channel { index: 2, value, .. } => {
            assert!(matches!(value.kind, ExprKind::Select { .. }));
        }
        other => panic!("unexpected statement: {other:?}"),
    }
}

#[test]
fn parses_arithmetic_precedence() {
    let e = parse_expr("1 + 2 * 3").unwrap();
    match e.kind {
        ExprKind::Binary {
            op: BinaryOp::Add,
            right,
            ..
        } => assert!(matches!(
            right.kind,
            ExprKind::Binary {
                op: BinaryOp::Mul,
                ..
            }
        )),
        other => panic!("unexpected ast: {other:?}"),
    }
}

#[test]
fn select_is_right_associative_and_spans_cover_source() {
    let src = "a ? b : c ? d : e";
    let e = parse_expr(src).unwrap();
    assert_eq!((e.span.start, e.span.end), (0, src.len()));
    match e.kind {
        ExprKind::Select { otherwise, .. } => {
            assert!(matches!(otherwise.kind, ExprKind::Select { .. }));
        }
        other => panic!("unexpected ast: {other:?}"),
    }
}

#[test]
fn parses_calls() {
    let e = parse_expr("min(1, max(2, 3))").unwrap();
    match e.kind {
        ExprKind::Call { func, args } => {
            assert_eq!(func, "min");
            assert_eq!(args.len(), 2);
        }
        other => panic!("unexpected ast: {other:?}"),
    }
    assert!(parse_expr("(1)(2)").is_err());
}

#[test]
fn sections_must_follow_nesting_order() {
    let err = parse_program("@at_pixel\n@fields\n").unwrap_err();
    assert!(err.message.contains("out of order"));
    let err = parse_program("@at_pixel\n@at_pixel\n").unwrap_err();
    assert!(err.message.contains("repeated"));
    assert!(parse_program("@somewhere\n").is_err());
}

#[test]
fn statements_need_a_section_and_a_semicolon() {
    assert!(parse_program("let a = 1;").is_err());
    let err = parse_program("@at_pixel\nlet a = 1\n").unwrap_err();
    assert_eq!(err.offset, Some(20));
    assert!(parse_program("channels -1;").is_err());
}
