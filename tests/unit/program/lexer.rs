use super::*;
use crate::compile::error::CompileErrorKind;

fn kinds(src: &str) -> Vec<TokenKind> {
    lex(src).unwrap().into_iter().map(|t| t.kind).collect()
}

#[test]
fn lexes_statements_and_sections() {
    assert_eq!(
        kinds("@at_pixel\nlet v = x_norm * 2.5e1; // trailing\nchannel[0] = v;"),
        vec![
            TokenKind::Section("at_pixel".to_owned()),
            TokenKind::Let,
            TokenKind::Ident("v".to_owned()),
            TokenKind::Assign,
            TokenKind::Ident("x_norm".to_owned()),
            TokenKind::Star,
            TokenKind::Number(25.0),
            TokenKind::Semi,
            TokenKind::Ident("channel".to_owned()),
            TokenKind::LBracket,
            TokenKind::Number(0.0),
            TokenKind::RBracket,
            TokenKind::Assign,
            TokenKind::Ident("v".to_owned()),
            TokenKind::Semi,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn distinguishes_assignment_from_equality() {
    assert_eq!(
        kinds("a == b = c != d"),
        vec![
            TokenKind::Ident("a".to_owned()),
            TokenKind::EqEq,
            TokenKind::Ident("b".to_owned()),
            TokenKind::Assign,
            TokenKind::Ident("c".to_owned()),
            TokenKind::Ne,
            TokenKind::Ident("d".to_owned()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn string_literals_support_escapes() {
    assert_eq!(
        kinds(r#"program "a \"b\" \\ c";"#)[1],
        TokenKind::Str(r#"a "b" \ c"#.to_owned())
    );
    let err = lex("\"open").unwrap_err();
    assert_eq!(err.kind, CompileErrorKind::Syntax);
    assert_eq!(err.offset, Some(0));
}

#[test]
fn rejects_stray_characters_with_offsets() {
    let err = lex("let a = 1 # 2;").unwrap_err();
    assert_eq!(err.offset, Some(10));
    assert!(err.message.contains('#'));
    assert!(lex("1e+").is_err());
    assert!(lex("@ fields").is_err());
}
