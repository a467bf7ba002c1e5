//! Lines the way they show up in a half-written script

use interspy_parser::{parse_line, ParseError, Stmt};

#[test]
fn test_typical_script_lines_parse() {
    let lines = [
        "a = 1",
        "b = a + 1",
        "b",
        "names = ['ada', 'grace']",
        "names.append('linus')",
        "first, second = names[0], names[1]",
        "scores = {'ada': 3, 'grace': 5}",
        "len(names) > 2 and 'ada' in scores",
        "ratio = scores['ada'] / scores['grace']",
        "label = 'big' if ratio > 0.5 else 'small'",
        "print(label)",
        "",
        "# a comment",
        "pass",
    ];

    for line in lines {
        assert!(parse_line(line).is_ok(), "failed to parse {:?}", line);
    }
}

#[test]
fn test_in_progress_lines_fail_cleanly() {
    let lines = [
        "total = (a +",
        "names = ['ada',",
        "def area(r):",
        "    return r * r",
        "for n in names:",
        "x = 'unterminated",
        "while True:",
        "import math",
    ];

    for line in lines {
        assert!(parse_line(line).is_err(), "expected {:?} to be rejected", line);
    }
}

#[test]
fn test_lex_error_carries_span() {
    let err = parse_line("value = 3 $ 4").unwrap_err();
    match err {
        ParseError::LexError { span, .. } => assert_eq!(span.start, 10),
        other => panic!("expected lex error, got {:?}", other),
    }
}

#[test]
fn test_expression_statements_are_not_assignments() {
    for line in ["b", "a == b", "f(1)", "xs[0]", "-x ** 2"] {
        let stmt = parse_line(line).unwrap();
        assert!(matches!(stmt, Stmt::Expr(_)), "{:?} should be an expression", line);
        assert!(!stmt.is_assignment());
    }
}
