use crate::ast::Span;
use crate::error::{ParseError, ParseResult};
use logos::Logos;
use std::fmt;

/// Token types for the Interspy script language
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\f\r]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token<'src> {
    // Keywords
    #[token("True")]
    True,

    #[token("False")]
    False,

    #[token("None")]
    NoneKw,

    #[token("and")]
    And,

    #[token("or")]
    Or,

    #[token("not")]
    Not,

    #[token("in")]
    In,

    #[token("is")]
    Is,

    #[token("if")]
    If,

    #[token("else")]
    Else,

    #[token("pass")]
    Pass,

    #[token("del")]
    Del,

    // Identifiers
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice())]
    Ident(&'src str),

    // Literals
    #[regex(r"[0-9][0-9_]*", |lex| lex.slice())]
    Int(&'src str),

    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9]+", |lex| lex.slice())]
    Float(&'src str),

    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    #[regex(r"'([^'\\\n]|\\.)*'", |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    Str(&'src str),

    // Operators
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("**")]
    DoubleStar,

    #[token("/")]
    Slash,

    #[token("//")]
    DoubleSlash,

    #[token("%")]
    Percent,

    #[token("=")]
    Assign,

    #[token("+=")]
    PlusAssign,

    #[token("-=")]
    MinusAssign,

    #[token("*=")]
    StarAssign,

    #[token("**=")]
    DoubleStarAssign,

    #[token("/=")]
    SlashAssign,

    #[token("//=")]
    DoubleSlashAssign,

    #[token("%=")]
    PercentAssign,

    #[token("==")]
    EqEq,

    #[token("!=")]
    NotEq,

    #[token("<")]
    Lt,

    #[token("<=")]
    Lte,

    #[token(">")]
    Gt,

    #[token(">=")]
    Gte,

    // Punctuation
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,

    #[token(".")]
    Dot,

    #[token(";")]
    Semicolon,
}

impl<'src> fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::True => write!(f, "True"),
            Token::False => write!(f, "False"),
            Token::NoneKw => write!(f, "None"),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Not => write!(f, "not"),
            Token::In => write!(f, "in"),
            Token::Is => write!(f, "is"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::Pass => write!(f, "pass"),
            Token::Del => write!(f, "del"),
            Token::Ident(s) => write!(f, "identifier '{}'", s),
            Token::Int(n) => write!(f, "integer {}", n),
            Token::Float(n) => write!(f, "float {}", n),
            Token::Str(s) => write!(f, "string '{}'", s),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::DoubleStar => write!(f, "**"),
            Token::Slash => write!(f, "/"),
            Token::DoubleSlash => write!(f, "//"),
            Token::Percent => write!(f, "%"),
            Token::Assign => write!(f, "="),
            Token::PlusAssign => write!(f, "+="),
            Token::MinusAssign => write!(f, "-="),
            Token::StarAssign => write!(f, "*="),
            Token::DoubleStarAssign => write!(f, "**="),
            Token::SlashAssign => write!(f, "/="),
            Token::DoubleSlashAssign => write!(f, "//="),
            Token::PercentAssign => write!(f, "%="),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Lte => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::Gte => write!(f, ">="),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Comma => write!(f, ","),
            Token::Colon => write!(f, ":"),
            Token::Dot => write!(f, "."),
            Token::Semicolon => write!(f, ";"),
        }
    }
}

/// Tokenize one line of source, keeping byte spans.
///
/// Fails on the first character that does not start a token (an
/// unterminated string, a stray `$`, ...).
pub fn tokenize(source: &str) -> ParseResult<Vec<(Token<'_>, Span)>> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = Span::new(range.start, range.end);
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                return Err(ParseError::lex_error(
                    span,
                    format!("unexpected character '{}'", lexer.slice()),
                ));
            }
        }
    }

    Ok(tokens)
}
