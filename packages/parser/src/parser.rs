use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::tokenizer::{tokenize, Token};

/// Statement keywords of the full language that cannot appear on a
/// standalone line (they open or close blocks, or need a module system).
const RESERVED: &[&str] = &[
    "as", "assert", "async", "await", "break", "class", "continue", "def", "elif", "except",
    "finally", "for", "from", "global", "import", "lambda", "nonlocal", "raise", "return", "try",
    "while", "with", "yield",
];

/// Longest line, in tokens, the parser accepts
pub const MAX_TOKENS: usize = 4096;

/// Deepest expression tree a line may build: parentheses, prefix
/// operators, and every link of an operator or postfix chain count
pub const MAX_NESTING: usize = 100;

/// Recursive descent parser for a single line
pub struct Parser<'src> {
    tokens: Vec<(Token<'src>, Span)>,
    pos: usize,
    line_len: usize,
    depth: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> ParseResult<Self> {
        let tokens = tokenize(source)?;
        if tokens.len() > MAX_TOKENS {
            return Err(ParseError::invalid_syntax(
                Span::new(0, source.len()),
                "line is too long to evaluate",
            ));
        }
        Ok(Self {
            tokens,
            pos: 0,
            line_len: source.len(),
            depth: 0,
        })
    }

    /// Parse the whole line as one statement
    pub fn parse_statement(&mut self) -> ParseResult<Stmt> {
        let stmt = match self.peek() {
            None => Stmt::Empty,
            Some((Token::Pass, _)) => {
                self.advance();
                Stmt::Pass
            }
            Some((Token::Del, _)) => {
                self.advance();
                self.parse_del()?
            }
            Some((Token::Ident(name), span)) if RESERVED.contains(name) => {
                return Err(ParseError::invalid_syntax(
                    *span,
                    format!("'{}' statements cannot be evaluated line by line", name),
                ));
            }
            Some(_) => self.parse_expression_statement()?,
        };

        if let Some((token, span)) = self.peek() {
            return Err(ParseError::unexpected_token(*span, "end of line", token.to_string()));
        }

        Ok(stmt)
    }

    fn parse_del(&mut self) -> ParseResult<Stmt> {
        let mut names = vec![self.expect_ident()?];
        while self.match_token(&Token::Comma) {
            if self.is_at_end() {
                break;
            }
            names.push(self.expect_ident()?);
        }
        Ok(Stmt::Del(names))
    }

    fn parse_expression_statement(&mut self) -> ParseResult<Stmt> {
        let start = self.peek_span();
        let first = self.parse_expr_list()?;

        if let Some(op) = self.peek().and_then(|(token, _)| augmented_operator(token)) {
            self.advance();
            let name = match first {
                Expr::Name(name) => name,
                _ => {
                    return Err(ParseError::invalid_syntax(
                        start,
                        "augmented assignment needs a plain name",
                    ))
                }
            };
            let value = self.parse_expr_list()?;
            return Ok(Stmt::AugAssign { name, op, value });
        }

        if !self.check(&Token::Assign) {
            return Ok(Stmt::Expr(first));
        }

        // `a = b = value`: everything left of the last `=` is a target
        let mut chain = vec![(first, start)];
        while self.match_token(&Token::Assign) {
            let span = self.peek_span();
            chain.push((self.parse_expr_list()?, span));
        }

        let (value, _) = chain.pop().ok_or_else(|| ParseError::unexpected_eof(self.line_len, "expression"))?;
        let targets = chain
            .into_iter()
            .map(|(expr, span)| to_target(expr, span))
            .collect::<ParseResult<Vec<_>>>()?;

        Ok(Stmt::Assign { targets, value })
    }

    /// `expr, expr, ...`: a bare comma list forms a tuple
    fn parse_expr_list(&mut self) -> ParseResult<Expr> {
        let first = self.parse_expr()?;
        if !self.check(&Token::Comma) {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.match_token(&Token::Comma) {
            if !self.starts_expression() {
                break;
            }
            items.push(self.parse_expr()?);
        }
        Ok(Expr::Tuple(items))
    }

    /// Conditional expression: `body if test else orelse`
    fn parse_expr(&mut self) -> ParseResult<Expr> {
        let body = self.parse_or()?;
        if !self.match_token(&Token::If) {
            return Ok(body);
        }
        let test = self.parse_or()?;
        self.expect(&Token::Else, "'else'")?;
        let orelse = self.nested(Self::parse_expr)?;
        Ok(Expr::Conditional {
            body: Box::new(body),
            test: Box::new(test),
            orelse: Box::new(orelse),
        })
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let outer = self.depth;
        let mut left = self.parse_and()?;
        while self.match_token(&Token::Or) {
            self.deepen()?;
            let right = self.parse_and()?;
            left = Expr::Logical {
                op: LogicalOperator::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = outer;
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let outer = self.depth;
        let mut left = self.parse_not()?;
        while self.match_token(&Token::And) {
            self.deepen()?;
            let right = self.parse_not()?;
            left = Expr::Logical {
                op: LogicalOperator::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = outer;
        Ok(left)
    }

    fn parse_not(&mut self) -> ParseResult<Expr> {
        if self.match_token(&Token::Not) {
            let operand = self.nested(Self::parse_not)?;
            return Ok(Expr::Unary {
                op: UnaryOperator::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let left = self.parse_arith()?;
        let mut comparisons = Vec::new();

        while let Some(op) = self.match_compare_operator()? {
            comparisons.push((op, self.parse_arith()?));
        }

        if comparisons.is_empty() {
            Ok(left)
        } else {
            Ok(Expr::Compare {
                left: Box::new(left),
                comparisons,
            })
        }
    }

    fn match_compare_operator(&mut self) -> ParseResult<Option<CompareOperator>> {
        let op = match self.peek() {
            Some((Token::EqEq, _)) => CompareOperator::Equal,
            Some((Token::NotEq, _)) => CompareOperator::NotEqual,
            Some((Token::Lt, _)) => CompareOperator::Less,
            Some((Token::Lte, _)) => CompareOperator::LessEqual,
            Some((Token::Gt, _)) => CompareOperator::Greater,
            Some((Token::Gte, _)) => CompareOperator::GreaterEqual,
            Some((Token::In, _)) => CompareOperator::In,
            Some((Token::Is, _)) => {
                self.advance();
                if self.match_token(&Token::Not) {
                    return Ok(Some(CompareOperator::IsNot));
                }
                return Ok(Some(CompareOperator::Is));
            }
            Some((Token::Not, _)) => {
                self.advance();
                self.expect(&Token::In, "'in'")?;
                return Ok(Some(CompareOperator::NotIn));
            }
            _ => return Ok(None),
        };
        self.advance();
        Ok(Some(op))
    }

    fn parse_arith(&mut self) -> ParseResult<Expr> {
        let outer = self.depth;
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some((Token::Plus, _)) => BinaryOperator::Add,
                Some((Token::Minus, _)) => BinaryOperator::Subtract,
                _ => break,
            };
            self.advance();
            self.deepen()?;
            let right = self.parse_term()?;
            left = binary(op, left, right);
        }
        self.depth = outer;
        Ok(left)
    }

    fn parse_term(&mut self) -> ParseResult<Expr> {
        let outer = self.depth;
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some((Token::Star, _)) => BinaryOperator::Multiply,
                Some((Token::Slash, _)) => BinaryOperator::Divide,
                Some((Token::DoubleSlash, _)) => BinaryOperator::FloorDivide,
                Some((Token::Percent, _)) => BinaryOperator::Modulo,
                _ => break,
            };
            self.advance();
            self.deepen()?;
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
        self.depth = outer;
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let op = match self.peek() {
            Some((Token::Minus, _)) => UnaryOperator::Negate,
            Some((Token::Plus, _)) => UnaryOperator::Plus,
            _ => return self.nested(Self::parse_power),
        };
        self.advance();
        let operand = self.nested(Self::parse_unary)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// `primary ** unary`, right-associative and tighter than a leading minus
    fn parse_power(&mut self) -> ParseResult<Expr> {
        let base = self.parse_primary()?;
        if self.match_token(&Token::DoubleStar) {
            let exponent = self.parse_unary()?;
            return Ok(binary(BinaryOperator::Power, base, exponent));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let outer = self.depth;
        let mut expr = self.parse_atom()?;

        loop {
            if self.starts_postfix() {
                self.deepen()?;
            }
            if self.check(&Token::LParen) {
                let span = self.peek_span();
                let args = self.parse_call_args()?;
                expr = match expr {
                    Expr::Name(function) => Expr::Call { function, args },
                    Expr::Attribute { value, name } => Expr::MethodCall {
                        receiver: value,
                        method: name,
                        args,
                    },
                    _ => {
                        return Err(ParseError::invalid_syntax(
                            span,
                            "only builtins and methods can be called",
                        ))
                    }
                };
            } else if self.match_token(&Token::LBracket) {
                let index = self.parse_expr_list()?;
                self.expect(&Token::RBracket, "']'")?;
                expr = Expr::Subscript {
                    value: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.match_token(&Token::Dot) {
                let name = self.expect_ident()?;
                expr = Expr::Attribute {
                    value: Box::new(expr),
                    name,
                };
            } else {
                self.depth = outer;
                return Ok(expr);
            }
        }
    }

    fn starts_postfix(&self) -> bool {
        matches!(
            self.peek(),
            Some((Token::LParen | Token::LBracket | Token::Dot, _))
        )
    }

    fn parse_call_args(&mut self) -> ParseResult<Vec<Expr>> {
        self.expect(&Token::LParen, "'('")?;
        let mut args = Vec::new();
        while !self.check(&Token::RParen) {
            let arg = self.parse_expr()?;
            if self.check(&Token::Assign) {
                return Err(ParseError::invalid_syntax(
                    self.peek_span(),
                    "keyword arguments are not supported",
                ));
            }
            args.push(arg);
            if !self.match_token(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RParen, "')'")?;
        Ok(args)
    }

    fn parse_atom(&mut self) -> ParseResult<Expr> {
        let Some((token, span)) = self.advance().cloned() else {
            return Err(ParseError::unexpected_eof(self.line_len, "expression"));
        };

        match token {
            Token::Int(text) => parse_int(text, span),
            Token::Float(text) => parse_float(text, span),
            Token::Str(raw) => {
                let mut value = unescape(raw, span)?;
                // adjacent literals concatenate: 'a' 'b'
                while let Some((Token::Str(next), next_span)) = self.peek().cloned() {
                    self.advance();
                    value.push_str(&unescape(next, next_span)?);
                }
                Ok(Expr::Str(value))
            }
            Token::True => Ok(Expr::Bool(true)),
            Token::False => Ok(Expr::Bool(false)),
            Token::NoneKw => Ok(Expr::None),
            Token::Ident(name) if RESERVED.contains(&name) => Err(ParseError::invalid_syntax(
                span,
                format!("'{}' cannot be used in an expression", name),
            )),
            Token::Ident(name) => Ok(Expr::Name(name.to_string())),
            Token::LParen => self.parse_parenthesized(),
            Token::LBracket => {
                let items = self.parse_sequence(&Token::RBracket, "']'")?;
                Ok(Expr::List(items))
            }
            Token::LBrace => self.parse_dict(),
            other => Err(ParseError::unexpected_token(span, "expression", other.to_string())),
        }
    }

    fn parse_parenthesized(&mut self) -> ParseResult<Expr> {
        if self.match_token(&Token::RParen) {
            return Ok(Expr::Tuple(Vec::new()));
        }
        let first = self.parse_expr()?;
        if self.match_token(&Token::RParen) {
            return Ok(first);
        }
        self.expect(&Token::Comma, "',' or ')'")?;
        let mut items = vec![first];
        items.extend(self.parse_sequence(&Token::RParen, "')'")?);
        Ok(Expr::Tuple(items))
    }

    /// Comma separated items up to `close`, trailing comma allowed
    fn parse_sequence(&mut self, close: &Token<'src>, expected: &str) -> ParseResult<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.check(close) {
            items.push(self.parse_expr()?);
            if !self.match_token(&Token::Comma) {
                break;
            }
        }
        self.expect(close, expected)?;
        Ok(items)
    }

    fn parse_dict(&mut self) -> ParseResult<Expr> {
        let mut entries = Vec::new();
        while !self.check(&Token::RBrace) {
            let key = self.parse_expr()?;
            self.expect(&Token::Colon, "':'")?;
            let value = self.parse_expr()?;
            entries.push((key, value));
            if !self.match_token(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RBrace, "'}'")?;
        Ok(Expr::Dict(entries))
    }

    fn starts_expression(&self) -> bool {
        match self.peek() {
            Some((token, _)) => !matches!(
                token,
                Token::RParen
                    | Token::RBracket
                    | Token::RBrace
                    | Token::Assign
                    | Token::Comma
                    | Token::Colon
                    | Token::Semicolon
            ) && augmented_operator(token).is_none(),
            None => false,
        }
    }

    // Helper methods

    /// Run a recursive step, bounding how deep a single line may nest
    fn nested(&mut self, step: fn(&mut Self) -> ParseResult<Expr>) -> ParseResult<Expr> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::invalid_syntax(self.peek_span(), "too many nested expressions"));
        }
        self.depth += 1;
        let result = step(self);
        self.depth -= 1;
        result
    }

    /// Count one more link of a loop-built chain; the caller restores
    /// `depth` once the chain is complete
    fn deepen(&mut self) -> ParseResult<()> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::invalid_syntax(self.peek_span(), "too many nested expressions"));
        }
        self.depth += 1;
        Ok(())
    }

    fn peek(&self) -> Option<&(Token<'src>, Span)> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&(Token<'src>, Span)> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn check(&self, token: &Token<'src>) -> bool {
        match self.peek() {
            Some((t, _)) => std::mem::discriminant(t) == std::mem::discriminant(token),
            None => false,
        }
    }

    fn match_token(&mut self, token: &Token<'src>) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token<'src>, expected: &str) -> ParseResult<()> {
        if self.match_token(token) {
            return Ok(());
        }
        Err(self.error_here(expected))
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some((Token::Ident(name), _)) if !RESERVED.contains(name) => {
                let name = name.to_string();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error_here("identifier")),
        }
    }

    fn peek_span(&self) -> Span {
        self.peek()
            .map(|(_, span)| *span)
            .unwrap_or(Span::new(self.line_len, self.line_len))
    }

    fn error_here(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some((token, span)) => ParseError::unexpected_token(*span, expected, token.to_string()),
            None => ParseError::unexpected_eof(self.line_len, expected),
        }
    }
}

fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn augmented_operator(token: &Token) -> Option<BinaryOperator> {
    match token {
        Token::PlusAssign => Some(BinaryOperator::Add),
        Token::MinusAssign => Some(BinaryOperator::Subtract),
        Token::StarAssign => Some(BinaryOperator::Multiply),
        Token::SlashAssign => Some(BinaryOperator::Divide),
        Token::DoubleSlashAssign => Some(BinaryOperator::FloorDivide),
        Token::PercentAssign => Some(BinaryOperator::Modulo),
        Token::DoubleStarAssign => Some(BinaryOperator::Power),
        _ => None,
    }
}

fn to_target(expr: Expr, span: Span) -> ParseResult<Target> {
    match expr {
        Expr::Name(name) => Ok(Target::Name(name)),
        Expr::Tuple(items) | Expr::List(items) => items
            .into_iter()
            .map(|item| to_target(item, span))
            .collect::<ParseResult<Vec<_>>>()
            .map(Target::Unpack),
        _ => Err(ParseError::invalid_syntax(span, "cannot assign to expression")),
    }
}

fn parse_int(text: &str, span: Span) -> ParseResult<Expr> {
    text.replace('_', "")
        .parse::<i64>()
        .map(Expr::Int)
        .map_err(|_| ParseError::invalid_syntax(span, "integer literal is too large"))
}

fn parse_float(text: &str, span: Span) -> ParseResult<Expr> {
    text.replace('_', "")
        .parse::<f64>()
        .map(Expr::Float)
        .map_err(|_| ParseError::invalid_syntax(span, format!("invalid float literal '{}'", text)))
}

/// Resolve backslash escapes inside a string literal body
fn unescape(raw: &str, span: Span) -> ParseResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            // unknown escapes are kept verbatim
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => return Err(ParseError::lex_error(span, "string ends with a backslash")),
        }
    }
    Ok(out)
}

/// Parse one line of script source.
///
/// An indented line is rejected: on its own it can only be the body of a
/// block whose header lives on another line.
pub fn parse_line(source: &str) -> ParseResult<Stmt> {
    let body = source.trim_end_matches(['\r', '\n']);
    let indent = body.len() - body.trim_start_matches([' ', '\t']).len();
    let rest = body[indent..].trim_start();
    if indent > 0 && !rest.is_empty() && !rest.starts_with('#') {
        return Err(ParseError::invalid_syntax(Span::new(0, indent), "unexpected indent"));
    }

    Parser::new(body)?.parse_statement()
}
