use crate::error::EvalError;
use crate::interpreter::{exec_stmt, Scope};
use crate::value::Value;
use crate::Bindings;
use interspy_parser::ast::{Stmt, Target};
use interspy_parser::{parse_line, ParseError};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Reserved name an expression line is bound to when its value is captured
pub const CAPTURE_SENTINEL: &str = "__interspy_capture__";

/// What a successfully executed line produced
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// The statement ran; nothing was captured
    Executed,
    /// The line is an expression; its value is recorded under the line text
    Captured(Value),
}

/// Why a line was skipped. Bindings are unchanged in both cases.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LineFailure {
    #[error("SyntaxError: {}", .0.label())]
    Syntax(#[from] ParseError),

    #[error(transparent)]
    Runtime(#[from] EvalError),
}

/// Bindings and expression records of one evaluation pass
#[derive(Debug, Default, Clone)]
pub struct EvalContext {
    bindings: Bindings,
    expressions: HashMap<String, Value>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every binding and expression record
    pub fn reset(&mut self) {
        self.bindings.clear();
        self.expressions.clear();
    }

    /// Bind a name directly, without running a line
    pub fn seed(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// Bindings in first-insertion order
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn binding(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Value recorded for an expression line, keyed by its exact text
    pub fn expression(&self, line: &str) -> Option<&Value> {
        self.expressions.get(line)
    }

    pub fn expression_count(&self) -> usize {
        self.expressions.len()
    }

    /// Execute one line against the current bindings.
    ///
    /// A line that fails to parse or raises leaves the bindings exactly as
    /// they were. When an expression line succeeds it is evaluated a second
    /// time against a throwaway view of the bindings and the value is kept
    /// as the line's expression record; a failure at that stage only means
    /// no record.
    pub fn evaluate_line(&mut self, text: &str) -> Result<LineOutcome, LineFailure> {
        let stmt = parse_line(text).map_err(|err| {
            debug!(line = text, error = %err.label(), "line does not parse");
            LineFailure::Syntax(err)
        })?;

        let writes = {
            let mut scope = Scope::new(&self.bindings);
            exec_stmt(&stmt, &mut scope).map_err(|err| {
                debug!(line = text, error = %err, "line raised");
                LineFailure::Runtime(err)
            })?;
            scope.into_writes()
        };
        writes.commit(&mut self.bindings);

        let Stmt::Expr(expr) = stmt else {
            return Ok(LineOutcome::Executed);
        };

        match self.capture(expr) {
            Ok(value) => {
                self.expressions.insert(text.to_string(), value.clone());
                Ok(LineOutcome::Captured(value))
            }
            Err(err) => {
                debug!(line = text, error = %err, "expression capture failed");
                Ok(LineOutcome::Executed)
            }
        }
    }

    fn capture(&self, expr: interspy_parser::Expr) -> Result<Value, EvalError> {
        let capture = Stmt::Assign {
            targets: vec![Target::Name(CAPTURE_SENTINEL.to_string())],
            value: expr,
        };
        let mut view = Scope::new(&self.bindings);
        exec_stmt(&capture, &mut view)?;
        view.get(CAPTURE_SENTINEL)
            .cloned()
            .ok_or_else(|| EvalError::undefined(CAPTURE_SENTINEL))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_expression_line_is_captured() {
        let mut ctx = EvalContext::new();
        assert_eq!(ctx.evaluate_line("a = 1"), Ok(LineOutcome::Executed));
        assert_eq!(ctx.evaluate_line("a + 1"), Ok(LineOutcome::Captured(Value::Int(2))));
        assert_eq!(ctx.expression("a + 1"), Some(&Value::Int(2)));
        assert_eq!(ctx.binding(CAPTURE_SENTINEL), None);
    }

    #[test]
    fn test_comparison_line_gets_a_record() {
        let mut ctx = EvalContext::new();
        ctx.seed("a", Value::Int(1));
        ctx.evaluate_line("a == 1").unwrap();
        assert_eq!(ctx.expression("a == 1"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_failed_capture_leaves_no_record() {
        let mut ctx = EvalContext::new();
        ctx.evaluate_line("xs = [1]").unwrap();
        // the first pop empties the list, the capture's pop then fails
        assert_eq!(ctx.evaluate_line("xs.pop()"), Ok(LineOutcome::Executed));
        assert_eq!(ctx.binding("xs"), Some(&Value::List(vec![])));
        assert_eq!(ctx.expression("xs.pop()"), None);
    }

    #[test]
    fn test_failures_are_classified() {
        let mut ctx = EvalContext::new();
        assert!(matches!(ctx.evaluate_line("x = (1"), Err(LineFailure::Syntax(_))));
        let err = ctx.evaluate_line("x = 1/0").unwrap_err();
        assert_eq!(err.to_string(), "ZeroDivisionError: division by zero");
        assert!(ctx.bindings().is_empty());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut ctx = EvalContext::new();
        ctx.evaluate_line("a = 1").unwrap();
        ctx.evaluate_line("a").unwrap();
        ctx.reset();
        assert!(ctx.bindings().is_empty());
        assert_eq!(ctx.expression_count(), 0);
    }
}
