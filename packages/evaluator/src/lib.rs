//! # Interspy Evaluator
//!
//! Runs script lines one at a time against an ordered set of bindings.
//! Each line is parsed, executed transactionally and, when it is a bare
//! expression, evaluated again in a throwaway view to record its value.
//!
//! ```
//! use interspy_evaluator::{EvalContext, LineOutcome, Value};
//!
//! let mut ctx = EvalContext::new();
//! ctx.evaluate_line("a = 1").unwrap();
//! ctx.evaluate_line("b = a + 1").unwrap();
//! assert_eq!(ctx.evaluate_line("b"), Ok(LineOutcome::Captured(Value::Int(2))));
//! assert!(ctx.evaluate_line("x = 1/0").is_err());
//! assert_eq!(ctx.binding("x"), None);
//! ```

pub mod builtins;
pub mod context;
pub mod error;
pub mod interpreter;
pub mod ops;
pub mod value;

/// Name to value mapping in first-insertion order
pub type Bindings = indexmap::IndexMap<String, Value>;

pub use context::{EvalContext, LineFailure, LineOutcome, CAPTURE_SENTINEL};
pub use error::{EvalError, EvalResult};
pub use interpreter::{Scope, Writes};
pub use value::Value;
