//! Statement execution and expression evaluation.
//!
//! A line runs against a [`Scope`]: a write overlay on top of the committed
//! bindings. Nothing reaches the bindings until the whole line succeeded,
//! so a failing line never leaves a partial assignment behind.

use crate::builtins::{call_builtin, call_method, is_builtin, MUTATING_METHODS};
use crate::error::{EvalError, EvalResult};
use crate::ops::{binary_op, contains, subscript, unary_op};
use crate::value::Value;
use crate::Bindings;
use indexmap::IndexMap;
use interspy_parser::ast::{CompareOperator, Expr, LogicalOperator, Stmt, Target};
use std::cmp::Ordering;

/// Copy-on-write view of the bindings for one line
#[derive(Debug)]
pub struct Scope<'a> {
    base: &'a Bindings,
    /// `None` marks a deleted name
    writes: IndexMap<String, Option<Value>>,
}

/// Pending changes of a successful line, ready to be committed
#[derive(Debug, Default)]
pub struct Writes(IndexMap<String, Option<Value>>);

impl<'a> Scope<'a> {
    pub fn new(base: &'a Bindings) -> Self {
        Self {
            base,
            writes: IndexMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        match self.writes.get(name) {
            Some(written) => written.as_ref(),
            None => self.base.get(name),
        }
    }

    /// Mutable access, copying the committed value into the overlay first
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        if !self.writes.contains_key(name) {
            let current = self.base.get(name)?.clone();
            self.writes.insert(name.to_string(), Some(current));
        }
        self.writes.get_mut(name).and_then(Option::as_mut)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.writes.insert(name.to_string(), Some(value));
    }

    /// Unbind `name`; false when it was not bound
    pub fn remove(&mut self, name: &str) -> bool {
        if self.get(name).is_none() {
            return false;
        }
        self.writes.insert(name.to_string(), None);
        true
    }

    pub fn into_writes(self) -> Writes {
        Writes(self.writes)
    }
}

impl Writes {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Apply to `bindings`. Rebound names keep their position, new names
    /// go to the end, deleted names are removed preserving the rest.
    pub fn commit(self, bindings: &mut Bindings) {
        for (name, value) in self.0 {
            match value {
                Some(value) => {
                    bindings.insert(name, value);
                }
                None => {
                    bindings.shift_remove(&name);
                }
            }
        }
    }
}

pub fn exec_stmt(stmt: &Stmt, scope: &mut Scope) -> EvalResult<()> {
    match stmt {
        Stmt::Empty | Stmt::Pass => Ok(()),
        Stmt::Del(names) => {
            for name in names {
                if !scope.remove(name) {
                    return Err(EvalError::undefined(name));
                }
            }
            Ok(())
        }
        Stmt::Assign { targets, value } => {
            let value = eval_expr(value, scope)?;
            for target in targets {
                assign(target, value.clone(), scope)?;
            }
            Ok(())
        }
        Stmt::AugAssign { name, op, value } => {
            let current = scope
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::undefined(name))?;
            let rhs = eval_expr(value, scope)?;
            let updated = binary_op(*op, &current, &rhs)?;
            scope.set(name, updated);
            Ok(())
        }
        Stmt::Expr(expr) => eval_expr(expr, scope).map(|_| ()),
    }
}

fn assign(target: &Target, value: Value, scope: &mut Scope) -> EvalResult<()> {
    match target {
        Target::Name(name) => {
            scope.set(name, value);
            Ok(())
        }
        Target::Unpack(targets) => {
            let items = value.iterate().map_err(|_| {
                EvalError::Type(format!(
                    "cannot unpack non-iterable {} object",
                    value.type_name()
                ))
            })?;
            match items.len().cmp(&targets.len()) {
                Ordering::Less => Err(EvalError::Value(format!(
                    "not enough values to unpack (expected {}, got {})",
                    targets.len(),
                    items.len()
                ))),
                Ordering::Greater => Err(EvalError::Value(format!(
                    "too many values to unpack (expected {})",
                    targets.len()
                ))),
                Ordering::Equal => {
                    for (target, item) in targets.iter().zip(items) {
                        assign(target, item, scope)?;
                    }
                    Ok(())
                }
            }
        }
    }
}

pub fn eval_expr(expr: &Expr, scope: &mut Scope) -> EvalResult<Value> {
    match expr {
        Expr::Int(n) => Ok(Value::Int(*n)),
        Expr::Float(f) => Ok(Value::Float(*f)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::None => Ok(Value::None),
        Expr::Name(name) => scope
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::undefined(name)),
        Expr::List(items) => Ok(Value::List(eval_all(items, scope)?)),
        Expr::Tuple(items) => Ok(Value::Tuple(eval_all(items, scope)?)),
        Expr::Dict(pairs) => {
            let mut entries: Vec<(Value, Value)> = Vec::with_capacity(pairs.len());
            for (key, value) in pairs {
                let key = eval_expr(key, scope)?;
                let value = eval_expr(value, scope)?;
                if !key.is_hashable() {
                    return Err(EvalError::Type(format!(
                        "unhashable type: '{}'",
                        key.type_name()
                    )));
                }
                match entries.iter_mut().find(|(k, _)| k.py_eq(&key)) {
                    Some(entry) => entry.1 = value,
                    None => entries.push((key, value)),
                }
            }
            Ok(Value::Dict(entries))
        }
        Expr::Unary { op, operand } => {
            let operand = eval_expr(operand, scope)?;
            unary_op(*op, &operand)
        }
        Expr::Binary { op, left, right } => {
            let left = eval_expr(left, scope)?;
            let right = eval_expr(right, scope)?;
            binary_op(*op, &left, &right)
        }
        Expr::Logical { op, left, right } => {
            let left = eval_expr(left, scope)?;
            let short_circuits = match op {
                LogicalOperator::And => !left.is_truthy(),
                LogicalOperator::Or => left.is_truthy(),
            };
            if short_circuits {
                Ok(left)
            } else {
                eval_expr(right, scope)
            }
        }
        Expr::Compare { left, comparisons } => {
            let mut current = eval_expr(left, scope)?;
            for (op, right) in comparisons {
                let right = eval_expr(right, scope)?;
                if !compare(*op, &current, &right)? {
                    return Ok(Value::Bool(false));
                }
                current = right;
            }
            Ok(Value::Bool(true))
        }
        Expr::Conditional { body, test, orelse } => {
            if eval_expr(test, scope)?.is_truthy() {
                eval_expr(body, scope)
            } else {
                eval_expr(orelse, scope)
            }
        }
        Expr::Call { function, args } => {
            if let Some(bound) = scope.get(function) {
                return Err(EvalError::Type(format!(
                    "'{}' object is not callable",
                    bound.type_name()
                )));
            }
            if !is_builtin(function) {
                return Err(EvalError::undefined(function));
            }
            let args = eval_all(args, scope)?;
            call_builtin(function, args)
        }
        Expr::MethodCall {
            receiver,
            method,
            args,
        } => match receiver.as_ref() {
            Expr::Name(name) if MUTATING_METHODS.contains(&method.as_str()) => {
                if scope.get(name).is_none() {
                    return Err(EvalError::undefined(name));
                }
                let args = eval_all(args, scope)?;
                let target = scope
                    .get_mut(name)
                    .ok_or_else(|| EvalError::undefined(name))?;
                call_method(target, method, args)
            }
            receiver => {
                let mut value = eval_expr(receiver, scope)?;
                let args = eval_all(args, scope)?;
                call_method(&mut value, method, args)
            }
        },
        Expr::Attribute { value, name } => {
            let value = eval_expr(value, scope)?;
            Err(EvalError::Attribute(format!(
                "'{}' object has no attribute '{}'",
                value.type_name(),
                name
            )))
        }
        Expr::Subscript { value, index } => {
            let value = eval_expr(value, scope)?;
            let index = eval_expr(index, scope)?;
            subscript(&value, &index)
        }
    }
}

fn eval_all(exprs: &[Expr], scope: &mut Scope) -> EvalResult<Vec<Value>> {
    exprs.iter().map(|expr| eval_expr(expr, scope)).collect()
}

fn compare(op: CompareOperator, left: &Value, right: &Value) -> EvalResult<bool> {
    let ordered = |symbol: &str, accept: fn(Ordering) -> bool| -> EvalResult<bool> {
        // NaN is unordered against everything
        if let (Some(a), Some(b)) = (left.as_float(), right.as_float()) {
            if a.is_nan() || b.is_nan() {
                return Ok(false);
            }
        }
        Ok(accept(left.py_cmp(right, symbol)?))
    };

    match op {
        CompareOperator::Equal => Ok(left.py_eq(right)),
        CompareOperator::NotEqual => Ok(!left.py_eq(right)),
        CompareOperator::Less => ordered("<", Ordering::is_lt),
        CompareOperator::LessEqual => ordered("<=", Ordering::is_le),
        CompareOperator::Greater => ordered(">", Ordering::is_gt),
        CompareOperator::GreaterEqual => ordered(">=", Ordering::is_ge),
        CompareOperator::In => contains(right, left),
        CompareOperator::NotIn => contains(right, left).map(|found| !found),
        CompareOperator::Is => Ok(identical(left, right)),
        CompareOperator::IsNot => Ok(!identical(left, right)),
    }
}

/// Values have no identity here; `is` holds for equal values of one type
fn identical(left: &Value, right: &Value) -> bool {
    left.type_name() == right.type_name() && left.py_eq(right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use interspy_parser::parse_line;

    fn run(bindings: &mut Bindings, line: &str) -> EvalResult<()> {
        let stmt = parse_line(line).expect("line should parse");
        let writes = {
            let mut scope = Scope::new(bindings);
            exec_stmt(&stmt, &mut scope)?;
            scope.into_writes()
        };
        writes.commit(bindings);
        Ok(())
    }

    fn eval(bindings: &Bindings, source: &str) -> EvalResult<Value> {
        match parse_line(source).expect("expression should parse") {
            Stmt::Expr(expr) => eval_expr(&expr, &mut Scope::new(bindings)),
            other => panic!("not an expression: {:?}", other),
        }
    }

    #[test]
    fn test_assignment_binds_in_order() {
        let mut b = Bindings::new();
        run(&mut b, "z = 1").unwrap();
        run(&mut b, "a = 2").unwrap();
        run(&mut b, "z = 3").unwrap();
        assert_eq!(b.keys().collect::<Vec<_>>(), vec!["z", "a"]);
        assert_eq!(b["z"], Value::Int(3));
    }

    #[test]
    fn test_failed_unpack_leaves_bindings_untouched() {
        let mut b = Bindings::new();
        run(&mut b, "a = 1").unwrap();
        let err = run(&mut b, "a, c = 5, 6, 7").unwrap_err();
        assert_eq!(err.to_string(), "ValueError: too many values to unpack (expected 2)");
        assert_eq!(b.len(), 1);
        assert_eq!(b["a"], Value::Int(1));

        let err = run(&mut b, "a, c, d = 'xy'").unwrap_err();
        assert_eq!(
            err.to_string(),
            "ValueError: not enough values to unpack (expected 3, got 2)"
        );
    }

    #[test]
    fn test_chained_targets_all_bound() {
        let mut b = Bindings::new();
        run(&mut b, "x = (p, q) = 1, 2").unwrap();
        assert_eq!(b["x"], Value::Tuple(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(b["q"], Value::Int(2));
    }

    #[test]
    fn test_augmented_assignment_requires_binding() {
        let mut b = Bindings::new();
        assert_eq!(run(&mut b, "n += 1").unwrap_err(), EvalError::undefined("n"));
        run(&mut b, "n = 1").unwrap();
        run(&mut b, "n *= 10").unwrap();
        assert_eq!(b["n"], Value::Int(10));
    }

    #[test]
    fn test_del_removes_and_keeps_order() {
        let mut b = Bindings::new();
        for line in ["a = 1", "b = 2", "c = 3", "del b"] {
            run(&mut b, line).unwrap();
        }
        assert_eq!(b.keys().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(run(&mut b, "del b").unwrap_err().kind(), "NameError");
    }

    #[test]
    fn test_del_then_rebind_in_one_scope() {
        let mut b = Bindings::new();
        run(&mut b, "a = 1").unwrap();
        run(&mut b, "del a, a").unwrap_err();
        assert_eq!(b["a"], Value::Int(1));
    }

    #[test]
    fn test_mutating_method_updates_binding() {
        let mut b = Bindings::new();
        run(&mut b, "xs = [1]").unwrap();
        run(&mut b, "xs.append(xs.pop() + 1)").unwrap();
        assert_eq!(b["xs"], Value::List(vec![Value::Int(2)]));
    }

    #[test]
    fn test_logical_operators_return_operands() {
        let b = Bindings::new();
        assert_eq!(eval(&b, "0 or 'x'").unwrap(), Value::Str("x".to_string()));
        assert_eq!(eval(&b, "[] and 1/0").unwrap(), Value::List(vec![]));
    }

    #[test]
    fn test_chained_comparison_short_circuits() {
        let b = Bindings::new();
        assert_eq!(eval(&b, "1 < 2 < 3").unwrap(), Value::Bool(true));
        assert_eq!(eval(&b, "3 < 2 < 1/0").unwrap(), Value::Bool(false));
        assert_eq!(eval(&b, "1 < 'a'").unwrap_err().kind(), "TypeError");
    }

    #[test]
    fn test_nan_comparisons_are_false() {
        let b = Bindings::new();
        assert_eq!(eval(&b, "float('nan') <= 1").unwrap(), Value::Bool(false));
        assert_eq!(eval(&b, "float('nan') == float('nan')").unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_is_compares_type_and_value() {
        let b = Bindings::new();
        assert_eq!(eval(&b, "None is None").unwrap(), Value::Bool(true));
        assert_eq!(eval(&b, "1 is True").unwrap(), Value::Bool(false));
        assert_eq!(eval(&b, "1 is not None").unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_calling_a_bound_name() {
        let mut b = Bindings::new();
        run(&mut b, "len = 3").unwrap();
        assert_eq!(
            eval(&b, "len('abc')").unwrap_err().to_string(),
            "TypeError: 'int' object is not callable"
        );
        assert_eq!(eval(&Bindings::new(), "nope(1)").unwrap_err().kind(), "NameError");
    }

    #[test]
    fn test_dict_literal_last_value_wins() {
        let b = Bindings::new();
        assert_eq!(eval(&b, "{'a': 1, 'b': 2, 'a': 3}").unwrap().to_string(), "{'a': 3, 'b': 2}");
        assert_eq!(eval(&b, "{[1]: 2}").unwrap_err().kind(), "TypeError");
    }

    #[test]
    fn test_attribute_access_is_an_error() {
        let b = Bindings::new();
        assert_eq!(eval(&b, "(1).real").unwrap_err().kind(), "AttributeError");
    }
}
