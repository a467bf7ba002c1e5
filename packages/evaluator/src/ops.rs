//! Operator semantics: arithmetic, membership and subscripting.

use crate::error::{EvalError, EvalResult};
use crate::value::{range_item, range_len, Value, MAX_SEQUENCE_LEN};
use interspy_parser::ast::{BinaryOperator, UnaryOperator};

pub fn binary_op(op: BinaryOperator, left: &Value, right: &Value) -> EvalResult<Value> {
    if left.is_number() && right.is_number() {
        return match (left.as_int(), right.as_int()) {
            (Some(a), Some(b)) => int_op(op, a, b),
            _ => float_op(op, left.as_float().unwrap_or(0.0), right.as_float().unwrap_or(0.0)),
        };
    }

    match (op, left, right) {
        (BinaryOperator::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
        (BinaryOperator::Add, Value::List(a), Value::List(b)) => {
            Ok(Value::List(a.iter().chain(b).cloned().collect()))
        }
        (BinaryOperator::Add, Value::Tuple(a), Value::Tuple(b)) => {
            Ok(Value::Tuple(a.iter().chain(b).cloned().collect()))
        }
        (BinaryOperator::Multiply, seq, count) | (BinaryOperator::Multiply, count, seq)
            if is_sequence(seq) && count.as_int().is_some() =>
        {
            repeat(seq, count.as_int().unwrap_or(0))
        }
        (BinaryOperator::Modulo, Value::Str(_), _) => Err(EvalError::Type(
            "printf-style string formatting is not supported".to_string(),
        )),
        _ => Err(unsupported(op.symbol(), left, right)),
    }
}

fn int_op(op: BinaryOperator, a: i64, b: i64) -> EvalResult<Value> {
    let result = match op {
        BinaryOperator::Add => a.checked_add(b),
        BinaryOperator::Subtract => a.checked_sub(b),
        BinaryOperator::Multiply => a.checked_mul(b),
        BinaryOperator::Divide => {
            if b == 0 {
                return Err(EvalError::ZeroDivision("division by zero".to_string()));
            }
            return Ok(Value::Float(a as f64 / b as f64));
        }
        BinaryOperator::FloorDivide => {
            if b == 0 {
                return Err(EvalError::ZeroDivision(
                    "integer division or modulo by zero".to_string(),
                ));
            }
            a.checked_div(b).map(|q| {
                if (a % b != 0) && ((a < 0) != (b < 0)) {
                    q - 1
                } else {
                    q
                }
            })
        }
        BinaryOperator::Modulo => {
            if b == 0 {
                return Err(EvalError::ZeroDivision(
                    "integer division or modulo by zero".to_string(),
                ));
            }
            a.checked_rem(b).map(|r| if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r })
        }
        BinaryOperator::Power => {
            if b < 0 {
                if a == 0 {
                    return Err(EvalError::ZeroDivision(
                        "0.0 cannot be raised to a negative power".to_string(),
                    ));
                }
                return Ok(Value::Float((a as f64).powf(b as f64)));
            }
            u32::try_from(b).ok().and_then(|exp| a.checked_pow(exp))
        }
    };
    result.map(Value::Int).ok_or_else(EvalError::overflow)
}

fn float_op(op: BinaryOperator, a: f64, b: f64) -> EvalResult<Value> {
    let result = match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Subtract => a - b,
        BinaryOperator::Multiply => a * b,
        BinaryOperator::Divide => {
            if b == 0.0 {
                return Err(EvalError::ZeroDivision("float division by zero".to_string()));
            }
            a / b
        }
        BinaryOperator::FloorDivide => {
            if b == 0.0 {
                return Err(EvalError::ZeroDivision("float floor division by zero".to_string()));
            }
            (a / b).floor()
        }
        BinaryOperator::Modulo => {
            if b == 0.0 {
                return Err(EvalError::ZeroDivision("float modulo".to_string()));
            }
            let r = a % b;
            if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                r + b
            } else {
                r
            }
        }
        BinaryOperator::Power => {
            if a == 0.0 && b < 0.0 {
                return Err(EvalError::ZeroDivision(
                    "0.0 cannot be raised to a negative power".to_string(),
                ));
            }
            a.powf(b)
        }
    };
    Ok(Value::Float(result))
}

fn is_sequence(value: &Value) -> bool {
    matches!(value, Value::Str(_) | Value::List(_) | Value::Tuple(_))
}

fn repeat(seq: &Value, count: i64) -> EvalResult<Value> {
    let count = usize::try_from(count).unwrap_or(0);
    let item_len = seq.len()?;
    if item_len.saturating_mul(count) > MAX_SEQUENCE_LEN {
        return Err(EvalError::Overflow("repeated sequence is too long".to_string()));
    }
    Ok(match seq {
        Value::Str(s) => Value::Str(s.repeat(count)),
        Value::List(items) => Value::List(repeat_items(items, count)),
        Value::Tuple(items) => Value::Tuple(repeat_items(items, count)),
        other => other.clone(),
    })
}

fn repeat_items(items: &[Value], count: usize) -> Vec<Value> {
    let mut out = Vec::with_capacity(items.len() * count);
    for _ in 0..count {
        out.extend(items.iter().cloned());
    }
    out
}

fn unsupported(symbol: &str, left: &Value, right: &Value) -> EvalError {
    EvalError::Type(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        symbol,
        left.type_name(),
        right.type_name()
    ))
}

pub fn unary_op(op: UnaryOperator, operand: &Value) -> EvalResult<Value> {
    match op {
        UnaryOperator::Not => Ok(Value::Bool(!operand.is_truthy())),
        UnaryOperator::Negate => match operand {
            Value::Float(f) => Ok(Value::Float(-f)),
            other => match other.as_int() {
                Some(n) => n.checked_neg().map(Value::Int).ok_or_else(EvalError::overflow),
                None => Err(bad_unary("-", other)),
            },
        },
        UnaryOperator::Plus => match operand {
            Value::Float(f) => Ok(Value::Float(*f)),
            other => other.as_int().map(Value::Int).ok_or_else(|| bad_unary("+", other)),
        },
    }
}

fn bad_unary(symbol: &str, operand: &Value) -> EvalError {
    EvalError::Type(format!(
        "bad operand type for unary {}: '{}'",
        symbol,
        operand.type_name()
    ))
}

/// `item in container`
pub fn contains(container: &Value, item: &Value) -> EvalResult<bool> {
    match container {
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(needle.as_str())),
            other => Err(EvalError::Type(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::List(items) | Value::Tuple(items) => Ok(items.iter().any(|v| v.py_eq(item))),
        Value::Dict(entries) => Ok(entries.iter().any(|(k, _)| k.py_eq(item))),
        Value::Range { start, stop, step } => Ok(match item.as_int() {
            Some(n) => {
                let in_bounds = if *step > 0 {
                    *start <= n && n < *stop
                } else {
                    *stop < n && n <= *start
                };
                in_bounds && (n as i128 - *start as i128) % (*step as i128) == 0
            }
            None => false,
        }),
        other => Err(EvalError::Type(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

/// `value[index]`
pub fn subscript(value: &Value, index: &Value) -> EvalResult<Value> {
    match value {
        Value::List(items) | Value::Tuple(items) => {
            let position = sequence_index(index, items.len(), value.type_name())?;
            Ok(items[position].clone())
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let position = sequence_index(index, chars.len(), "string")?;
            Ok(Value::Str(chars[position].to_string()))
        }
        Value::Range { start, stop, step } => {
            let position = sequence_index(index, range_len(*start, *stop, *step), "range object")?;
            Ok(Value::Int(range_item(*start, *step, position)?))
        }
        Value::Dict(entries) => {
            if !index.is_hashable() {
                return Err(EvalError::Type(format!("unhashable type: '{}'", index.type_name())));
            }
            entries
                .iter()
                .find(|(k, _)| k.py_eq(index))
                .map(|(_, v)| v.clone())
                .ok_or_else(|| EvalError::Key(index.repr()))
        }
        other => Err(EvalError::Type(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// Resolve a possibly negative index against a sequence length
pub fn sequence_index(index: &Value, len: usize, what: &str) -> EvalResult<usize> {
    let raw = index.as_int().ok_or_else(|| {
        EvalError::Type(format!(
            "{} indices must be integers, not {}",
            what,
            index.type_name()
        ))
    })?;
    // ranges can be longer than i64::MAX
    let len = len as i128;
    let resolved = if raw < 0 { raw as i128 + len } else { raw as i128 };
    if resolved < 0 || resolved >= len {
        return Err(EvalError::Index(format!("{} index out of range", what)));
    }
    Ok(resolved as usize)
}
