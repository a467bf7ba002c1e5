//! Runtime values of the script language and their Python-compatible
//! formatting, equality and ordering.

use crate::error::{EvalError, EvalResult};
use std::cmp::Ordering;
use std::fmt;

/// Largest sequence the sandbox will materialize (`'a' * n`, `list(range(n))`)
pub const MAX_SEQUENCE_LEN: usize = 10_000_000;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Insertion ordered key/value pairs
    Dict(Vec<(Value, Value)>),
    Range { start: i64, stop: i64, step: i64 },
}

impl Value {
    /// Python type name, as shown after `::` in annotations
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Range { .. } => "range",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) | Value::Tuple(items) => !items.is_empty(),
            Value::Dict(entries) => !entries.is_empty(),
            Value::Range { .. } => self.range_len() > 0,
        }
    }

    /// `repr()` of the value
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => quote(s),
            other => other.to_string(),
        }
    }

    /// Integer view of ints and bools
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    /// Float view of any number
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            other => other.as_int().map(|n| n as f64),
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Bool(_) | Value::Float(_))
    }

    pub fn is_hashable(&self) -> bool {
        match self {
            Value::List(_) | Value::Dict(_) => false,
            Value::Tuple(items) => items.iter().all(Value::is_hashable),
            _ => true,
        }
    }

    fn range_len(&self) -> usize {
        match self {
            Value::Range { start, stop, step } => range_len(*start, *stop, *step),
            _ => 0,
        }
    }

    /// Number of items for sized values
    pub fn len(&self) -> EvalResult<usize> {
        match self {
            Value::Str(s) => Ok(s.chars().count()),
            Value::List(items) | Value::Tuple(items) => Ok(items.len()),
            Value::Dict(entries) => Ok(entries.len()),
            Value::Range { .. } => Ok(self.range_len()),
            other => Err(EvalError::Type(format!(
                "object of type '{}' has no len()",
                other.type_name()
            ))),
        }
    }

    /// Materialize the items produced by iterating the value
    pub fn iterate(&self) -> EvalResult<Vec<Value>> {
        match self {
            Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
            Value::List(items) | Value::Tuple(items) => Ok(items.clone()),
            Value::Dict(entries) => Ok(entries.iter().map(|(k, _)| k.clone()).collect()),
            Value::Range { start, step, .. } => {
                let len = self.range_len();
                if len > MAX_SEQUENCE_LEN {
                    return Err(EvalError::Overflow("range is too large to materialize".to_string()));
                }
                (0..len)
                    .map(|position| range_item(*start, *step, position).map(Value::Int))
                    .collect()
            }
            other => Err(EvalError::Type(format!(
                "'{}' object is not iterable",
                other.type_name()
            ))),
        }
    }

    /// Python `==`
    pub fn py_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.py_eq(y))
            }
            (Value::Dict(a), Value::Dict(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        b.iter().any(|(k2, v2)| k.py_eq(k2) && v.py_eq(v2))
                    })
            }
            (Value::Range { .. }, Value::Range { .. }) => {
                // equal when they produce the same sequence
                self.iterate().ok() == other.iterate().ok()
            }
            (a, b) if a.is_number() && b.is_number() => match (a.as_int(), b.as_int()) {
                (Some(x), Some(y)) => x == y,
                _ => a.as_float() == b.as_float(),
            },
            _ => false,
        }
    }

    /// Python ordering for `<`, `min`, `sorted`, ...
    pub fn py_cmp(&self, other: &Value, op: &str) -> EvalResult<Ordering> {
        match (self, other) {
            (a, b) if a.is_number() && b.is_number() => match (a.as_int(), b.as_int()) {
                (Some(x), Some(y)) => Ok(x.cmp(&y)),
                _ => {
                    let (x, y) = (a.as_float().unwrap_or(f64::NAN), b.as_float().unwrap_or(f64::NAN));
                    // NaN compares false both ways; report it as equal so chains stay false
                    Ok(x.partial_cmp(&y).unwrap_or(Ordering::Equal))
                }
            },
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                for (x, y) in a.iter().zip(b) {
                    if !x.py_eq(y) {
                        return x.py_cmp(y, op);
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
            (a, b) => Err(EvalError::Type(format!(
                "'{}' not supported between instances of '{}' and '{}'",
                op,
                a.type_name(),
                b.type_name()
            ))),
        }
    }
}

/// `str()` of the value
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", format_float(*x)),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => write!(f, "[{}]", join_repr(items)),
            Value::Tuple(items) if items.len() == 1 => write!(f, "({},)", items[0].repr()),
            Value::Tuple(items) => write!(f, "({})", join_repr(items)),
            Value::Dict(entries) => {
                let body: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.repr(), v.repr()))
                    .collect();
                write!(f, "{{{}}}", body.join(", "))
            }
            Value::Range { start, stop, step: 1 } => write!(f, "range({}, {})", start, stop),
            Value::Range { start, stop, step } => write!(f, "range({}, {}, {})", start, stop, step),
        }
    }
}

pub(crate) fn range_len(start: i64, stop: i64, step: i64) -> usize {
    let (lo, hi, step) = if step > 0 {
        (start as i128, stop as i128, step as i128)
    } else {
        (stop as i128, start as i128, -(step as i128))
    };
    if hi <= lo || step == 0 {
        return 0;
    }
    let len = (hi - lo + step - 1) / step;
    usize::try_from(len).unwrap_or(usize::MAX)
}

/// Item `position` of a range; the caller checks `position` against its length
pub(crate) fn range_item(start: i64, step: i64, position: usize) -> EvalResult<i64> {
    let item = start as i128 + position as i128 * step as i128;
    i64::try_from(item)
        .map_err(|_| EvalError::Overflow("range item is out of integer range".to_string()))
}

fn join_repr(items: &[Value]) -> String {
    items.iter().map(Value::repr).collect::<Vec<_>>().join(", ")
}

/// Float formatting compatible with Python's `repr(float)`
pub fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = x.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let formatted = format!("{:e}", x);
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) => {
                let exponent: i32 = exponent.parse().unwrap_or(0);
                let sign = if exponent < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exponent.abs())
            }
            None => formatted,
        };
    }

    if x == x.trunc() {
        format!("{:.1}", x)
    } else {
        format!("{}", x)
    }
}

/// Python string repr: single quotes unless the text only contains single quotes
fn quote(s: &str) -> String {
    let delimiter = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(delimiter);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == delimiter => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delimiter);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::Str(text.to_string())
    }

    #[test]
    fn test_str_formatting_matches_python() {
        assert_eq!(Value::Int(2).to_string(), "2");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Float(0.5).to_string(), "0.5");
        assert_eq!(Value::Float(-0.0).to_string(), "-0.0");
        assert_eq!(Value::Float(1e20).to_string(), "1e+20");
        assert_eq!(Value::Float(1.5e-7).to_string(), "1.5e-07");
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::None.to_string(), "None");
        assert_eq!(s("hi").to_string(), "hi");
    }

    #[test]
    fn test_container_formatting_uses_repr() {
        assert_eq!(Value::List(vec![Value::Int(1), s("a")]).to_string(), "[1, 'a']");
        assert_eq!(Value::Tuple(vec![Value::Int(1)]).to_string(), "(1,)");
        assert_eq!(Value::Tuple(vec![]).to_string(), "()");
        assert_eq!(
            Value::Dict(vec![(s("k"), Value::Float(1.0))]).to_string(),
            "{'k': 1.0}"
        );
        assert_eq!(Value::Range { start: 0, stop: 3, step: 1 }.to_string(), "range(0, 3)");
    }

    #[test]
    fn test_repr_quote_choice() {
        assert_eq!(s("it's").repr(), "\"it's\"");
        assert_eq!(s("a\nb").repr(), "'a\\nb'");
        assert_eq!(s(r#"say "hi" it's"#).repr(), r#"'say "hi" it\'s'"#);
    }

    #[test]
    fn test_numeric_equality_crosses_types() {
        assert!(Value::Int(1).py_eq(&Value::Float(1.0)));
        assert!(Value::Bool(true).py_eq(&Value::Int(1)));
        assert!(!Value::Int(1).py_eq(&s("1")));
        assert!(!Value::List(vec![]).py_eq(&Value::Tuple(vec![])));
    }

    #[test]
    fn test_ordering_errors_across_types() {
        let err = Value::Int(1).py_cmp(&s("a"), "<").unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: '<' not supported between instances of 'int' and 'str'"
        );
    }

    #[test]
    fn test_range_iteration_and_len() {
        let r = Value::Range { start: 10, stop: 0, step: -3 };
        assert_eq!(r.len().unwrap(), 4);
        assert_eq!(
            r.iterate().unwrap(),
            vec![Value::Int(10), Value::Int(7), Value::Int(4), Value::Int(1)]
        );
        assert!(!Value::Range { start: 3, stop: 3, step: 1 }.is_truthy());
    }

    #[test]
    fn test_wide_range_iterates_without_overflow() {
        let r = Value::Range { start: i64::MIN, stop: i64::MAX, step: 1 << 62 };
        assert_eq!(r.len().unwrap(), 4);
        assert_eq!(
            r.iterate().unwrap(),
            vec![
                Value::Int(i64::MIN),
                Value::Int(-(1 << 62)),
                Value::Int(0),
                Value::Int(1 << 62),
            ]
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Int(0).is_truthy());
        assert!(!s("").is_truthy());
        assert!(Value::List(vec![Value::None]).is_truthy());
        assert!(!Value::None.is_truthy());
    }
}
