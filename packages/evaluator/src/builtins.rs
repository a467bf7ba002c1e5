//! Builtin functions and methods available to script lines.
//!
//! Nothing here touches the outside world: `print` is accepted and
//! discarded so scripts that print still evaluate.

use crate::error::{EvalError, EvalResult};
use crate::ops::{binary_op, sequence_index};
use crate::value::{Value, MAX_SEQUENCE_LEN};
use interspy_parser::ast::BinaryOperator;
use std::cmp::Ordering;

pub const BUILTINS: &[&str] = &[
    "abs", "bool", "float", "int", "len", "list", "max", "min", "print", "range", "repr", "round",
    "sorted", "str", "sum", "tuple",
];

/// Methods that change their receiver in place
pub const MUTATING_METHODS: &[&str] = &["append", "pop"];

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

pub fn call_builtin(name: &str, args: Vec<Value>) -> EvalResult<Value> {
    match name {
        "abs" => {
            let [x] = exact::<1>(name, args)?;
            match x {
                Value::Float(f) => Ok(Value::Float(f.abs())),
                other => match other.as_int() {
                    Some(n) => n.checked_abs().map(Value::Int).ok_or_else(EvalError::overflow),
                    None => Err(EvalError::Type(format!(
                        "bad operand type for abs(): '{}'",
                        other.type_name()
                    ))),
                },
            }
        }
        "bool" => {
            let x = optional(name, args)?;
            Ok(Value::Bool(x.map(|v| v.is_truthy()).unwrap_or(false)))
        }
        "float" => match optional(name, args)? {
            None => Ok(Value::Float(0.0)),
            Some(Value::Str(s)) => parse_float(&s),
            Some(other) => other.as_float().map(Value::Float).ok_or_else(|| {
                EvalError::Type(format!(
                    "float() argument must be a string or a real number, not '{}'",
                    other.type_name()
                ))
            }),
        },
        "int" => match optional(name, args)? {
            None => Ok(Value::Int(0)),
            Some(Value::Str(s)) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
                EvalError::Value(format!("invalid literal for int() with base 10: {}", Value::Str(s.clone()).repr()))
            }),
            Some(Value::Float(f)) => float_to_int(f),
            Some(other) => other.as_int().map(Value::Int).ok_or_else(|| {
                EvalError::Type(format!(
                    "int() argument must be a string or a real number, not '{}'",
                    other.type_name()
                ))
            }),
        },
        "len" => {
            let [x] = exact::<1>(name, args)?;
            let len = i64::try_from(x.len()?).map_err(|_| {
                EvalError::Overflow("Python int too large to convert to C ssize_t".to_string())
            })?;
            Ok(Value::Int(len))
        }
        "list" => Ok(Value::List(optional_iterable(name, args)?)),
        "tuple" => Ok(Value::Tuple(optional_iterable(name, args)?)),
        "max" => extreme(name, args, Ordering::Greater),
        "min" => extreme(name, args, Ordering::Less),
        "print" => Ok(Value::None),
        "range" => range(args),
        "repr" => {
            let [x] = exact::<1>(name, args)?;
            Ok(Value::Str(x.repr()))
        }
        "round" => round(args),
        "sorted" => {
            let [x] = exact::<1>(name, args)?;
            Ok(Value::List(sort_values(x.iterate()?)?))
        }
        "str" => Ok(Value::Str(
            optional(name, args)?.map(|v| v.to_string()).unwrap_or_default(),
        )),
        "sum" => {
            if args.is_empty() || args.len() > 2 {
                return Err(arity(name, "1 or 2", args.len()));
            }
            let mut args = args.into_iter();
            let items = args.next().map(|v| v.iterate()).transpose()?.unwrap_or_default();
            let mut total = args.next().unwrap_or(Value::Int(0));
            if matches!(total, Value::Str(_)) {
                return Err(EvalError::Type(
                    "sum() can't sum strings [use ''.join(seq) instead]".to_string(),
                ));
            }
            for item in &items {
                total = binary_op(BinaryOperator::Add, &total, item)?;
            }
            Ok(total)
        }
        other => Err(EvalError::undefined(other)),
    }
}

/// Call `receiver.method(args)`; mutating methods change `receiver`.
pub fn call_method(receiver: &mut Value, method: &str, args: Vec<Value>) -> EvalResult<Value> {
    match receiver {
        Value::Str(s) => str_method(s, method, args),
        Value::List(items) => list_method(items, method, args),
        Value::Dict(entries) => dict_method(entries, method, args),
        other => Err(no_attribute(other, method)),
    }
}

fn str_method(s: &str, method: &str, args: Vec<Value>) -> EvalResult<Value> {
    let text = |v: Value| match v {
        Value::Str(s) => Ok(s),
        other => Err(EvalError::Type(format!(
            "must be str, not {}",
            other.type_name()
        ))),
    };

    match method {
        "upper" => {
            exact::<0>(method, args)?;
            Ok(Value::Str(s.to_uppercase()))
        }
        "lower" => {
            exact::<0>(method, args)?;
            Ok(Value::Str(s.to_lowercase()))
        }
        "strip" => {
            exact::<0>(method, args)?;
            Ok(Value::Str(s.trim().to_string()))
        }
        "split" => {
            let parts: Vec<Value> = match optional(method, args)? {
                None => s.split_whitespace().map(|p| Value::Str(p.to_string())).collect(),
                Some(sep) => {
                    let sep = text(sep)?;
                    if sep.is_empty() {
                        return Err(EvalError::Value("empty separator".to_string()));
                    }
                    s.split(sep.as_str()).map(|p| Value::Str(p.to_string())).collect()
                }
            };
            Ok(Value::List(parts))
        }
        "replace" => {
            let [old, new] = exact::<2>(method, args)?;
            Ok(Value::Str(s.replace(text(old)?.as_str(), &text(new)?)))
        }
        "startswith" => {
            let [prefix] = exact::<1>(method, args)?;
            Ok(Value::Bool(s.starts_with(text(prefix)?.as_str())))
        }
        "endswith" => {
            let [suffix] = exact::<1>(method, args)?;
            Ok(Value::Bool(s.ends_with(text(suffix)?.as_str())))
        }
        "join" => {
            let [items] = exact::<1>(method, args)?;
            let parts = items
                .iterate()?
                .into_iter()
                .map(|item| match item {
                    Value::Str(part) => Ok(part),
                    other => Err(EvalError::Type(format!(
                        "sequence item: expected str instance, {} found",
                        other.type_name()
                    ))),
                })
                .collect::<EvalResult<Vec<_>>>()?;
            Ok(Value::Str(parts.join(s)))
        }
        _ => Err(no_attribute(&Value::Str(String::new()), method)),
    }
}

fn list_method(items: &mut Vec<Value>, method: &str, args: Vec<Value>) -> EvalResult<Value> {
    match method {
        "append" => {
            let [item] = exact::<1>(method, args)?;
            if items.len() >= MAX_SEQUENCE_LEN {
                return Err(EvalError::Overflow("list is too long".to_string()));
            }
            items.push(item);
            Ok(Value::None)
        }
        "pop" => {
            if items.is_empty() {
                return Err(EvalError::Index("pop from empty list".to_string()));
            }
            let position = match optional(method, args)? {
                Some(index) => sequence_index(&index, items.len(), "pop")?,
                None => items.len() - 1,
            };
            Ok(items.remove(position))
        }
        "index" => {
            let [needle] = exact::<1>(method, args)?;
            items
                .iter()
                .position(|v| v.py_eq(&needle))
                .map(|i| Value::Int(i as i64))
                .ok_or_else(|| EvalError::Value(format!("{} is not in list", needle.repr())))
        }
        "count" => {
            let [needle] = exact::<1>(method, args)?;
            Ok(Value::Int(items.iter().filter(|v| v.py_eq(&needle)).count() as i64))
        }
        _ => Err(no_attribute(&Value::List(Vec::new()), method)),
    }
}

fn dict_method(entries: &[(Value, Value)], method: &str, args: Vec<Value>) -> EvalResult<Value> {
    match method {
        "keys" => {
            exact::<0>(method, args)?;
            Ok(Value::List(entries.iter().map(|(k, _)| k.clone()).collect()))
        }
        "values" => {
            exact::<0>(method, args)?;
            Ok(Value::List(entries.iter().map(|(_, v)| v.clone()).collect()))
        }
        "items" => {
            exact::<0>(method, args)?;
            Ok(Value::List(
                entries
                    .iter()
                    .map(|(k, v)| Value::Tuple(vec![k.clone(), v.clone()]))
                    .collect(),
            ))
        }
        "get" => {
            if args.is_empty() || args.len() > 2 {
                return Err(arity(method, "1 or 2", args.len()));
            }
            let mut args = args.into_iter();
            let key = args.next().unwrap_or(Value::None);
            let default = args.next().unwrap_or(Value::None);
            Ok(entries
                .iter()
                .find(|(k, _)| k.py_eq(&key))
                .map(|(_, v)| v.clone())
                .unwrap_or(default))
        }
        _ => Err(no_attribute(&Value::Dict(Vec::new()), method)),
    }
}

fn no_attribute(value: &Value, name: &str) -> EvalError {
    EvalError::Attribute(format!(
        "'{}' object has no attribute '{}'",
        value.type_name(),
        name
    ))
}

fn arity(name: &str, expected: &str, got: usize) -> EvalError {
    EvalError::Type(format!(
        "{}() takes {} argument(s) ({} given)",
        name, expected, got
    ))
}

fn exact<const N: usize>(name: &str, args: Vec<Value>) -> EvalResult<[Value; N]> {
    let got = args.len();
    args.try_into()
        .map_err(|_| arity(name, &N.to_string(), got))
}

fn optional(name: &str, args: Vec<Value>) -> EvalResult<Option<Value>> {
    if args.len() > 1 {
        return Err(arity(name, "at most 1", args.len()));
    }
    Ok(args.into_iter().next())
}

fn optional_iterable(name: &str, args: Vec<Value>) -> EvalResult<Vec<Value>> {
    match optional(name, args)? {
        Some(value) => value.iterate(),
        None => Ok(Vec::new()),
    }
}

fn extreme(name: &str, args: Vec<Value>, wanted: Ordering) -> EvalResult<Value> {
    let candidates = match args.len() {
        0 => return Err(arity(name, "at least 1", 0)),
        1 => args.into_iter().next().map(|v| v.iterate()).transpose()?.unwrap_or_default(),
        _ => args,
    };

    let mut best: Option<Value> = None;
    for candidate in candidates {
        best = match best {
            None => Some(candidate),
            Some(current) => {
                let op = if wanted == Ordering::Greater { ">" } else { "<" };
                if candidate.py_cmp(&current, op)? == wanted {
                    Some(candidate)
                } else {
                    Some(current)
                }
            }
        };
    }
    best.ok_or_else(|| EvalError::Value(format!("{}() arg is an empty sequence", name)))
}

fn sort_values(mut items: Vec<Value>) -> EvalResult<Vec<Value>> {
    let mut failure = None;
    items.sort_by(|a, b| match a.py_cmp(b, "<") {
        Ok(ordering) => ordering,
        Err(err) => {
            failure.get_or_insert(err);
            Ordering::Equal
        }
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(items),
    }
}

fn range(args: Vec<Value>) -> EvalResult<Value> {
    let ints = args
        .iter()
        .map(|v| {
            v.as_int().ok_or_else(|| {
                EvalError::Type(format!(
                    "'{}' object cannot be interpreted as an integer",
                    v.type_name()
                ))
            })
        })
        .collect::<EvalResult<Vec<_>>>()?;

    let (start, stop, step) = match ints.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => return Err(arity("range", "1 to 3", ints.len())),
    };
    if step == 0 {
        return Err(EvalError::Value("range() arg 3 must not be zero".to_string()));
    }
    Ok(Value::Range { start, stop, step })
}

fn round(args: Vec<Value>) -> EvalResult<Value> {
    let (number, digits) = match args.len() {
        1 | 2 => {
            let mut args = args.into_iter();
            (args.next().unwrap_or(Value::None), args.next())
        }
        n => return Err(arity("round", "1 or 2", n)),
    };

    if !number.is_number() {
        return Err(EvalError::Type(format!(
            "type {} doesn't define __round__ method",
            number.type_name()
        )));
    }

    match digits {
        None | Some(Value::None) => match number {
            Value::Float(f) => float_to_int(f.round_ties_even()),
            other => Ok(Value::Int(other.as_int().unwrap_or(0))),
        },
        Some(digits) => {
            let digits = digits.as_int().ok_or_else(|| {
                EvalError::Type(format!(
                    "'{}' object cannot be interpreted as an integer",
                    digits.type_name()
                ))
            })?;
            match number {
                Value::Float(f) => {
                    let scale = 10f64.powi(digits.clamp(-308, 308) as i32);
                    Ok(Value::Float((f * scale).round_ties_even() / scale))
                }
                other => Ok(Value::Int(other.as_int().unwrap_or(0))),
            }
        }
    }
}

fn float_to_int(f: f64) -> EvalResult<Value> {
    if f.is_nan() {
        return Err(EvalError::Value("cannot convert float NaN to integer".to_string()));
    }
    if f.is_infinite() || f.trunc() < i64::MIN as f64 || f.trunc() >= i64::MAX as f64 {
        return Err(EvalError::Overflow("cannot convert float to integer".to_string()));
    }
    Ok(Value::Int(f.trunc() as i64))
}

fn parse_float(s: &str) -> EvalResult<Value> {
    let trimmed = s.trim();
    let parsed = match trimmed.to_ascii_lowercase().as_str() {
        "inf" | "+inf" | "infinity" => Some(f64::INFINITY),
        "-inf" | "-infinity" => Some(f64::NEG_INFINITY),
        "nan" | "+nan" | "-nan" => Some(f64::NAN),
        _ => trimmed.parse::<f64>().ok(),
    };
    parsed.map(Value::Float).ok_or_else(|| {
        EvalError::Value(format!(
            "could not convert string to float: {}",
            Value::Str(s.to_string()).repr()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::Str(text.to_string())
    }

    fn ints(values: &[i64]) -> Value {
        Value::List(values.iter().map(|n| Value::Int(*n)).collect())
    }

    #[test]
    fn test_len_and_str() {
        assert_eq!(call_builtin("len", vec![s("héllo")]).unwrap(), Value::Int(5));
        assert_eq!(call_builtin("str", vec![Value::Float(2.0)]).unwrap(), s("2.0"));
        assert_eq!(call_builtin("len", vec![Value::Int(3)]).unwrap_err().kind(), "TypeError");
    }

    #[test]
    fn test_len_of_huge_range_overflows() {
        let huge = Value::Range {
            start: -9_000_000_000_000_000_000,
            stop: 9_000_000_000_000_000_000,
            step: 1,
        };
        assert_eq!(call_builtin("len", vec![huge]).unwrap_err().kind(), "OverflowError");

        let fits = Value::Range { start: 0, stop: i64::MAX, step: 1 };
        assert_eq!(call_builtin("len", vec![fits]).unwrap(), Value::Int(i64::MAX));
    }

    #[test]
    fn test_int_conversion() {
        assert_eq!(call_builtin("int", vec![s(" 42 ")]).unwrap(), Value::Int(42));
        assert_eq!(call_builtin("int", vec![Value::Float(-2.7)]).unwrap(), Value::Int(-2));
        assert_eq!(
            call_builtin("int", vec![s("x")]).unwrap_err().to_string(),
            "ValueError: invalid literal for int() with base 10: 'x'"
        );
    }

    #[test]
    fn test_min_max_forms() {
        assert_eq!(call_builtin("max", vec![ints(&[3, 9, 2])]).unwrap(), Value::Int(9));
        assert_eq!(
            call_builtin("min", vec![Value::Int(4), Value::Float(1.5)]).unwrap(),
            Value::Float(1.5)
        );
        assert_eq!(call_builtin("max", vec![ints(&[])]).unwrap_err().kind(), "ValueError");
    }

    #[test]
    fn test_sum_and_sorted() {
        assert_eq!(call_builtin("sum", vec![ints(&[1, 2, 3])]).unwrap(), Value::Int(6));
        assert_eq!(call_builtin("sorted", vec![ints(&[3, 1, 2])]).unwrap(), ints(&[1, 2, 3]));
        let mixed = Value::List(vec![Value::Int(1), s("a")]);
        assert_eq!(call_builtin("sorted", vec![mixed]).unwrap_err().kind(), "TypeError");
    }

    #[test]
    fn test_range_is_lazy() {
        let r = call_builtin("range", vec![Value::Int(1_000_000_000_000)]).unwrap();
        assert_eq!(r.to_string(), "range(0, 1000000000000)");
        assert_eq!(call_builtin("list", vec![r]).unwrap_err().kind(), "OverflowError");
    }

    #[test]
    fn test_round_uses_bankers_rounding() {
        assert_eq!(call_builtin("round", vec![Value::Float(2.5)]).unwrap(), Value::Int(2));
        assert_eq!(call_builtin("round", vec![Value::Float(3.5)]).unwrap(), Value::Int(4));
        assert_eq!(
            call_builtin("round", vec![Value::Float(1.25), Value::Int(1)]).unwrap(),
            Value::Float(1.2)
        );
    }

    #[test]
    fn test_print_is_silent() {
        assert_eq!(call_builtin("print", vec![s("hello")]).unwrap(), Value::None);
    }

    #[test]
    fn test_list_methods_mutate() {
        let mut list = ints(&[1, 2]);
        assert_eq!(call_method(&mut list, "append", vec![Value::Int(3)]).unwrap(), Value::None);
        assert_eq!(list, ints(&[1, 2, 3]));
        assert_eq!(call_method(&mut list, "pop", vec![]).unwrap(), Value::Int(3));
        assert_eq!(call_method(&mut list, "index", vec![Value::Int(2)]).unwrap(), Value::Int(1));
    }

    #[test]
    fn test_str_methods() {
        let mut text = s("a,b,c");
        assert_eq!(
            call_method(&mut text, "split", vec![s(",")]).unwrap(),
            Value::List(vec![s("a"), s("b"), s("c")])
        );
        let mut sep = s("-");
        assert_eq!(
            call_method(&mut sep, "join", vec![Value::List(vec![s("x"), s("y")])]).unwrap(),
            s("x-y")
        );
    }

    #[test]
    fn test_unknown_method_is_attribute_error() {
        let mut n = Value::Int(1);
        assert_eq!(
            call_method(&mut n, "upper", vec![]).unwrap_err().to_string(),
            "AttributeError: 'int' object has no attribute 'upper'"
        );
    }

    #[test]
    fn test_dict_get_with_default() {
        let mut dict = Value::Dict(vec![(s("a"), Value::Int(1))]);
        assert_eq!(call_method(&mut dict, "get", vec![s("z"), Value::Int(0)]).unwrap(), Value::Int(0));
    }
}
