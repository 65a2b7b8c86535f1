use crate::interp::EvalError;
use crate::value::Value;

/// The fixed builtin function set available to UDF bodies. There is no way
/// for a registered UDF to call another UDF or any host function outside
/// this list — the boundary of what a transform can do is this file.
pub fn call(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    match name {
        "to_upper" => {
            let s = str_arg(name, args, 0)?;
            Ok(Value::Str(s.to_uppercase()))
        }
        "to_lower" => {
            let s = str_arg(name, args, 0)?;
            Ok(Value::Str(s.to_lowercase()))
        }
        "trim" => {
            let s = str_arg(name, args, 0)?;
            Ok(Value::Str(s.trim().to_string()))
        }
        "substr" => {
            let s = str_arg(name, args, 0)?;
            let start = int_arg(name, args, 1)?;
            let len = int_arg(name, args, 2)?;
            if start < 0 || len < 0 {
                return Err(EvalError::TypeError(name.to_string(), "start and len must be non-negative".to_string()));
            }
            let chars: Vec<char> = s.chars().collect();
            let start = (start as usize).min(chars.len());
            let end = start.saturating_add(len as usize).min(chars.len());
            Ok(Value::Str(chars[start..end].iter().collect()))
        }
        "index_of" => {
            let haystack = str_arg(name, args, 0)?;
            let needle = str_arg(name, args, 1)?;
            match haystack.find(needle) {
                Some(byte_idx) => Ok(Value::Int(haystack[..byte_idx].chars().count() as i64)),
                None => Ok(Value::Int(-1)),
            }
        }
        "min" => {
            let a = num_arg(name, args, 0)?;
            let b = num_arg(name, args, 1)?;
            if a.as_f64() <= b.as_f64() {
                Ok(a.clone())
            } else {
                Ok(b.clone())
            }
        }
        "max" => {
            let a = num_arg(name, args, 0)?;
            let b = num_arg(name, args, 1)?;
            if a.as_f64() >= b.as_f64() {
                Ok(a.clone())
            } else {
                Ok(b.clone())
            }
        }
        "concat" => {
            let mut out = String::new();
            for (i, a) in args.iter().enumerate() {
                out.push_str(&display(a).map_err(|e| EvalError::TypeError(format!("concat arg {i}"), e))?);
            }
            Ok(Value::Str(out))
        }
        "len" => {
            let s = str_arg(name, args, 0)?;
            Ok(Value::Int(s.chars().count() as i64))
        }
        "contains" => {
            let haystack = str_arg(name, args, 0)?;
            let needle = str_arg(name, args, 1)?;
            Ok(Value::Bool(haystack.contains(needle)))
        }
        "starts_with" => {
            let s = str_arg(name, args, 0)?;
            let prefix = str_arg(name, args, 1)?;
            Ok(Value::Bool(s.starts_with(prefix)))
        }
        "ends_with" => {
            let s = str_arg(name, args, 0)?;
            let suffix = str_arg(name, args, 1)?;
            Ok(Value::Bool(s.ends_with(suffix)))
        }
        "abs" => {
            let v = num_arg(name, args, 0)?;
            match v {
                Value::Int(i) => Ok(Value::Int(i.abs())),
                Value::Float(f) => Ok(Value::Float(f.abs())),
                _ => unreachable!(),
            }
        }
        "round" => {
            let f = float_arg(name, args, 0)?;
            Ok(Value::Float(f.round()))
        }
        "to_str" => {
            let v = arg(name, args, 0)?;
            Ok(Value::Str(display(v).map_err(|e| EvalError::TypeError(name.to_string(), e))?))
        }
        "to_int" => {
            let v = arg(name, args, 0)?;
            match v {
                Value::Int(i) => Ok(Value::Int(*i)),
                Value::Float(f) => Ok(Value::Int(*f as i64)),
                Value::Str(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|e| EvalError::TypeError("to_int".into(), e.to_string())),
                other => Err(EvalError::TypeError("to_int".into(), format!("cannot convert {other:?}"))),
            }
        }
        "to_float" => {
            let v = arg(name, args, 0)?;
            match v {
                Value::Int(i) => Ok(Value::Float(*i as f64)),
                Value::Float(f) => Ok(Value::Float(*f)),
                Value::Str(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|e| EvalError::TypeError("to_float".into(), e.to_string())),
                other => Err(EvalError::TypeError("to_float".into(), format!("cannot convert {other:?}"))),
            }
        }
        "coalesce" => {
            for a in args {
                if *a != Value::Null {
                    return Ok(a.clone());
                }
            }
            Ok(Value::Null)
        }
        other => Err(EvalError::UnknownFunction(other.to_string())),
    }
}

fn arg<'a>(name: &str, args: &'a [Value], idx: usize) -> Result<&'a Value, EvalError> {
    args.get(idx)
        .ok_or_else(|| EvalError::Arity(name.to_string(), idx + 1, args.len()))
}

fn str_arg<'a>(name: &str, args: &'a [Value], idx: usize) -> Result<&'a str, EvalError> {
    arg(name, args, idx)?
        .as_str()
        .ok_or_else(|| EvalError::TypeError(name.to_string(), format!("argument {idx} must be str")))
}

fn num_arg<'a>(name: &str, args: &'a [Value], idx: usize) -> Result<&'a Value, EvalError> {
    let v = arg(name, args, idx)?;
    if v.as_f64().is_some() {
        Ok(v)
    } else {
        Err(EvalError::TypeError(name.to_string(), format!("argument {idx} must be numeric")))
    }
}

fn int_arg(name: &str, args: &[Value], idx: usize) -> Result<i64, EvalError> {
    match arg(name, args, idx)? {
        Value::Int(i) => Ok(*i),
        other => Err(EvalError::TypeError(name.to_string(), format!("argument {idx} must be int, got {other:?}"))),
    }
}

fn float_arg(name: &str, args: &[Value], idx: usize) -> Result<f64, EvalError> {
    arg(name, args, idx)?
        .as_f64()
        .ok_or_else(|| EvalError::TypeError(name.to_string(), format!("argument {idx} must be numeric")))
}

fn display(v: &Value) -> Result<String, String> {
    Ok(match v {
        Value::Str(s) => s.clone(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_joins_mixed_types() {
        let v = call("concat", &[Value::Str("n=".into()), Value::Int(3)]).unwrap();
        assert_eq!(v, Value::Str("n=3".into()));
    }

    #[test]
    fn unknown_function_errors() {
        let err = call("frobnicate", &[]).unwrap_err();
        assert!(matches!(err, EvalError::UnknownFunction(_)));
    }

    #[test]
    fn substr_extracts_a_char_range() {
        let v = call("substr", &[Value::Str("hello world".into()), Value::Int(6), Value::Int(5)]).unwrap();
        assert_eq!(v, Value::Str("world".to_string()));
    }

    #[test]
    fn substr_clamps_past_the_end_of_the_string() {
        let v = call("substr", &[Value::Str("hi".into()), Value::Int(0), Value::Int(99)]).unwrap();
        assert_eq!(v, Value::Str("hi".to_string()));
    }

    #[test]
    fn index_of_returns_negative_one_when_absent() {
        let v = call("index_of", &[Value::Str("hello".into()), Value::Str("z".into())]).unwrap();
        assert_eq!(v, Value::Int(-1));
    }

    #[test]
    fn min_and_max_compare_numerically() {
        assert_eq!(call("min", &[Value::Int(3), Value::Int(1)]).unwrap(), Value::Int(1));
        assert_eq!(call("max", &[Value::Float(2.5), Value::Int(2)]).unwrap(), Value::Float(2.5));
    }

    #[test]
    fn trim_strips_surrounding_whitespace() {
        let v = call("trim", &[Value::Str("  padded  ".into())]).unwrap();
        assert_eq!(v, Value::Str("padded".to_string()));
    }
}
