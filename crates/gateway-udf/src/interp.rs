use std::collections::HashMap;

use crate::ast::{BinOp, Expr, FunctionDef, Stmt, UnaryOp};
use crate::value::Value;

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("unknown identifier '{0}'")]
    UnknownIdent(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("wrong number of arguments to '{0}': expected {expected}, got {got}", expected = .1, got = .2)]
    Arity(String, usize, usize),

    #[error("type error in '{0}': {1}")]
    TypeError(String, String),

    #[error("division by zero")]
    DivisionByZero,
}

/// Interprets a parsed function body against a binding environment built
/// from the call's argument values. There is no recursion, no loops, and
/// no user-defined function calls: only the fixed builtin set below, which
/// keeps evaluation total and cheap to run once per ingested event.
pub fn eval_function(def: &FunctionDef, args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != def.params.len() {
        return Err(EvalError::Arity(def.name.clone(), def.params.len(), args.len()));
    }

    let mut env: HashMap<String, Value> = HashMap::new();
    for (param, arg) in def.params.iter().zip(args) {
        env.insert(param.name.clone(), arg.clone());
    }

    for stmt in &def.body {
        match stmt {
            Stmt::Let { name, value } => {
                let v = eval_expr(value, &env)?;
                env.insert(name.clone(), v);
            }
        }
    }

    eval_expr(&def.tail, &env)
}

fn eval_expr(expr: &Expr, env: &HashMap<String, Value>) -> Result<Value, EvalError> {
    match expr {
        Expr::Int(v) => Ok(Value::Int(*v)),
        Expr::Float(v) => Ok(Value::Float(*v)),
        Expr::Str(v) => Ok(Value::Str(v.clone())),
        Expr::Bool(v) => Ok(Value::Bool(*v)),
        Expr::Ident(name) => env
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnknownIdent(name.clone())),
        Expr::Unary(op, inner) => {
            let v = eval_expr(inner, env)?;
            eval_unary(*op, v)
        }
        Expr::Binary(lhs, op, rhs) => {
            let l = eval_expr(lhs, env)?;
            let r = eval_expr(rhs, env)?;
            eval_binary(l, *op, r)
        }
        Expr::Call(name, arg_exprs) => {
            let mut args = Vec::with_capacity(arg_exprs.len());
            for a in arg_exprs {
                args.push(eval_expr(a, env)?);
            }
            crate::builtins::call(name, &args)
        }
    }
}

fn eval_unary(op: UnaryOp, v: Value) -> Result<Value, EvalError> {
    match (op, &v) {
        (UnaryOp::Neg, Value::Int(i)) => Ok(Value::Int(-i)),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        _ => Err(EvalError::TypeError(
            "unary operator".to_string(),
            format!("cannot apply to {v:?}"),
        )),
    }
}

fn eval_binary(l: Value, op: BinOp, r: Value) -> Result<Value, EvalError> {
    use BinOp::*;
    match op {
        Add | Sub | Mul | Div | Mod => eval_arith(l, op, r),
        Eq => Ok(Value::Bool(values_equal(&l, &r))),
        NotEq => Ok(Value::Bool(!values_equal(&l, &r))),
        Lt | LtEq | Gt | GtEq => eval_compare(l, op, r),
        And => {
            let lb = l.as_bool().ok_or_else(|| EvalError::TypeError("&&".into(), "expected bool".into()))?;
            let rb = r.as_bool().ok_or_else(|| EvalError::TypeError("&&".into(), "expected bool".into()))?;
            Ok(Value::Bool(lb && rb))
        }
        Or => {
            let lb = l.as_bool().ok_or_else(|| EvalError::TypeError("||".into(), "expected bool".into()))?;
            let rb = r.as_bool().ok_or_else(|| EvalError::TypeError("||".into(), "expected bool".into()))?;
            Ok(Value::Bool(lb || rb))
        }
    }
}

fn eval_arith(l: Value, op: BinOp, r: Value) -> Result<Value, EvalError> {
    if op == BinOp::Add {
        if let (Value::Str(a), Value::Str(b)) = (&l, &r) {
            return Ok(Value::Str(format!("{a}{b}")));
        }
    }
    match (&l, &r) {
        (Value::Int(a), Value::Int(b)) => {
            let (a, b) = (*a, *b);
            match op {
                BinOp::Add => Ok(Value::Int(a + b)),
                BinOp::Sub => Ok(Value::Int(a - b)),
                BinOp::Mul => Ok(Value::Int(a * b)),
                BinOp::Div => {
                    if b == 0 {
                        Err(EvalError::DivisionByZero)
                    } else {
                        Ok(Value::Int(a / b))
                    }
                }
                BinOp::Mod => {
                    if b == 0 {
                        Err(EvalError::DivisionByZero)
                    } else {
                        Ok(Value::Int(a % b))
                    }
                }
                _ => unreachable!(),
            }
        }
        _ => {
            let a = l.as_f64().ok_or_else(|| EvalError::TypeError("arithmetic".into(), format!("not numeric: {l:?}")))?;
            let b = r.as_f64().ok_or_else(|| EvalError::TypeError("arithmetic".into(), format!("not numeric: {r:?}")))?;
            match op {
                BinOp::Add => Ok(Value::Float(a + b)),
                BinOp::Sub => Ok(Value::Float(a - b)),
                BinOp::Mul => Ok(Value::Float(a * b)),
                BinOp::Div => {
                    if b == 0.0 {
                        Err(EvalError::DivisionByZero)
                    } else {
                        Ok(Value::Float(a / b))
                    }
                }
                BinOp::Mod => Ok(Value::Float(a % b)),
                _ => unreachable!(),
            }
        }
    }
}

fn eval_compare(l: Value, op: BinOp, r: Value) -> Result<Value, EvalError> {
    let ordering = if let (Value::Str(a), Value::Str(b)) = (&l, &r) {
        a.partial_cmp(b)
    } else {
        let a = l.as_f64().ok_or_else(|| EvalError::TypeError("comparison".into(), format!("not comparable: {l:?}")))?;
        let b = r.as_f64().ok_or_else(|| EvalError::TypeError("comparison".into(), format!("not comparable: {r:?}")))?;
        a.partial_cmp(&b)
    };
    let ordering = ordering.ok_or_else(|| EvalError::TypeError("comparison".into(), "incomparable values".into()))?;
    let result = match op {
        BinOp::Lt => ordering.is_lt(),
        BinOp::LtEq => ordering.is_le(),
        BinOp::Gt => ordering.is_gt(),
        BinOp::GtEq => ordering.is_ge(),
        _ => unreachable!(),
    };
    Ok(Value::Bool(result))
}

fn values_equal(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => (*a as f64) == *b,
        _ => l == r,
    }
}
