use gateway_core::model::{UdfArg, ValueType};

use crate::ast::FunctionDef;
use crate::interp::{self, EvalError};
use crate::parser::{self, ParseError};
use crate::value::Value;

/// A parsed and validated UDF, ready to be called with argument values
/// matching its declared signature.
#[derive(Debug, Clone)]
pub struct CompiledUdf {
    pub def: FunctionDef,
}

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("function name in source ('{0}') must match the registered logical name ('{1}')")]
    NameMismatch(String, String),
}

impl CompiledUdf {
    /// Parses `source` and checks that its declared name matches
    /// `expected_name`, the logical name the caller intends to register it
    /// under.
    pub fn compile(source: &str, expected_name: &str) -> Result<Self, CompileError> {
        let def = parser::parse(source)?;
        if def.name != expected_name {
            return Err(CompileError::NameMismatch(def.name, expected_name.to_string()));
        }
        Ok(CompiledUdf { def })
    }

    pub fn args(&self) -> Vec<UdfArg> {
        self.def
            .params
            .iter()
            .map(|p| UdfArg {
                name: p.name.clone(),
                arg_type: p.ty,
            })
            .collect()
    }

    pub fn return_type(&self) -> ValueType {
        self.def.return_type
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        interp::eval_function(&self.def, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_and_evaluates_a_function() {
        let udf = CompiledUdf::compile(
            "fn classify(amount: float) -> str { let big = amount > 100.0; to_str(big) }",
            "classify",
        )
        .unwrap();
        let result = udf.call(&[Value::Float(150.0)]).unwrap();
        assert_eq!(result, Value::Str("true".to_string()));
    }

    #[test]
    fn rejects_name_mismatch() {
        let err = CompiledUdf::compile("fn f(x: int) -> int { x }", "g").unwrap_err();
        assert!(matches!(err, CompileError::NameMismatch(_, _)));
    }
}
