//! Demo tools served by the binary.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use toolgate::prelude::*;

/// Registers `echo` and `calculator_arithmetic` on `registry`.
pub fn register_demo_tools(registry: &ToolRegistry) -> ToolResult<()> {
    registry.register(echo_tool())?;
    registry.register(CalculatorTool)?;
    Ok(())
}

fn echo_tool() -> impl Tool {
    let spec = ToolSpec::new("Echo")
        .with_description("Returns the arguments it was called with")
        .with_input_schema(json!({
            "type": "object",
            "properties": {
                "msg": { "type": "string", "description": "Text to echo back" }
            },
            "required": ["msg"]
        }));
    FnTool::new("echo", spec, |ctx: CallContext, input: Value| async move {
        if ctx.is_cancelled() {
            return Err(ToolError::Cancelled);
        }
        match input.get("msg") {
            Some(Value::String(_)) => Ok(input),
            Some(other) => Err(ToolError::invalid_input(format!(
                "`msg` must be a string, found {other}"
            ))),
            None => Err(ToolError::invalid_input("missing required field `msg`")),
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

#[derive(Debug, Deserialize)]
struct ArithmeticInput {
    operation: Operation,
    operands: Vec<f64>,
}

/// Folds a list of operands with one of the four basic operations.
#[derive(Debug, Clone, Copy)]
struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator_arithmetic"
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec::new("Calculator")
            .with_description("Apply add, subtract, multiply or divide across a list of numbers")
            .with_input_schema(json!({
                "type": "object",
                "properties": {
                    "operation": {
                        "type": "string",
                        "enum": ["add", "subtract", "multiply", "divide"]
                    },
                    "operands": {
                        "type": "array",
                        "items": { "type": "number" },
                        "minItems": 1
                    }
                },
                "required": ["operation", "operands"]
            }))
    }

    async fn execute(&self, _ctx: &CallContext, input: Value) -> ToolResult<Value> {
        let input: ArithmeticInput = serde_json::from_value(input)
            .map_err(|err| ToolError::invalid_input(err.to_string()))?;
        let result = evaluate(input.operation, &input.operands)?;
        Ok(json!({ "result": result }))
    }
}

fn evaluate(operation: Operation, operands: &[f64]) -> ToolResult<f64> {
    let Some((&first, rest)) = operands.split_first() else {
        return Err(ToolError::invalid_input("`operands` must not be empty"));
    };
    rest.iter().try_fold(first, |acc, &value| match operation {
        Operation::Add => Ok(acc + value),
        Operation::Subtract => Ok(acc - value),
        Operation::Multiply => Ok(acc * value),
        Operation::Divide if value == 0.0 => Err(ToolError::execution("division by zero")),
        Operation::Divide => Ok(acc / value),
    })
}
