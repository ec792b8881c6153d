// Example: a custom Tool outside the built-in eleven, dispatched through
// a bare ToolRegistry with no EditorHost involved.
//
// Run with: cargo run --example custom_tool

use mcp_bridge_runtime::{Result, Tool, ToolRegistry};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
struct CalculatorInput {
    operation: String,
    a: f64,
    b: f64,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
struct CalculatorOutput {
    result: f64,
}

struct CalculatorTool;

#[async_trait::async_trait]
impl Tool for CalculatorTool {
    type Input = CalculatorInput;
    type Output = CalculatorOutput;
    type Error = mcp_bridge_runtime::Error;

    fn name() -> &'static str {
        "calculate"
    }

    fn description() -> &'static str {
        "applies a binary arithmetic operation"
    }

    async fn handle(&self, input: Self::Input) -> Result<Self::Output> {
        let result = match input.operation.as_str() {
            "add" => input.a + input.b,
            "subtract" => input.a - input.b,
            "multiply" => input.a * input.b,
            "divide" => {
                if input.b == 0.0 {
                    return Err(mcp_bridge_runtime::Error::Internal(
                        "division by zero".to_string(),
                    ));
                }
                input.a / input.b
            }
            _ => {
                return Err(mcp_bridge_runtime::Error::Internal(format!(
                    "unknown operation: {}",
                    input.operation
                )))
            }
        };

        Ok(CalculatorOutput { result })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut registry = ToolRegistry::new();
    registry.register(CalculatorTool);

    let test_cases = vec![
        ("add", 5.0, 3.0),
        ("subtract", 10.0, 4.0),
        ("multiply", 6.0, 7.0),
        ("divide", 20.0, 4.0),
    ];

    for (op, a, b) in test_cases {
        let input = serde_json::json!({"operation": op, "a": a, "b": b});
        match registry.dispatch("calculate", input).await {
            Ok(output) => println!("{} {} {} = {}", a, op, b, output["result"]),
            Err(e) => println!("error: {}", e),
        }
    }

    let error_input = serde_json::json!({"operation": "divide", "a": 10.0, "b": 0.0});
    match registry.dispatch("calculate", error_input).await {
        Ok(_) => println!("should have failed"),
        Err(e) => println!("correctly caught error: {}", e),
    }

    Ok(())
}
