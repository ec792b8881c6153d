// Example: Middleware Chain Demonstration
//
// Run with: cargo run --example middleware_demo

use mcp_bridge_runtime::{LoggingMiddleware, Middleware, Result, Tool};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
struct EchoInput {
    message: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
struct EchoOutput {
    echo: String,
    length: usize,
}

struct EchoTool;

#[async_trait::async_trait]
impl Tool for EchoTool {
    type Input = EchoInput;
    type Output = EchoOutput;
    type Error = mcp_bridge_runtime::Error;

    fn name() -> &'static str {
        "echo"
    }

    fn description() -> &'static str {
        "echoes the message back with its length"
    }

    async fn handle(&self, input: Self::Input) -> Result<Self::Output> {
        Ok(EchoOutput {
            length: input.message.len(),
            echo: input.message,
        })
    }
}

// Custom timing middleware
struct TimingMiddleware {
    start: std::time::Instant,
}

impl TimingMiddleware {
    fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[async_trait::async_trait]
impl Middleware for TimingMiddleware {
    async fn before(&self, request: Value) -> Result<Value> {
        println!("  request started");
        Ok(request)
    }

    async fn after(&self, _request: Value, response: Value) -> Result<Value> {
        let elapsed = self.start.elapsed();
        println!("  request completed in {:?}", elapsed);
        Ok(response)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let logging_mw = LoggingMiddleware::new("echo");
    let timing_mw = TimingMiddleware::new();

    let input = EchoInput {
        message: "Hello from middleware!".to_string(),
    };

    let mut request = serde_json::to_value(&input)?;

    println!("1. LoggingMiddleware.before()");
    request = logging_mw.before(request).await?;

    println!("2. TimingMiddleware.before()");
    request = timing_mw.before(request).await?;

    println!("3. Execute tool");
    let tool_input: EchoInput = serde_json::from_value(request.clone())?;
    let tool = EchoTool;
    let tool_output = tool.handle(tool_input).await?;
    let mut response = serde_json::to_value(&tool_output)?;

    println!("4. TimingMiddleware.after()");
    response = timing_mw.after(request.clone(), response).await?;

    println!("5. LoggingMiddleware.after()");
    response = logging_mw.after(request, response).await?;

    println!("final response: {}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
