use crate::{Error, Result};
use serde_json::Value;
use std::sync::Arc;

/// Middleware trait for request/response processing
#[async_trait::async_trait]
pub trait Middleware: Send + Sync {
    /// Process request before handler execution
    /// Returns modified request or error
    async fn before(&self, request: Value) -> Result<Value> {
        Ok(request)
    }

    /// Process response after handler execution
    /// Returns modified response or error
    async fn after(&self, request: Value, response: Value) -> Result<Value> {
        let _ = request;
        Ok(response)
    }

    /// Handle errors from handler or downstream middleware
    async fn on_error(&self, request: Value, error: Error) -> Result<Value> {
        let _ = request;
        Err(error)
    }
}

/// Middleware chain manages ordered middleware execution
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    /// Add middleware to the chain
    pub fn add(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    /// Execute middleware chain around a handler
    pub async fn execute<F, Fut>(&self, mut request: Value, handler: F) -> Result<Value>
    where
        F: FnOnce(Value) -> Fut,
        Fut: std::future::Future<Output = Result<Value>>,
    {
        // Execute "before" phase in order
        for middleware in &self.middlewares {
            request = middleware.before(request).await?;
        }

        // Execute handler
        let result = handler(request.clone()).await;

        // Execute "after" phase in reverse order or "on_error" if failed
        match result {
            Ok(mut response) => {
                for middleware in self.middlewares.iter().rev() {
                    response = middleware.after(request.clone(), response).await?;
                }
                Ok(response)
            }
            Err(error) => {
                let mut current_error = error;
                for middleware in self.middlewares.iter().rev() {
                    match middleware.on_error(request.clone(), current_error).await {
                        Ok(recovery_response) => return Ok(recovery_response),
                        Err(new_error) => current_error = new_error,
                    }
                }
                Err(current_error)
            }
        }
    }
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Logging middleware - logs requests and responses
pub struct LoggingMiddleware {
    tag: String,
}

impl LoggingMiddleware {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

#[async_trait::async_trait]
impl Middleware for LoggingMiddleware {
    async fn before(&self, request: Value) -> Result<Value> {
        eprintln!(
            "[{}] Request: {}",
            self.tag,
            serde_json::to_string(&request).unwrap_or_default()
        );
        Ok(request)
    }

    async fn after(&self, _request: Value, response: Value) -> Result<Value> {
        eprintln!(
            "[{}] Response: {}",
            self.tag,
            serde_json::to_string(&response).unwrap_or_default()
        );
        Ok(response)
    }

    async fn on_error(&self, _request: Value, error: Error) -> Result<Value> {
        eprintln!("[{}] Error: {}", self.tag, error);
        Err(error)
    }
}

/// Validation middleware - validates request structure
pub struct ValidationMiddleware {
    required_fields: Vec<String>,
}

impl ValidationMiddleware {
    pub fn new(required_fields: Vec<String>) -> Self {
        Self { required_fields }
    }
}

#[async_trait::async_trait]
impl Middleware for ValidationMiddleware {
    async fn before(&self, request: Value) -> Result<Value> {
        if let Value::Object(obj) = &request {
            for field in &self.required_fields {
                if !obj.contains_key(field) {
                    return Err(Error::Internal(format!("Missing required field: {}", field)));
                }
            }
        }
        Ok(request)
    }
}

/// Transform middleware - applies transformations to request/response
pub struct TransformMiddleware<BeforeFn, AfterFn>
where
    BeforeFn: Fn(Value) -> Result<Value> + Send + Sync,
    AfterFn: Fn(Value) -> Result<Value> + Send + Sync,
{
    before_fn: BeforeFn,
    after_fn: AfterFn,
}

impl<BeforeFn, AfterFn> TransformMiddleware<BeforeFn, AfterFn>
where
    BeforeFn: Fn(Value) -> Result<Value> + Send + Sync,
    AfterFn: Fn(Value) -> Result<Value> + Send + Sync,
{
    pub fn new(before_fn: BeforeFn, after_fn: AfterFn) -> Self {
        Self {
            before_fn,
            after_fn,
        }
    }
}

#[async_trait::async_trait]
impl<BeforeFn, AfterFn> Middleware for TransformMiddleware<BeforeFn, AfterFn>
where
    BeforeFn: Fn(Value) -> Result<Value> + Send + Sync,
    AfterFn: Fn(Value) -> Result<Value> + Send + Sync,
{
    async fn before(&self, request: Value) -> Result<Value> {
        (self.before_fn)(request)
    }

    async fn after(&self, _request: Value, response: Value) -> Result<Value> {
        (self.after_fn)(response)
    }
}
