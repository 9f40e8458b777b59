//! Tool registry seam
//!
//! The server never knows what a tool does. It only lists descriptors and asks
//! the registry to execute a tool by name with a JSON object of arguments.

use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub type ToolArguments = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    NotFound(String),
    #[error("{0}")]
    Failed(String),
}

impl ToolError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Lookup table plus executor for every tool the server exposes.
///
/// Implementations must allow concurrent `execute` calls; the HTTP transport
/// issues them from independent requests.
#[async_trait]
pub trait ToolRegistry: Send + Sync {
    fn list_tools(&self) -> Vec<ToolDescriptor>;

    async fn execute(&self, name: &str, arguments: ToolArguments) -> Result<Value, ToolError>;
}

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: ToolArguments) -> Result<Value, ToolError>;
}

/// Adapts an async closure into a [`ToolHandler`].
pub struct FnTool<F>(F);

pub fn tool_fn<F, Fut>(handler: F) -> FnTool<F>
where
    F: Fn(ToolArguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
{
    FnTool(handler)
}

#[async_trait]
impl<F, Fut> ToolHandler for FnTool<F>
where
    F: Fn(ToolArguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
{
    async fn call(&self, arguments: ToolArguments) -> Result<Value, ToolError> {
        (self.0)(arguments).await
    }
}

struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: Arc<dyn ToolHandler>,
}

/// In-memory registry keeping tools in registration order.
#[derive(Default)]
pub struct ToolCatalog {
    tools: Vec<RegisteredTool>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool. A later registration with the same name replaces the
    /// earlier one in place.
    pub fn with_tool(mut self, descriptor: ToolDescriptor, handler: impl ToolHandler + 'static) -> Self {
        let position = self
            .tools
            .iter()
            .position(|tool| tool.descriptor.name == descriptor.name);
        let tool = RegisteredTool {
            descriptor,
            handler: Arc::new(handler),
        };

        match position {
            Some(index) => self.tools[index] = tool,
            None => self.tools.push(tool),
        }
        self
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[async_trait]
impl ToolRegistry for ToolCatalog {
    fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .map(|tool| tool.descriptor.clone())
            .collect()
    }

    async fn execute(&self, name: &str, arguments: ToolArguments) -> Result<Value, ToolError> {
        let handler = self
            .tools
            .iter()
            .find(|tool| tool.descriptor.name == name)
            .map(|tool| Arc::clone(&tool.handler))
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        handler.call(arguments).await
    }
}
