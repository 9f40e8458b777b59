//! Model Context Protocol (MCP) server handling and JSON-RPC implementations
//!
//! Provides protocol-level specifics surrounding JSON-RPC envelopes, method routing and
//! tool invocation shared by every transport.

pub mod rpc;
pub mod server;
