//! HTTP Transport layer for the Model Context Protocol
//!
//! Stateless request/response adapter over the shared dispatcher.

pub mod handlers;
