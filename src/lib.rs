//! MCP server exposing the nAble clinic API as assistant tools.

pub mod app;
pub mod constants;
pub mod errors;
pub mod managers;
pub mod mcp;
pub mod services;
pub mod utils;
