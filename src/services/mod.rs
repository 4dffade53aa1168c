pub mod config;
pub mod http;
pub mod logger;
pub mod nable_client;
pub mod tool_executor;
