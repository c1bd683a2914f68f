pub mod advisor;
pub mod catalog;
pub mod error;
pub mod mcp_api;
pub mod model;
pub mod openai;
pub mod prompt;
pub mod response;
pub mod store;
