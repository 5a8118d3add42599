pub mod config;
pub mod consts;
pub mod engine;
pub mod files;
pub mod llm;
pub mod prompts;
pub mod server;
pub mod tools;
