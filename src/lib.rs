pub mod advisory;
pub mod config;
pub mod engine;
pub mod output;
pub mod server;
pub mod store;
