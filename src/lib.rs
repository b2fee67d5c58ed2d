pub mod aliases;
pub mod apis;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod refresh;
pub mod resolver;
pub mod server;
pub mod slack;
pub mod types;
