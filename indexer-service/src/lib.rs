pub mod api;
pub mod auth_middleware;
pub mod cache;
pub mod config;
pub mod database;
pub mod decoder;
pub mod error;
pub mod metrics;
pub mod reader;
pub mod rpc;
pub mod snapshot;
pub mod state;
pub mod types;
