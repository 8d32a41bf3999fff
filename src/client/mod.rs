// File: ./src/client/mod.rs
pub mod core;
pub mod encode;
pub mod middleware;
pub mod retry;

pub use crate::client::core::NotionClient;
