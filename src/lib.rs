// Crate root library declaration and module exports.
pub mod cli;
pub mod client;
pub mod config;
pub mod context;
pub mod extract;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod store;
pub mod sync;
