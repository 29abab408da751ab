/// History Mock Server Library
///
/// This crate provides both a standalone binary and library components for
/// mocking the Etherscan/BscScan `tokentx` API from in-memory fixtures.
pub mod handlers;
pub mod server;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use server::{create_router, run_server, spawn_local};
pub use store::MockHistory;
pub use types::*;
