pub mod config;
pub mod error;
pub mod scheduler;
pub mod server;
pub mod shutdown;
