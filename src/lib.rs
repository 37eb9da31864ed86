// ABOUTME: Library root for devstack - exposes public types for embedding and testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod container;
pub mod environment;
pub mod error;
pub mod health;
pub mod output;
pub mod process;
pub mod reloader;
pub mod retry;
pub mod stack;
pub mod types;
