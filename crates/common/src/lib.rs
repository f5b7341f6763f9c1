//! Common types and utilities shared across the USDT/BOB rate tracker components

pub mod config;
pub mod error;
pub mod types;

pub use error::*;
pub use types::*;
