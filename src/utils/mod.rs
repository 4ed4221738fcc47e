//! Utility functions and helpers.
//!
//! Common utilities for environment variable handling and timestamps.

pub mod env;
pub mod time;

pub use env::get_env_with_prefix;
pub use time::current_timestamp;
