//! Shared helpers (error types, config path resolution).

pub mod error;

pub use crate::config_utils::resolve_relative;
pub use error::{SerializationError, StoreError};
