//! Core modules for credport
//!
//! This module contains the shared building blocks of the entity layer:
//! - Error taxonomy for validation, envelope, type and format failures
//! - Record (DTO) type definitions used across entities and codecs

pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::{
    EntityError, EntityResult, EntityValidationError, SchemaError, ValidationDetails,
};
pub use types::{dto_from_value, Dto};

/// Version information for the core library
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");
