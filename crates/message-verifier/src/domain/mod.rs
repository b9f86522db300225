//! # Domain Layer
//!
//! Pure signing logic with no I/O dependencies.
//! This is the inner layer of the hexagonal architecture.

pub mod digest;
pub mod envelope;
pub mod errors;
pub mod metadata;
pub mod payload;
pub mod rotation;
pub mod secret;
pub mod token;
