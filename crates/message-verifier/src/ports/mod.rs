//! # Ports Layer
//!
//! Trait definitions for the hexagonal architecture.
//! - **Inbound (Driving)**: API that callers use to sign and verify
//! - **Outbound (Driven)**: Serializers and clocks the engine depends on

pub mod inbound;
pub mod outbound;
