//! Request and Response models for the proxy's HTTP surface
//!
//! This module defines the DTOs (Data Transfer Objects) used for parsing
//! inbound proxy paths and serializing JSON response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::ProxyTarget;
pub use responses::{EntrySummary, ErrorResponse, HealthResponse, ProxyInfoResponse};
