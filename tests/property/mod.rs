// tests/property/mod.rs

//! Property-based tests for tallyd
//!
//! These tests use property-based testing to verify invariants and properties
//! that should always hold, regardless of input values.

pub mod framing_test;
pub mod service_test;
