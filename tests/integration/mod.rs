// tests/integration/mod.rs

//! Integration tests for tallyd
//!
//! These tests boot a real server on an ephemeral port and exercise it over
//! TCP, verifying the response contract, visit accounting, and connection
//! lifecycle behavior.

pub mod server_test;
