//! clonelib-test-harness: Test utilities and mock transports for clonelib.
//!
//! This crate provides [`MockTransport`] for deterministic testing of clone
//! sessions without a radio or programming cable attached.

pub mod mock_serial;

pub use mock_serial::MockTransport;
