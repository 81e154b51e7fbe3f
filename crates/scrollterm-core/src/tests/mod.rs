//! Crate-level integration tests.

mod console_integration;
