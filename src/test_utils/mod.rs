//! Test utilities for handler and use case tests.
//!
//! This module provides:
//! - Test data factories and token helpers
//! - In-memory implementations of the persistence and outbound service ports
//! - A builder for an `AppState` wired to those mocks

mod app_state_builder;
mod factories;
mod mocks;

pub use app_state_builder::*;
pub use factories::*;
pub use mocks::*;
