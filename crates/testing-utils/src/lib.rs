//! # Defer Testing Utils
//!
//! Shared testing utilities for the workspace: mocks for the handler and
//! message queue seams, builders for captures and settings, a RabbitMQ test
//! container and small async helpers.
//!
//! ## Usage
//!
//! ```toml
//! [dev-dependencies]
//! defer-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod containers;
pub mod helpers;
pub mod mocks;

pub use builders::*;
pub use containers::*;
pub use helpers::*;
pub use mocks::*;
