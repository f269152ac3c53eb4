//! # 数据模型
//!
//! Core data structures shared by every crate in the workspace.
//!
//! ### Capture
//! A self-contained snapshot of deferred work: a [`WorkItem`] (registered
//! task name plus arguments), named locals and a receiver value. Everything
//! is serializable so the capture can cross process boundaries.
//!
//! ### HandlerSpec / HandlerChain
//! Which handlers to try, in order, and with which options.
//!
//! ### EffectiveConfig / Outcome
//! The resolved routing for one dispatch and its result.

pub mod capture;
pub mod handler_spec;
pub mod outcome;

pub use capture::{Capture, WorkItem};
pub use handler_spec::{HandlerChain, HandlerOptions, HandlerSpec};
pub use outcome::{EffectiveConfig, Outcome};
