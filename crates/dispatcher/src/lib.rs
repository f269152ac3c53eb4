//! Dispatch layer
//!
//! Routes captures to handlers: the [`Dispatcher`] walks a handler chain,
//! [`Background`] resolves which chain and reporter a call uses, and the
//! [`RecoveryService`] replays captures the `disk` handler persisted.

pub mod background;
pub mod deferred_task;
pub mod dispatcher;
pub mod recovery_service;

pub use background::{Background, DeferOptions};
pub use deferred_task::DeferredTask;
pub use dispatcher::Dispatcher;
pub use recovery_service::{RecoveryReport, RecoveryService};
