//! 处理器接口定义
//!
//! A handler is a backend that accepts a [`Capture`] and arranges for it to
//! run: immediately in-process, in a child process, through a broker, or by
//! persisting it for later replay.
//!
//! ## 语义
//!
//! `handle` returning `Ok(())` means the handler *accepted* the work. For
//! handlers that execute the work themselves (`in_process`) acceptance and
//! execution are the same step, so a task error surfaces as `Err`. Handlers
//! that hand the work to another process (`fork`, `runner`,
//! `message_queue`) only report delivery failures; what happens to the work
//! after delivery is not observable from here.
//!
//! ## 实现自定义处理器
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use defer_core::{Capture, DeferResult, Handler, HandlerOptions};
//!
//! pub struct AuditHandler;
//!
//! #[async_trait]
//! impl Handler for AuditHandler {
//!     fn name(&self) -> &str {
//!         "audit"
//!     }
//!
//!     async fn handle(&self, capture: &Capture, _options: &HandlerOptions) -> DeferResult<()> {
//!         tracing::info!(task = capture.task_name(), "audited");
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::{
    models::{Capture, HandlerOptions},
    DeferResult,
};

/// 处理器核心接口
///
/// Implementations must be `Send + Sync`: a single instance is registered
/// once and shared by every dispatch.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Registry name, e.g. `"disk"`.
    fn name(&self) -> &str;

    /// One line description shown by `defer handlers`.
    fn description(&self) -> &str {
        ""
    }

    /// Accept the capture or fail. `options` come from the [`HandlerSpec`]
    /// that selected this handler and may be empty.
    ///
    /// [`HandlerSpec`]: crate::models::HandlerSpec
    async fn handle(&self, capture: &Capture, options: &HandlerOptions) -> DeferResult<()>;
}
