use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while deferring, delivering or executing work.
#[derive(Debug, Error)]
pub enum DeferError {
    #[error("unknown handler: {name}")]
    UnknownHandler { name: String },

    #[error("unknown reporter: {name}")]
    UnknownReporter { name: String },

    #[error("unknown task: {name}")]
    UnknownTask { name: String },

    #[error("task execution failed: {0}")]
    TaskExecution(String),

    #[error("handler {handler} failed: {message}")]
    HandlerExecution { handler: String, message: String },

    #[error("message queue error: {0}")]
    MessageQueue(String),

    #[error("failed to spawn process: {0}")]
    Spawn(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("notification delivery failed: {0}")]
    Notification(String),

    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    #[error("corrupt capture file {}: {message}", path.display())]
    CorruptCapture { path: PathBuf, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeferError {
    /// Short machine readable classification, used as a metrics label and in
    /// notification payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            DeferError::UnknownHandler { .. } => "unknown_handler",
            DeferError::UnknownReporter { .. } => "unknown_reporter",
            DeferError::UnknownTask { .. } => "unknown_task",
            DeferError::TaskExecution(_) => "task_execution",
            DeferError::HandlerExecution { .. } => "handler_execution",
            DeferError::MessageQueue(_) => "message_queue",
            DeferError::Spawn(_) => "spawn",
            DeferError::Serialization(_) => "serialization",
            DeferError::Configuration(_) => "configuration",
            DeferError::Notification(_) => "notification",
            DeferError::Timeout { .. } => "timeout",
            DeferError::CorruptCapture { .. } => "corrupt_capture",
            DeferError::Io(_) => "io",
        }
    }

    pub fn task_execution(message: impl Into<String>) -> Self {
        DeferError::TaskExecution(message.into())
    }

    pub fn handler(handler: &str, message: impl Into<String>) -> Self {
        DeferError::HandlerExecution {
            handler: handler.to_string(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for DeferError {
    fn from(e: serde_json::Error) -> Self {
        DeferError::Serialization(e.to_string())
    }
}

impl From<::config::ConfigError> for DeferError {
    fn from(e: ::config::ConfigError) -> Self {
        DeferError::Configuration(e.to_string())
    }
}

/// 统一的Result类型
pub type DeferResult<T> = std::result::Result<T, DeferError>;
