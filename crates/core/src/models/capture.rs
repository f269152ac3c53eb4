use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DeferError, DeferResult};

/// A registered task identifier plus its ordered, serializable arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub task: String,
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
}

impl WorkItem {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(task: impl Into<String>, args: Vec<serde_json::Value>) -> Self {
        Self {
            task: task.into(),
            args,
        }
    }
}

/// Immutable snapshot of deferred work.
///
/// A capture never references anything in the creating process: the work
/// item is resolved by name through a [`TaskRegistry`](crate::TaskRegistry)
/// at execution time, and every local and the receiver are plain JSON values.
/// This is what lets the disk, fork, runner and message-queue handlers move a
/// capture across processes or time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capture {
    pub id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub work_item: WorkItem,
    #[serde(default)]
    pub locals: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub receiver: serde_json::Value,
}

impl Capture {
    pub fn new(work_item: WorkItem) -> Self {
        Self {
            id: Uuid::new_v4(),
            captured_at: Utc::now(),
            work_item,
            locals: BTreeMap::new(),
            receiver: serde_json::Value::Null,
        }
    }

    /// Capture a task with no arguments.
    pub fn task(task: impl Into<String>) -> Self {
        Self::new(WorkItem::new(task))
    }

    pub fn with_args(mut self, args: Vec<serde_json::Value>) -> Self {
        self.work_item.args = args;
        self
    }

    /// Binds a named value. A later binding of the same name replaces the
    /// earlier one, so names stay unique.
    pub fn with_local(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.locals.insert(name.into(), value);
        self
    }

    pub fn with_locals(
        mut self,
        locals: impl IntoIterator<Item = (String, serde_json::Value)>,
    ) -> Self {
        self.locals.extend(locals);
        self
    }

    pub fn with_receiver(mut self, receiver: serde_json::Value) -> Self {
        self.receiver = receiver;
        self
    }

    pub fn task_name(&self) -> &str {
        &self.work_item.task
    }

    pub fn args(&self) -> &[serde_json::Value] {
        &self.work_item.args
    }

    pub fn local(&self, name: &str) -> Option<&serde_json::Value> {
        self.locals.get(name)
    }

    pub fn to_json(&self) -> DeferResult<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| DeferError::Serialization(format!("failed to serialize capture: {e}")))
    }

    pub fn from_json(data: &[u8]) -> DeferResult<Self> {
        serde_json::from_slice(data)
            .map_err(|e| DeferError::Serialization(format!("failed to deserialize capture: {e}")))
    }

    /// Encodes the capture as a single base64 token that survives being
    /// passed as a command line argument.
    pub fn encode(&self) -> DeferResult<String> {
        Ok(STANDARD.encode(self.to_json()?))
    }

    pub fn decode(encoded: &str) -> DeferResult<Self> {
        let data = STANDARD
            .decode(encoded.trim())
            .map_err(|e| DeferError::Serialization(format!("invalid base64 payload: {e}")))?;
        Self::from_json(&data)
    }
}
