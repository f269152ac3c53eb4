use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use defer_core::{traits::MessageQueue, DeferError, DeferResult};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// 内存消息队列实现
///
/// Queues live for the lifetime of the process and are created on first
/// use. Suitable for embedded deployments and tests; nothing survives a
/// restart.
#[derive(Debug, Default)]
pub struct InMemoryMessageQueue {
    queues: RwLock<HashMap<String, VecDeque<Vec<u8>>>>,
    config: InMemoryQueueConfig,
}

#[derive(Debug, Clone)]
pub struct InMemoryQueueConfig {
    /// 队列最大容量（0表示无限制）
    pub max_queue_size: usize,
}

impl Default for InMemoryQueueConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 10000,
        }
    }
}

impl InMemoryMessageQueue {
    pub fn new() -> Self {
        Self::with_config(InMemoryQueueConfig::default())
    }

    pub fn with_config(config: InMemoryQueueConfig) -> Self {
        info!("creating in-memory message queue with config: {:?}", config);
        Self {
            queues: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub async fn queue_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.queues.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn purge_queue(&self, queue: &str) -> DeferResult<()> {
        if let Some(messages) = self.queues.write().await.get_mut(queue) {
            messages.clear();
        }
        Ok(())
    }
}

#[async_trait]
impl MessageQueue for InMemoryMessageQueue {
    async fn publish(&self, queue: &str, payload: &[u8]) -> DeferResult<()> {
        let mut queues = self.queues.write().await;
        let messages = queues.entry(queue.to_string()).or_default();

        if self.config.max_queue_size > 0 && messages.len() >= self.config.max_queue_size {
            return Err(DeferError::MessageQueue(format!(
                "queue '{queue}' is full ({} messages)",
                messages.len()
            )));
        }

        messages.push_back(payload.to_vec());
        debug!(queue, size = messages.len(), "published message");
        Ok(())
    }

    async fn consume(&self, queue: &str) -> DeferResult<Option<Vec<u8>>> {
        let mut queues = self.queues.write().await;
        Ok(queues.get_mut(queue).and_then(|messages| messages.pop_front()))
    }

    async fn create_queue(&self, queue: &str, durable: bool) -> DeferResult<()> {
        let mut queues = self.queues.write().await;
        if !queues.contains_key(queue) {
            queues.insert(queue.to_string(), VecDeque::new());
            debug!("created queue '{}' (durable: {})", queue, durable);
        }
        Ok(())
    }

    async fn queue_size(&self, queue: &str) -> DeferResult<u32> {
        let queues = self.queues.read().await;
        Ok(queues
            .get(queue)
            .map(|messages| messages.len() as u32)
            .unwrap_or(0))
    }
}
