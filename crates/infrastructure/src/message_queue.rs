use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use defer_core::{config::MessageQueueSettings, traits::MessageQueue, DeferError, DeferResult};
use lapin::{
    options::*, publisher_confirm::Confirmation, types::FieldTable, BasicProperties, Channel,
    Connection, ConnectionProperties, Queue,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// RabbitMQ消息队列实现
///
/// Publishing declares the target queue first and waits for the broker's
/// confirmation, so a message that cannot be routed is an error.
pub struct RabbitMQMessageQueue {
    connection: Connection,
    channel: Arc<Mutex<Channel>>,
    declared: Mutex<HashSet<String>>,
    settings: MessageQueueSettings,
}

impl RabbitMQMessageQueue {
    /// 创建新的RabbitMQ消息队列实例，并声明默认队列
    pub async fn new(settings: MessageQueueSettings) -> DeferResult<Self> {
        let connect = Connection::connect(&settings.url, ConnectionProperties::default());
        let connection = tokio::time::timeout(
            Duration::from_secs(settings.connection_timeout_seconds),
            connect,
        )
        .await
        .map_err(|_| DeferError::Timeout {
            operation: format!("connect to {}", settings.url),
            seconds: settings.connection_timeout_seconds,
        })?
        .map_err(|e| DeferError::MessageQueue(format!("failed to connect to RabbitMQ: {e}")))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| DeferError::MessageQueue(format!("failed to create channel: {e}")))?;
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| DeferError::MessageQueue(format!("failed to enable publisher confirms: {e}")))?;

        info!("connected to RabbitMQ: {}", settings.url);

        let queue = Self {
            connection,
            channel: Arc::new(Mutex::new(channel)),
            declared: Mutex::new(HashSet::new()),
            settings,
        };

        {
            let channel = queue.channel.lock().await;
            queue
                .declare_queue(&channel, &queue.settings.default_queue, true)
                .await?;
        }

        Ok(queue)
    }

    async fn declare_queue(
        &self,
        channel: &Channel,
        queue_name: &str,
        durable: bool,
    ) -> DeferResult<Queue> {
        let queue = channel
            .queue_declare(
                queue_name,
                QueueDeclareOptions {
                    durable,
                    exclusive: false,
                    auto_delete: false,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                DeferError::MessageQueue(format!("failed to declare queue {queue_name}: {e}"))
            })?;

        self.declared.lock().await.insert(queue_name.to_string());
        debug!("declared queue {}", queue_name);
        Ok(queue)
    }

    pub fn is_connected(&self) -> bool {
        self.connection.status().connected()
    }

    pub async fn purge_queue(&self, queue: &str) -> DeferResult<()> {
        let channel = self.channel.lock().await;
        channel
            .queue_purge(queue, QueuePurgeOptions::default())
            .await
            .map_err(|e| DeferError::MessageQueue(format!("failed to purge queue {queue}: {e}")))?;

        debug!("purged queue {}", queue);
        Ok(())
    }

    pub async fn close(&self) -> DeferResult<()> {
        self.connection
            .close(200, "normal shutdown")
            .await
            .map_err(|e| DeferError::MessageQueue(format!("failed to close connection: {e}")))?;

        info!("RabbitMQ connection closed");
        Ok(())
    }
}

fn is_not_found(e: &lapin::Error) -> bool {
    let message = e.to_string();
    message.contains("NOT_FOUND") || message.contains("404")
}

#[async_trait]
impl MessageQueue for RabbitMQMessageQueue {
    async fn publish(&self, queue: &str, payload: &[u8]) -> DeferResult<()> {
        let channel = self.channel.lock().await;

        if !self.declared.lock().await.contains(queue) {
            self.declare_queue(&channel, queue, true).await?;
        }

        let confirm = channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions {
                    mandatory: true,
                    ..Default::default()
                },
                payload,
                BasicProperties::default()
                    .with_delivery_mode(2) // persistent
                    .with_content_type("application/json".into()),
            )
            .await
            .map_err(|e| {
                DeferError::MessageQueue(format!("failed to publish to queue {queue}: {e}"))
            })?;

        let confirmation = confirm
            .await
            .map_err(|e| DeferError::MessageQueue(format!("publish confirmation failed: {e}")))?;
        match confirmation {
            Confirmation::Ack(None) => {}
            Confirmation::Ack(Some(_)) => {
                return Err(DeferError::MessageQueue(format!(
                    "message to queue {queue} was returned as unroutable"
                )))
            }
            Confirmation::Nack(_) => {
                return Err(DeferError::MessageQueue(format!(
                    "broker rejected message to queue {queue}"
                )))
            }
            Confirmation::NotRequested => {
                return Err(DeferError::MessageQueue(
                    "publisher confirms are not enabled on the channel".to_string(),
                ))
            }
        }

        debug!(queue, bytes = payload.len(), "published message");
        Ok(())
    }

    async fn consume(&self, queue: &str) -> DeferResult<Option<Vec<u8>>> {
        let channel = self.channel.lock().await;

        match channel.basic_get(queue, BasicGetOptions::default()).await {
            Ok(Some(message)) => {
                channel
                    .basic_ack(message.delivery.delivery_tag, BasicAckOptions::default())
                    .await
                    .map_err(|e| DeferError::MessageQueue(format!("failed to ack message: {e}")))?;

                Ok(Some(message.delivery.data))
            }
            Ok(None) => Ok(None),
            Err(e) if is_not_found(&e) => {
                debug!("queue {} does not exist, nothing to consume", queue);
                Ok(None)
            }
            Err(e) => Err(DeferError::MessageQueue(format!(
                "failed to get message from queue {queue}: {e}"
            ))),
        }
    }

    async fn create_queue(&self, queue: &str, durable: bool) -> DeferResult<()> {
        let channel = self.channel.lock().await;
        self.declare_queue(&channel, queue, durable).await?;
        Ok(())
    }

    async fn queue_size(&self, queue: &str) -> DeferResult<u32> {
        let channel = self.channel.lock().await;
        let queue_info = channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    passive: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await;

        match queue_info {
            Ok(info) => Ok(info.message_count()),
            Err(e) if is_not_found(&e) => Ok(0),
            Err(e) => Err(DeferError::MessageQueue(format!(
                "failed to inspect queue {queue}: {e}"
            ))),
        }
    }
}
