use std::sync::Arc;

use defer_core::{
    config::{MessageQueueSettings, MessageQueueType},
    traits::MessageQueue,
    DeferError, DeferResult,
};
use tracing::{debug, info};

use crate::{InMemoryMessageQueue, RabbitMQMessageQueue};

pub struct MessageQueueFactory;

impl MessageQueueFactory {
    pub async fn create(settings: &MessageQueueSettings) -> DeferResult<Arc<dyn MessageQueue>> {
        debug!("creating message queue with type: {:?}", settings.r#type);
        Self::validate_config(settings)?;

        match settings.r#type {
            MessageQueueType::Rabbitmq => {
                info!("initializing RabbitMQ message queue");
                let rabbitmq = RabbitMQMessageQueue::new(settings.clone()).await?;
                Ok(Arc::new(rabbitmq))
            }
            MessageQueueType::InMemory => {
                info!("initializing in-memory message queue");
                Ok(Arc::new(InMemoryMessageQueue::new()))
            }
        }
    }

    pub fn validate_config(settings: &MessageQueueSettings) -> DeferResult<()> {
        if settings.default_queue.is_empty() {
            return Err(DeferError::Configuration(
                "message queue default_queue must not be empty".to_string(),
            ));
        }
        if settings.r#type == MessageQueueType::Rabbitmq {
            if settings.url.is_empty() {
                return Err(DeferError::Configuration(
                    "RabbitMQ requires an AMQP URL".to_string(),
                ));
            }
            if !settings.url.starts_with("amqp://") && !settings.url.starts_with("amqps://") {
                return Err(DeferError::Configuration(
                    "RabbitMQ URL must start with amqp:// or amqps://".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn get_type_string(queue_type: &MessageQueueType) -> &'static str {
        match queue_type {
            MessageQueueType::Rabbitmq => "rabbitmq",
            MessageQueueType::InMemory => "in_memory",
        }
    }

    pub fn parse_type_string(type_str: &str) -> DeferResult<MessageQueueType> {
        match type_str.to_lowercase().as_str() {
            "rabbitmq" => Ok(MessageQueueType::Rabbitmq),
            "in_memory" | "memory" => Ok(MessageQueueType::InMemory),
            _ => Err(DeferError::Configuration(format!(
                "unsupported message queue type: {type_str}, expected one of: rabbitmq, in_memory"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_in_memory() {
        let settings = MessageQueueSettings::default();
        let queue = MessageQueueFactory::create(&settings).await.unwrap();

        queue.publish("background", b"{}").await.unwrap();
        assert_eq!(queue.queue_size("background").await.unwrap(), 1);
    }

    #[test]
    fn test_validate_config() {
        let mut settings = MessageQueueSettings {
            r#type: MessageQueueType::Rabbitmq,
            ..MessageQueueSettings::default()
        };
        assert!(MessageQueueFactory::validate_config(&settings).is_ok());

        settings.url = "redis://localhost:6379".to_string();
        assert!(MessageQueueFactory::validate_config(&settings).is_err());

        settings.url.clear();
        assert!(MessageQueueFactory::validate_config(&settings).is_err());
    }

    #[test]
    fn test_type_strings() {
        assert_eq!(
            MessageQueueFactory::parse_type_string("RabbitMQ").unwrap(),
            MessageQueueType::Rabbitmq
        );
        assert_eq!(
            MessageQueueFactory::get_type_string(&MessageQueueType::InMemory),
            "in_memory"
        );
        assert!(MessageQueueFactory::parse_type_string("kafka").is_err());
    }
}
