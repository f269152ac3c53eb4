//! Requires Docker. Run with `cargo test -- --ignored`.

use anyhow::Result;
use defer_core::{
    config::{MessageQueueSettings, MessageQueueType},
    Capture, MessageQueue,
};
use defer_infrastructure::{MessageQueueFactory, RabbitMQMessageQueue};
use defer_testing_utils::RabbitMqTestContainer;
use tokio::time::{sleep, Duration};

fn settings(broker: &RabbitMqTestContainer) -> MessageQueueSettings {
    MessageQueueSettings {
        r#type: MessageQueueType::Rabbitmq,
        url: broker.url.clone(),
        default_queue: "background_test".to_string(),
        ..MessageQueueSettings::default()
    }
}

#[tokio::test]
#[ignore]
async fn test_rabbitmq_publish_and_consume_capture() -> Result<()> {
    let broker = RabbitMqTestContainer::new().await?;
    let queue = MessageQueueFactory::create(&settings(&broker)).await?;

    let capture = Capture::task("log").with_args(vec![serde_json::json!("hello")]);
    queue.publish("background_test", &capture.to_json()?).await?;
    sleep(Duration::from_millis(200)).await;

    assert_eq!(queue.queue_size("background_test").await?, 1);

    let payload = queue.consume("background_test").await?.expect("message");
    assert_eq!(Capture::from_json(&payload)?, capture);
    assert!(queue.consume("background_test").await?.is_none());
    Ok(())
}

#[tokio::test]
#[ignore]
async fn test_rabbitmq_missing_queue_is_empty() -> Result<()> {
    let broker = RabbitMqTestContainer::new().await?;
    let queue = RabbitMQMessageQueue::new(settings(&broker)).await?;

    assert!(queue.is_connected());
    assert_eq!(queue.queue_size("does_not_exist").await?, 0);

    queue.close().await?;
    Ok(())
}

#[tokio::test]
#[ignore]
async fn test_rabbitmq_publish_declares_other_queues() -> Result<()> {
    let broker = RabbitMqTestContainer::new().await?;
    let queue = RabbitMQMessageQueue::new(settings(&broker)).await?;

    let capture = Capture::task("log");
    queue.publish("mail", &capture.to_json()?).await?;
    sleep(Duration::from_millis(200)).await;

    assert_eq!(queue.queue_size("mail").await?, 1);
    let payload = queue.consume("mail").await?.expect("message");
    assert_eq!(Capture::from_json(&payload)?, capture);

    queue.close().await?;
    Ok(())
}
