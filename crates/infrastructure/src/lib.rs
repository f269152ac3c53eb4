pub mod disk_queue;
pub mod in_memory_queue;
pub mod message_queue;
pub mod message_queue_factory;
pub mod timeout_handler;

pub use disk_queue::{ClaimedFile, DiskQueue};
pub use in_memory_queue::{InMemoryMessageQueue, InMemoryQueueConfig};
pub use message_queue::RabbitMQMessageQueue;
pub use message_queue_factory::MessageQueueFactory;
pub use timeout_handler::{TimeoutConfig, TimeoutHandler};
