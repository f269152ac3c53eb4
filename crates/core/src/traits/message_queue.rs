use async_trait::async_trait;

use crate::DeferResult;

/// 消息队列抽象接口
///
/// The publish side is all the `message_queue` handler needs; `consume` and
/// the queue management calls serve the consumer worker and tests.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// 发布消息到指定队列
    async fn publish(&self, queue: &str, payload: &[u8]) -> DeferResult<()>;

    /// 从指定队列取出一条消息，队列为空时返回 `None`
    async fn consume(&self, queue: &str) -> DeferResult<Option<Vec<u8>>>;

    /// 创建队列
    async fn create_queue(&self, queue: &str, durable: bool) -> DeferResult<()>;

    /// 获取队列中的消息数量
    async fn queue_size(&self, queue: &str) -> DeferResult<u32>;
}
