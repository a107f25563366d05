use async_trait::async_trait;
use domain::{Message, RepositoryError, UserId};

/// 消息持久化网关。
///
/// 路由器对每条被接受的消息恰好追加一次；写入失败由调用方记录日志，
/// 绝不沿投递路径向外传播。
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// 追加一条消息到持久化日志。
    async fn append(&self, message: Message) -> Result<(), RepositoryError>;

    /// 取请求者可见的最近消息，新的在前。
    /// 可见性过滤必须发生在查询本身，不允许先取全集再过滤。
    async fn recent_for(&self, user_id: UserId, limit: u32)
        -> Result<Vec<Message>, RepositoryError>;
}
