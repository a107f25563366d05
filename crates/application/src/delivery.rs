use async_trait::async_trait;
use domain::{ConnectionId, Message};
use thiserror::Error;

/// 投递给单个连接的事件。
#[derive(Debug, Clone)]
pub enum DeliveryEvent {
    /// 一条完整的消息（广播、私聊或在场事件）。
    Message(Message),
    /// 仅发给调用方连接的错误确认。
    Error(String),
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("delivery failed: {0}")]
    Failed(String),
}

impl DeliveryError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// 路由器对传输层的指令面。
///
/// 路由器决定哪些连接收到哪个载荷；真正的帧编码和套接字写入
/// 由实现方完成。投递目标恰好在投递瞬间消失（连接竞态关闭）
/// 属于稳态而不是错误。
#[async_trait]
pub trait MessageDeliverer: Send + Sync {
    /// 定向投递到一个连接。
    async fn deliver_to(
        &self,
        connection: ConnectionId,
        message: &Message,
    ) -> Result<(), DeliveryError>;

    /// 投递到进程内每一个活跃连接。
    async fn deliver_to_all(&self, message: &Message) -> Result<(), DeliveryError>;

    /// 仅向调用方连接发送错误确认。
    async fn deliver_error(
        &self,
        connection: ConnectionId,
        reason: &str,
    ) -> Result<(), DeliveryError>;
}
