// 进程内的通道投递器实现
use async_trait::async_trait;
use dashmap::DashMap;
use domain::{ConnectionId, Message};
use tokio::sync::mpsc;

use crate::delivery::{DeliveryError, DeliveryEvent, MessageDeliverer};

/// 基于每连接 mpsc 通道的投递器。
///
/// 传输层在 WebSocket 升级后注册自己的发送端，断开时注销；
/// 路由器只认 ConnectionId，不触碰套接字。
#[derive(Default)]
pub struct ChannelMessageDeliverer {
    senders: DashMap<ConnectionId, mpsc::UnboundedSender<DeliveryEvent>>,
}

impl ChannelMessageDeliverer {
    pub fn new() -> Self {
        Self {
            senders: DashMap::new(),
        }
    }

    /// 注册连接的发送端。
    pub fn register_sender(
        &self,
        connection: ConnectionId,
        sender: mpsc::UnboundedSender<DeliveryEvent>,
    ) {
        self.senders.insert(connection, sender);
    }

    /// 注销连接的发送端。
    pub fn unregister_sender(&self, connection: ConnectionId) {
        self.senders.remove(&connection);
    }

    fn send(&self, connection: ConnectionId, event: DeliveryEvent) {
        match self.senders.get(&connection) {
            Some(sender) => {
                if sender.send(event).is_err() {
                    // 接收端已经被丢弃：连接正在收尾
                    tracing::debug!(connection = %connection, "connection channel closed, dropping event");
                }
            }
            None => {
                // 目标连接在投递前断开，这是在场数据的正常竞态
                tracing::debug!(connection = %connection, "no sender registered, dropping event");
            }
        }
    }
}

#[async_trait]
impl MessageDeliverer for ChannelMessageDeliverer {
    async fn deliver_to(
        &self,
        connection: ConnectionId,
        message: &Message,
    ) -> Result<(), DeliveryError> {
        self.send(connection, DeliveryEvent::Message(message.clone()));
        Ok(())
    }

    async fn deliver_to_all(&self, message: &Message) -> Result<(), DeliveryError> {
        let mut failed = 0usize;
        for entry in self.senders.iter() {
            if entry
                .value()
                .send(DeliveryEvent::Message(message.clone()))
                .is_err()
            {
                failed += 1;
            }
        }
        if failed > 0 {
            tracing::warn!(failed, message_id = %message.id, "broadcast skipped closed connections");
        }
        Ok(())
    }

    async fn deliver_error(
        &self,
        connection: ConnectionId,
        reason: &str,
    ) -> Result<(), DeliveryError> {
        self.send(connection, DeliveryEvent::Error(reason.to_owned()));
        Ok(())
    }
}
