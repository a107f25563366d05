//! 消息路由器
//!
//! 管理单条连接的生命周期（连接、断开）和单条消息的
//! 接受与投递（广播、私聊、历史查询）。

use std::collections::HashSet;
use std::sync::Arc;

use domain::{content, ConnectionId, Message, MessageId};

use crate::{
    clock::Clock,
    delivery::MessageDeliverer,
    directory::ConnectionDirectory,
    error::ApplicationError,
    identity::Principal,
    repository::MessageRepository,
};

/// 历史查询的固定页大小。
pub const HISTORY_PAGE_SIZE: u32 = 50;

const BROADCAST_REJECTED: &str = "Message must contain only emojis and whitespace.";
const WHISPER_REJECTED: &str = "Whisper must contain only emojis and whitespace.";

pub struct ChatServiceDependencies {
    pub directory: Arc<ConnectionDirectory>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub deliverer: Arc<dyn MessageDeliverer>,
    pub clock: Arc<dyn Clock>,
}

pub struct ChatService {
    deps: ChatServiceDependencies,
}

impl ChatService {
    pub fn new(deps: ChatServiceDependencies) -> Self {
        Self { deps }
    }

    /// 连接建立：登记目录，合成上线消息，持久化并广播给
    /// 进程内所有连接（包括新连接自己）。
    pub async fn connect(&self, principal: &Principal, connection: ConnectionId) {
        self.deps.directory.register_connection(
            principal.user_id,
            principal.username.clone(),
            connection,
        );

        tracing::info!(
            user_id = %principal.user_id,
            username = %principal.username,
            connection = %connection,
            "用户连接"
        );

        let message = Message::connected(
            MessageId::generate(),
            principal.user_id,
            principal.username.clone(),
            self.deps.clock.now(),
        );
        self.persist_and_broadcast(message).await;
    }

    /// 连接断开：优雅或异常断开都会走到这里。目录注销是幂等的。
    pub async fn disconnect(&self, principal: &Principal, connection: ConnectionId) {
        self.deps
            .directory
            .unregister_connection(principal.user_id, connection);

        tracing::info!(
            user_id = %principal.user_id,
            username = %principal.username,
            connection = %connection,
            "用户断开"
        );

        let message = Message::disconnected(
            MessageId::generate(),
            principal.user_id,
            principal.username.clone(),
            self.deps.clock.now(),
        );
        self.persist_and_broadcast(message).await;
    }

    /// 群发。内容不过门禁时只给调用方回错误确认，
    /// 不持久化、不扇出。
    pub async fn send_broadcast(
        &self,
        principal: &Principal,
        connection: ConnectionId,
        text: String,
    ) {
        if !content::is_acceptable(&text) {
            self.acknowledge_error(connection, BROADCAST_REJECTED).await;
            return;
        }

        tracing::info!(username = %principal.username, content = %text, "用户群发消息");

        let message = Message::broadcast(
            MessageId::generate(),
            principal.user_id,
            principal.username.clone(),
            text,
            self.deps.clock.now(),
        );
        self.persist_and_broadcast(message).await;
    }

    /// 私聊。扇出目标是接收方与发送方两个身份的连接集合之并，
    /// 其余连接绝不会收到；消息无论接收方有几条连接都只追加一次。
    pub async fn send_whisper(
        &self,
        principal: &Principal,
        connection: ConnectionId,
        target_name: &str,
        text: String,
    ) {
        if !content::is_acceptable(&text) {
            self.acknowledge_error(connection, WHISPER_REJECTED).await;
            return;
        }

        let Some((receiver_id, receiver_name)) = self.deps.directory.identity_for(target_name)
        else {
            self.acknowledge_error(connection, &format!("User '{target_name}' not found."))
                .await;
            return;
        };

        tracing::info!(
            sender = %principal.username,
            receiver = %receiver_name,
            content = %text,
            "用户发送私聊"
        );

        let message = Message::whisper(
            MessageId::generate(),
            principal.user_id,
            principal.username.clone(),
            receiver_id,
            receiver_name,
            text,
            self.deps.clock.now(),
        );

        // 在解析与投递之间接收方可能已经下线：快照为空也照常持久化，
        // 发送方仍然拿到自己的副本，不视为错误。
        let mut targets: HashSet<ConnectionId> = self.deps.directory.connections_for(receiver_id);
        targets.extend(self.deps.directory.connections_for(principal.user_id));

        let persist = self.persist_best_effort(&message);
        let fanout = async {
            for target in &targets {
                if let Err(err) = self.deps.deliverer.deliver_to(*target, &message).await {
                    tracing::warn!(connection = %target, error = %err, "whisper delivery failed");
                }
            }
        };
        tokio::join!(persist, fanout);
    }

    /// 请求者可见的最近历史，新的在前，固定 50 条。
    pub async fn recent_history(
        &self,
        principal: &Principal,
    ) -> Result<Vec<Message>, ApplicationError> {
        let messages = self
            .deps
            .message_repository
            .recent_for(principal.user_id, HISTORY_PAGE_SIZE)
            .await?;
        Ok(messages)
    }

    /// 持久化与全员广播并发执行；两者都尝试过，操作才算完成。
    async fn persist_and_broadcast(&self, message: Message) {
        let persist = self.persist_best_effort(&message);
        let fanout = async {
            if let Err(err) = self.deps.deliverer.deliver_to_all(&message).await {
                tracing::warn!(message_id = %message.id, error = %err, "fanout failed");
            }
        };
        tokio::join!(persist, fanout);
    }

    /// 持久化失败只记日志，绝不打断投递：服务降级为非持久模式
    /// 继续提供实时通信。
    async fn persist_best_effort(&self, message: &Message) {
        if let Err(err) = self.deps.message_repository.append(message.clone()).await {
            tracing::error!(message_id = %message.id, error = %err, "消息持久化失败");
        }
    }

    async fn acknowledge_error(&self, connection: ConnectionId, reason: &str) {
        if let Err(err) = self.deps.deliverer.deliver_error(connection, reason).await {
            tracing::warn!(connection = %connection, error = %err, "error acknowledgement failed");
        }
    }
}
