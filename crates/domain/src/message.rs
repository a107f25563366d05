use serde::{Deserialize, Serialize};

use crate::value_objects::{MessageId, Timestamp, UserId, Username};

/// 消息类型是封闭的显式标签，永远随消息一起携带，
/// 不允许在渲染时从字段是否存在反推。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    Connected,
    Disconnected,
    Broadcast,
    Whisper,
}

/// 持久化与线上可见的消息单元。
///
/// 由路由器在事件被接受的那一刻创建一次，此后不可变；
/// 持久化与投递是同一事件的两个独立效果，互不蕴含完成。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    /// 正文；在场事件（上线/下线）为空串。
    pub content: String,
    pub sender_id: UserId,
    pub sender_name: Username,
    /// 仅私聊消息携带接收方。
    pub receiver_id: Option<UserId>,
    pub receiver_name: Option<Username>,
    pub sent_at: Timestamp,
    pub message_type: MessageType,
}

impl Message {
    pub fn connected(
        id: MessageId,
        sender_id: UserId,
        sender_name: Username,
        sent_at: Timestamp,
    ) -> Self {
        Self {
            id,
            content: String::new(),
            sender_id,
            sender_name,
            receiver_id: None,
            receiver_name: None,
            sent_at,
            message_type: MessageType::Connected,
        }
    }

    pub fn disconnected(
        id: MessageId,
        sender_id: UserId,
        sender_name: Username,
        sent_at: Timestamp,
    ) -> Self {
        Self {
            id,
            content: String::new(),
            sender_id,
            sender_name,
            receiver_id: None,
            receiver_name: None,
            sent_at,
            message_type: MessageType::Disconnected,
        }
    }

    pub fn broadcast(
        id: MessageId,
        sender_id: UserId,
        sender_name: Username,
        content: String,
        sent_at: Timestamp,
    ) -> Self {
        Self {
            id,
            content,
            sender_id,
            sender_name,
            receiver_id: None,
            receiver_name: None,
            sent_at,
            message_type: MessageType::Broadcast,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn whisper(
        id: MessageId,
        sender_id: UserId,
        sender_name: Username,
        receiver_id: UserId,
        receiver_name: Username,
        content: String,
        sent_at: Timestamp,
    ) -> Self {
        Self {
            id,
            content,
            sender_id,
            sender_name,
            receiver_id: Some(receiver_id),
            receiver_name: Some(receiver_name),
            sent_at,
            message_type: MessageType::Whisper,
        }
    }

    /// 历史查询的可见性规则：无定向接收方的消息对所有人可见，
    /// 私聊只对发送方与接收方可见。
    pub fn is_visible_to(&self, user_id: UserId) -> bool {
        match self.receiver_id {
            None => true,
            Some(receiver) => receiver == user_id || self.sender_id == user_id,
        }
    }
}
