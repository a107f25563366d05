//! 对外数据传输对象
//!
//! 线格式与历史接口、WebSocket 帧共用，字段名保持 camelCase。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain::{Message, MessageType, Timestamp};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: Uuid,
    pub content: String,
    pub sender_user_id: Uuid,
    pub sender_username: String,
    pub receiver_user_id: Option<Uuid>,
    pub receiver_username: Option<String>,
    pub sent_at_utc: Timestamp,
    #[serde(rename = "type")]
    pub message_type: MessageType,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.into(),
            content: message.content.clone(),
            sender_user_id: message.sender_id.into(),
            sender_username: message.sender_name.to_string(),
            receiver_user_id: message.receiver_id.map(Uuid::from),
            receiver_username: message.receiver_name.as_ref().map(|name| name.to_string()),
            sent_at_utc: message.sent_at,
            message_type: message.message_type,
        }
    }
}
