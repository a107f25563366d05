//! 消息持久化网关的 PostgreSQL 实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

use application::MessageRepository;
use domain::{Message, MessageId, MessageType, RepositoryError, UserId, Username};

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    RepositoryError::storage(err.to_string())
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

fn message_type_to_column(message_type: MessageType) -> &'static str {
    match message_type {
        MessageType::Connected => "connected",
        MessageType::Disconnected => "disconnected",
        MessageType::Broadcast => "broadcast",
        MessageType::Whisper => "whisper",
    }
}

fn message_type_from_column(value: &str) -> Result<MessageType, RepositoryError> {
    match value {
        "connected" => Ok(MessageType::Connected),
        "disconnected" => Ok(MessageType::Disconnected),
        "broadcast" => Ok(MessageType::Broadcast),
        "whisper" => Ok(MessageType::Whisper),
        other => Err(invalid_data(format!("unknown message type: {other}"))),
    }
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: Uuid,
    content: String,
    sender_user_id: Uuid,
    sender_username: String,
    receiver_user_id: Option<Uuid>,
    receiver_username: Option<String>,
    sent_at: DateTime<Utc>,
    message_type: String,
}

impl TryFrom<MessageRecord> for Message {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let sender_name = Username::parse(value.sender_username)
            .map_err(|err| invalid_data(err.to_string()))?;
        let receiver_name = value
            .receiver_username
            .map(Username::parse)
            .transpose()
            .map_err(|err| invalid_data(err.to_string()))?;
        let message_type = message_type_from_column(&value.message_type)?;

        Ok(Message {
            id: MessageId::from(value.id),
            content: value.content,
            sender_id: UserId::from(value.sender_user_id),
            sender_name,
            receiver_id: value.receiver_user_id.map(UserId::from),
            receiver_name,
            sent_at: value.sent_at,
            message_type,
        })
    }
}

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn append(&self, message: Message) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO messages (id, content, sender_user_id, sender_username, receiver_user_id, receiver_username, sent_at, message_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::from(message.id))
        .bind(&message.content)
        .bind(Uuid::from(message.sender_id))
        .bind(message.sender_name.as_str())
        .bind(message.receiver_id.map(Uuid::from))
        .bind(message.receiver_name.as_ref().map(|name| name.as_str()))
        .bind(message.sent_at)
        .bind(message_type_to_column(message.message_type))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(())
    }

    async fn recent_for(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<Message>, RepositoryError> {
        // 可见性过滤放在查询里：第三方之间的私聊从不离开数据库
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, content, sender_user_id, sender_username, receiver_user_id, receiver_username, sent_at, message_type
            FROM messages
            WHERE receiver_user_id IS NULL OR receiver_user_id = $1 OR sender_user_id = $1
            ORDER BY sent_at DESC
            LIMIT $2
            "#,
        )
        .bind(Uuid::from(user_id))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Message::try_from).collect()
    }
}

/// 创建 PostgreSQL 连接池。
pub async fn create_pg_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(message_type: &str, receiver: Option<(&str, Uuid)>) -> MessageRecord {
        MessageRecord {
            id: Uuid::new_v4(),
            content: "😀".to_owned(),
            sender_user_id: Uuid::new_v4(),
            sender_username: "alice".to_owned(),
            receiver_user_id: receiver.map(|(_, id)| id),
            receiver_username: receiver.map(|(name, _)| name.to_owned()),
            sent_at: Utc::now(),
            message_type: message_type.to_owned(),
        }
    }

    #[test]
    fn whisper_record_round_trips() {
        let receiver_id = Uuid::new_v4();
        let message = Message::try_from(record("whisper", Some(("bob", receiver_id)))).unwrap();
        assert_eq!(message.message_type, MessageType::Whisper);
        assert_eq!(message.receiver_id, Some(UserId::from(receiver_id)));
        assert_eq!(message.receiver_name.unwrap().as_str(), "bob");
    }

    #[test]
    fn broadcast_record_has_no_receiver() {
        let message = Message::try_from(record("broadcast", None)).unwrap();
        assert_eq!(message.message_type, MessageType::Broadcast);
        assert!(message.receiver_id.is_none());
    }

    #[test]
    fn unknown_type_column_is_a_storage_error() {
        assert!(Message::try_from(record("carrier-pigeon", None)).is_err());
    }

    #[test]
    fn type_column_mapping_is_stable() {
        for message_type in [
            MessageType::Connected,
            MessageType::Disconnected,
            MessageType::Broadcast,
            MessageType::Whisper,
        ] {
            let column = message_type_to_column(message_type);
            assert_eq!(message_type_from_column(column).unwrap(), message_type);
        }
    }
}
