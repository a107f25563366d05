//! 内存实现的消息仓库（用于测试和本地开发）

use async_trait::async_trait;
use tokio::sync::RwLock;

use application::MessageRepository;
use domain::{Message, RepositoryError, UserId};

#[derive(Default)]
pub struct MemoryMessageRepository {
    messages: RwLock<Vec<Message>>,
}

impl MemoryMessageRepository {
    pub fn new() -> Self {
        Self {
            messages: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MessageRepository for MemoryMessageRepository {
    async fn append(&self, message: Message) -> Result<(), RepositoryError> {
        self.messages.write().await.push(message);
        Ok(())
    }

    async fn recent_for(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<Message>, RepositoryError> {
        let messages = self.messages.read().await;
        let mut visible: Vec<Message> = messages
            .iter()
            .filter(|message| message.is_visible_to(user_id))
            .cloned()
            .collect();
        visible.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        visible.truncate(limit as usize);
        Ok(visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use domain::{MessageId, Username};
    use uuid::Uuid;

    fn identity(name: &str) -> (UserId, Username) {
        (UserId::from(Uuid::new_v4()), Username::parse(name).unwrap())
    }

    #[tokio::test]
    async fn third_party_never_sees_a_whisper() {
        let repository = MemoryMessageRepository::new();
        let (bob_id, bob) = identity("bob");
        let (carol_id, carol) = identity("carol");
        let (alice_id, _) = identity("alice");

        repository
            .append(Message::whisper(
                MessageId::generate(),
                bob_id,
                bob,
                carol_id,
                carol,
                "🤫".to_owned(),
                Utc::now(),
            ))
            .await
            .unwrap();

        assert!(repository.recent_for(alice_id, 50).await.unwrap().is_empty());
        assert_eq!(repository.recent_for(bob_id, 50).await.unwrap().len(), 1);
        assert_eq!(repository.recent_for(carol_id, 50).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn history_is_newest_first_and_capped() {
        let repository = MemoryMessageRepository::new();
        let (alice_id, alice) = identity("alice");
        let start = Utc::now();

        for i in 0..3 {
            repository
                .append(Message::broadcast(
                    MessageId::generate(),
                    alice_id,
                    alice.clone(),
                    "👍".to_owned(),
                    start + Duration::seconds(i),
                ))
                .await
                .unwrap();
        }

        let history = repository.recent_for(alice_id, 2).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].sent_at > history[1].sent_at);
    }
}
