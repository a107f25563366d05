use std::sync::Arc;

use application::{ChannelMessageDeliverer, ChatService};

use crate::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ChatService>,
    /// 具体的通道投递器：WebSocket 层需要在这里注册/注销发送端
    pub deliverer: Arc<ChannelMessageDeliverer>,
    pub jwt_service: Arc<JwtService>,
}

impl AppState {
    pub fn new(
        chat_service: Arc<ChatService>,
        deliverer: Arc<ChannelMessageDeliverer>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            chat_service,
            deliverer,
            jwt_service,
        }
    }
}
