//! 集成测试支撑：在随机端口上拉起完整服务。
//!
//! 持久化网关换成内存实现，其余装配与生产组合根一致，
//! 测试不依赖任何外部服务。

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

use application::{
    ChannelMessageDeliverer, ChatService, ChatServiceDependencies, Clock, ConnectionDirectory,
    SystemClock,
};
use infrastructure::MemoryMessageRepository;
use web_api::{router, AppState, JwtConfig, JwtService};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub async fn spawn_server() -> (SocketAddr, Arc<JwtService>) {
    let directory = Arc::new(ConnectionDirectory::new());
    let deliverer = Arc::new(ChannelMessageDeliverer::new());
    let repository = Arc::new(MemoryMessageRepository::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let chat_service = ChatService::new(ChatServiceDependencies {
        directory,
        message_repository: repository,
        deliverer: deliverer.clone(),
        clock,
    });

    let jwt_service = Arc::new(JwtService::new(JwtConfig {
        secret: "integration-test-secret-key-0123456789".to_string(),
        expiration_hours: 1,
    }));

    let state = AppState::new(Arc::new(chat_service), deliverer, jwt_service.clone());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    (addr, jwt_service)
}

/// 以给定身份建立 WebSocket 连接。
pub async fn connect_user(
    addr: SocketAddr,
    jwt: &JwtService,
    user_id: Uuid,
    username: &str,
) -> WsClient {
    let token = jwt.generate_token(user_id, username).expect("token");
    let url = format!("ws://{}/api/v1/ws?access_token={}", addr, token);
    let (ws, _) = connect_async(url).await.expect("ws connect");
    ws
}

/// 取下一个 JSON 帧；超时视为测试失败。
pub async fn next_frame(ws: &mut WsClient) -> serde_json::Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(3), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("ws error");
        if let tungstenite::Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).expect("json frame");
        }
    }
}

/// 丢弃帧直到看到某人的上线广播。
/// 连接事件按注册顺序扇出，等到最后一个连接者就等于清空了之前的所有帧。
pub async fn await_presence(ws: &mut WsClient, username: &str) {
    loop {
        let frame = next_frame(ws).await;
        if frame["type"] == "message"
            && frame["message"]["type"] == "Connected"
            && frame["message"]["senderUsername"] == username
        {
            return;
        }
    }
}

pub fn broadcast_command(content: &str) -> tungstenite::Message {
    tungstenite::Message::Text(
        serde_json::json!({"type": "broadcast", "content": content})
            .to_string()
            .into(),
    )
}

pub fn whisper_command(target: &str, content: &str) -> tungstenite::Message {
    tungstenite::Message::Text(
        serde_json::json!({"type": "whisper", "target": target, "content": content})
            .to_string()
            .into(),
    )
}

/// 拉取某身份可见的历史。
pub async fn fetch_history(
    addr: SocketAddr,
    jwt: &JwtService,
    user_id: Uuid,
    username: &str,
) -> Vec<serde_json::Value> {
    let token = jwt.generate_token(user_id, username).expect("token");
    reqwest::Client::new()
        .get(format!("http://{}/api/v1/history", addr))
        .bearer_auth(token)
        .send()
        .await
        .expect("history request")
        .json::<Vec<serde_json::Value>>()
        .await
        .expect("history json")
}
