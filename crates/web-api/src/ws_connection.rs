//! WebSocket 连接生命周期
//!
//! 封装单个 WebSocket 连接的全部状态和逻辑：
//! - 在投递器注册/注销本连接的发送端
//! - 连接/断开事件上报路由服务
//! - 客户端指令解析与分发
//! - 服务端事件帧的序列化下发

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use application::{DeliveryEvent, MessageDeliverer, MessageDto, Principal};
use domain::ConnectionId;

use crate::state::AppState;

/// 客户端 → 服务端指令
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum ClientCommand {
    /// 群发
    Broadcast { content: String },
    /// 私聊，按显示名寻址
    Whisper { target: String, content: String },
}

/// 服务端 → 客户端帧
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum ServerFrame {
    Message { message: MessageDto },
    Error { message: String },
}

impl From<DeliveryEvent> for ServerFrame {
    fn from(event: DeliveryEvent) -> Self {
        match event {
            DeliveryEvent::Message(message) => ServerFrame::Message {
                message: MessageDto::from(&message),
            },
            DeliveryEvent::Error(message) => ServerFrame::Error { message },
        }
    }
}

pub struct WsConnection {
    socket: WebSocket,
    state: AppState,
    principal: Principal,
    connection_id: ConnectionId,
}

impl WsConnection {
    pub fn new(socket: WebSocket, state: AppState, principal: Principal) -> Self {
        Self {
            socket,
            state,
            principal,
            connection_id: ConnectionId::generate(),
        }
    }

    /// 运行连接主循环，直到客户端断开（优雅或异常）。
    pub async fn run(self) {
        let Self {
            socket,
            state,
            principal,
            connection_id,
        } = self;

        let (events_tx, mut events_rx) = mpsc::unbounded_channel::<DeliveryEvent>();

        // 先注册发送端，再上报连接事件：上线广播必须能回到本连接
        state.deliverer.register_sender(connection_id, events_tx);
        state.chat_service.connect(&principal, connection_id).await;

        let (mut sender, mut incoming) = socket.split();

        // 发送任务：把投递事件编码成 JSON 帧写入套接字
        let send_task = tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                let frame = ServerFrame::from(event);
                let payload = match serde_json::to_string(&frame) {
                    Ok(json) => json,
                    Err(err) => {
                        tracing::warn!(error = %err, "failed to serialize websocket frame");
                        continue;
                    }
                };
                if sender.send(WsMessage::Text(payload.into())).await.is_err() {
                    break;
                }
            }
        });

        // 接收循环：逐条处理客户端指令，单连接内自然串行
        while let Some(Ok(message)) = incoming.next().await {
            match message {
                WsMessage::Text(text) => {
                    match serde_json::from_str::<ClientCommand>(text.as_str()) {
                        Ok(ClientCommand::Broadcast { content }) => {
                            state
                                .chat_service
                                .send_broadcast(&principal, connection_id, content)
                                .await;
                        }
                        Ok(ClientCommand::Whisper { target, content }) => {
                            state
                                .chat_service
                                .send_whisper(&principal, connection_id, &target, content)
                                .await;
                        }
                        Err(err) => {
                            tracing::debug!(connection = %connection_id, error = %err, "malformed client frame");
                            let _ = state
                                .deliverer
                                .deliver_error(connection_id, "Unrecognized command.")
                                .await;
                        }
                    }
                }
                WsMessage::Close(_) => break,
                // 协议层 ping/pong 由底层自动应答
                _ => {}
            }
        }

        // 注销发送端会让发送任务的通道走空并退出
        state.deliverer.unregister_sender(connection_id);
        state.chat_service.disconnect(&principal, connection_id).await;

        let _ = send_task.await;
    }
}
