use axum::{
    extract::{Query, State, WebSocketUpgrade},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use application::MessageDto;

use crate::{
    auth::resolve_principal,
    error::ApiError,
    state::AppState,
    ws_connection::WsConnection,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_routes())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/history", get(get_history))
        .route("/ws", get(websocket_upgrade))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn get_history(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let principal = state.jwt_service.principal_from_headers(&headers)?;
    let items = state.chat_service.recent_history(&principal).await?;

    Ok(Json(items.iter().map(MessageDto::from).collect()))
}

#[derive(Debug, Deserialize)]
struct WsQuery {
    /// WebSocket 握手无法携带 Authorization header，
    /// 令牌走查询参数
    access_token: String,
}

async fn websocket_upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    // 身份解析失败直接拒绝升级，连接不会被登记
    let claims = state.jwt_service.verify_token(&query.access_token)?;
    let principal = resolve_principal(claims)?;

    Ok(ws.on_upgrade(move |socket| WsConnection::new(socket, state, principal).run()))
}
