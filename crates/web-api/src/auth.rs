//! JWT 认证与身份解析模块
//!
//! 令牌签发属于外部身份提供方；这里只做校验，外加把 claims
//! 解析成 Principal 的身份解析器。`generate_token` 留给开发
//! 工具和集成测试造令牌用。

use axum::http::HeaderMap;
use config::JwtConfig;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use application::Principal;
use domain::{UserId, Username};

use crate::error::ApiError;

/// JWT Claims 结构，声明名与身份提供方保持一致
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// 稳定用户标识
    pub sub: Uuid,
    /// 显示名
    pub preferred_username: String,
    /// 过期时间 (Unix timestamp)
    pub exp: i64,
}

/// JWT Token 服务
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_ref());
        let decoding_key = DecodingKey::from_secret(config.secret.as_ref());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 生成 JWT token（开发与测试用）
    pub fn generate_token(&self, user_id: Uuid, username: &str) -> Result<String, ApiError> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::hours(self.config.expiration_hours);

        let claims = Claims {
            sub: user_id,
            preferred_username: username.to_owned(),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| ApiError::unauthorized(format!("Token generation failed: {}", err)))
    }

    /// 验证并解析 JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|token_data| token_data.claims)
            .map_err(|err| ApiError::unauthorized(format!("Invalid token: {}", err)))
    }

    /// 从 Authorization header 解析出已认证身份
    pub fn principal_from_headers(&self, headers: &HeaderMap) -> Result<Principal, ApiError> {
        let auth_header = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Invalid authorization header format"))?;

        let claims = self.verify_token(token)?;
        resolve_principal(claims)
    }
}

/// 身份解析器：从 claims 提取稳定标识与显示名。
/// 任一声明缺失或非法都会让整个连接建立失败。
pub fn resolve_principal(claims: Claims) -> Result<Principal, ApiError> {
    let username = Username::parse(claims.preferred_username)
        .map_err(|err| ApiError::unauthorized(format!("Invalid username claim: {}", err)))?;
    Ok(Principal::new(UserId::from(claims.sub), username))
}
