//! 聊天服务核心领域模型
//!
//! 包含消息实体、值对象、内容校验规则以及错误类型。

pub mod content;
pub mod errors;
pub mod message;
pub mod value_objects;

// 重新导出常用类型
pub use errors::{DomainError, DomainResult, RepositoryError};
pub use message::{Message, MessageType};
pub use value_objects::{ConnectionId, MessageId, Timestamp, UserId, Username};
