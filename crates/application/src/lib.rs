//! 应用层实现。
//!
//! 这里提供在线目录与消息路由的用例服务，处理内容校验、
//! 扇出目标选择，以及对外部适配器（持久化网关、传输投递）的抽象。

pub mod channel_delivery;
pub mod clock;
pub mod delivery;
pub mod directory;
pub mod dto;
pub mod error;
pub mod identity;
pub mod repository;
pub mod services;

pub use channel_delivery::ChannelMessageDeliverer;
pub use clock::{Clock, SystemClock};
pub use delivery::{DeliveryError, DeliveryEvent, MessageDeliverer};
pub use directory::ConnectionDirectory;
pub use dto::MessageDto;
pub use error::ApplicationError;
pub use identity::Principal;
pub use repository::MessageRepository;
pub use services::{ChatService, ChatServiceDependencies, HISTORY_PAGE_SIZE};
