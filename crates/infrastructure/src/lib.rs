//! 基础设施层。
//!
//! 持久化网关的 PostgreSQL 实现，以及测试与本地开发用的内存实现。

pub mod memory;
pub mod repository;

pub use memory::MemoryMessageRepository;
pub use repository::{create_pg_pool, PgMessageRepository};
