//! 在线目录
//!
//! 进程内权威的 "谁在线、在哪些连接上、用什么名字" 记录。
//! 双向索引：身份 → 连接集合，显示名 → 身份。
//! 由组合根显式构造并注入，测试中可以并存多个实例。

use std::collections::HashSet;

use dashmap::DashMap;
use domain::{ConnectionId, UserId, Username};

struct UserPresence {
    username: Username,
    connections: HashSet<ConnectionId>,
}

/// 连接目录。所有操作都是同步的哈希查找，不做任何 I/O，
/// 在无限并发调用下安全（DashMap 分片锁，没有全局大锁）。
///
/// 这是在场数据而不是账本：读到的快照允许在返回后立即过期。
#[derive(Default)]
pub struct ConnectionDirectory {
    presences: DashMap<UserId, UserPresence>,
    names: DashMap<String, UserId>,
}

impl ConnectionDirectory {
    pub fn new() -> Self {
        Self {
            presences: DashMap::new(),
            names: DashMap::new(),
        }
    }

    /// 注册一个连接。集合语义，同一句柄重复注册是幂等的。
    ///
    /// 显示名映射采用最后注册者获胜：不同身份先后用同一显示名
    /// 注册时，目录不做任何抵抗。
    pub fn register_connection(
        &self,
        user_id: UserId,
        username: Username,
        connection: ConnectionId,
    ) {
        {
            let mut presence = self.presences.entry(user_id).or_insert_with(|| UserPresence {
                username: username.clone(),
                connections: HashSet::new(),
            });
            presence.username = username.clone();
            presence.connections.insert(connection);
        }
        self.names.insert(username.as_str().to_owned(), user_id);
    }

    /// 注销一个连接。未知句柄是空操作，不是错误。
    /// 最后一个连接关闭时移除整个身份，并且仅当显示名映射
    /// 仍指向该身份时才一并摘除（名字可能已被别人接管）。
    pub fn unregister_connection(&self, user_id: UserId, connection: ConnectionId) {
        let mut drained_name = None;
        if let Some(mut presence) = self.presences.get_mut(&user_id) {
            presence.connections.remove(&connection);
            if presence.connections.is_empty() {
                drained_name = Some(presence.username.clone());
            }
        }

        if let Some(username) = drained_name {
            self.presences
                .remove_if(&user_id, |_, presence| presence.connections.is_empty());
            self.names
                .remove_if(username.as_str(), |_, owner| *owner == user_id);
        }
    }

    /// 某身份当前的连接快照；离线时为空集合。
    pub fn connections_for(&self, user_id: UserId) -> HashSet<ConnectionId> {
        self.presences
            .get(&user_id)
            .map(|presence| presence.connections.clone())
            .unwrap_or_default()
    }

    /// 按显示名解析身份。查不到是预期结果（离线或未知用户），
    /// 不是错误。返回目录中登记的规范显示名。
    pub fn identity_for(&self, username: &str) -> Option<(UserId, Username)> {
        let user_id = *self.names.get(username)?;
        let registered = self.presences.get(&user_id)?.username.clone();
        Some((user_id, registered))
    }
}
