use domain::{UserId, Username};

/// 身份解析器的输出：一个已认证的稳定身份加显示名。
///
/// 由认证边界（JWT claims）解析而来；解析失败会直接拒绝连接，
/// 不会出现携带残缺身份的 Principal。
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: UserId,
    pub username: Username,
}

impl Principal {
    pub fn new(user_id: UserId, username: Username) -> Self {
        Self { user_id, username }
    }
}
