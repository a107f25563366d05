//! 消息内容门禁
//!
//! 正文只允许表情码点和空白字符；修剪后为空的输入一律拒绝。
//! 这是一个纯函数，不产生 I/O，也不抛错。

/// 判断字符是否属于允许的表情标量。
///
/// 覆盖常用表情区块以及组成序列所需的组合字符：
/// 肤色修饰符落在 1F3FB..=1F3FF（杂项符号与图形区块内），
/// 旗帜由区域指示符组成，ZWJ/VS16/键帽组合符让家庭、
/// 红心、数字键帽这类序列能够整体通过。
fn is_emoji_scalar(c: char) -> bool {
    matches!(
        u32::from(c),
        0x1F300..=0x1F5FF // 杂项符号与图形（含肤色修饰符）
            | 0x1F600..=0x1F64F // 表情符号
            | 0x1F680..=0x1F6FF // 交通与地图
            | 0x1F900..=0x1F9FF // 补充符号与图形
            | 0x1FA70..=0x1FAFF // 扩展符号与图形 A
            | 0x2600..=0x26FF // 杂项符号
            | 0x2700..=0x27BF // 装饰符号
            | 0x1F1E6..=0x1F1FF // 区域指示符（旗帜）
            | 0x2B05..=0x2B55 // 箭头、星形等零散表情
            | 0x200D // 零宽连接符
            | 0xFE0F // 变体选择符-16
            | 0x20E3 // 键帽组合符
    )
}

/// 正文是否可以成为一条消息。
pub fn is_acceptable(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    text.chars().all(|c| c.is_whitespace() || is_emoji_scalar(c))
}
