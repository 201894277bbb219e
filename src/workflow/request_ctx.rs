//! 请求处理上下文
//!
//! 封装"我正在处理第几个请求文件"这一信息

use std::fmt::Display;

/// 请求处理上下文
///
/// 包含处理单个出题请求所需的所有上下文信息
#[derive(Debug, Clone)]
pub struct RequestCtx {
    /// 请求文件名（不含扩展名）
    pub name: String,

    /// 请求索引（仅用于日志显示）
    pub request_index: usize,

    /// 试卷包令牌
    pub quiz_token: String,
}

impl RequestCtx {
    /// 创建新的请求上下文
    pub fn new(name: impl Into<String>, request_index: usize, quiz_token: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            request_index,
            quiz_token: quiz_token.into(),
        }
    }
}

impl Display for RequestCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[请求 {} 令牌#{}]", self.name, self.quiz_token)
    }
}
