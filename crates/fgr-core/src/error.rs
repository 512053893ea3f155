//! 错误定义模块

use thiserror::Error;

/// FGR系统统一错误类型
#[derive(Error, Debug)]
pub enum FgrError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("缺少必填字段: {0}")]
    MissingField(&'static str),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("导出错误: {0}")]
    Export(String),
}

/// FGR系统统一结果类型
pub type Result<T> = std::result::Result<T, FgrError>;
