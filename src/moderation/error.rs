//! 审核流程错误类型

use std::path::PathBuf;
use thiserror::Error;

/// 审核流程错误
///
/// 校验类错误由调用方输入引起，可直接返回给调用方；
/// 构造类错误表示配置或词库资源损坏，服务无法创建。
#[derive(Debug, Error)]
pub enum ModerationError {
    /// 传入的文本为空或只含空白
    #[error("待审核文本为空")]
    EmptyText,

    #[error("文件不存在: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("读取文件失败: {}: {source}", path.display())]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 正则模式编译失败
    #[error("{group} 模式无效 `{pattern}`: {source}")]
    InvalidPattern {
        group: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("敏感词库加载失败: {message}")]
    Lexicon { message: String },

    #[error("配置无效: {message}")]
    InvalidConfig { message: String },

    #[error("序列化分析结果失败: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ModerationError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn file_unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileUnreadable {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_pattern(group: &'static str, pattern: &str, source: regex::Error) -> Self {
        Self::InvalidPattern {
            group,
            pattern: pattern.to_string(),
            source,
        }
    }

    pub fn lexicon(message: impl Into<String>) -> Self {
        Self::Lexicon {
            message: message.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// 是否为调用方输入错误（而非构造期的致命错误）
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyText | Self::FileNotFound { .. } | Self::FileUnreadable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ModerationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(ModerationError::EmptyText.is_validation());
        assert!(ModerationError::file_not_found("/missing.txt").is_validation());
        assert!(!ModerationError::lexicon("bad base64").is_validation());
        assert!(!ModerationError::invalid_config("chunk size").is_validation());
    }

    #[test]
    fn test_display_includes_path() {
        let err = ModerationError::file_not_found("/books/novel.txt");
        assert!(err.to_string().contains("/books/novel.txt"));
    }
}
