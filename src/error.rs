//! Error types for card generation

use serde::Serialize;
use thiserror::Error;

/// Result type alias for card operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while validating a request or rendering a card.
///
/// Metadata fetch failures are deliberately absent: the resolver absorbs
/// them and falls back to placeholder text (see [`crate::metadata`]).
#[derive(Error, Debug)]
pub enum Error {
    /// No URL was supplied
    #[error("请提供有效的 URL")]
    MissingUrl,

    /// No style id was supplied
    #[error("请选择卡片样式")]
    MissingStyle,

    /// The URL could not be parsed or uses an unsupported scheme
    #[error("请输入正确的网页链接格式，例如：example.com ({0})")]
    InvalidUrl(String),

    /// The hostname does not look like a public domain name
    #[error("请输入有效的网页链接，域名格式不正确: {0}")]
    InvalidHost(String),

    /// A custom title or description exceeds its character limit
    #[error("{field} 不能超过 {max} 个字符")]
    OverrideTooLong { field: &'static str, max: usize },

    /// The requested style id is not registered
    #[error("不支持的样式: {0}")]
    UnknownStyle(String),

    /// Failed to initialize fonts, clients or worker threads
    #[error("初始化失败: {0}")]
    InitializationError(String),

    /// Font loading or glyph access failed
    #[error("生成图片时出错：字体错误: {0}")]
    FontError(String),

    /// QR symbol generation failed
    #[error("生成图片时出错：二维码错误: {0}")]
    QrError(String),

    /// A drawing operation failed
    #[error("生成图片时出错：{0}")]
    RenderError(String),

    /// PNG encoding failed
    #[error("生成图片时出错：编码失败: {0}")]
    EncodeError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Machine-distinguishable failure category for outer layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    Validation,
    UnreachableStyle,
    RenderFailure,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::UnreachableStyle => "unreachable-style",
            ErrorCategory::RenderFailure => "render-failure",
        }
    }
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MissingUrl
            | Error::MissingStyle
            | Error::InvalidUrl(_)
            | Error::InvalidHost(_)
            | Error::OverrideTooLong { .. } => ErrorCategory::Validation,
            Error::UnknownStyle(_) => ErrorCategory::UnreachableStyle,
            Error::InitializationError(_)
            | Error::FontError(_)
            | Error::QrError(_)
            | Error::RenderError(_)
            | Error::EncodeError(_)
            | Error::Other(_) => ErrorCategory::RenderFailure,
        }
    }

    /// Whether the caller is at fault (maps to a 4xx-style response).
    pub fn is_client_error(&self) -> bool {
        self.category() != ErrorCategory::RenderFailure
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            category: self.category(),
        }
    }
}

/// Structured error payload: a human-readable message plus its category.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub category: ErrorCategory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_split_client_and_server_errors() {
        assert_eq!(Error::MissingUrl.category(), ErrorCategory::Validation);
        assert_eq!(Error::MissingStyle.category(), ErrorCategory::Validation);
        assert_eq!(
            Error::UnknownStyle("neon".into()).category(),
            ErrorCategory::UnreachableStyle
        );
        assert!(Error::UnknownStyle("neon".into()).is_client_error());
        assert!(!Error::RenderError("boom".into()).is_client_error());
    }

    #[test]
    fn error_body_serializes_kebab_case_category() {
        let body = Error::UnknownStyle("neon".into()).to_body();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["category"], "unreachable-style");
        assert!(json["error"].as_str().unwrap().contains("neon"));
    }

    #[test]
    fn render_errors_carry_underlying_message() {
        let err = Error::EncodeError("disk full".into());
        assert!(err.to_string().starts_with("生成图片时出错："));
        assert!(err.to_string().contains("disk full"));
    }
}
