// ==========================================
// 渗透测试报告生成系统 - 统一错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: 配置错误 / 解析错误 / IO 错误
// ==========================================

use std::path::Path;
use thiserror::Error;

/// 报告生成错误类型
#[derive(Error, Debug)]
pub enum ReportError {
    // ===== 配置错误（模板缺失等，不重试） =====
    #[error("配置错误: {0}")]
    ConfigurationError(String),

    #[error("模板不存在: {0}")]
    TemplateNotFound(String),

    #[error("占位符标记错误 ({marker}): 期望 1 处，实际 {found} 处")]
    MarkerError { marker: String, found: usize },

    // ===== 解析错误（在任何文件 IO 之前抛出） =====
    #[error("报告日期格式错误: 期望 <年>年<月>月<日>日，实际 {value}")]
    DateParseError { value: String },

    #[error("测试类型无法识别: {0}（仅支持 初测/复测）")]
    TestTypeParseError(String),

    #[error("漏洞数据解析失败: {0}")]
    FindingsParseError(String),

    // ===== IO 错误（附带出错路径） =====
    #[error("文件操作失败 ({path}): {message}")]
    Io { path: String, message: String },

    #[error("打包失败: {0}")]
    ZipError(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReportError {
    /// 构造带路径的 IO 错误
    pub fn io(path: impl AsRef<Path>, err: impl std::fmt::Display) -> Self {
        ReportError::Io {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }

    /// 是否属于配置类错误
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ReportError::ConfigurationError(_)
                | ReportError::TemplateNotFound(_)
                | ReportError::MarkerError { .. }
        )
    }

    /// 是否属于解析类错误
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            ReportError::DateParseError { .. }
                | ReportError::TestTypeParseError(_)
                | ReportError::FindingsParseError(_)
        )
    }
}

// 实现 From<std::io::Error>（无路径信息时使用）
impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::Io {
            path: "<unknown>".to_string(),
            message: err.to_string(),
        }
    }
}

// 实现 From<zip::result::ZipError>
impl From<zip::result::ZipError> for ReportError {
    fn from(err: zip::result::ZipError) -> Self {
        ReportError::ZipError(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::FindingsParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ReportResult<T> = Result<T, ReportError>;
