// ==========================================
// 渗透测试报告生成系统 - 领域模型层
// ==========================================
// 职责: 报告元数据、漏洞树、领域枚举
// 红线: 不含文件 IO 以外的渲染逻辑,不含打包逻辑
// ==========================================

pub mod findings;
pub mod report;
pub mod types;

// 重导出核心类型
pub use findings::{FindingsTree, System, Unit, Vulnerability};
pub use report::{ReportDate, ReportForm, ReportMetadata, RiskCounts};
pub use types::{HeadingLevel, PlaceholderClass, TestType};
