// ==========================================
// 渗透测试报告生成系统 - 核心库
// ==========================================
// 输入: 报告表单 + 漏洞树（单位 → 系统 → 漏洞）
// 输出: 基于 Word 模板生成的 .docx 报告
// 技术栈: Rust + WordprocessingML 文本模板 + zip
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 报告元数据与漏洞树
pub mod domain;

// 引擎层 - 转义、标识、片段渲染、内容组装
pub mod engine;

// 打包层 - 临时工作目录与 docx 打包
pub mod package;

// 工具层 - 片段提取、跨文本块修复
pub mod tooling;

// 配置层 - 目录配置
pub mod config;

// 统一错误类型
pub mod error;

// 文件系统基础设施（原子写入 / 目录复制）
pub mod fsutil;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    FindingsTree, HeadingLevel, PlaceholderClass, ReportDate, ReportForm, ReportMetadata,
    RiskCounts, System, TestType, Unit, Vulnerability,
};

// 引擎
pub use engine::{ContentComposer, FragmentRenderer, FragmentTemplate, Placeholder, Substitutions};

// 打包
pub use package::{PackageAssembler, ReportGenerator, ScratchWorkspace};

// 工具
pub use tooling::{ExtractionReport, FragmentExtractor, RepairReport, RunSplitRepairer};

// 配置与错误
pub use config::ReportConfig;
pub use error::{ReportError, ReportResult};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "渗透测试报告生成系统";
