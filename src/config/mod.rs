// ==========================================
// 渗透测试报告生成系统 - 配置层
// ==========================================
// 职责: 目录配置加载、覆写、校验
// 存储: JSON 文件 + 环境变量
// ==========================================

pub mod report_config;

pub use report_config::{env_keys, ReportConfig, DATA_DIR_NAME};
