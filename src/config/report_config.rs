// ==========================================
// 渗透测试报告生成系统 - 路径配置
// ==========================================
// 职责: 模板目录 / 片段目录 / 输出目录 / 临时工作目录
// 存储: JSON 文件（缺失时使用默认值）
// 覆写: 环境变量优先于文件
// ==========================================

use crate::error::{ReportError, ReportResult};
use crate::fsutil::write_atomic;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 默认数据目录名（位于用户数据目录下）
pub const DATA_DIR_NAME: &str = "pentest-report";

// ==========================================
// 环境变量键
// ==========================================
pub mod env_keys {
    pub const TEMPLATE_DIR: &str = "PENTEST_REPORT_TEMPLATE_DIR";
    pub const FRAGMENT_DIR: &str = "PENTEST_REPORT_FRAGMENT_DIR";
    pub const OUTPUT_DIR: &str = "PENTEST_REPORT_OUTPUT_DIR";
    pub const SCRATCH_DIR: &str = "PENTEST_REPORT_SCRATCH_DIR";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// 基础模板（已解压的 docx 目录）
    pub template_dir: PathBuf,
    /// 片段模板目录
    pub fragment_dir: PathBuf,
    /// 报告输出目录
    pub output_dir: PathBuf,
    /// 打包临时工作目录
    ///
    /// 每次生成都会清空该目录；已有内容但没有工作目录标记文件的目录会被拒绝
    pub scratch_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self::rooted_at(Self::default_root())
    }
}

impl ReportConfig {
    /// 默认根目录: 用户数据目录/pentest-report（取不到时为当前目录）
    pub fn default_root() -> PathBuf {
        match dirs::data_dir() {
            Some(data_dir) => data_dir.join(DATA_DIR_NAME),
            None => PathBuf::from("."),
        }
    }

    /// 以指定目录为根的标准布局
    pub fn rooted_at<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self {
            template_dir: root.join("template"),
            fragment_dir: root.join("fragments"),
            output_dir: root.join("output"),
            scratch_dir: root.join("scratch"),
        }
    }

    /// 加载配置文件并应用环境变量覆写
    ///
    /// - 文件不存在 → 默认值
    /// - 文件格式错误 → ConfigurationError
    pub fn load<P: AsRef<Path>>(path: P) -> ReportResult<Self> {
        let mut config = Self::load_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// 只读取文件（不应用环境变量）
    pub fn load_file<P: AsRef<Path>>(path: P) -> ReportResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
        let config: ReportConfig = serde_json::from_str(&raw).map_err(|e| {
            ReportError::ConfigurationError(format!("配置文件格式错误 {}: {}", path.display(), e))
        })?;
        info!(path = %path.display(), "已加载配置文件");
        Ok(config)
    }

    /// 应用覆写（空白值忽略）
    ///
    /// lookup 按环境变量键取值，便于测试时注入
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let targets: [(&str, &mut PathBuf); 4] = [
            (env_keys::TEMPLATE_DIR, &mut self.template_dir),
            (env_keys::FRAGMENT_DIR, &mut self.fragment_dir),
            (env_keys::OUTPUT_DIR, &mut self.output_dir),
            (env_keys::SCRATCH_DIR, &mut self.scratch_dir),
        ];

        for (key, slot) in targets {
            if let Some(value) = lookup(key) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    debug!(key, value = trimmed, "环境变量覆写配置");
                    *slot = PathBuf::from(trimmed);
                }
            }
        }
    }

    /// 保存为格式化 JSON（原子写入）
    pub fn save<P: AsRef<Path>>(&self, path: P) -> ReportResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ReportError::ConfigurationError(format!("配置序列化失败: {}", e)))?;
        write_atomic(path, json)
    }

    /// 校验输入目录存在
    pub fn validate(&self) -> ReportResult<()> {
        if !self.template_dir.is_dir() {
            return Err(ReportError::ConfigurationError(format!(
                "模板目录不存在: {}",
                self.template_dir.display()
            )));
        }
        if !self.fragment_dir.is_dir() {
            return Err(ReportError::ConfigurationError(format!(
                "片段目录不存在: {}",
                self.fragment_dir.display()
            )));
        }
        Ok(())
    }
}
