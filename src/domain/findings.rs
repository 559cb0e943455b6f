// ==========================================
// 渗透测试报告生成系统 - 漏洞数据树
// ==========================================
// 结构: 单位(Unit) → 系统(System) → 漏洞(Vulnerability)
// 约束: 顺序即输入顺序；名称可重复，渲染时不去重
// 边界: JSON 在此一次性解析为强类型树，渲染核心不接触无类型数据
// ==========================================

use crate::domain::report::RiskCounts;
use crate::error::{ReportError, ReportResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// null / 缺失字段统一视为空串
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ==========================================
// Vulnerability - 单个漏洞
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vulnerability {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,

    /// 风险等级文本（高危 / 中危 / 低危 ...）
    #[serde(default, alias = "riskLevel", deserialize_with = "null_as_empty")]
    pub risk_level: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub hazards: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub links: String,

    #[serde(default, alias = "proofDetail", deserialize_with = "null_as_empty")]
    pub proof_detail: String,

    #[serde(default, alias = "fixSuggestion", deserialize_with = "null_as_empty")]
    pub fix_suggestion: String,

    /// 修复状态（已修复 / 未修复），仅复测报告使用
    #[serde(default, alias = "fixedStatus", deserialize_with = "null_as_empty")]
    pub fixed_status: String,
}

// ==========================================
// System - 被测系统
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct System {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,

    #[serde(default)]
    pub vulnerabilities: Vec<Vulnerability>,
}

// ==========================================
// Unit - 单位（组织）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,

    #[serde(default)]
    pub systems: Vec<System>,
}

// ==========================================
// FindingsTree - 漏洞树（顶层为单位数组）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FindingsTree {
    pub units: Vec<Unit>,
}

impl FindingsTree {
    pub fn new(units: Vec<Unit>) -> Self {
        Self { units }
    }

    /// 从 JSON 字符串构建
    pub fn from_json_str(json: &str) -> ReportResult<Self> {
        serde_json::from_str(json).map_err(|e| ReportError::FindingsParseError(e.to_string()))
    }

    /// 从 JSON 文件构建
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ReportResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
        Self::from_json_str(&raw)
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// 按输入顺序遍历所有漏洞
    pub fn vulnerabilities(&self) -> impl Iterator<Item = &Vulnerability> {
        self.units
            .iter()
            .flat_map(|u| u.systems.iter())
            .flat_map(|s| s.vulnerabilities.iter())
    }

    /// 统计各风险等级数量
    ///
    /// 仅识别 高危 / 中危 / 低危 前缀（"高危漏洞" 亦计入高危）；
    /// total 为全部漏洞条数（含未识别等级）
    pub fn risk_counts(&self) -> RiskCounts {
        let mut counts = RiskCounts::default();
        for vuln in self.vulnerabilities() {
            let level = vuln.risk_level.trim();
            if level.starts_with("高") {
                counts.high += 1;
            } else if level.starts_with("中") {
                counts.medium += 1;
            } else if level.starts_with("低") {
                counts.low += 1;
            }
            counts.total += 1;
        }
        counts
    }
}
