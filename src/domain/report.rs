// ==========================================
// 渗透测试报告生成系统 - 报告元数据
// ==========================================
// 职责: 表单原始值（字符串）→ 强类型 ReportMetadata
// 红线: 所有解析在任何文件 IO 之前完成
// 生命周期: 每份报告新建一次，生成期间只读
// ==========================================

use crate::domain::types::TestType;
use crate::error::{ReportError, ReportResult};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(\d{4})\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*日\s*$").expect("invalid regex")
    })
}

// ==========================================
// ReportDate - 报告日期
// ==========================================
// 格式: <年>年<月>月<日>日，例如 2025年3月5日
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReportDate(NaiveDate);

impl ReportDate {
    /// 解析中文日期字符串
    ///
    /// # 返回
    /// - Ok(ReportDate): 合法日期
    /// - Err(DateParseError): 格式不符或日期不存在（如 2月30日）
    pub fn parse(value: &str) -> ReportResult<Self> {
        let err = || ReportError::DateParseError {
            value: value.to_string(),
        };

        let caps = date_pattern().captures(value).ok_or_else(err)?;
        let year: i32 = caps[1].parse().map_err(|_| err())?;
        let month: u32 = caps[2].parse().map_err(|_| err())?;
        let day: u32 = caps[3].parse().map_err(|_| err())?;

        NaiveDate::from_ymd_opt(year, month, day)
            .map(ReportDate)
            .ok_or_else(err)
    }

    pub fn from_naive(date: NaiveDate) -> Self {
        ReportDate(date)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }

    /// 紧凑格式 YYYYMMDD（用于输出文件名）
    pub fn compact(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }
}

impl fmt::Display for ReportDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}年{}月{}日", self.year(), self.month(), self.day())
    }
}

// ==========================================
// RiskCounts - 漏洞数量统计
// ==========================================
// total 仅作展示，核心不重新计算
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskCounts {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
    pub total: u32,
}

// ==========================================
// ReportForm - 表单原始值（外部 UI 边界对象）
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportForm {
    #[serde(alias = "customerName")]
    pub customer_name: String,

    /// 初测 / 复测
    #[serde(alias = "testType")]
    pub test_type: String,

    /// 签章单位名称
    #[serde(alias = "signatureName")]
    pub signature_name: String,

    /// 例如 "2025年3月5日"
    #[serde(alias = "reportDate")]
    pub report_date: String,

    #[serde(alias = "testerName")]
    pub tester_name: String,

    pub author: String,

    #[serde(alias = "pmName")]
    pub pm_name: String,

    #[serde(alias = "highCount")]
    pub high_count: Option<u32>,

    #[serde(alias = "mediumCount")]
    pub medium_count: Option<u32>,

    #[serde(alias = "lowCount")]
    pub low_count: Option<u32>,

    #[serde(alias = "totalCount")]
    pub total_count: Option<u32>,
}

// ==========================================
// ReportMetadata - 报告元数据（强类型，只读）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub customer_name: String,
    pub test_type: TestType,
    pub signature_name: String,
    pub report_date: ReportDate,
    pub tester_name: String,
    pub author: String,
    pub pm_name: String,
    pub counts: RiskCounts,
}

impl ReportMetadata {
    /// 从表单构建元数据（表单未填的数量按 0 处理）
    pub fn from_form(form: &ReportForm) -> ReportResult<Self> {
        Self::from_form_with_fallback(form, &RiskCounts::default())
    }

    /// 从表单构建元数据，表单未填的数量取 fallback
    ///
    /// # 错误
    /// - TestTypeParseError: 测试类型无法识别
    /// - DateParseError: 报告日期格式错误
    pub fn from_form_with_fallback(
        form: &ReportForm,
        fallback: &RiskCounts,
    ) -> ReportResult<Self> {
        let test_type = form
            .test_type
            .parse::<TestType>()
            .map_err(ReportError::TestTypeParseError)?;
        let report_date = ReportDate::parse(&form.report_date)?;

        let counts = RiskCounts {
            high: form.high_count.unwrap_or(fallback.high),
            medium: form.medium_count.unwrap_or(fallback.medium),
            low: form.low_count.unwrap_or(fallback.low),
            total: form.total_count.unwrap_or(fallback.total),
        };

        Ok(Self {
            customer_name: form.customer_name.trim().to_string(),
            test_type,
            signature_name: form.signature_name.trim().to_string(),
            report_date,
            tester_name: form.tester_name.trim().to_string(),
            author: form.author.trim().to_string(),
            pm_name: form.pm_name.trim().to_string(),
            counts,
        })
    }
}
