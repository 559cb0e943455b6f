// ==========================================
// 渗透测试报告生成系统 - 领域类型定义
// ==========================================
// 职责: 测试类型 / 标题级别 / 片段占位符类别
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 测试类型 (Test Type)
// ==========================================
// 初测: 标题不带修复状态
// 复测: 标题追加（修复状态）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestType {
    Initial, // 初测
    Retest,  // 复测
}

impl TestType {
    /// 中文标签（写入报告正文）
    pub fn label(&self) -> &'static str {
        match self {
            TestType::Initial => "初测",
            TestType::Retest => "复测",
        }
    }

    /// 报告标题（用于输出文件名与封面）
    pub fn report_title(&self) -> &'static str {
        match self {
            TestType::Initial => "渗透测试报告",
            TestType::Retest => "渗透测试复测报告",
        }
    }

    pub fn is_initial(&self) -> bool {
        matches!(self, TestType::Initial)
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for TestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed {
            "初测" => Ok(TestType::Initial),
            "复测" => Ok(TestType::Retest),
            _ => match trimmed.to_lowercase().as_str() {
                "initial" => Ok(TestType::Initial),
                "retest" => Ok(TestType::Retest),
                _ => Err(trimmed.to_string()),
            },
        }
    }
}

// ==========================================
// 标题级别 (Heading Level)
// ==========================================
// 对应片段模板: 一级 ~ 四级标题
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HeadingLevel {
    First,  // 一级: 单位
    Second, // 二级: 系统
    Third,  // 三级: 漏洞
    Fourth, // 四级: 漏洞字段
}

impl HeadingLevel {
    pub const ALL: [HeadingLevel; 4] = [
        HeadingLevel::First,
        HeadingLevel::Second,
        HeadingLevel::Third,
        HeadingLevel::Fourth,
    ];

    /// 数字级别 (1-4)
    pub fn depth(&self) -> u8 {
        match self {
            HeadingLevel::First => 1,
            HeadingLevel::Second => 2,
            HeadingLevel::Third => 3,
            HeadingLevel::Fourth => 4,
        }
    }

    /// 对应的片段占位符类别
    pub fn placeholder_class(&self) -> PlaceholderClass {
        match self {
            HeadingLevel::First => PlaceholderClass::FirstLevelHeading,
            HeadingLevel::Second => PlaceholderClass::SecondLevelHeading,
            HeadingLevel::Third => PlaceholderClass::ThirdLevelHeading,
            HeadingLevel::Fourth => PlaceholderClass::FourthLevelHeading,
        }
    }
}

impl TryFrom<u8> for HeadingLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(HeadingLevel::First),
            2 => Ok(HeadingLevel::Second),
            3 => Ok(HeadingLevel::Third),
            4 => Ok(HeadingLevel::Fourth),
            other => Err(format!("标题级别超出范围: {}（仅支持 1-4）", other)),
        }
    }
}

// ==========================================
// 片段占位符类别 (Placeholder Class)
// ==========================================
// 一个类别 = 一个片段模板文件 = 一个文本占位符
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PlaceholderClass {
    FirstLevelHeading,
    SecondLevelHeading,
    ThirdLevelHeading,
    FourthLevelHeading,
    NormalText,
}

impl PlaceholderClass {
    pub const ALL: [PlaceholderClass; 5] = [
        PlaceholderClass::FirstLevelHeading,
        PlaceholderClass::SecondLevelHeading,
        PlaceholderClass::ThirdLevelHeading,
        PlaceholderClass::FourthLevelHeading,
        PlaceholderClass::NormalText,
    ];

    /// 占位符名（{{{{{名称}}}}} 中的名称）
    pub fn token_name(&self) -> &'static str {
        match self {
            PlaceholderClass::FirstLevelHeading => "FirstLevelHeading",
            PlaceholderClass::SecondLevelHeading => "SecondLevelHeading",
            PlaceholderClass::ThirdLevelHeading => "ThirdLevelHeading",
            PlaceholderClass::FourthLevelHeading => "FourthLevelHeading",
            PlaceholderClass::NormalText => "NormalText",
        }
    }

    /// 片段模板文件名（固定）
    pub fn file_name(&self) -> &'static str {
        match self {
            PlaceholderClass::FirstLevelHeading => "first_level_heading.xml",
            PlaceholderClass::SecondLevelHeading => "second_level_heading.xml",
            PlaceholderClass::ThirdLevelHeading => "third_level_heading.xml",
            PlaceholderClass::FourthLevelHeading => "fourth_level_heading.xml",
            PlaceholderClass::NormalText => "normal_text.xml",
        }
    }

    pub fn from_token_name(name: &str) -> Option<Self> {
        PlaceholderClass::ALL
            .into_iter()
            .find(|class| class.token_name() == name)
    }
}

impl fmt::Display for PlaceholderClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token_name())
    }
}
