// ==========================================
// 渗透测试报告生成系统 - 占位符替换
// ==========================================
// 语法: {{{{{名称}}}}}（左右各 5 个花括号）
// 设计: 封闭枚举 Placeholder + 单一替换函数 substitute
//       单次从左到右扫描，替换值不会被再次扫描
// ==========================================

use crate::domain::types::PlaceholderClass;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Range;
use std::sync::OnceLock;

/// 占位符起始标记
pub const TOKEN_OPEN: &str = "{{{{{";

/// 占位符结束标记
pub const TOKEN_CLOSE: &str = "}}}}}";

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\{\{\{([A-Za-z_][A-Za-z0-9_]*)\}\}\}\}\}").expect("invalid regex")
    })
}

// ==========================================
// Placeholder - 全部替换键
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Placeholder {
    /// 片段文本（标题 / 正文）
    Text(PlaceholderClass),

    // ===== 易变属性 =====
    ParaId,
    TocName,

    // ===== 正文插入点 =====
    MainContent,

    // ===== 封面 / 前言 =====
    CustomerName,
    TestType,
    ReportTitle,
    SignatureName,
    ReportYear,
    ReportMonth,
    ReportDay,
    HighRiskCount,
    MediumRiskCount,
    LowRiskCount,
    TotalRiskCount,
    TesterName,
    Author,
    PmName,
}

impl Placeholder {
    /// 前言部分的全部替换键
    pub const FRONT_MATTER: [Placeholder; 15] = [
        Placeholder::CustomerName,
        Placeholder::TestType,
        Placeholder::ReportTitle,
        Placeholder::SignatureName,
        Placeholder::ReportYear,
        Placeholder::ReportMonth,
        Placeholder::ReportDay,
        Placeholder::HighRiskCount,
        Placeholder::MediumRiskCount,
        Placeholder::LowRiskCount,
        Placeholder::TotalRiskCount,
        Placeholder::TesterName,
        Placeholder::Author,
        Placeholder::PmName,
        Placeholder::MainContent,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Placeholder::Text(class) => class.token_name(),
            Placeholder::ParaId => "paraId",
            Placeholder::TocName => "TocName",
            Placeholder::MainContent => "MainContent",
            Placeholder::CustomerName => "CustomerName",
            Placeholder::TestType => "TestType",
            Placeholder::ReportTitle => "ReportTitle",
            Placeholder::SignatureName => "SignatureName",
            Placeholder::ReportYear => "ReportYear",
            Placeholder::ReportMonth => "ReportMonth",
            Placeholder::ReportDay => "ReportDay",
            Placeholder::HighRiskCount => "HighRiskCount",
            Placeholder::MediumRiskCount => "MediumRiskCount",
            Placeholder::LowRiskCount => "LowRiskCount",
            Placeholder::TotalRiskCount => "TotalRiskCount",
            Placeholder::TesterName => "TesterName",
            Placeholder::Author => "Author",
            Placeholder::PmName => "PmName",
        }
    }

    /// 完整占位符文本，例如 {{{{{paraId}}}}}
    pub fn token(&self) -> String {
        format!("{}{}{}", TOKEN_OPEN, self.name(), TOKEN_CLOSE)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(class) = PlaceholderClass::from_token_name(name) {
            return Some(Placeholder::Text(class));
        }
        match name {
            "paraId" => Some(Placeholder::ParaId),
            "TocName" => Some(Placeholder::TocName),
            _ => Placeholder::FRONT_MATTER
                .into_iter()
                .find(|p| p.name() == name),
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

// ==========================================
// Substitutions - 替换表
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct Substitutions {
    values: BTreeMap<Placeholder, String>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式添加替换值（值需已转义）
    pub fn with(mut self, key: Placeholder, value: impl Into<String>) -> Self {
        self.values.insert(key, value.into());
        self
    }

    pub fn insert(&mut self, key: Placeholder, value: impl Into<String>) {
        self.values.insert(key, value.into());
    }

    pub fn get(&self, key: Placeholder) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = Placeholder> + '_ {
        self.values.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// 替换结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substituted {
    pub text: String,
    /// 实际替换次数
    pub replaced: usize,
    /// 提供了值但模板中未出现的键
    pub unused: Vec<Placeholder>,
}

/// 占位符替换（单次扫描）
///
/// - 已识别且有值的占位符 → 替换为对应值
/// - 未识别 / 无值的占位符 → 原样保留
/// - 替换后的值不再参与扫描
pub fn substitute(template: &str, subs: &Substitutions) -> Substituted {
    let mut out = String::with_capacity(template.len());
    let mut used: BTreeSet<Placeholder> = BTreeSet::new();
    let mut replaced = 0usize;
    let mut rest = template;

    while let Some(pos) = rest.find(TOKEN_OPEN) {
        let after = &rest[pos + TOKEN_OPEN.len()..];
        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        let name = &after[..name_len];
        let well_formed = !name.is_empty()
            && !name.starts_with(|c: char| c.is_ascii_digit())
            && after[name_len..].starts_with(TOKEN_CLOSE);

        if !well_formed {
            // 非占位符：前移一个字符继续
            out.push_str(&rest[..pos + 1]);
            rest = &rest[pos + 1..];
            continue;
        }

        let token_end = pos + TOKEN_OPEN.len() + name_len + TOKEN_CLOSE.len();
        match Placeholder::from_name(name).and_then(|p| subs.get(p).map(|v| (p, v))) {
            Some((key, value)) => {
                out.push_str(&rest[..pos]);
                out.push_str(value);
                used.insert(key);
                replaced += 1;
            }
            None => out.push_str(&rest[..token_end]),
        }
        rest = &rest[token_end..];
    }
    out.push_str(rest);

    let unused = subs.keys().filter(|k| !used.contains(k)).collect();
    Substituted {
        text: out,
        replaced,
        unused,
    }
}

/// 占位符出现位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch {
    pub range: Range<usize>,
    pub name: String,
}

impl TokenMatch {
    pub fn placeholder(&self) -> Option<Placeholder> {
        Placeholder::from_name(&self.name)
    }
}

/// 查找全部语法合法的占位符
pub fn find_tokens(text: &str) -> Vec<TokenMatch> {
    token_pattern()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(TokenMatch {
                range: whole.range(),
                name: caps[1].to_string(),
            })
        })
        .collect()
}

/// 统计语法合法的占位符数量
pub fn count_well_formed_tokens(text: &str) -> usize {
    token_pattern().find_iter(text).count()
}

/// 统计模板中某个占位符出现次数
pub fn occurrences(text: &str, key: Placeholder) -> usize {
    text.matches(&key.token()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_format() {
        assert_eq!(Placeholder::ParaId.token(), "{{{{{paraId}}}}}");
        assert_eq!(
            Placeholder::Text(PlaceholderClass::NormalText).token(),
            "{{{{{NormalText}}}}}"
        );
    }

    #[test]
    fn test_from_name_round_trip() {
        let mut all: Vec<Placeholder> = PlaceholderClass::ALL
            .into_iter()
            .map(Placeholder::Text)
            .collect();
        all.extend([Placeholder::ParaId, Placeholder::TocName]);
        all.extend(Placeholder::FRONT_MATTER);
        for key in all {
            assert_eq!(Placeholder::from_name(key.name()), Some(key));
        }
        assert_eq!(Placeholder::from_name("Unknown"), None);
    }

    #[test]
    fn test_substitute_basic() {
        let subs = Substitutions::new()
            .with(Placeholder::ParaId, "1A2B3C4D")
            .with(Placeholder::Text(PlaceholderClass::NormalText), "你好");
        let result = substitute(
            r#"<w:p w14:paraId="{{{{{paraId}}}}}"><w:t>{{{{{NormalText}}}}}</w:t></w:p>"#,
            &subs,
        );
        assert_eq!(
            result.text,
            r#"<w:p w14:paraId="1A2B3C4D"><w:t>你好</w:t></w:p>"#
        );
        assert_eq!(result.replaced, 2);
        assert!(result.unused.is_empty());
    }

    #[test]
    fn test_substitute_keeps_unknown_and_reports_unused() {
        let subs = Substitutions::new()
            .with(Placeholder::CustomerName, "ACME")
            .with(Placeholder::PmName, "王五");
        let result = substitute("{{{{{CustomerName}}}}}|{{{{{MainContent}}}}}|{{{{{Foo}}}}}", &subs);
        assert_eq!(result.text, "ACME|{{{{{MainContent}}}}}|{{{{{Foo}}}}}");
        assert_eq!(result.unused, vec![Placeholder::PmName]);
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let subs = Substitutions::new()
            .with(Placeholder::Text(PlaceholderClass::NormalText), "{{{{{paraId}}}}}")
            .with(Placeholder::ParaId, "00000001");
        let result = substitute("{{{{{NormalText}}}}}/{{{{{paraId}}}}}", &subs);
        assert_eq!(result.text, "{{{{{paraId}}}}}/00000001");
    }

    #[test]
    fn test_substitute_extra_braces() {
        let subs = Substitutions::new().with(Placeholder::TocName, "_Toc00000001");
        let result = substitute("{{{{{{TocName}}}}}}", &subs);
        assert_eq!(result.text, "{_Toc00000001}");
    }

    #[test]
    fn test_count_and_find_tokens() {
        let text = "a {{{{{x}}}}} b {{{{ {y}}}}} {{{{{NormalText}}}}}";
        assert_eq!(count_well_formed_tokens(text), 2);
        let found = find_tokens(text);
        assert_eq!(found[0].name, "x");
        assert_eq!(
            found[1].placeholder(),
            Some(Placeholder::Text(PlaceholderClass::NormalText))
        );
        assert_eq!(&text[found[0].range.clone()], "{{{{{x}}}}}");
    }
}
