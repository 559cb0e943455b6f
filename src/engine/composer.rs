// ==========================================
// 渗透测试报告生成系统 - 文档内容组装器
// ==========================================
// 输入: 漏洞树 + 报告元数据
// 输出: 完整的 word/document.xml 文本
// ==========================================
// 遍历顺序: 单位 → 系统 → 漏洞，严格保持输入顺序，不排序不去重
// 单位 = 一级标题，系统 = 二级标题，漏洞 = 三级标题
// 每个漏洞固定 6 组（四级标题 + 正文）
// ==========================================

use crate::domain::findings::{FindingsTree, Vulnerability};
use crate::domain::report::ReportMetadata;
use crate::domain::types::{HeadingLevel, TestType};
use crate::engine::fragment::FragmentRenderer;
use crate::engine::placeholder::{occurrences, substitute, Placeholder, Substitutions};
use crate::engine::sanitizer::escape;
use crate::error::{ReportError, ReportResult};
use std::path::Path;
use tracing::{debug, info, instrument};

/// 基础模板中正文 XML 的相对路径
pub const DOCUMENT_PART: &str = "word/document.xml";

/// 漏洞四级标题（固定顺序）
pub const SECTION_TITLES: [&str; 6] = [
    "漏洞描述",
    "风险等级",
    "漏洞危害",
    "参考链接",
    "漏洞详情",
    "修复建议",
];

/// 漏洞三级标题文本
///
/// - 初测: 【风险等级】漏洞名
/// - 复测: 【风险等级】漏洞名（修复状态）
pub fn vulnerability_heading(vuln: &Vulnerability, test_type: TestType) -> String {
    if test_type.is_initial() {
        format!("【{}】{}", vuln.risk_level, vuln.name)
    } else {
        format!("【{}】{}（{}）", vuln.risk_level, vuln.name, vuln.fixed_status)
    }
}

// ==========================================
// ContentComposer - 正文组装器
// ==========================================
pub struct ContentComposer {
    renderer: FragmentRenderer,
}

impl ContentComposer {
    pub fn new(renderer: FragmentRenderer) -> Self {
        Self { renderer }
    }

    pub fn renderer(&self) -> &FragmentRenderer {
        &self.renderer
    }

    /// 组装正文 XML（插入到 MainContent 处）
    #[instrument(skip_all, fields(units = findings.units.len()))]
    pub fn compose_body(&self, findings: &FindingsTree, metadata: &ReportMetadata) -> String {
        let mut fragments: Vec<String> = Vec::new();
        let mut vuln_count = 0usize;

        for unit in &findings.units {
            fragments.push(self.renderer.render_heading(HeadingLevel::First, &unit.name));

            for system in &unit.systems {
                fragments.push(self.renderer.render_heading(HeadingLevel::Second, &system.name));

                for vuln in &system.vulnerabilities {
                    self.compose_vulnerability(vuln, metadata.test_type, &mut fragments);
                    vuln_count += 1;
                }
            }
        }

        info!(vulnerabilities = vuln_count, fragments = fragments.len(), "正文组装完成");
        fragments.join("\n")
    }

    fn compose_vulnerability(
        &self,
        vuln: &Vulnerability,
        test_type: TestType,
        fragments: &mut Vec<String>,
    ) {
        debug!(name = %vuln.name, "渲染漏洞");
        fragments.push(
            self.renderer
                .render_heading(HeadingLevel::Third, &vulnerability_heading(vuln, test_type)),
        );

        let bodies = [
            &vuln.description,
            &vuln.risk_level,
            &vuln.hazards,
            &vuln.links,
            &vuln.proof_detail,
            &vuln.fix_suggestion,
        ];
        for (title, body) in SECTION_TITLES.iter().zip(bodies) {
            fragments.push(self.renderer.render_heading(HeadingLevel::Fourth, title));
            fragments.push(self.renderer.render_body(body));
        }
    }
}

// ==========================================
// 前言（封面）替换
// ==========================================

/// 前言替换表（全部值已转义）
pub fn front_matter_substitutions(metadata: &ReportMetadata) -> Substitutions {
    let date = metadata.report_date;
    let counts = metadata.counts;
    Substitutions::new()
        .with(Placeholder::CustomerName, escape(&metadata.customer_name))
        .with(Placeholder::TestType, metadata.test_type.label())
        .with(Placeholder::ReportTitle, metadata.test_type.report_title())
        .with(Placeholder::SignatureName, escape(&metadata.signature_name))
        .with(Placeholder::ReportYear, date.year().to_string())
        .with(Placeholder::ReportMonth, date.month().to_string())
        .with(Placeholder::ReportDay, date.day().to_string())
        .with(Placeholder::HighRiskCount, counts.high.to_string())
        .with(Placeholder::MediumRiskCount, counts.medium.to_string())
        .with(Placeholder::LowRiskCount, counts.low.to_string())
        .with(Placeholder::TotalRiskCount, counts.total.to_string())
        .with(Placeholder::TesterName, escape(&metadata.tester_name))
        .with(Placeholder::Author, escape(&metadata.author))
        .with(Placeholder::PmName, escape(&metadata.pm_name))
}

/// 对已读取的基础模板执行前言替换（MainContent 保留）
pub fn apply_front_matter(template_xml: &str, metadata: &ReportMetadata) -> String {
    let result = substitute(template_xml, &front_matter_substitutions(metadata));
    if !result.unused.is_empty() {
        debug!(unused = ?result.unused, "基础模板未使用的前言占位符");
    }
    result.text
}

/// 前言替换后的基础模板，以 MainContent 标记为界分为前后两段
///
/// 标记在替换前的原始模板中定位，表单值里出现的标记文本只是普通文字
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatter {
    pub head: String,
    pub tail: String,
}

impl FrontMatter {
    /// 按原始模板中的 MainContent 标记切分，再分别执行前言替换
    ///
    /// # 错误
    /// - MarkerError: 标记不存在或出现多次
    pub fn split(template_xml: &str, metadata: &ReportMetadata) -> ReportResult<Self> {
        let marker = Placeholder::MainContent.token();
        let found = occurrences(template_xml, Placeholder::MainContent);
        let (head, tail) = match template_xml.split_once(marker.as_str()) {
            Some(halves) if found == 1 => halves,
            _ => return Err(ReportError::MarkerError { marker, found }),
        };
        Ok(Self {
            head: apply_front_matter(head, metadata),
            tail: apply_front_matter(tail, metadata),
        })
    }
}

/// 读取基础模板 word/document.xml 并执行前言替换
///
/// # 错误
/// - TemplateNotFound: 基础模板缺少 word/document.xml
/// - MarkerError: 模板中 MainContent 标记不是恰好一处
#[instrument(skip_all, fields(template_dir = %template_dir.as_ref().display()))]
pub fn compose_front_matter<P: AsRef<Path>>(
    template_dir: P,
    metadata: &ReportMetadata,
) -> ReportResult<FrontMatter> {
    let path = template_dir.as_ref().join(DOCUMENT_PART);
    if !path.is_file() {
        return Err(ReportError::TemplateNotFound(path.display().to_string()));
    }
    let template_xml = std::fs::read_to_string(&path).map_err(|e| ReportError::io(&path, e))?;
    FrontMatter::split(&template_xml, metadata)
}

/// 将正文 XML 原样放在 MainContent 标记处（不再转义）
pub fn assemble_document(front: &FrontMatter, body_xml: &str) -> String {
    let mut document = String::with_capacity(front.head.len() + body_xml.len() + front.tail.len());
    document.push_str(&front.head);
    document.push_str(body_xml);
    document.push_str(&front.tail);
    document
}
