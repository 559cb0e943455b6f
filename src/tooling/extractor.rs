// ==========================================
// 渗透测试报告生成系统 - 片段模板提取工具
// ==========================================
// 输入: 作者在 Word 中标注好占位符的 document.xml
// 输出: 每个文本类别一个片段模板文件（first_level_heading.xml 等）
// ==========================================
// 规则:
// - 只看最外层段落；段落内恰好一个文本类占位符才入选
// - 含 PAGEREF 的目录段落跳过
// - 段落标识 / 书签名替换为 {{{{{paraId}}}}} / {{{{{TocName}}}}}
// - 同一类别多次出现时取第一个，其余记为重复
// ==========================================

use crate::domain::types::PlaceholderClass;
use crate::engine::placeholder::{find_tokens, Placeholder};
use crate::error::{ReportError, ReportResult};
use crate::fsutil::write_atomic;
use crate::tooling::xml_scan::outermost_paragraphs;
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, instrument, warn};

/// 目录（TOC）段落的页码引用域
pub const TOC_MARKER: &str = "PAGEREF";

fn para_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"w14:paraId="[0-9A-Fa-f]+""#).expect("invalid regex"))
}

fn toc_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"w:name="_Toc[0-9]+""#).expect("invalid regex"))
}

/// 段落分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphKind {
    /// 不含文本类占位符
    Plain,
    /// 含多个文本类占位符（无法确定类别）
    Ambiguous(usize),
    /// 目录段落
    TocEntry(PlaceholderClass),
    /// 可提取的片段
    Template(PlaceholderClass),
}

/// 对单个段落分类
pub fn classify_paragraph(paragraph_xml: &str) -> ParagraphKind {
    let classes: Vec<PlaceholderClass> = find_tokens(paragraph_xml)
        .iter()
        .filter_map(|t| match t.placeholder() {
            Some(Placeholder::Text(class)) => Some(class),
            _ => None,
        })
        .collect();

    match classes.as_slice() {
        [] => ParagraphKind::Plain,
        [class] if paragraph_xml.contains(TOC_MARKER) => ParagraphKind::TocEntry(*class),
        [class] => ParagraphKind::Template(*class),
        many => ParagraphKind::Ambiguous(many.len()),
    }
}

/// 将段落内的易变属性替换为占位符
///
/// 已是占位符的属性保持不变（重复提取结果一致）
pub fn neutralize_volatile(paragraph_xml: &str) -> String {
    let para_id = format!(r#"w14:paraId="{}""#, Placeholder::ParaId.token());
    let toc_name = format!(r#"w:name="{}""#, Placeholder::TocName.token());

    let replaced = para_id_pattern().replace_all(paragraph_xml, |_: &Captures| para_id.clone());
    toc_name_pattern()
        .replace_all(&replaced, |_: &Captures| toc_name.clone())
        .into_owned()
}

/// 已写出的片段文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFragment {
    pub class: PlaceholderClass,
    pub path: PathBuf,
}

/// 提取结果统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    pub paragraphs_scanned: usize,
    pub candidates: usize,
    pub toc_skipped: usize,
    pub ambiguous_skipped: usize,
    pub duplicates: Vec<PlaceholderClass>,
    pub written: Vec<ExtractedFragment>,
}

impl ExtractionReport {
    /// 写出的片段文件数
    pub fn count(&self) -> usize {
        self.written.len()
    }

    /// 尚未提取到的类别
    pub fn missing_classes(&self) -> Vec<PlaceholderClass> {
        PlaceholderClass::ALL
            .into_iter()
            .filter(|class| !self.written.iter().any(|w| w.class == *class))
            .collect()
    }
}

/// 单次提取的完整输出
#[derive(Debug, Clone)]
pub struct Extraction {
    pub report: ExtractionReport,
    /// 删除已提取段落后的文档
    pub cleaned_xml: String,
}

// ==========================================
// FragmentExtractor - 片段提取器
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct FragmentExtractor;

impl FragmentExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 从 document.xml 文本提取片段并写入输出目录
    ///
    /// 没有可提取段落时返回空报告（非错误）
    #[instrument(skip_all, fields(output_dir = %output_dir.display()))]
    pub fn extract(&self, document_xml: &str, output_dir: &Path) -> ReportResult<Extraction> {
        let mut report = ExtractionReport::default();
        let mut accepted: Vec<(PlaceholderClass, &str)> = Vec::new();

        for range in outermost_paragraphs(document_xml) {
            report.paragraphs_scanned += 1;
            let paragraph = &document_xml[range];

            match classify_paragraph(paragraph) {
                ParagraphKind::Plain => {}
                ParagraphKind::Ambiguous(n) => {
                    report.ambiguous_skipped += 1;
                    warn!(tokens = n, "段落含多个文本占位符，跳过");
                }
                ParagraphKind::TocEntry(class) => {
                    report.toc_skipped += 1;
                    info!(class = %class, "跳过目录段落");
                }
                ParagraphKind::Template(class) => {
                    report.candidates += 1;
                    if accepted.iter().any(|(c, _)| *c == class) {
                        report.duplicates.push(class);
                        warn!(class = %class, "类别重复出现，保留第一个");
                    } else {
                        debug!(class = %class, "找到片段段落");
                        accepted.push((class, paragraph));
                    }
                }
            }
        }

        if !accepted.is_empty() {
            std::fs::create_dir_all(output_dir).map_err(|e| ReportError::io(output_dir, e))?;
        }

        let mut cleaned_xml = document_xml.to_string();
        for (class, paragraph) in accepted {
            let path = output_dir.join(class.file_name());
            write_atomic(&path, neutralize_volatile(paragraph))?;
            info!(class = %class, path = %path.display(), "片段已写出");
            report.written.push(ExtractedFragment { class, path });

            if let Some(pos) = cleaned_xml.find(paragraph) {
                cleaned_xml.replace_range(pos..pos + paragraph.len(), "");
            }
        }

        info!(
            scanned = report.paragraphs_scanned,
            written = report.count(),
            toc_skipped = report.toc_skipped,
            duplicates = report.duplicates.len(),
            "片段提取完成"
        );
        Ok(Extraction {
            report,
            cleaned_xml,
        })
    }

    /// 从文件提取；clean_source 时把删除已提取段落后的文档写回源文件
    pub fn extract_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source: P,
        output_dir: Q,
        clean_source: bool,
    ) -> ReportResult<ExtractionReport> {
        let source = source.as_ref();
        let document_xml =
            std::fs::read_to_string(source).map_err(|e| ReportError::io(source, e))?;

        let extraction = self.extract(&document_xml, output_dir.as_ref())?;
        if clean_source && extraction.report.count() > 0 {
            write_atomic(source, &extraction.cleaned_xml)?;
            info!(source = %source.display(), "源文档已清理");
        }
        Ok(extraction.report)
    }
}
