// ==========================================
// 渗透测试报告生成系统 - 占位符跨文本块修复工具
// ==========================================
// 问题: Word 编辑时会把 {{{{{Name}}}}} 拆进多个 <w:r>，
//       逐块替换时占位符无法被识别
// 做法（两遍扫描）:
// 1. 删除拼写检查 / 渲染分页等无语义元素
// 2. 列出全部 <w:r> 及所属段落
// 3. 从含左花括号的文本块向后累积文本，直到出现 }}}}}
//    （第一个包含结束标记的文本块收尾，不回溯）
// 4. 跨度内文本块之间只能有自闭合元素（不跨越修订 / 超链接等包装元素），
//    用首个文本块的起始标签和格式重建为单个文本块
// 5. 按偏移把重建结果拼回原文
// ==========================================

use crate::engine::placeholder::{count_well_formed_tokens, TOKEN_CLOSE};
use crate::error::{ReportError, ReportResult};
use crate::fsutil::write_atomic;
use crate::tooling::xml_scan::{
    find_paragraphs, find_runs, only_empty_elements, run_properties, strip_non_semantic,
    text_content, RunSpan,
};
use std::ops::Range;
use std::path::Path;
use tracing::{debug, info, warn};

/// 出现在跨度内即放弃修复的元素
const OPAQUE_MARKERS: [&str; 4] = ["<w:fldChar", "<w:instrText", "<w:drawing", "<w:pict"];

/// 修复结果统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// 修复前合法占位符数
    pub tokens_before: usize,
    /// 修复后合法占位符数
    pub tokens_after: usize,
    pub repaired_spans: usize,
    pub abandoned_spans: usize,
}

impl RepairReport {
    pub fn recovered(&self) -> usize {
        self.tokens_after.saturating_sub(self.tokens_before)
    }
}

struct ScannedRun {
    span: RunSpan,
    paragraph: Option<usize>,
    text: String,
}

struct Repair {
    range: Range<usize>,
    replacement: String,
}

#[derive(Default)]
struct PassOutcome {
    repairs: Vec<Repair>,
    abandoned: usize,
}

// ==========================================
// RunSplitRepairer - 跨文本块修复器
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct RunSplitRepairer {
    max_passes: usize,
}

impl Default for RunSplitRepairer {
    fn default() -> Self {
        Self { max_passes: 8 }
    }
}

impl RunSplitRepairer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 修复 XML 文本
    ///
    /// 一遍修复后重建的文本块可能仍与后续文本块构成新的跨度，
    /// 因此重复扫描直到没有可修复的跨度。放弃的跨度保持原样，
    /// 每一遍都会被再次发现，以最后一遍的数量为准
    pub fn repair(&self, xml: &str) -> (String, RepairReport) {
        let mut report = RepairReport {
            tokens_before: count_well_formed_tokens(xml),
            ..Default::default()
        };

        let mut current = strip_non_semantic(xml);
        for _ in 0..self.max_passes {
            let outcome = scan_pass(&current);
            report.abandoned_spans = outcome.abandoned;
            if outcome.repairs.is_empty() {
                break;
            }
            report.repaired_spans += outcome.repairs.len();
            current = splice(&current, &outcome.repairs);
        }

        report.tokens_after = count_well_formed_tokens(&current);
        info!(
            before = report.tokens_before,
            after = report.tokens_after,
            repaired = report.repaired_spans,
            abandoned = report.abandoned_spans,
            "跨文本块占位符修复完成"
        );
        (current, report)
    }

    /// 修复文件；output 为 None 时覆盖输入文件（原子写入）
    pub fn repair_file<P: AsRef<Path>>(
        &self,
        input: P,
        output: Option<&Path>,
    ) -> ReportResult<RepairReport> {
        let input = input.as_ref();
        let xml = std::fs::read_to_string(input).map_err(|e| ReportError::io(input, e))?;
        let (repaired, report) = self.repair(&xml);
        let target = output.unwrap_or(input);
        write_atomic(target, repaired)?;
        Ok(report)
    }
}

/// 列出文本块及其最内层段落（段落与文本块都按起点有序，一次扫描完成）
fn scan_runs(xml: &str) -> Vec<ScannedRun> {
    let paragraphs = find_paragraphs(xml);
    let mut next = 0usize;
    let mut open: Vec<usize> = Vec::new();

    find_runs(xml)
        .into_iter()
        .map(|span| {
            while next < paragraphs.len() && paragraphs[next].range.start <= span.range.start {
                open.push(next);
                next += 1;
            }
            // 在文本块结束前已关闭的段落不会再包含后续文本块
            while open
                .last()
                .is_some_and(|&idx| paragraphs[idx].range.end < span.range.end)
            {
                open.pop();
            }
            let paragraph = open.last().copied();
            let text = text_content(&xml[span.range.clone()]);
            ScannedRun {
                span,
                paragraph,
                text,
            }
        })
        .collect()
}

/// 文本块中未闭合占位符的起点（最后一个 }}}}} 之后的第一个左花括号）
fn open_brace_offset(text: &str) -> Option<usize> {
    let tail_start = text.rfind(TOKEN_CLOSE).map(|p| p + TOKEN_CLOSE.len()).unwrap_or(0);
    text[tail_start..].find('{').map(|p| tail_start + p)
}

fn scan_pass(xml: &str) -> PassOutcome {
    let runs = scan_runs(xml);
    let mut outcome = PassOutcome::default();
    let mut i = 0usize;

    while i < runs.len() {
        let Some(brace) = open_brace_offset(&runs[i].text) else {
            i += 1;
            continue;
        };

        let mut pending = runs[i].text[brace..].to_string();
        let mut end = None;
        for (j, run) in runs.iter().enumerate().skip(i + 1) {
            if run.paragraph != runs[i].paragraph {
                break;
            }
            pending.push_str(&run.text);
            if pending.contains(TOKEN_CLOSE) {
                end = Some(j);
                break;
            }
        }

        let Some(j) = end else {
            i += 1;
            continue;
        };

        let range = runs[i].span.range.start..runs[j].span.range.end;
        match rebuild_span(xml, &runs[i..=j]) {
            Some(replacement) => {
                debug!(first = i, last = j, "重建跨文本块占位符");
                outcome.repairs.push(Repair { range, replacement });
                i = j + 1;
            }
            None => {
                warn!(first = i, last = j, "跨度无法修复，保持原样");
                outcome.abandoned += 1;
                i += 1;
            }
        }
    }
    outcome
}

fn rebuild_span(xml: &str, runs: &[ScannedRun]) -> Option<String> {
    let first = runs.first()?;
    let last = runs.last()?;

    // 跨度内部（去掉首个起始标签）不得含域代码、图形、嵌套段落
    let inner = &xml[first.span.open_tag.end..last.span.range.end];
    if OPAQUE_MARKERS.iter().any(|m| inner.contains(m)) || !find_paragraphs(inner).is_empty() {
        return None;
    }

    // 文本块之间出现起始 / 结束标签说明跨度跨越了包装元素边界
    let crosses_wrapper = runs.windows(2).any(|pair| {
        !only_empty_elements(&xml[pair[0].span.range.end..pair[1].span.range.start])
    });
    if crosses_wrapper {
        return None;
    }

    let text: String = runs.iter().map(|r| r.text.as_str()).collect();
    let split_tokens: usize = runs.iter().map(|r| count_well_formed_tokens(&r.text)).sum();
    if count_well_formed_tokens(&text) <= split_tokens {
        return None;
    }

    let first_xml = &xml[first.span.range.clone()];
    Some(format!(
        "{}{}<w:t xml:space=\"preserve\">{}</w:t></w:r>",
        &xml[first.span.open_tag.clone()],
        run_properties(first_xml),
        text
    ))
}

fn splice(xml: &str, repairs: &[Repair]) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut cursor = 0usize;
    for repair in repairs {
        out.push_str(&xml[cursor..repair.range.start]);
        out.push_str(&repair.replacement);
        cursor = repair.range.end;
    }
    out.push_str(&xml[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> String {
        format!(r#"<w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#, text)
    }

    #[test]
    fn test_repair_three_way_split() {
        let xml = format!(
            "<w:p>{}{}{}</w:p>",
            run("prefix {{{{"),
            run("{x}"),
            run("}}}} suffix")
        );
        let (out, report) = RunSplitRepairer::new().repair(&xml);

        assert_eq!(report.tokens_before, 0);
        assert_eq!(report.tokens_after, 1);
        assert_eq!(report.repaired_spans, 1);
        assert_eq!(find_runs(&out).len(), 1);
        assert!(out.contains("prefix {{{{{x}}}}} suffix"));
        assert!(out.contains("<w:rPr><w:b/></w:rPr>"));
    }

    #[test]
    fn test_repair_with_proof_err() {
        let xml = format!(
            r#"<w:p>{}<w:proofErr w:type="spellStart"/>{}<w:proofErr w:type="spellEnd"/>{}</w:p>"#,
            run("{{{{{Customer"),
            run("Name}}"),
            run("}}}"),
        );
        let (out, report) = RunSplitRepairer::new().repair(&xml);
        assert_eq!(report.tokens_after, 1);
        assert!(out.contains("{{{{{CustomerName}}}}}"));
        assert!(!out.contains("proofErr"));
    }

    #[test]
    fn test_repair_chained_spans() {
        let xml = format!(
            "<w:p>{}{}{}</w:p>",
            run("{{{{{a}}"),
            run("}}} and {{{{{b"),
            run("}}}}}"),
        );
        let (out, report) = RunSplitRepairer::new().repair(&xml);
        assert_eq!(report.tokens_before, 0);
        assert_eq!(report.tokens_after, 2);
        assert_eq!(report.repaired_spans, 2);
        assert!(out.contains("{{{{{a}}}}} and {{{{{b}}}}}"));
    }

    #[test]
    fn test_repair_does_not_cross_paragraphs() {
        let xml = format!("<w:p>{}</w:p><w:p>{}</w:p>", run("{{{{{a"), run("}}}}}"));
        let (out, report) = RunSplitRepairer::new().repair(&xml);
        assert_eq!(report.repaired_spans, 0);
        assert_eq!(out, xml);
    }

    #[test]
    fn test_repair_abandons_field_code() {
        let xml = format!(
            r#"<w:p>{}<w:r><w:fldChar w:fldCharType="begin"/><w:t>}}}}}}}}</w:t></w:r>{}</w:p>"#,
            run("{{{{{a"),
            run("}")
        );
        let (out, report) = RunSplitRepairer::new().repair(&xml);
        assert_eq!(report.repaired_spans, 0);
        assert_eq!(report.abandoned_spans, 1);
        assert_eq!(out, xml);
    }

    fn field_run(text: &str) -> String {
        format!(r#"<w:r><w:fldChar w:fldCharType="begin"/><w:t>{}</w:t></w:r>"#, text)
    }

    #[test]
    fn test_repair_keeps_tracked_formatting_change() {
        let first = r#"<w:r><w:rPr><w:b/><w:rPrChange w:id="1" w:author="a"><w:rPr><w:i/></w:rPr></w:rPrChange></w:rPr><w:t>{{{{{Cust</w:t></w:r>"#;
        let xml = format!("<w:p>{}{}</w:p>", first, run("omerName}}}}}"));
        let (out, report) = RunSplitRepairer::new().repair(&xml);

        assert_eq!(report.tokens_after, 1);
        assert_eq!(
            out,
            r#"<w:p><w:r><w:rPr><w:b/><w:rPrChange w:id="1" w:author="a"><w:rPr><w:i/></w:rPr></w:rPrChange></w:rPr><w:t xml:space="preserve">{{{{{CustomerName}}}}}</w:t></w:r></w:p>"#
        );
        assert_eq!(out.matches("<w:rPrChange").count(), out.matches("</w:rPrChange>").count());
    }

    #[test]
    fn test_repair_abandons_span_across_wrapper() {
        for wrapper in [r#"<w:ins w:id="3" w:author="a">"#, r#"<w:hyperlink r:id="rId5">"#] {
            let name = &wrapper[1..wrapper.find(' ').unwrap()];
            let xml = format!(
                "<w:p>{}{}{}</{}></w:p>",
                run("{{{{{Cust"),
                wrapper,
                run("omerName}}}}}"),
                name
            );
            let (out, report) = RunSplitRepairer::new().repair(&xml);
            assert_eq!(report.repaired_spans, 0, "{}", name);
            assert_eq!(report.abandoned_spans, 1, "{}", name);
            assert_eq!(out, xml);
        }
    }

    #[test]
    fn test_repair_drops_bookmarks_between_runs() {
        let xml = format!(
            r#"<w:p>{}<w:bookmarkStart w:id="0" w:name="_Toc1"/><w:bookmarkEnd w:id="0"/>{}</w:p>"#,
            run("{{{{{Cust"),
            run("omerName}}}}}")
        );
        let (out, report) = RunSplitRepairer::new().repair(&xml);
        assert_eq!(report.repaired_spans, 1);
        assert!(out.contains("{{{{{CustomerName}}}}}"));
        assert!(!out.contains("bookmark"));
    }

    #[test]
    fn test_abandoned_span_found_in_later_pass() {
        // 第一遍修复 a 之后，重建的文本块才与域代码文本块构成跨度
        let xml = format!(
            "<w:p>{}{}{}</w:p>",
            run("{{{{{a}}"),
            run("}}} and {{{{{b"),
            field_run("}}}}}")
        );
        let (_, report) = RunSplitRepairer::new().repair(&xml);
        assert_eq!(report.repaired_spans, 1);
        assert_eq!(report.abandoned_spans, 1);
    }

    #[test]
    fn test_abandoned_span_counted_once() {
        let xml = format!(
            "<w:p>{}{}</w:p><w:p>{}{}{}</w:p>",
            run("{{{{{a"),
            run("}}}}}"),
            run("{{{{{b"),
            field_run("x"),
            run("}}}}}")
        );
        let (_, report) = RunSplitRepairer::new().repair(&xml);
        assert_eq!(report.repaired_spans, 1);
        assert_eq!(report.abandoned_spans, 1);
    }

    #[test]
    fn test_scan_runs_assigns_innermost_paragraph() {
        let xml = format!(
            "<w:p>{}</w:p><w:p>{}<w:p>{}</w:p>{}</w:p>",
            run("a"),
            run("b"),
            run("c"),
            run("d")
        );
        let paragraphs: Vec<Option<usize>> = scan_runs(&xml).iter().map(|r| r.paragraph).collect();
        // find_paragraphs 按起点排序: 0 = 第一段, 1 = 外层, 2 = 内层
        assert_eq!(paragraphs, vec![Some(0), Some(1), Some(2), Some(1)]);
    }

    #[test]
    fn test_repair_leaves_intact_tokens() {
        let xml = format!("<w:p>{}{}</w:p>", run("{{{{{a}}}}}"), run("plain"));
        let (out, report) = RunSplitRepairer::new().repair(&xml);
        assert_eq!(report.tokens_before, 1);
        assert_eq!(report.tokens_after, 1);
        assert_eq!(report.recovered(), 0);
        assert_eq!(out, xml);
    }

    #[test]
    fn test_open_brace_offset() {
        assert_eq!(open_brace_offset("abc {{"), Some(4));
        assert_eq!(open_brace_offset("{{{{{a}}}}} tail"), None);
        assert_eq!(open_brace_offset("{{{{{a}}}}} {{"), Some(12));
        assert_eq!(open_brace_offset("plain"), None);
    }
}
