// ==========================================
// 渗透测试报告生成系统 - WordprocessingML 扫描工具
// ==========================================
// 职责: 在 document.xml 文本上定位段落 <w:p> / 文本块 <w:r> / 文本节点 <w:t>
// 说明: 纯文本扫描（不做 schema 校验），只识别本系统关心的少数元素
// ==========================================

use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

fn paragraph_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // <w:p>、<w:p ...>、<w:p/>、</w:p>；不匹配 <w:pPr>、<w:pStyle> 等
    PATTERN.get_or_init(|| Regex::new(r"<(/?)w:p(?:\s[^>]*)?/?>").expect("invalid regex"))
}

fn run_open_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<w:r(?:\s[^>]*)?>").expect("invalid regex"))
}

fn text_node_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>").expect("invalid regex"))
}

fn run_properties_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // <w:rPr>、<w:rPr/>、</w:rPr>；不匹配 <w:rPrChange>
    PATTERN.get_or_init(|| Regex::new(r"</?w:rPr(?:\s[^>]*)?/?>").expect("invalid regex"))
}

fn element_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("invalid regex"))
}

fn non_semantic_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"<w:(?:proofErr|lastRenderedPageBreak)\b[^>]*/>").expect("invalid regex")
    })
}

/// 段落位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphSpan {
    pub range: Range<usize>,
    /// 嵌套深度（0 = 最外层，文本框内段落 > 0）
    pub depth: usize,
}

/// 查找全部段落（按起始位置排序）
///
/// 未闭合的段落被忽略
pub fn find_paragraphs(xml: &str) -> Vec<ParagraphSpan> {
    let mut spans = Vec::new();
    let mut open_stack: Vec<usize> = Vec::new();

    for m in paragraph_tag_pattern().find_iter(xml) {
        let tag = m.as_str();
        if tag.starts_with("</") {
            if let Some(start) = open_stack.pop() {
                spans.push(ParagraphSpan {
                    range: start..m.end(),
                    depth: open_stack.len(),
                });
            }
        } else if tag.ends_with("/>") {
            spans.push(ParagraphSpan {
                range: m.range(),
                depth: open_stack.len(),
            });
        } else {
            open_stack.push(m.start());
        }
    }

    spans.sort_by_key(|s| s.range.start);
    spans
}

/// 最外层段落
pub fn outermost_paragraphs(xml: &str) -> Vec<Range<usize>> {
    find_paragraphs(xml)
        .into_iter()
        .filter(|p| p.depth == 0)
        .map(|p| p.range)
        .collect()
}

/// 文本块位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpan {
    /// 整个 <w:r>...</w:r>
    pub range: Range<usize>,
    /// 起始标签 <w:r ...>
    pub open_tag: Range<usize>,
}

/// 查找全部文本块（按出现顺序）
pub fn find_runs(xml: &str) -> Vec<RunSpan> {
    const CLOSE: &str = "</w:r>";
    let mut runs = Vec::new();
    let mut cursor = 0usize;

    while let Some(m) = run_open_pattern().find_at(xml, cursor) {
        if m.as_str().ends_with("/>") {
            cursor = m.end();
            continue;
        }
        match xml[m.end()..].find(CLOSE) {
            Some(offset) => {
                let end = m.end() + offset + CLOSE.len();
                runs.push(RunSpan {
                    range: m.start()..end,
                    open_tag: m.range(),
                });
                cursor = end;
            }
            None => break,
        }
    }
    runs
}

/// 拼接片段内全部 <w:t> 的文本内容（保留实体原样）
pub fn text_content(xml: &str) -> String {
    text_node_pattern()
        .captures_iter(xml)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

/// 文本块的格式属性 <w:rPr>（不存在返回空串）
///
/// 按嵌套深度匹配结束标签：修订记录 <w:rPrChange> 内还有一层 <w:rPr>
pub fn run_properties(run_xml: &str) -> &str {
    let mut start: Option<usize> = None;
    let mut depth = 0usize;

    for m in run_properties_tag_pattern().find_iter(run_xml) {
        let tag = m.as_str();
        let closing = tag.starts_with("</");
        let empty = !closing && tag.ends_with("/>");

        let Some(begin) = start else {
            if closing {
                return "";
            }
            if empty {
                return tag;
            }
            start = Some(m.start());
            depth = 1;
            continue;
        };

        if closing {
            depth -= 1;
            if depth == 0 {
                return &run_xml[begin..m.end()];
            }
        } else if !empty {
            depth += 1;
        }
    }
    ""
}

/// 片段内是否只有自闭合元素（书签、换行等），不含任何起始 / 结束标签
pub fn only_empty_elements(xml: &str) -> bool {
    element_tag_pattern()
        .find_iter(xml)
        .all(|m| m.as_str().ends_with("/>"))
}

/// 删除无语义的穿插元素（拼写检查标记、渲染分页标记）
pub fn strip_non_semantic(xml: &str) -> String {
    non_semantic_pattern().replace_all(xml, "").into_owned()
}
