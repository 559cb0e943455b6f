// ==========================================
// 渗透测试报告生成系统 - 模板维护工具层
// ==========================================
// 离线工具，不参与报告生成流程:
// - extractor: 从标注好的文档提取片段模板
// - run_repair: 修复被 Word 拆进多个文本块的占位符
// ==========================================

pub mod extractor;
pub mod run_repair;
pub mod xml_scan;

pub use extractor::{
    classify_paragraph, neutralize_volatile, ExtractedFragment, Extraction, ExtractionReport,
    FragmentExtractor, ParagraphKind,
};
pub use run_repair::{RepairReport, RunSplitRepairer};
