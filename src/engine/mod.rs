// ==========================================
// 渗透测试报告生成系统 - 引擎层
// ==========================================
// 职责: 文本转义、标识生成、片段渲染、正文与前言组装
// 红线: 引擎只产出 XML 文本，不负责打包与落盘
// ==========================================

pub mod composer;
pub mod fragment;
pub mod identifier;
pub mod placeholder;
pub mod sanitizer;

// 重导出核心引擎
pub use composer::{
    apply_front_matter, assemble_document, compose_front_matter, front_matter_substitutions,
    vulnerability_heading, ContentComposer, FrontMatter, DOCUMENT_PART, SECTION_TITLES,
};
pub use fragment::{FragmentRenderer, FragmentTemplate};
pub use identifier::{new_cross_ref_name, new_disambiguator, new_paragraph_id};
pub use placeholder::{substitute, Placeholder, Substituted, Substitutions};
pub use sanitizer::{escape, unescape};
