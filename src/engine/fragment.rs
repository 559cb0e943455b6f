// ==========================================
// 渗透测试报告生成系统 - 片段模板渲染器
// ==========================================
// 输入: 片段模板目录（一级~四级标题 + 正文，共 5 个文件）
// 输出: 替换后的段落 XML
// 规则: 文本先转义；每个实例都生成新的 paraId / TocName
//       正文含换行时按行拆分，每行一个段落实例
// ==========================================

use crate::domain::types::{HeadingLevel, PlaceholderClass};
use crate::engine::identifier::{new_cross_ref_name, new_paragraph_id};
use crate::engine::placeholder::{occurrences, substitute, Placeholder, Substitutions};
use crate::engine::sanitizer::escape;
use crate::error::{ReportError, ReportResult};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, instrument, warn};

// ==========================================
// FragmentTemplate - 单个片段模板
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentTemplate {
    class: PlaceholderClass,
    xml: String,
}

impl FragmentTemplate {
    /// 创建片段模板并校验占位符
    ///
    /// # 错误
    /// - ConfigurationError: 模板不含本类别的文本占位符
    ///
    /// 缺少 paraId / TocName 仅告警
    pub fn new(class: PlaceholderClass, xml: impl Into<String>) -> ReportResult<Self> {
        let xml = xml.into();
        let text_key = Placeholder::Text(class);

        if occurrences(&xml, text_key) == 0 {
            return Err(ReportError::ConfigurationError(format!(
                "片段模板 {} 缺少文本占位符 {}",
                class.file_name(),
                text_key.token()
            )));
        }
        for volatile in [Placeholder::ParaId, Placeholder::TocName] {
            if occurrences(&xml, volatile) == 0 {
                warn!(
                    template = class.file_name(),
                    "片段模板缺少易变属性占位符 {}",
                    volatile.token()
                );
            }
        }

        Ok(Self { class, xml })
    }

    /// 从目录加载固定文件名的片段模板
    pub fn load<P: AsRef<Path>>(dir: P, class: PlaceholderClass) -> ReportResult<Self> {
        let path = dir.as_ref().join(class.file_name());
        if !path.is_file() {
            return Err(ReportError::TemplateNotFound(path.display().to_string()));
        }
        let xml = std::fs::read_to_string(&path).map_err(|e| ReportError::io(&path, e))?;
        Self::new(class, xml)
    }

    pub fn class(&self) -> PlaceholderClass {
        self.class
    }

    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// 渲染一个实例（文本转义 + 新标识符）
    pub fn instantiate(&self, text: &str) -> String {
        let subs = Substitutions::new()
            .with(Placeholder::Text(self.class), escape(text))
            .with(Placeholder::ParaId, new_paragraph_id())
            .with(Placeholder::TocName, new_cross_ref_name());

        let result = substitute(&self.xml, &subs);
        if !result.unused.is_empty() {
            debug!(
                template = self.class.file_name(),
                unused = ?result.unused,
                "片段模板未使用的替换键"
            );
        }
        result.text
    }
}

// ==========================================
// FragmentRenderer - 片段渲染器
// ==========================================
#[derive(Debug, Clone)]
pub struct FragmentRenderer {
    templates: BTreeMap<PlaceholderClass, FragmentTemplate>,
}

impl FragmentRenderer {
    /// 从片段目录加载全部 5 个模板
    ///
    /// # 错误
    /// - TemplateNotFound: 目录或任一模板文件不存在
    #[instrument(skip_all, fields(dir = %fragment_dir.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(fragment_dir: P) -> ReportResult<Self> {
        let dir = fragment_dir.as_ref();
        if !dir.is_dir() {
            return Err(ReportError::TemplateNotFound(dir.display().to_string()));
        }

        let templates = PlaceholderClass::ALL
            .into_iter()
            .map(|class| FragmentTemplate::load(dir, class))
            .collect::<ReportResult<Vec<_>>>()?;

        Self::from_templates(templates)
    }

    /// 从已有模板构建（必须覆盖全部 5 个类别）
    pub fn from_templates(
        templates: impl IntoIterator<Item = FragmentTemplate>,
    ) -> ReportResult<Self> {
        let templates: BTreeMap<PlaceholderClass, FragmentTemplate> = templates
            .into_iter()
            .map(|t| (t.class(), t))
            .collect();

        for class in PlaceholderClass::ALL {
            if !templates.contains_key(&class) {
                return Err(ReportError::ConfigurationError(format!(
                    "缺少片段模板: {}",
                    class.file_name()
                )));
            }
        }

        Ok(Self { templates })
    }

    fn template(&self, class: PlaceholderClass) -> &FragmentTemplate {
        // from_templates 已保证全部类别存在
        &self.templates[&class]
    }

    /// 渲染标题（1-4 级）
    pub fn render_heading(&self, level: HeadingLevel, text: &str) -> String {
        self.template(level.placeholder_class()).instantiate(text)
    }

    /// 渲染正文
    ///
    /// - 不含换行: 单个实例
    /// - 含换行: 每行一个实例（空行也渲染），实例之间以换行连接
    pub fn render_body(&self, text: &str) -> String {
        let template = self.template(PlaceholderClass::NormalText);
        if !text.contains('\n') {
            return template.instantiate(text);
        }

        text.split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .map(|line| template.instantiate(line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use std::collections::HashSet;

    fn template_xml(class: PlaceholderClass) -> String {
        format!(
            r#"<w:p w14:paraId="{{{{{{{{{{paraId}}}}}}}}}}"><w:bookmarkStart w:id="0" w:name="{{{{{{{{{{TocName}}}}}}}}}}"/><w:r><w:t>{}</w:t></w:r><w:bookmarkEnd w:id="0"/></w:p>"#,
            Placeholder::Text(class).token()
        )
    }

    fn renderer() -> FragmentRenderer {
        FragmentRenderer::from_templates(
            PlaceholderClass::ALL
                .into_iter()
                .map(|c| FragmentTemplate::new(c, template_xml(c)).unwrap()),
        )
        .unwrap()
    }

    fn para_ids(xml: &str) -> Vec<String> {
        let re = Regex::new(r#"w14:paraId="([0-9A-F]{8})""#).unwrap();
        re.captures_iter(xml).map(|c| c[1].to_string()).collect()
    }

    fn toc_names(xml: &str) -> Vec<String> {
        let re = Regex::new(r#"w:name="(_Toc\d{8})""#).unwrap();
        re.captures_iter(xml).map(|c| c[1].to_string()).collect()
    }

    #[test]
    fn test_template_xml_helper() {
        let xml = template_xml(PlaceholderClass::NormalText);
        assert!(xml.contains(r#"w14:paraId="{{{{{paraId}}}}}""#));
        assert!(xml.contains(r#"w:name="{{{{{TocName}}}}}""#));
        assert!(xml.contains("{{{{{NormalText}}}}}"));
    }

    #[test]
    fn test_render_heading_escapes_and_fills_ids() {
        let xml = renderer().render_heading(HeadingLevel::Third, "【高危】<SQLi> & XSS");
        assert!(xml.contains("<w:t>【高危】&lt;SQLi&gt; &amp; XSS</w:t>"));
        assert_eq!(para_ids(&xml).len(), 1);
        assert_eq!(toc_names(&xml).len(), 1);
        assert!(!xml.contains("{{{{{"));
    }

    #[test]
    fn test_render_body_single_line() {
        let xml = renderer().render_body("单行文本");
        assert_eq!(xml.matches("<w:p ").count(), 1);
        assert!(!xml.contains('\n'));
    }

    #[test]
    fn test_render_body_multi_line() {
        let xml = renderer().render_body("a\nb\nc");
        let parts: Vec<&str> = xml.split('\n').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[0].contains("<w:t>a</w:t>"));
        assert!(parts[1].contains("<w:t>b</w:t>"));
        assert!(parts[2].contains("<w:t>c</w:t>"));

        let ids: HashSet<String> = para_ids(&xml).into_iter().collect();
        let tocs: HashSet<String> = toc_names(&xml).into_iter().collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(tocs.len(), 3);
    }

    #[test]
    fn test_render_body_keeps_empty_lines() {
        let xml = renderer().render_body("a\n\nb\r\n");
        let parts: Vec<&str> = xml.split('\n').collect();
        assert_eq!(parts.len(), 4);
        assert!(parts[1].contains("<w:t></w:t>"));
        assert!(parts[3].contains("<w:t></w:t>"));
        assert!(!xml.contains('\r'));
    }

    #[test]
    fn test_template_without_text_placeholder_is_rejected() {
        let err = FragmentTemplate::new(
            PlaceholderClass::FirstLevelHeading,
            template_xml(PlaceholderClass::NormalText),
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_renderer_requires_all_classes() {
        let only_one = FragmentTemplate::new(
            PlaceholderClass::NormalText,
            template_xml(PlaceholderClass::NormalText),
        )
        .unwrap();
        assert!(FragmentRenderer::from_templates([only_one]).is_err());
    }

    #[test]
    fn test_load_missing_dir() {
        let err = FragmentRenderer::load("/definitely/not/here").unwrap_err();
        assert!(matches!(err, ReportError::TemplateNotFound(_)));
    }
}
