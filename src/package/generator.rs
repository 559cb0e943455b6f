// ==========================================
// 渗透测试报告生成系统 - 报告生成编排器
// ==========================================
// 主流程:
// 1. 漏洞树 → 正文 XML（ContentComposer）
// 2. 基础模板按 MainContent 标记切分后前言替换（compose_front_matter）
// 3. 正文插入标记处（assemble_document）
// 4. 临时工作目录中打包为 .docx（PackageAssembler）
// ==========================================

use crate::config::ReportConfig;
use crate::domain::findings::FindingsTree;
use crate::domain::report::ReportMetadata;
use crate::engine::composer::{assemble_document, compose_front_matter, ContentComposer};
use crate::engine::fragment::FragmentRenderer;
use crate::error::ReportResult;
use crate::package::assembler::PackageAssembler;
use crate::package::workspace::ScratchWorkspace;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

// ==========================================
// ReportGenerator - 报告生成编排器
// ==========================================
pub struct ReportGenerator {
    config: ReportConfig,
    composer: ContentComposer,
    assembler: PackageAssembler,
}

impl ReportGenerator {
    /// 按配置创建（校验目录并加载全部片段模板）
    ///
    /// # 错误
    /// - ConfigurationError: 模板 / 片段目录不存在，或片段模板缺少文本占位符
    /// - TemplateNotFound: 片段模板文件缺失
    pub fn from_config(config: ReportConfig) -> ReportResult<Self> {
        config.validate()?;
        let renderer = FragmentRenderer::load(&config.fragment_dir)?;
        Ok(Self::with_renderer(config, renderer))
    }

    pub fn with_renderer(config: ReportConfig, renderer: FragmentRenderer) -> Self {
        let assembler = PackageAssembler::new(config.output_dir.clone());
        Self {
            composer: ContentComposer::new(renderer),
            assembler,
            config,
        }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// 生成完整的 word/document.xml 文本（不落盘）
    pub fn render_document(
        &self,
        findings: &FindingsTree,
        metadata: &ReportMetadata,
    ) -> ReportResult<String> {
        let body = self.composer.compose_body(findings, metadata);
        let front_matter = compose_front_matter(&self.config.template_dir, metadata)?;
        Ok(assemble_document(&front_matter, &body))
    }

    /// 生成报告文件，返回输出路径
    ///
    /// 临时工作目录在成功和失败时都会被删除
    #[instrument(skip_all, fields(customer = %metadata.customer_name, test_type = %metadata.test_type))]
    pub fn generate(
        &self,
        findings: &FindingsTree,
        metadata: &ReportMetadata,
    ) -> ReportResult<PathBuf> {
        let document_xml = self.render_document(findings, metadata)?;

        let workspace = ScratchWorkspace::acquire(&self.config.scratch_dir)?;
        let result = self.assembler.generate(
            &workspace,
            &self.config.template_dir,
            &document_xml,
            metadata,
        );
        if let Err(e) = workspace.release() {
            warn!(error = %e, "释放临时工作目录失败");
        }

        let path = result?;
        info!(output = %path.display(), "报告已生成");
        Ok(path)
    }
}
