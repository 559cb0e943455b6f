// ==========================================
// 渗透测试报告生成系统 - 文档打包器
// ==========================================
// 流程:
// 1. 清空临时工作目录
// 2. 复制基础模板目录（尽力而为，单文件失败仅告警）
// 3. 覆写 word/document.xml（缺失即失败）
// 4. 计算输出文件名
// 5. 按固定部件列表压缩为 .docx
// 6. 无论成功失败都清空临时工作目录
// ==========================================

use crate::domain::report::ReportMetadata;
use crate::engine::composer::DOCUMENT_PART;
use crate::engine::identifier::new_disambiguator;
use crate::error::{ReportError, ReportResult};
use crate::fsutil::{copy_tree, temp_sibling};
use crate::package::workspace::ScratchWorkspace;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// docx 必需的顶层部件（[Content_Types].xml 置于首位）
pub const REQUIRED_PARTS: [&str; 5] = [
    "[Content_Types].xml",
    "_rels",
    "docProps",
    "customXml",
    "word",
];

/// 输出文件扩展名
pub const OUTPUT_EXTENSION: &str = "docx";

/// 文件名中不允许出现的字符
const FORBIDDEN_FILE_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// 输出文件名: <客户名><报告标题><YYYYMMDD>_<4位十六进制>.docx
pub fn output_file_name(metadata: &ReportMetadata, disambiguator: &str) -> String {
    format!(
        "{}{}{}_{}.{}",
        sanitize_file_component(&metadata.customer_name),
        metadata.test_type.report_title(),
        metadata.report_date.compact(),
        disambiguator,
        OUTPUT_EXTENSION
    )
}

fn sanitize_file_component(name: &str) -> String {
    name.chars()
        .map(|c| {
            if FORBIDDEN_FILE_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

// ==========================================
// PackageAssembler - 文档打包器
// ==========================================
#[derive(Debug, Clone)]
pub struct PackageAssembler {
    output_dir: PathBuf,
}

impl PackageAssembler {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 生成 docx 文件
    ///
    /// # 参数
    /// - workspace: 调用方持有的临时工作目录句柄
    /// - template_dir: 基础模板目录（解压后的 docx 结构）
    /// - full_body_xml: 完整的 word/document.xml 内容
    /// - metadata: 报告元数据（用于输出文件名）
    ///
    /// # 返回
    /// - Ok(PathBuf): 输出文件路径
    /// - Err: 模板缺失 / IO 错误 / 压缩错误（工作目录已清空）
    #[instrument(skip_all, fields(template_dir = %template_dir.as_ref().display()))]
    pub fn generate<P: AsRef<Path>>(
        &self,
        workspace: &ScratchWorkspace,
        template_dir: P,
        full_body_xml: &str,
        metadata: &ReportMetadata,
    ) -> ReportResult<PathBuf> {
        let result = self.build_package(workspace, template_dir.as_ref(), full_body_xml, metadata);

        if let Err(e) = workspace.clear() {
            warn!(error = %e, "清空临时工作目录失败（下次生成时会重试）");
        }

        match &result {
            Ok(path) => info!(output = %path.display(), "报告生成成功"),
            Err(e) => warn!(error = %e, "报告生成失败"),
        }
        result
    }

    fn build_package(
        &self,
        workspace: &ScratchWorkspace,
        template_dir: &Path,
        full_body_xml: &str,
        metadata: &ReportMetadata,
    ) -> ReportResult<PathBuf> {
        if !template_dir.is_dir() {
            return Err(ReportError::TemplateNotFound(template_dir.display().to_string()));
        }

        workspace.clear()?;

        let report = copy_tree(template_dir, workspace.root())?;
        if !report.is_complete() {
            warn!(
                copied = report.copied_files,
                failed = report.failures.len(),
                "模板目录部分文件复制失败"
            );
        }

        let body_path = workspace.join(DOCUMENT_PART);
        if !body_path.is_file() {
            return Err(ReportError::io(&body_path, "临时目录中缺少正文部件"));
        }
        fs::write(&body_path, full_body_xml).map_err(|e| ReportError::io(&body_path, e))?;

        fs::create_dir_all(&self.output_dir).map_err(|e| ReportError::io(&self.output_dir, e))?;
        let output_path = self
            .output_dir
            .join(output_file_name(metadata, &new_disambiguator()));

        let entries = zip_parts(workspace.root(), &REQUIRED_PARTS, &output_path)?;
        info!(entries, "docx 压缩完成");
        Ok(output_path)
    }
}

/// 收集部件下的全部文件（按文件名排序遍历，保证输出稳定）
fn collect_part_files(root: &Path, part: &str) -> ReportResult<Vec<(String, PathBuf)>> {
    let part_path = root.join(part);
    if part_path.is_file() {
        return Ok(vec![(part.to_string(), part_path)]);
    }
    if !part_path.is_dir() {
        return Err(ReportError::io(&part_path, "缺少 docx 必需部件"));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&part_path).sort_by_file_name() {
        let entry =
            entry.map_err(|e| ReportError::io(e.path().unwrap_or(part_path.as_path()), &e))?;
        if entry.file_type().is_file() {
            files.push((entry_name(root, entry.path())?, entry.into_path()));
        }
    }
    Ok(files)
}

/// 压缩条目名：相对工作目录根，使用 '/' 分隔
fn entry_name(root: &Path, path: &Path) -> ReportResult<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|e| ReportError::io(path, e))?;
    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/"))
}

/// 将必需部件压缩为 docx（写临时文件后 rename）
///
/// 返回写入的条目数
fn zip_parts(root: &Path, parts: &[&str], output_path: &Path) -> ReportResult<usize> {
    let mut files = Vec::new();
    for part in parts {
        files.extend(collect_part_files(root, part)?);
    }

    let temp_path = temp_sibling(output_path);
    let result = write_zip(&temp_path, &files).and_then(|count| {
        fs::rename(&temp_path, output_path).map_err(|e| ReportError::io(output_path, e))?;
        Ok(count)
    });

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_zip(path: &Path, files: &[(String, PathBuf)]) -> ReportResult<usize> {
    let file = File::create(path).map_err(|e| ReportError::io(path, e))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, source) in files {
        zip.start_file(name.as_str(), options)?;
        let mut reader = File::open(source).map_err(|e| ReportError::io(source, e))?;
        io::copy(&mut reader, &mut zip).map_err(|e| ReportError::io(source, e))?;
    }

    let mut file = zip.finish()?;
    file.flush().map_err(|e| ReportError::io(path, e))?;
    Ok(files.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::report::{ReportDate, RiskCounts};
    use crate::domain::types::TestType;
    use regex::Regex;
    use std::io::Read;
    use tempfile::TempDir;

    fn metadata(customer: &str, test_type: TestType) -> ReportMetadata {
        ReportMetadata {
            customer_name: customer.to_string(),
            test_type,
            signature_name: String::new(),
            report_date: ReportDate::parse("2025年3月5日").unwrap(),
            tester_name: String::new(),
            author: String::new(),
            pm_name: String::new(),
            counts: RiskCounts::default(),
        }
    }

    fn build_template(dir: &Path) {
        fs::create_dir_all(dir.join("_rels")).unwrap();
        fs::create_dir_all(dir.join("docProps")).unwrap();
        fs::create_dir_all(dir.join("customXml/_rels")).unwrap();
        fs::create_dir_all(dir.join("word/_rels")).unwrap();
        fs::write(dir.join("[Content_Types].xml"), "<Types/>").unwrap();
        fs::write(dir.join("_rels/.rels"), "<Relationships/>").unwrap();
        fs::write(dir.join("docProps/core.xml"), "<core/>").unwrap();
        fs::write(dir.join("customXml/item1.xml"), "<item/>").unwrap();
        fs::write(dir.join("customXml/_rels/item1.xml.rels"), "<r/>").unwrap();
        fs::write(dir.join("word/document.xml"), "{{{{{MainContent}}}}}").unwrap();
        fs::write(dir.join("word/_rels/document.xml.rels"), "<r/>").unwrap();
        // 非必需部件不进入压缩包
        fs::write(dir.join("notes.txt"), "ignored").unwrap();
    }

    #[test]
    fn test_output_file_name() {
        let name = output_file_name(&metadata("ACME", TestType::Initial), "a1b2");
        assert_eq!(name, "ACME渗透测试报告20250305_a1b2.docx");

        let name = output_file_name(&metadata("ACME", TestType::Retest), "00ff");
        assert_eq!(name, "ACME渗透测试复测报告20250305_00ff.docx");
    }

    #[test]
    fn test_output_file_name_pattern_with_random_suffix() {
        let name = output_file_name(&metadata("ACME", TestType::Initial), &new_disambiguator());
        let re = Regex::new(r"^ACME渗透测试报告20250305_[0-9a-f]{4}\.docx$").unwrap();
        assert!(re.is_match(&name), "{}", name);
    }

    #[test]
    fn test_output_file_name_sanitizes_customer() {
        let name = output_file_name(&metadata("A/B:C", TestType::Initial), "0000");
        assert!(name.starts_with("A_B_C渗透测试报告"));
    }

    #[test]
    fn test_generate_zips_required_parts() {
        let tmp = TempDir::new().unwrap();
        let template = tmp.path().join("template");
        build_template(&template);
        let ws = ScratchWorkspace::acquire(tmp.path().join("scratch")).unwrap();
        let assembler = PackageAssembler::new(tmp.path().join("out"));

        let output = assembler
            .generate(&ws, &template, "<w:document>body</w:document>", &metadata("ACME", TestType::Initial))
            .unwrap();
        assert!(output.is_file());
        assert!(ws.is_empty());

        let mut archive = zip::ZipArchive::new(File::open(&output).unwrap()).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names[0], "[Content_Types].xml");
        assert!(names.contains(&"_rels/.rels".to_string()));
        assert!(names.contains(&"customXml/_rels/item1.xml.rels".to_string()));
        assert!(!names.iter().any(|n| n == "notes.txt"));

        let mut body = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut body)
            .unwrap();
        assert_eq!(body, "<w:document>body</w:document>");

        // 模板本身未被改动
        assert_eq!(
            fs::read_to_string(template.join("word/document.xml")).unwrap(),
            "{{{{{MainContent}}}}}"
        );
    }

    #[test]
    fn test_generate_missing_part_cleans_workspace() {
        let tmp = TempDir::new().unwrap();
        let template = tmp.path().join("template");
        build_template(&template);
        fs::remove_dir_all(template.join("customXml")).unwrap();
        let ws = ScratchWorkspace::acquire(tmp.path().join("scratch")).unwrap();
        let assembler = PackageAssembler::new(tmp.path().join("out"));

        let err = assembler
            .generate(&ws, &template, "x", &metadata("ACME", TestType::Initial))
            .unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
        assert!(ws.is_empty());
        assert!(crate::fsutil::is_dir_empty(tmp.path().join("out")));
    }

    #[test]
    fn test_generate_missing_template_dir() {
        let tmp = TempDir::new().unwrap();
        let ws = ScratchWorkspace::acquire(tmp.path().join("scratch")).unwrap();
        let assembler = PackageAssembler::new(tmp.path().join("out"));
        let err = assembler
            .generate(&ws, tmp.path().join("missing"), "x", &metadata("ACME", TestType::Initial))
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(ws.is_empty());
    }

    #[test]
    fn test_generate_missing_body_part_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let template = tmp.path().join("template");
        build_template(&template);
        fs::remove_file(template.join("word/document.xml")).unwrap();
        let ws = ScratchWorkspace::acquire(tmp.path().join("scratch")).unwrap();
        let assembler = PackageAssembler::new(tmp.path().join("out"));

        let err = assembler
            .generate(&ws, &template, "x", &metadata("ACME", TestType::Initial))
            .unwrap_err();
        assert!(err.to_string().contains("document.xml"));
        assert!(ws.is_empty());
    }
}
