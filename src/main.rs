// ==========================================
// 渗透测试报告生成系统 - 命令行入口
// ==========================================
// 用法: pentest-report <form.json> <findings.json> [config.json]
// 输出: 生成的 .docx 路径（stdout）
// ==========================================

use anyhow::Context;
use pentest_report::{logging, FindingsTree, ReportConfig, ReportForm, ReportGenerator, ReportMetadata};
use std::path::PathBuf;

const DEFAULT_CONFIG_FILE: &str = "pentest-report.json";

fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let (form_path, findings_path) = match (args.next(), args.next()) {
        (Some(form), Some(findings)) => (PathBuf::from(form), PathBuf::from(findings)),
        _ => {
            eprintln!("用法: pentest-report <form.json> <findings.json> [config.json]");
            std::process::exit(2);
        }
    };
    let config_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| ReportConfig::default_root().join(DEFAULT_CONFIG_FILE));

    tracing::info!("==================================================");
    tracing::info!("{} v{}", pentest_report::APP_NAME, pentest_report::VERSION);
    tracing::info!("==================================================");

    let config = ReportConfig::load(&config_path)
        .with_context(|| format!("加载配置失败: {}", config_path.display()))?;

    let raw_form = std::fs::read_to_string(&form_path)
        .with_context(|| format!("读取表单失败: {}", form_path.display()))?;
    let form: ReportForm = serde_json::from_str(&raw_form)
        .with_context(|| format!("表单格式错误: {}", form_path.display()))?;

    let findings = FindingsTree::from_json_file(&findings_path)?;
    let metadata = ReportMetadata::from_form_with_fallback(&form, &findings.risk_counts())?;

    let generator = ReportGenerator::from_config(config)?;
    let output = generator.generate(&findings, &metadata)?;

    println!("{}", output.display());
    Ok(())
}
