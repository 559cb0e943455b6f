// ==========================================
// 目录配置集成测试
// ==========================================
// 测试目标: 配置文件加载 / 保存 / 校验，与报告生成器的衔接
// ==========================================


use pentest_report::{ReportConfig, ReportError, ReportGenerator};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use test_helpers::{sample_findings, sample_metadata, TestEnv};

#[test]
fn test_missing_file_yields_defaults() {
    let temp = TempDir::new().unwrap();
    let config = ReportConfig::load_file(temp.path().join("absent.json")).unwrap();
    assert_eq!(config, ReportConfig::default());
    assert!(config.template_dir.ends_with("template"));
}

#[test]
fn test_saved_config_drives_generation() {
    let env = TestEnv::new().unwrap();
    let config_path = env.temp.path().join("pentest-report.json");

    let mut config = env.config.clone();
    config.output_dir = env.temp.path().join("custom-output");
    config.save(&config_path).unwrap();

    let loaded = ReportConfig::load_file(&config_path).unwrap();
    assert_eq!(loaded, config);

    let generator = ReportGenerator::from_config(loaded).unwrap();
    let output = generator
        .generate(&sample_findings(), &sample_metadata("初测"))
        .unwrap();
    assert!(output.starts_with(env.temp.path().join("custom-output")));
}

#[test]
fn test_saved_file_is_pretty_json() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("config.json");
    ReportConfig::rooted_at("/srv/report").save(&path).unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains('\n'));
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["scratch_dir"], "/srv/report/scratch");
}

#[test]
fn test_malformed_file_is_configuration_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");
    fs::write(&path, r#"{"template_dir": 42}"#).unwrap();

    let err = ReportConfig::load_file(&path).unwrap_err();
    assert!(matches!(err, ReportError::ConfigurationError(_)));
}

#[test]
fn test_validate_reports_missing_fragment_dir() {
    let env = TestEnv::new().unwrap();
    let mut config = env.config.clone();
    config.fragment_dir = PathBuf::from("/no/such/fragments");

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("片段目录不存在"));
}
