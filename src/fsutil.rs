// ==========================================
// 渗透测试报告生成系统 - 文件系统基础设施
// ==========================================
// 目标:
// - 统一“先写临时文件再 rename”的落盘方式，外部读者永远看不到半写文件
// - 模板目录的尽力复制（单文件失败记录后继续）
// - 临时工作目录的清空
// ==========================================

use crate::error::{ReportError, ReportResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// 原子写入文件（同目录临时文件 + rename）
///
/// 临时文件位于目标文件所在目录，保证 rename 不跨文件系统
pub fn write_atomic<P: AsRef<Path>>(path: P, contents: impl AsRef<[u8]>) -> ReportResult<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|e| ReportError::io(&parent, e))?;

    let temp_path = temp_sibling(path);
    fs::write(&temp_path, contents).map_err(|e| ReportError::io(&temp_path, e))?;

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(ReportError::io(path, e));
    }
    Ok(())
}

/// 目标文件的同目录临时路径：.<文件名>.tmp
pub fn temp_sibling(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{}.tmp", file_name))
}

/// 单个文件复制失败记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFailure {
    pub path: PathBuf,
    pub message: String,
}

/// 目录复制结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    pub copied_files: usize,
    pub failures: Vec<CopyFailure>,
}

impl CopyReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 递归复制目录（尽力而为）
///
/// - 源目录不存在 / 不可读 → Err
/// - 单个文件或子目录失败 → 记录到 CopyReport 并 warn，继续复制其余文件
pub fn copy_tree<P: AsRef<Path>, Q: AsRef<Path>>(src: P, dst: Q) -> ReportResult<CopyReport> {
    let src = src.as_ref();
    let dst = dst.as_ref();
    fs::read_dir(src).map_err(|e| ReportError::io(src, e))?;
    fs::create_dir_all(dst).map_err(|e| ReportError::io(dst, e))?;

    let mut report = CopyReport::default();
    let mut walker = WalkDir::new(src).min_depth(1).sort_by_file_name().into_iter();
    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let path = e.path().unwrap_or(src).to_path_buf();
                record_failure(&mut report, path, e);
                continue;
            }
        };

        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let to = dst.join(relative);

        if entry.file_type().is_dir() {
            if let Err(e) = fs::create_dir_all(&to) {
                record_failure(&mut report, to, e);
                walker.skip_current_dir();
            }
        } else {
            match fs::copy(entry.path(), &to) {
                Ok(_) => report.copied_files += 1,
                Err(e) => record_failure(&mut report, entry.into_path(), e),
            }
        }
    }
    Ok(report)
}

fn record_failure(report: &mut CopyReport, path: PathBuf, err: impl std::fmt::Display) {
    warn!(path = %path.display(), error = %err, "模板文件复制失败（继续复制其余文件）");
    report.failures.push(CopyFailure {
        path,
        message: err.to_string(),
    });
}

/// 清空目录内容（目录本身保留；不存在则创建）
pub fn clear_dir<P: AsRef<Path>>(dir: P) -> ReportResult<()> {
    let dir = dir.as_ref();
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| ReportError::io(dir, e))?;
        return Ok(());
    }

    for entry in fs::read_dir(dir).map_err(|e| ReportError::io(dir, e))? {
        let entry = entry.map_err(|e| ReportError::io(dir, e))?;
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        let result = if is_dir {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.map_err(|e| ReportError::io(&path, e))?;
    }
    Ok(())
}

/// 目录是否为空（不存在视为空）
pub fn is_dir_empty<P: AsRef<Path>>(dir: P) -> bool {
    match fs::read_dir(dir.as_ref()) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => true,
    }
}
