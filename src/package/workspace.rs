// ==========================================
// 渗透测试报告生成系统 - 临时工作目录句柄
// ==========================================
// 职责: 打包过程使用的临时目录（复制模板 → 覆写正文 → 压缩）
// 约定: 调用方获取 (acquire) 并释放 (release) 句柄
//       同一路径上同时只能有一个生成任务，不同路径的句柄互不影响
//       本模块不加锁
//       目录内写入标记文件；非空且无标记的目录不是本系统创建的，拒绝清空
// ==========================================

use crate::error::{ReportError, ReportResult};
use crate::fsutil::{clear_dir, is_dir_empty};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 工作目录标记文件（不进入压缩包）
pub const WORKSPACE_MARKER: &str = ".pentest-report-scratch";

#[derive(Debug)]
pub struct ScratchWorkspace {
    root: PathBuf,
}

impl ScratchWorkspace {
    /// 获取工作目录（不存在则创建，已有残留内容则清空）
    ///
    /// # 错误
    /// - ConfigurationError: 目录非空且没有标记文件
    pub fn acquire<P: Into<PathBuf>>(root: P) -> ReportResult<Self> {
        let root = root.into();
        if !is_dir_empty(&root) && !root.join(WORKSPACE_MARKER).is_file() {
            return Err(ReportError::ConfigurationError(format!(
                "临时工作目录非空且不是本系统创建的，拒绝清空: {}",
                root.display()
            )));
        }

        let workspace = Self { root };
        workspace.clear()?;
        debug!(root = %workspace.root.display(), "获取临时工作目录");
        Ok(workspace)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 工作目录内的相对路径
    pub fn join<P: AsRef<Path>>(&self, relative: P) -> PathBuf {
        self.root.join(relative)
    }

    /// 清空工作目录内容（保留标记文件）
    pub fn clear(&self) -> ReportResult<()> {
        clear_dir(&self.root)?;
        let marker = self.root.join(WORKSPACE_MARKER);
        fs::write(&marker, "").map_err(|e| ReportError::io(&marker, e))
    }

    /// 除标记文件外没有其他内容
    pub fn is_empty(&self) -> bool {
        match fs::read_dir(&self.root) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .all(|e| e.file_name() == WORKSPACE_MARKER),
            Err(_) => true,
        }
    }

    /// 释放句柄并删除工作目录
    pub fn release(self) -> ReportResult<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root).map_err(|e| ReportError::io(&self.root, e))?;
        }
        debug!(root = %self.root.display(), "释放临时工作目录");
        Ok(())
    }
}
