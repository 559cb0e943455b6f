// ==========================================
// 渗透测试报告生成系统 - 打包层
// ==========================================
// 职责: 基础模板目录 + 正文 XML → .docx 容器文件
//       报告生成主流程编排
// 资源: 临时工作目录以显式句柄传入，不使用全局固定路径
// ==========================================

pub mod assembler;
pub mod generator;
pub mod workspace;

// 重导出核心类型
pub use assembler::{output_file_name, PackageAssembler, OUTPUT_EXTENSION, REQUIRED_PARTS};
pub use generator::ReportGenerator;
pub use workspace::ScratchWorkspace;
