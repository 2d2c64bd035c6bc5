// ==========================================
// 考试名册系统 - 核心库
// ==========================================
// 职责: 学生名册（CSV/XLSX）导入、校验、去重与落库
// 技术栈: Rust + SQLite
// 管道: 表头规范化 -> 行解析 -> 行校验 -> 重复检测 -> 落库 -> 结果汇总
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 名册导入管道
pub mod importer;

// 配置层 - 名册字段定义与系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 上传文件清理
pub mod artifact;

// 查询缓存
pub mod cache;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{FieldValue, RosterVariant};

// 领域实体
pub use domain::roster::{
    FailureKind, ImportBatch, ImportFailure, ImportOutcome, RawRow, RowError, StudentRecord,
    ValidatedRecord,
};

// 导入
pub use importer::{ImportError, RosterImporter, RosterImporterImpl};

// API
pub use api::{ApiError, ImportApi, StudentLookupApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "考试名册系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
