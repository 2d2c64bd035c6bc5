// ==========================================
// 考试名册系统 - 导入层
// ==========================================
// 职责: 名册文件导入（解析 → 规范化 → 校验 → 去重 → 落库 → 汇总）
// 支持: Excel (.xlsx/.xls), CSV
// ==========================================

// 模块声明
pub mod conflict_handler;
pub mod data_cleaner;
pub mod error;
pub mod file_parser;
pub mod result_reporter;
pub mod roster_importer_impl;
pub mod roster_importer_trait;
pub mod row_validator;
pub mod schema_normalizer;

// 重导出核心类型
pub use conflict_handler::ConflictHandler;
pub use data_cleaner::DataCleaner;
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, SheetReader, SourceRecord, UniversalFileParser};
pub use result_reporter::ResultReporter;
pub use roster_importer_impl::RosterImporterImpl;
pub use row_validator::ProfileRowValidator;
pub use schema_normalizer::{NormalizedSchema, ProfileSchemaNormalizer};

// 重导出 Trait 接口
pub use roster_importer_trait::{
    DuplicateResolver, FileParser, RosterImporter, RowValidator, SchemaNormalizer,
};
