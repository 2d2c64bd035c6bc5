// ==========================================
// 考试名册系统 - 名册导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 管道: 文件解析 → 表头规范化 → 行校验 → 重复检测 → 落库 → 结果汇总
// ==========================================

use crate::config::field_spec::RosterProfile;
use crate::domain::roster::{ImportOutcome, RawRow, RowError, ValidatedRecord};
use crate::importer::error::ImportResult;
use crate::importer::file_parser::SheetReader;
use crate::importer::schema_normalizer::NormalizedSchema;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

// ==========================================
// RosterImporter Trait
// ==========================================
// 用途: 名册导入主接口
// 实现者: RosterImporterImpl
#[async_trait]
pub trait RosterImporter: Send + Sync {
    /// 导入单个名册文件
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 导入完成（可能含行级错误）
    /// - Err(ImportError): 致命错误（缺列/解析失败/重复学号/存储不可用），未写入任何记录
    ///
    /// # 说明
    /// - 无论成功与否，源文件在返回前被删除
    async fn import(&self, file_path: &Path) -> ImportResult<ImportOutcome>;

    /// 批量导入多个文件（并发执行）
    ///
    /// # 说明
    /// - 每个文件的导入是独立的，互不影响
    /// - 结果顺序与输入顺序一致
    async fn batch_import(&self, file_paths: Vec<PathBuf>) -> Vec<ImportResult<ImportOutcome>>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（行解析器）
// 实现者: CsvParser, ExcelParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 打开文件，读取表头，返回惰性的数据行迭代器
    ///
    /// # 参数
    /// - file_path: 文件路径
    /// - encoding: 文本编码标签（CSV 使用；存在 BOM 时以 BOM 为准）
    fn open(&self, file_path: &Path, encoding: &str) -> ImportResult<SheetReader>;
}

// ==========================================
// SchemaNormalizer Trait
// ==========================================
// 用途: 表头重命名 + 必填列检查
// 实现者: ProfileSchemaNormalizer
pub trait SchemaNormalizer: Send + Sync {
    /// # 返回
    /// - Ok(NormalizedSchema): 规范列名（按源列位置）与被忽略的未知列
    /// - Err(ImportError::MissingColumns): 缺少必填列
    fn normalize(&self, headers: &[String], profile: &RosterProfile) -> ImportResult<NormalizedSchema>;
}

// ==========================================
// RowValidator Trait
// ==========================================
// 用途: 单行校验（穷举全部违规，不短路）
// 实现者: ProfileRowValidator
pub trait RowValidator: Send + Sync {
    fn validate(&self, row: &RawRow, profile: &RosterProfile) -> Result<ValidatedRecord, RowError>;
}

// ==========================================
// DuplicateResolver Trait
// ==========================================
// 用途: 学号重复检测
// 实现者: ConflictHandler
pub trait DuplicateResolver: Send + Sync {
    /// 检测同批次内重复学号
    ///
    /// # 返回
    /// - 出现两次及以上的学号（排序、去重）
    fn detect_batch_duplicates(&self, records: &[ValidatedRecord]) -> Vec<String>;

    /// 检测与已落库记录冲突的学号
    ///
    /// # 参数
    /// - existing: 存储中已存在的学号
    fn detect_persisted_duplicates(
        &self,
        records: &[ValidatedRecord],
        existing: &[String],
    ) -> Vec<String>;
}
