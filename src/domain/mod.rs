// ==========================================
// 考试名册系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体与类型
// 红线: 不含数据访问逻辑
// ==========================================

pub mod roster;
pub mod types;

// 重导出核心类型
pub use roster::{
    BatchInsertReport, FailureKind, ImportBatch, ImportFailure, ImportOutcome, RawRow,
    RecordInsertResult, RecordInsertStatus, RowError, StudentRecord, ValidatedRecord,
};
pub use types::{FieldValue, RosterVariant};
