// ==========================================
// 考试名册系统 - 名册领域模型
// ==========================================
// 职责: 导入管道各阶段的数据结构
// 生命周期: RawRow / ValidatedRecord 仅在单次导入内存活
// ==========================================

use crate::domain::types::{FieldValue, RosterVariant};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ==========================================
// RawRow - 原始行记录
// ==========================================
// 用途: 文件解析产物（规范列名 → 去空白后的单元格值）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub row_number: usize,              // 源文件行号（表头为第 1 行）
    pub cells: HashMap<String, String>, // 规范列名 → 值
}

impl RawRow {
    pub fn new(row_number: usize, cells: HashMap<String, String>) -> Self {
        Self { row_number, cells }
    }

    /// 读取非空单元格（空白视为缺失）
    pub fn get(&self, field: &str) -> Option<&str> {
        self.cells
            .get(field)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

// ==========================================
// ValidatedRecord - 校验通过的学生记录
// ==========================================
// 红线: 仅当所有必填字段通过校验时才会构造，不存在"部分有效"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedRecord {
    pub roll_no: String,       // 学号（批内唯一、全局唯一）
    pub school_code: i64,      // 学校代码
    pub class: String,         // 年级
    pub section: String,       // 班级/分部
    pub student_name: String,  // 学生姓名

    // 可选描述字段与参赛标记（规范字段名 → 取值）
    pub attributes: BTreeMap<String, FieldValue>,

    #[serde(skip)]
    pub row_number: usize,     // 源文件行号
}

impl ValidatedRecord {
    pub fn attribute_text(&self, field: &str) -> Option<&str> {
        self.attributes.get(field).and_then(|v| v.as_text())
    }
}

// ==========================================
// RowError - 行级校验错误
// ==========================================
// 红线: 同一行的所有违规聚合为一个 RowError，不拆分
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    pub row_number: usize,     // 源文件行号（含表头偏移）
    pub roll_no: String,       // 学号（缺失时为 "unknown"）
    pub messages: Vec<String>, // 违规描述（按检查顺序）
}

// ==========================================
// FailureKind - 致命错误分类
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    MissingColumns,      // 必填列缺失
    Parse,               // 文件无法解析
    BatchDuplicates,     // 批内学号重复
    PersistedDuplicates, // 学号已存在于库中
    Storage,             // 存储不可用
}

// ==========================================
// ImportFailure - 致命错误详情
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFailure {
    pub kind: FailureKind,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub keys: Vec<String>, // 缺失列名或冲突学号
}

// ==========================================
// ImportOutcome - 导入结果
// ==========================================
// 用途: 每次导入构造一次，构造后不可变
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub batch_id: String,
    pub variant: RosterVariant,
    pub success: bool,
    pub message: String,
    pub inserted_count: usize,
    pub total_rows: usize,
    pub invalid_records: Vec<RowError>,
    pub ignored_columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub failure: Option<ImportFailure>,
    pub elapsed_ms: u64,
}

// ==========================================
// 批量写入结果（逐条状态）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordInsertStatus {
    Inserted,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordInsertResult {
    pub roll_no: String,
    pub status: RecordInsertStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchInsertReport {
    pub results: Vec<RecordInsertResult>,
}

impl BatchInsertReport {
    pub fn inserted_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == RecordInsertStatus::Inserted)
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &RecordInsertResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.status, RecordInsertStatus::Failed { .. }))
    }
}

// ==========================================
// ImportBatch - 导入批次台账
// ==========================================
// 对齐: import_batch 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,               // 批次 ID（UUID）
    pub variant: RosterVariant,         // 名册类型
    pub file_name: Option<String>,      // 源文件名
    pub total_rows: i64,                // 数据行数
    pub inserted_rows: i64,             // 实际写入行数
    pub invalid_rows: i64,              // 行级校验失败数
    pub imported_at: DateTime<Utc>,     // 导入时间
    pub elapsed_ms: i64,                // 耗时（毫秒）
}

// ==========================================
// StudentRecord - 已落库学生记录（查询用）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub variant: RosterVariant,
    pub roll_no: String,
    pub school_code: i64,
    pub class: String,
    pub section: String,
    pub student_name: String,
    pub mob_no: Option<String>,
    pub attributes: BTreeMap<String, FieldValue>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_row_get_treats_blank_as_missing() {
        let mut cells = HashMap::new();
        cells.insert("rollNo".to_string(), "A1".to_string());
        cells.insert("city".to_string(), "   ".to_string());
        let row = RawRow::new(2, cells);

        assert_eq!(row.get("rollNo"), Some("A1"));
        assert_eq!(row.get("city"), None);
        assert_eq!(row.get("section"), None);
    }

    #[test]
    fn test_batch_insert_report_counts() {
        let report = BatchInsertReport {
            results: vec![
                RecordInsertResult {
                    roll_no: "A1".to_string(),
                    status: RecordInsertStatus::Inserted,
                },
                RecordInsertResult {
                    roll_no: "A2".to_string(),
                    status: RecordInsertStatus::Failed {
                        reason: "UNIQUE constraint failed".to_string(),
                    },
                },
            ],
        };

        assert_eq!(report.inserted_count(), 1);
        assert_eq!(report.failures().count(), 1);
    }
}
