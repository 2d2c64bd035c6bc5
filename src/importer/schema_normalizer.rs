// ==========================================
// 考试名册系统 - 表头规范化器实现
// ==========================================
// 职责: 源列名 → 规范列名（按规则表重命名）+ 必填列检查
// 红线: 必填列缺失在读取任何数据行之前即为致命错误
// ==========================================

use crate::config::field_spec::RosterProfile;
use crate::domain::roster::RawRow;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::SourceRecord;
use crate::importer::roster_importer_trait::SchemaNormalizer;
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

// ==========================================
// NormalizedSchema - 规范化后的表头
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSchema {
    pub columns: Vec<String>,         // 规范列名（与源列位置一一对应）
    pub ignored_columns: Vec<String>, // 规则表未登记的列（已忽略）
}

impl NormalizedSchema {
    /// 源数据行 → RawRow（规范列名 → 单元格值）
    ///
    /// 同一规范列出现多次时，取第一个非空值
    pub fn to_raw_row(&self, record: SourceRecord) -> RawRow {
        let mut cells: HashMap<String, String> = HashMap::with_capacity(self.columns.len());
        for (column, value) in self.columns.iter().zip(record.values) {
            if column.is_empty() {
                continue;
            }
            match cells.get(column) {
                Some(existing) if !existing.is_empty() => {}
                _ => {
                    cells.insert(column.clone(), value);
                }
            }
        }
        RawRow::new(record.row_number, cells)
    }
}

// ==========================================
// ProfileSchemaNormalizer - 基于规则表的实现
// ==========================================
pub struct ProfileSchemaNormalizer;

impl SchemaNormalizer for ProfileSchemaNormalizer {
    fn normalize(&self, headers: &[String], profile: &RosterProfile) -> ImportResult<NormalizedSchema> {
        let columns: Vec<String> = headers
            .iter()
            .map(|h| profile.canonical_header(h))
            .collect();

        let present: BTreeSet<&str> = columns.iter().map(String::as_str).collect();

        // 必填列检查（按规则表顺序报告）
        let missing: Vec<String> = profile
            .required_columns()
            .into_iter()
            .filter(|c| !present.contains(c))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            warn!(missing = ?missing, "缺少必填列");
            return Err(ImportError::MissingColumns { columns: missing });
        }

        // 未知列: 记录告警并忽略
        let known = profile.known_columns();
        let mut ignored_columns = Vec::new();
        for column in &columns {
            if column.is_empty() || known.contains(column.as_str()) {
                continue;
            }
            if !ignored_columns.contains(column) {
                warn!(column = %column, "未知列，已忽略");
                ignored_columns.push(column.clone());
            }
        }

        Ok(NormalizedSchema {
            columns,
            ignored_columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_renames_source_headers() {
        let profile = RosterProfile::kindergarten();
        let schema = ProfileSchemaNormalizer
            .normalize(
                &headers(&["Student Name", "Roll No", "School Code", "Section", "IQKG"]),
                &profile,
            )
            .unwrap();

        assert_eq!(
            schema.columns,
            vec!["studentName", "rollNo", "schoolCode", "section", "IQKG"]
        );
        assert!(schema.ignored_columns.is_empty());
    }

    #[test]
    fn test_normalize_accepts_canonical_headers() {
        let profile = RosterProfile::kindergarten();
        let result = ProfileSchemaNormalizer.normalize(
            &headers(&["studentName", "rollNo", "schoolCode", "section"]),
            &profile,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_missing_required_columns_is_fatal() {
        let profile = RosterProfile::kindergarten();
        let err = ProfileSchemaNormalizer
            .normalize(&headers(&["Student Name", "Roll No"]), &profile)
            .unwrap_err();

        match err {
            ImportError::MissingColumns { columns } => {
                assert_eq!(columns, vec!["schoolCode", "section"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_columns_are_ignored_and_reported() {
        let profile = RosterProfile::kindergarten();
        let schema = ProfileSchemaNormalizer
            .normalize(
                &headers(&["Student Name", "Roll No", "School Code", "Section", "Remarks", "Remarks"]),
                &profile,
            )
            .unwrap();

        assert_eq!(schema.ignored_columns, vec!["Remarks"]);
    }

    #[test]
    fn test_to_raw_row_prefers_first_non_empty_alias() {
        let profile = RosterProfile::student();
        let schema = ProfileSchemaNormalizer
            .normalize(
                &headers(&[
                    "Student Name",
                    "Student's Name",
                    "Roll No",
                    "School Code",
                    "Class",
                    "Section",
                ]),
                &profile,
            )
            .unwrap();

        let row = schema.to_raw_row(SourceRecord {
            row_number: 2,
            values: vec![
                "".to_string(),
                "Asha".to_string(),
                "S1".to_string(),
                "12".to_string(),
                "5".to_string(),
                "a".to_string(),
            ],
        });

        assert_eq!(row.row_number, 2);
        assert_eq!(row.get("studentName"), Some("Asha"));
        assert_eq!(row.get("rollNo"), Some("S1"));
    }
}
