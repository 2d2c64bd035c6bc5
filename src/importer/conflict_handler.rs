// ==========================================
// 考试名册系统 - 重复学号检测实现
// ==========================================
// 职责: 检测同批次内 / 与已落库记录重复的 roll_no
// 红线: 任一重复即整批中止（由编排器决定），此处只负责识别
// ==========================================

use crate::domain::roster::ValidatedRecord;
use crate::importer::roster_importer_trait::DuplicateResolver;
use std::collections::{BTreeSet, HashMap, HashSet};

pub struct ConflictHandler;

impl DuplicateResolver for ConflictHandler {
    /// 检测同批次内重复学号
    ///
    /// # 返回
    /// - 出现两次及以上的学号（排序、去重）
    fn detect_batch_duplicates(&self, records: &[ValidatedRecord]) -> Vec<String> {
        let mut occurrences: HashMap<&str, usize> = HashMap::new();
        for record in records {
            *occurrences.entry(record.roll_no.as_str()).or_insert(0) += 1;
        }

        occurrences
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(roll_no, _)| roll_no.to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// 检测与已落库记录冲突的学号
    ///
    /// # 返回
    /// - 冲突学号（排序、去重）
    fn detect_persisted_duplicates(
        &self,
        records: &[ValidatedRecord],
        existing: &[String],
    ) -> Vec<String> {
        let existing_set: HashSet<&str> = existing.iter().map(String::as_str).collect();

        records
            .iter()
            .filter(|r| existing_set.contains(r.roll_no.as_str()))
            .map(|r| r.roll_no.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn create_test_record(roll_no: &str, row_number: usize) -> ValidatedRecord {
        ValidatedRecord {
            roll_no: roll_no.to_string(),
            school_code: 12,
            class: "KG".to_string(),
            section: "LKG".to_string(),
            student_name: "X".to_string(),
            attributes: BTreeMap::new(),
            row_number,
        }
    }

    #[test]
    fn test_detect_batch_duplicates_none() {
        let handler = ConflictHandler;
        let records = vec![create_test_record("A1", 2), create_test_record("A2", 3)];

        assert!(handler.detect_batch_duplicates(&records).is_empty());
    }

    #[test]
    fn test_detect_batch_duplicates_sorted_unique() {
        let handler = ConflictHandler;
        let records = vec![
            create_test_record("B7", 2),
            create_test_record("A1", 3),
            create_test_record("B7", 4),
            create_test_record("A1", 5),
            create_test_record("A1", 6), // 再次重复
            create_test_record("C3", 7),
        ];

        let duplicates = handler.detect_batch_duplicates(&records);

        assert_eq!(duplicates, vec!["A1".to_string(), "B7".to_string()]);
    }

    #[test]
    fn test_detect_persisted_duplicates() {
        let handler = ConflictHandler;
        let records = vec![create_test_record("A2", 2), create_test_record("A1", 3)];
        let existing = vec!["A1".to_string(), "Z9".to_string()];

        let duplicates = handler.detect_persisted_duplicates(&records, &existing);

        assert_eq!(duplicates, vec!["A1".to_string()]);
    }
}
