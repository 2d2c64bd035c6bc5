// ==========================================
// 考试名册系统 - 导入结果汇总
// ==========================================
// 职责: 收集一次导入过程中的统计，构造不可变的 ImportOutcome
// ==========================================

use crate::domain::roster::{ImportFailure, ImportOutcome, RowError};
use crate::domain::types::RosterVariant;
use crate::i18n::t_with_args;
use crate::importer::error::ImportError;
use std::time::Instant;

pub struct ResultReporter {
    batch_id: String,
    variant: RosterVariant,
    started_at: Instant,
    total_rows: usize,
    invalid_records: Vec<RowError>,
    ignored_columns: Vec<String>,
}

impl ResultReporter {
    pub fn new(batch_id: &str, variant: RosterVariant) -> Self {
        Self {
            batch_id: batch_id.to_string(),
            variant,
            started_at: Instant::now(),
            total_rows: 0,
            invalid_records: Vec::new(),
            ignored_columns: Vec::new(),
        }
    }

    pub fn record_ignored_columns(&mut self, columns: Vec<String>) {
        self.ignored_columns = columns;
    }

    /// 记录一行数据（无论是否通过校验）
    pub fn record_row(&mut self) {
        self.total_rows += 1;
    }

    pub fn record_row_error(&mut self, error: RowError) {
        self.invalid_records.push(error);
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn invalid_count(&self) -> usize {
        self.invalid_records.len()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }

    /// 成功结果
    pub fn success(self, inserted_count: usize) -> ImportOutcome {
        let elapsed_ms = self.elapsed_ms();
        ImportOutcome {
            batch_id: self.batch_id,
            variant: self.variant,
            success: true,
            message: t_with_args("import.inserted", &[("count", &inserted_count.to_string())]),
            inserted_count,
            total_rows: self.total_rows,
            invalid_records: self.invalid_records,
            ignored_columns: self.ignored_columns,
            failure: None,
            elapsed_ms,
        }
    }

    /// 致命失败结果（未写入任何记录）
    pub fn failure(self, err: &ImportError) -> ImportOutcome {
        let elapsed_ms = self.elapsed_ms();
        let message = err.localized_message();
        ImportOutcome {
            batch_id: self.batch_id,
            variant: self.variant,
            success: false,
            message: message.clone(),
            inserted_count: 0,
            total_rows: self.total_rows,
            invalid_records: self.invalid_records,
            ignored_columns: self.ignored_columns,
            failure: Some(ImportFailure {
                kind: err.kind(),
                message,
                keys: err.keys().to_vec(),
            }),
            elapsed_ms,
        }
    }
}

impl ImportOutcome {
    /// 由致命错误构造失败结果（供调用方统一返回形态）
    pub fn failed(err: &ImportError, batch_id: &str, variant: RosterVariant) -> Self {
        ResultReporter::new(batch_id, variant).failure(err)
    }
}
