// ==========================================
// 考试名册系统 - 名册 Repository 实现
// ==========================================
// 职责: 实现名册相关数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::config::field_spec::FIELD_MOBILE;
use crate::db::open_sqlite_connection;
use crate::domain::roster::{
    BatchInsertReport, ImportBatch, RecordInsertResult, RecordInsertStatus, StudentRecord,
    ValidatedRecord,
};
use crate::domain::types::{FieldValue, RosterVariant};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::roster_repo::RosterRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Transaction};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

// IN 查询单次参数上限
const IN_CLAUSE_CHUNK: usize = 500;

fn parse_datetime(raw: &str) -> RepositoryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::FieldValueError {
            field: "datetime".to_string(),
            message: format!("{}: {}", raw, e),
        })
}

fn parse_variant(raw: &str) -> RepositoryResult<RosterVariant> {
    raw.parse::<RosterVariant>()
        .map_err(|message| RepositoryError::FieldValueError {
            field: "variant".to_string(),
            message,
        })
}

// ==========================================
// RosterRepositoryImpl
// ==========================================
pub struct RosterRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl RosterRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 Repository
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在事务中逐条插入
    fn insert_many_tx(
        tx: &Transaction,
        variant: RosterVariant,
        batch_id: &str,
        records: &[ValidatedRecord],
        continue_on_error: bool,
    ) -> RepositoryResult<BatchInsertReport> {
        let sql = format!(
            r#"
            INSERT INTO {} (
                roll_no, school_code, class, section, student_name,
                mob_no, attributes_json, batch_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            variant.table_name()
        );
        let mut stmt = tx.prepare(&sql)?;
        let created_at = Utc::now().to_rfc3339();

        let mut results = Vec::with_capacity(records.len());
        for record in records {
            let mob_no = record
                .attribute_text(FIELD_MOBILE)
                .filter(|m| !m.is_empty());
            let attributes_json = serde_json::to_string(&record.attributes)?;

            let outcome = stmt
                .execute(params![
                    record.roll_no,
                    record.school_code,
                    record.class,
                    record.section,
                    record.student_name,
                    mob_no,
                    attributes_json,
                    batch_id,
                    created_at,
                ])
                .map_err(RepositoryError::from);

            match outcome {
                Ok(_) => results.push(RecordInsertResult {
                    roll_no: record.roll_no.clone(),
                    status: RecordInsertStatus::Inserted,
                }),
                Err(e) if continue_on_error && e.is_record_level() => {
                    warn!(roll_no = %record.roll_no, error = %e, "单条写入失败，继续");
                    results.push(RecordInsertResult {
                        roll_no: record.roll_no.clone(),
                        status: RecordInsertStatus::Failed {
                            reason: e.to_string(),
                        },
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(BatchInsertReport { results })
    }
}

#[async_trait]
impl RosterRepository for RosterRepositoryImpl {
    async fn find_existing_roll_nos(
        &self,
        variant: RosterVariant,
        roll_nos: &[String],
    ) -> RepositoryResult<Vec<String>> {
        if roll_nos.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;
        let mut existing = Vec::new();

        for chunk in roll_nos.chunks(IN_CLAUSE_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT roll_no FROM {} WHERE roll_no IN ({}) ORDER BY roll_no",
                variant.table_name(),
                placeholders
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| row.get::<_, String>(0))?;
            for row in rows {
                existing.push(row?);
            }
        }

        debug!(checked = roll_nos.len(), existing = existing.len(), "学号存在性检查完成");
        Ok(existing)
    }

    async fn insert_many(
        &self,
        variant: RosterVariant,
        batch_id: &str,
        records: Vec<ValidatedRecord>,
        continue_on_error: bool,
    ) -> RepositoryResult<BatchInsertReport> {
        if records.is_empty() {
            return Ok(BatchInsertReport::default());
        }

        let conn = self.lock()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let report = Self::insert_many_tx(&tx, variant, batch_id, &records, continue_on_error)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(report)
    }

    async fn insert_batch(&self, batch: ImportBatch) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, variant, file_name, total_rows, inserted_rows,
                invalid_rows, imported_at, elapsed_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                batch.batch_id,
                batch.variant.to_string(),
                batch.file_name,
                batch.total_rows,
                batch.inserted_rows,
                batch.invalid_rows,
                batch.imported_at.to_rfc3339(),
                batch.elapsed_ms,
            ],
        )?;
        Ok(())
    }

    async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, variant, file_name, total_rows, inserted_rows,
                   invalid_rows, imported_at, elapsed_ms
            FROM import_batch
            ORDER BY imported_at DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, i64>(7)?,
            ))
        })?;

        let mut batches = Vec::new();
        for row in rows {
            let (batch_id, variant, file_name, total_rows, inserted_rows, invalid_rows, imported_at, elapsed_ms) =
                row?;
            batches.push(ImportBatch {
                batch_id,
                variant: parse_variant(&variant)?,
                file_name,
                total_rows,
                inserted_rows,
                invalid_rows,
                imported_at: parse_datetime(&imported_at)?,
                elapsed_ms,
            });
        }
        Ok(batches)
    }

    async fn find_by_mobile(
        &self,
        variant: RosterVariant,
        mob_no: &str,
    ) -> RepositoryResult<Option<StudentRecord>> {
        let conn = self.lock()?;
        let sql = format!(
            r#"
            SELECT roll_no, school_code, class, section, student_name,
                   mob_no, attributes_json, created_at
            FROM {}
            WHERE mob_no = ?1
            ORDER BY id
            LIMIT 1
            "#,
            variant.table_name()
        );

        let row = conn
            .query_row(&sql, params![mob_no], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                ))
            })
            .optional()?;

        let Some((roll_no, school_code, class, section, student_name, mob_no, attributes_json, created_at)) = row
        else {
            return Ok(None);
        };

        let attributes: BTreeMap<String, FieldValue> = serde_json::from_str(&attributes_json)?;

        Ok(Some(StudentRecord {
            variant,
            roll_no,
            school_code,
            class,
            section,
            student_name,
            mob_no,
            attributes,
            created_at: parse_datetime(&created_at)?,
        }))
    }

    async fn count(&self, variant: RosterVariant) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let sql = format!("SELECT COUNT(*) FROM {}", variant.table_name());
        let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
