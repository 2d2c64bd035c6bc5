// ==========================================
// 考试名册系统 - 名册导入器实现（提交编排）
// ==========================================
// 职责: 整合导入流程，从文件到数据库
// 流程: 解析 → 表头规范化 → 行校验 → 重复检测 → 落库 → 批次台账 → 清理源文件
// 红线: 任一致命错误时不写入任何记录
// 红线: 源文件在每条退出路径上恰好删除一次（解析句柄释放之后）
// ==========================================

use crate::artifact::ArtifactStore;
use crate::config::field_spec::RosterProfile;
use crate::config::ImportConfigReader;
use crate::domain::roster::{ImportBatch, ImportOutcome, ValidatedRecord};
use crate::domain::types::RosterVariant;
use crate::importer::conflict_handler::ConflictHandler;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::result_reporter::ResultReporter;
use crate::importer::roster_importer_trait::{
    DuplicateResolver, FileParser, RosterImporter, RowValidator, SchemaNormalizer,
};
use crate::importer::row_validator::ProfileRowValidator;
use crate::importer::schema_normalizer::ProfileSchemaNormalizer;
use crate::repository::RosterRepository;
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// RosterImporterImpl - 名册导入器实现
// ==========================================
pub struct RosterImporterImpl<R, C, A>
where
    R: RosterRepository,
    C: ImportConfigReader,
    A: ArtifactStore,
{
    // 名册类型
    variant: RosterVariant,

    // 数据访问层
    roster_repo: R,

    // 配置读取器
    config: C,

    // 源文件清理
    artifact_store: A,

    // 导入组件
    file_parser: Box<dyn FileParser>,
    schema_normalizer: Box<dyn SchemaNormalizer>,
    row_validator: Box<dyn RowValidator>,
    duplicate_resolver: Box<dyn DuplicateResolver>,
}

impl<R, C, A> RosterImporterImpl<R, C, A>
where
    R: RosterRepository,
    C: ImportConfigReader,
    A: ArtifactStore,
{
    /// 创建新的 RosterImporter 实例
    ///
    /// # 参数
    /// - variant: 名册类型
    /// - roster_repo: 名册数据仓储
    /// - config: 配置读取器
    /// - artifact_store: 源文件清理
    /// - file_parser: 文件解析器
    /// - schema_normalizer: 表头规范化器
    /// - row_validator: 行校验器
    /// - duplicate_resolver: 重复学号检测器
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        variant: RosterVariant,
        roster_repo: R,
        config: C,
        artifact_store: A,
        file_parser: Box<dyn FileParser>,
        schema_normalizer: Box<dyn SchemaNormalizer>,
        row_validator: Box<dyn RowValidator>,
        duplicate_resolver: Box<dyn DuplicateResolver>,
    ) -> Self {
        Self {
            variant,
            roster_repo,
            config,
            artifact_store,
            file_parser,
            schema_normalizer,
            row_validator,
            duplicate_resolver,
        }
    }

    /// 使用默认组件创建（规则表驱动的解析/校验/重复检测）
    pub fn with_default_components(
        variant: RosterVariant,
        roster_repo: R,
        config: C,
        artifact_store: A,
    ) -> Self {
        Self::new(
            variant,
            roster_repo,
            config,
            artifact_store,
            Box::new(UniversalFileParser),
            Box::new(ProfileSchemaNormalizer),
            Box::new(ProfileRowValidator::new()),
            Box::new(ConflictHandler),
        )
    }

    pub fn variant(&self) -> RosterVariant {
        self.variant
    }

    /// 导入主流程（不含源文件清理）
    ///
    /// # 返回
    /// - Ok(usize): 实际写入的记录数
    async fn run(
        &self,
        file_path: &Path,
        batch_id: &str,
        reporter: &mut ResultReporter,
    ) -> ImportResult<usize> {
        // === 步骤 0: 读取配置 ===
        let encoding = self
            .config
            .get_source_encoding()
            .await
            .map_err(|e| ImportError::Config(e.to_string()))?;
        let profile = self
            .config
            .get_roster_profile(self.variant)
            .await
            .map_err(|e| ImportError::Config(e.to_string()))?;

        // === 步骤 1-3: 解析 + 表头规范化 + 行校验 ===
        let valid_records = self.parse_and_validate(file_path, &encoding, &profile, reporter)?;
        info!(
            total = reporter.total_rows(),
            valid = valid_records.len(),
            invalid = reporter.invalid_count(),
            "行校验完成"
        );
        if reporter.invalid_count() > 0 {
            warn!(invalid = reporter.invalid_count(), "存在行级校验错误，已跳过对应行");
        }

        // === 步骤 4: 批内重复检测 ===
        debug!("步骤 4: 批内重复检测");
        let batch_duplicates = self.duplicate_resolver.detect_batch_duplicates(&valid_records);
        if !batch_duplicates.is_empty() {
            return Err(ImportError::BatchDuplicates {
                keys: batch_duplicates,
            });
        }

        // === 步骤 5: 已落库重复检测 ===
        debug!("步骤 5: 已落库重复检测");
        let roll_nos: Vec<String> = valid_records.iter().map(|r| r.roll_no.clone()).collect();
        let existing = self
            .roster_repo
            .find_existing_roll_nos(self.variant, &roll_nos)
            .await?;
        let persisted_duplicates = self
            .duplicate_resolver
            .detect_persisted_duplicates(&valid_records, &existing);
        if !persisted_duplicates.is_empty() {
            return Err(ImportError::PersistedDuplicates {
                keys: persisted_duplicates,
            });
        }

        // === 步骤 6: 批量写入（单条失败不影响其余记录）===
        debug!("步骤 6: 批量写入");
        let inserted_count = if valid_records.is_empty() {
            info!("无有效记录可写入");
            0
        } else {
            let report = self
                .roster_repo
                .insert_many(self.variant, batch_id, valid_records, true)
                .await?;
            for failure in report.failures() {
                warn!(roll_no = %failure.roll_no, status = ?failure.status, "记录写入失败");
            }
            report.inserted_count()
        };
        info!(count = inserted_count, "批量写入完成");

        // === 步骤 7: 记录批次信息 ===
        let batch = ImportBatch {
            batch_id: batch_id.to_string(),
            variant: self.variant,
            file_name: file_path
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string),
            total_rows: reporter.total_rows() as i64,
            inserted_rows: inserted_count as i64,
            invalid_rows: reporter.invalid_count() as i64,
            imported_at: Utc::now(),
            elapsed_ms: reporter.elapsed_ms() as i64,
        };
        if let Err(e) = self.roster_repo.insert_batch(batch).await {
            // 记录已提交，台账失败不改变导入结果
            error!(error = %e, "批次台账写入失败");
        }

        Ok(inserted_count)
    }

    /// 解析文件并逐行校验
    ///
    /// 解析句柄在返回前释放
    fn parse_and_validate(
        &self,
        file_path: &Path,
        encoding: &str,
        profile: &RosterProfile,
        reporter: &mut ResultReporter,
    ) -> ImportResult<Vec<ValidatedRecord>> {
        // === 步骤 1: 打开文件 ===
        debug!("步骤 1: 解析文件");
        let sheet = self.file_parser.open(file_path, encoding)?;

        // === 步骤 2: 表头规范化 ===
        debug!("步骤 2: 表头规范化");
        let schema = self.schema_normalizer.normalize(&sheet.headers, profile)?;
        reporter.record_ignored_columns(schema.ignored_columns.clone());

        // === 步骤 3: 逐行校验 ===
        debug!("步骤 3: 行校验");
        let mut valid_records = Vec::new();
        for record in sheet.records {
            let raw_row = schema.to_raw_row(record?);
            reporter.record_row();

            match self.row_validator.validate(&raw_row, profile) {
                Ok(validated) => valid_records.push(validated),
                Err(row_error) => {
                    debug!(
                        row_number = row_error.row_number,
                        roll_no = %row_error.roll_no,
                        violations = row_error.messages.len(),
                        "行校验失败"
                    );
                    reporter.record_row_error(row_error);
                }
            }
        }

        Ok(valid_records)
    }

    /// 删除源文件（失败仅记录日志，不覆盖导入结果）
    async fn cleanup(&self, file_path: &Path) {
        if let Err(e) = self.artifact_store.delete(file_path).await {
            error!(file_path = %file_path.display(), error = %e, "源文件删除失败");
        }
    }
}

#[async_trait]
impl<R, C, A> RosterImporter for RosterImporterImpl<R, C, A>
where
    R: RosterRepository + Send + Sync,
    C: ImportConfigReader + Send + Sync,
    A: ArtifactStore + Send + Sync,
{
    #[instrument(skip(self, file_path), fields(variant = %self.variant, batch_id))]
    async fn import(&self, file_path: &Path) -> ImportResult<ImportOutcome> {
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());
        info!(file_path = %file_path.display(), "开始导入名册");

        let mut reporter = ResultReporter::new(&batch_id, self.variant);
        let result = self.run(file_path, &batch_id, &mut reporter).await;

        self.cleanup(file_path).await;

        match result {
            Ok(inserted_count) => {
                let outcome = reporter.success(inserted_count);
                info!(
                    total = outcome.total_rows,
                    inserted = outcome.inserted_count,
                    invalid = outcome.invalid_records.len(),
                    elapsed_ms = outcome.elapsed_ms,
                    "名册导入完成"
                );
                Ok(outcome)
            }
            Err(e) => {
                error!(kind = ?e.kind(), error = %e, "名册导入失败");
                Err(e)
            }
        }
    }

    async fn batch_import(&self, file_paths: Vec<PathBuf>) -> Vec<ImportResult<ImportOutcome>> {
        info!(count = file_paths.len(), "开始批量导入文件");

        // 为每个文件创建导入任务
        let import_tasks = file_paths.iter().map(|path| async move {
            let result = self.import(path).await;
            if let Err(e) = &result {
                error!(file = %path.display(), error = %e, "文件导入失败");
            }
            result
        });

        // 并发执行所有导入任务
        let results = join_all(import_tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量导入完成"
        );

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::field_spec::RosterProfile;
    use crate::domain::roster::{
        BatchInsertReport, RecordInsertResult, RecordInsertStatus, StudentRecord,
    };
    use crate::repository::error::{RepositoryError, RepositoryResult};
    use std::error::Error;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

    // ===== 内存实现 =====

    #[derive(Default)]
    struct MemoryRepo {
        roll_nos: Mutex<Vec<String>>,
        fail_storage: bool,
        insert_calls: AtomicUsize,
    }

    #[async_trait]
    impl RosterRepository for MemoryRepo {
        async fn find_existing_roll_nos(
            &self,
            _variant: RosterVariant,
            roll_nos: &[String],
        ) -> RepositoryResult<Vec<String>> {
            if self.fail_storage {
                return Err(RepositoryError::DatabaseConnectionError("offline".to_string()));
            }
            let stored = self.roll_nos.lock().unwrap();
            Ok(roll_nos.iter().filter(|r| stored.contains(*r)).cloned().collect())
        }

        async fn insert_many(
            &self,
            _variant: RosterVariant,
            _batch_id: &str,
            records: Vec<ValidatedRecord>,
            _continue_on_error: bool,
        ) -> RepositoryResult<BatchInsertReport> {
            self.insert_calls.fetch_add(1, Ordering::SeqCst);
            let mut stored = self.roll_nos.lock().unwrap();
            let results = records
                .into_iter()
                .map(|r| {
                    stored.push(r.roll_no.clone());
                    RecordInsertResult {
                        roll_no: r.roll_no,
                        status: RecordInsertStatus::Inserted,
                    }
                })
                .collect();
            Ok(BatchInsertReport { results })
        }

        async fn insert_batch(&self, _batch: ImportBatch) -> RepositoryResult<()> {
            Ok(())
        }

        async fn get_recent_batches(&self, _limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
            Ok(Vec::new())
        }

        async fn find_by_mobile(
            &self,
            _variant: RosterVariant,
            _mob_no: &str,
        ) -> RepositoryResult<Option<StudentRecord>> {
            Ok(None)
        }

        async fn count(&self, _variant: RosterVariant) -> RepositoryResult<usize> {
            Ok(self.roll_nos.lock().unwrap().len())
        }
    }

    struct DefaultConfig;

    #[async_trait]
    impl ImportConfigReader for DefaultConfig {
        async fn get_source_encoding(&self) -> ConfigResult<String> {
            Ok("utf-8".to_string())
        }
        async fn get_roster_profile(&self, variant: RosterVariant) -> ConfigResult<RosterProfile> {
            Ok(RosterProfile::builtin(variant))
        }
        async fn get_lookup_cache_ttl_secs(&self) -> ConfigResult<u64> {
            Ok(600)
        }
        async fn get_lookup_cache_capacity(&self) -> ConfigResult<usize> {
            Ok(1000)
        }
    }

    #[derive(Default)]
    struct CountingArtifactStore {
        deletes: AtomicUsize,
    }

    #[async_trait]
    impl ArtifactStore for CountingArtifactStore {
        async fn delete(&self, path: &Path) -> std::io::Result<bool> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            crate::artifact::LocalArtifactStore.delete(path).await
        }
    }

    fn importer(repo: MemoryRepo) -> RosterImporterImpl<MemoryRepo, DefaultConfig, CountingArtifactStore> {
        RosterImporterImpl::with_default_components(
            RosterVariant::Kindergarten,
            repo,
            DefaultConfig,
            CountingArtifactStore::default(),
        )
    }

    fn csv_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    const HEADER: &str = "Student Name,Roll No,School Code,Section,Class\n";

    #[tokio::test]
    async fn test_import_success_with_row_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = csv_file(
            dir.path(),
            "kg.csv",
            &format!("{}{}", HEADER, ",A1,12,LKG,KG\nY,A2,13,UKG,KG\n"),
        );
        let importer = importer(MemoryRepo::default());

        let outcome = importer.import(&path).await.unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.inserted_count, 1);
        assert_eq!(outcome.total_rows, 2);
        assert_eq!(outcome.invalid_records.len(), 1);
        assert_eq!(outcome.invalid_records[0].row_number, 2);
        assert!(!path.exists());
        assert_eq!(importer.artifact_store.deletes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_batch_duplicates_abort_before_insert() {
        let dir = tempfile::tempdir().unwrap();
        let path = csv_file(
            dir.path(),
            "kg.csv",
            &format!("{}{}", HEADER, "X,A1,12,LKG,KG\nY,A1,13,UKG,KG\n"),
        );
        let importer = importer(MemoryRepo::default());

        let err = importer.import(&path).await.unwrap_err();

        assert!(matches!(&err, ImportError::BatchDuplicates { keys } if keys == &vec!["A1".to_string()]));
        assert_eq!(importer.roster_repo.insert_calls.load(Ordering::SeqCst), 0);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_storage_failure_is_fatal_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = csv_file(
            dir.path(),
            "kg.csv",
            &format!("{}{}", HEADER, "X,A1,12,LKG,KG\n"),
        );
        let importer = importer(MemoryRepo {
            fail_storage: true,
            ..Default::default()
        });

        let err = importer.import(&path).await.unwrap_err();

        assert!(matches!(err, ImportError::Storage(_)));
        assert!(!path.exists());
        assert_eq!(importer.artifact_store.deletes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_file_still_attempts_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let importer = importer(MemoryRepo::default());

        let err = importer
            .import(&dir.path().join("missing.csv"))
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::FileNotFound(_)));
        assert_eq!(importer.artifact_store.deletes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_batch_import_keeps_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = csv_file(dir.path(), "a.csv", &format!("{}{}", HEADER, "X,A1,12,LKG,KG\n"));
        let second = csv_file(dir.path(), "b.csv", "Roll No\nB1\n");
        let importer = importer(MemoryRepo::default());

        let results = importer.batch_import(vec![first, second]).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().inserted_count, 1);
        assert!(matches!(results[1], Err(ImportError::MissingColumns { .. })));
    }
}
