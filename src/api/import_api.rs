// ==========================================
// 名册导入API
// ==========================================
// 职责: 封装名册导入相关功能（导入器装配 + 批次台账查询）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::artifact::{ArtifactStore, LocalArtifactStore};
use crate::config::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::roster::{ImportBatch, ImportOutcome};
use crate::domain::types::RosterVariant;
use crate::importer::{ImportError, RosterImporter, RosterImporterImpl};
use crate::repository::{RosterRepository, RosterRepositoryImpl};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use uuid::Uuid;

type DefaultRosterImporter = RosterImporterImpl<RosterRepositoryImpl, ConfigManager, LocalArtifactStore>;

/// 导入API
pub struct ImportApi {
    db_path: String,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    /// 初始化数据库 schema（幂等）
    pub fn init_database(&self) -> ApiResult<()> {
        let conn = open_sqlite_connection(&self.db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn).map_err(|e| ApiError::DatabaseError(format!("初始化 schema 失败: {}", e)))?;
        Ok(())
    }

    /// 导入名册文件
    ///
    /// # 参数
    /// - file_path: 文件路径（.csv/.xlsx/.xls）
    /// - variant: 名册类型
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 导入结果（可能含行级错误）
    /// - Err(ApiError::Import): 致命错误，未写入任何记录
    pub async fn import_roster(
        &self,
        file_path: &str,
        variant: RosterVariant,
    ) -> ApiResult<ImportOutcome> {
        if file_path.trim().is_empty() {
            return Err(ApiError::InvalidInput("文件路径不能为空".to_string()));
        }

        let path = Path::new(file_path);
        let importer = match self.create_importer(variant) {
            Ok(importer) => importer,
            Err(e) => {
                // 存储不可用时导入器无法接管源文件，由此处负责清理
                discard_upload(path).await;
                return Err(ApiError::Import(ImportError::Storage(e.to_string())));
            }
        };
        let outcome = importer.import(path).await?;
        Ok(outcome)
    }

    /// 导入名册文件（致命错误同样以 ImportOutcome 形式返回）
    pub async fn import_roster_outcome(
        &self,
        file_path: &str,
        variant: RosterVariant,
    ) -> ApiResult<ImportOutcome> {
        match self.import_roster(file_path, variant).await {
            Ok(outcome) => Ok(outcome),
            Err(ApiError::Import(err)) => Ok(ImportOutcome::failed(
                &err,
                &Uuid::new_v4().to_string(),
                variant,
            )),
            Err(e) => Err(e),
        }
    }

    /// 批量导入多个文件（并发执行）
    ///
    /// # 返回
    /// - 每个文件一个 ImportOutcome（顺序与输入一致），致命错误以失败形态返回
    pub async fn batch_import(
        &self,
        file_paths: Vec<String>,
        variant: RosterVariant,
    ) -> ApiResult<Vec<ImportOutcome>> {
        if file_paths.is_empty() {
            return Err(ApiError::InvalidInput("文件列表不能为空".to_string()));
        }

        let paths: Vec<PathBuf> = file_paths.iter().map(PathBuf::from).collect();
        let results = match self.create_importer(variant) {
            Ok(importer) => importer.batch_import(paths).await,
            Err(e) => {
                let reason = e.to_string();
                let mut results = Vec::with_capacity(paths.len());
                for path in &paths {
                    discard_upload(path).await;
                    results.push(Err(ImportError::Storage(reason.clone())));
                }
                results
            }
        };

        let outcomes = results
            .into_iter()
            .map(|result| match result {
                Ok(outcome) => outcome,
                Err(err) => ImportOutcome::failed(&err, &Uuid::new_v4().to_string(), variant),
            })
            .collect();
        Ok(outcomes)
    }

    /// 查询最近的导入批次
    pub async fn get_recent_batches(&self, limit: usize) -> ApiResult<Vec<ImportBatch>> {
        let limit = limit.clamp(1, 100);
        let repo = RosterRepositoryImpl::new(&self.db_path)?;
        Ok(repo.get_recent_batches(limit).await?)
    }

    /// 装配导入器（仓储 + 配置 + 本地文件清理）
    fn create_importer(&self, variant: RosterVariant) -> ApiResult<DefaultRosterImporter> {
        self.init_database()?;

        let repo = RosterRepositoryImpl::new(&self.db_path)?;
        let config = ConfigManager::new(&self.db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(format!("创建配置管理器失败: {}", e)))?;

        info!(variant = %variant, db_path = %self.db_path, "导入器已装配");
        Ok(RosterImporterImpl::with_default_components(
            variant,
            repo,
            config,
            LocalArtifactStore,
        ))
    }
}

/// 删除未进入导入流程的上传文件（失败只记录日志）
async fn discard_upload(path: &Path) {
    if let Err(e) = LocalArtifactStore.delete(path).await {
        error!(path = %path.display(), error = %e, "源文件清理失败");
    }
}
