// ==========================================
// 学生查询API
// ==========================================
// 职责: 按手机号查询学生（普通名册优先，其次幼儿园名册）
// 缓存: 显式注入的 TtlCache，仅缓存命中的记录
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::cache::TtlCache;
use crate::config::{ConfigManager, ImportConfigReader};
use crate::domain::roster::StudentRecord;
use crate::domain::types::RosterVariant;
use crate::repository::{RosterRepository, RosterRepositoryImpl};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub type StudentCache = TtlCache<String, StudentRecord>;

/// 学生查询API
pub struct StudentLookupApi<R>
where
    R: RosterRepository,
{
    roster_repo: R,
    cache: Arc<StudentCache>,
}

impl<R> StudentLookupApi<R>
where
    R: RosterRepository,
{
    /// # 参数
    /// - roster_repo: 名册数据仓储
    /// - cache: 查询缓存（可在多个实例间共享）
    pub fn new(roster_repo: R, cache: Arc<StudentCache>) -> Self {
        Self { roster_repo, cache }
    }

    /// 按手机号查询学生
    ///
    /// # 返回
    /// - Ok(StudentRecord): 查询成功
    /// - Err(ApiError::InvalidInput): 手机号为空
    /// - Err(ApiError::NotFound): 无匹配记录
    pub async fn get_student_by_mobile(&self, mob_no: &str) -> ApiResult<StudentRecord> {
        let mob_no = mob_no.trim();
        if mob_no.is_empty() {
            return Err(ApiError::InvalidInput("手机号不能为空".to_string()));
        }

        let key = mob_no.to_string();
        if let Some(student) = self.cache.get(&key) {
            debug!(mob_no = %mob_no, "学生查询命中缓存");
            return Ok(student);
        }

        for variant in [RosterVariant::Student, RosterVariant::Kindergarten] {
            if let Some(student) = self.roster_repo.find_by_mobile(variant, mob_no).await? {
                self.cache.insert(key, student.clone());
                return Ok(student);
            }
        }

        Err(ApiError::NotFound(format!("手机号 {} 无对应学生", mob_no)))
    }

    /// 使缓存条目失效（学生资料变更后调用）
    pub fn invalidate(&self, mob_no: &str) {
        self.cache.invalidate(&mob_no.trim().to_string());
    }
}

impl StudentLookupApi<RosterRepositoryImpl> {
    /// 按配置（config_kv）创建缓存与仓储
    pub async fn from_db_path(db_path: &str) -> ApiResult<Self> {
        let config = ConfigManager::new(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(format!("创建配置管理器失败: {}", e)))?;
        let ttl_secs = config
            .get_lookup_cache_ttl_secs()
            .await
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        let capacity = config
            .get_lookup_cache_capacity()
            .await
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

        let repo = RosterRepositoryImpl::new(db_path)?;
        let cache = Arc::new(TtlCache::new(capacity, Duration::from_secs(ttl_secs)));
        Ok(Self::new(repo, cache))
    }
}
