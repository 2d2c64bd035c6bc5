// ==========================================
// 考试名册系统 - 名册 Repository Trait
// ==========================================
// 职责: 定义名册相关数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::roster::{BatchInsertReport, ImportBatch, StudentRecord, ValidatedRecord};
use crate::domain::types::RosterVariant;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// RosterRepository Trait
// ==========================================
// 用途: 名册导入与查询相关数据访问
// 实现者: RosterRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait RosterRepository: Send + Sync {
    // ===== 重复检测 =====

    /// 查询已存在的学号
    ///
    /// # 参数
    /// - variant: 名册类型（决定落库表）
    /// - roll_nos: 待检测学号
    ///
    /// # 返回
    /// - 存储中已存在的学号子集
    async fn find_existing_roll_nos(
        &self,
        variant: RosterVariant,
        roll_nos: &[String],
    ) -> RepositoryResult<Vec<String>>;

    // ===== 批量写入 =====

    /// 批量插入学生记录
    ///
    /// # 参数
    /// - continue_on_error: true 时单条失败（如唯一约束）不影响其余记录；
    ///   false 时任一失败整体回滚
    ///
    /// # 返回
    /// - Ok(BatchInsertReport): 逐条写入状态
    /// - Err: 整体失败（连接/锁/事务错误）
    async fn insert_many(
        &self,
        variant: RosterVariant,
        batch_id: &str,
        records: Vec<ValidatedRecord>,
        continue_on_error: bool,
    ) -> RepositoryResult<BatchInsertReport>;

    // ===== 批次台账 =====

    /// 记录导入批次
    async fn insert_batch(&self, batch: ImportBatch) -> RepositoryResult<()>;

    /// 查询最近的导入批次（按导入时间倒序）
    async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>>;

    // ===== 查询 =====

    /// 按手机号查询学生（取最早写入的一条）
    async fn find_by_mobile(
        &self,
        variant: RosterVariant,
        mob_no: &str,
    ) -> RepositoryResult<Option<StudentRecord>>;

    /// 统计名册记录数
    async fn count(&self, variant: RosterVariant) -> RepositoryResult<usize>;
}
