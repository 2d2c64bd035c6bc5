// ==========================================
// 考试名册系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化（表名仅来自 RosterVariant 常量）
// ==========================================

pub mod error;
pub mod roster_repo;
pub mod roster_repo_impl;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use roster_repo::RosterRepository;
pub use roster_repo_impl::RosterRepositoryImpl;
