// ==========================================
// 考试名册系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 CLI / 外部服务调用
// ==========================================

pub mod error;
pub mod import_api;
pub mod student_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::ImportApi;
pub use student_api::{StudentCache, StudentLookupApi};
