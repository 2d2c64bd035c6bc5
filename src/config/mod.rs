// ==========================================
// 考试名册系统 - 配置层
// ==========================================
// 职责: 名册规则表 + 导入配置读取
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod field_spec;
pub mod import_config_trait;

// 重导出核心配置类型
pub use config_manager::{config_keys, ConfigManager};
pub use field_spec::{FieldDomain, FieldSpec, FlagOutput, Normalization, RosterProfile};
pub use import_config_trait::ImportConfigReader;
