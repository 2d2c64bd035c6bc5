// ==========================================
// 考试名册系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::field_spec::RosterProfile;
use crate::domain::types::RosterVariant;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取源文件默认编码（无 BOM 时使用）
    ///
    /// # 默认值
    /// - "utf-8"
    async fn get_source_encoding(&self) -> Result<String, Box<dyn Error + Send + Sync>>;

    /// 获取名册规则表
    ///
    /// # 逻辑
    /// 1. config_kv 中存在 roster_profile/{variant} → 解析 JSON 覆写
    /// 2. 否则使用内置规则表
    async fn get_roster_profile(
        &self,
        variant: RosterVariant,
    ) -> Result<RosterProfile, Box<dyn Error + Send + Sync>>;

    /// 获取学生查询缓存有效期（秒）
    ///
    /// # 默认值
    /// - 600
    async fn get_lookup_cache_ttl_secs(&self) -> Result<u64, Box<dyn Error + Send + Sync>>;

    /// 获取学生查询缓存容量
    ///
    /// # 默认值
    /// - 1000
    async fn get_lookup_cache_capacity(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;
}
