// ==========================================
// 考试名册系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::field_spec::RosterProfile;
use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::types::RosterVariant;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    /// 保存名册规则表覆写（存储于 config_kv: roster_profile/{variant}）
    pub fn save_roster_profile(&self, profile: &RosterProfile) -> ConfigResult<()> {
        profile.check()?;
        let key = config_keys::roster_profile_key(profile.variant);
        let raw = serde_json::to_string(profile)?;
        self.set_global_config_value(&key, &raw)
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_source_encoding(&self) -> ConfigResult<String> {
        let value = self.get_config_or_default(config_keys::SOURCE_ENCODING, "utf-8")?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Ok("utf-8".to_string())
        } else {
            Ok(trimmed.to_lowercase())
        }
    }

    async fn get_roster_profile(&self, variant: RosterVariant) -> ConfigResult<RosterProfile> {
        let key = config_keys::roster_profile_key(variant);
        let raw = match self.get_config_value(&key)? {
            Some(v) => v,
            None => return Ok(RosterProfile::builtin(variant)),
        };

        let profile: RosterProfile = serde_json::from_str(&raw)?;
        if profile.variant != variant {
            return Err(format!(
                "规则表变体不匹配: key={}, profile={}",
                key, profile.variant
            )
            .into());
        }
        profile.check()?;
        Ok(profile)
    }

    async fn get_lookup_cache_ttl_secs(&self) -> ConfigResult<u64> {
        let value = self.get_config_or_default(config_keys::LOOKUP_CACHE_TTL_SECS, "600")?;
        Ok(value.trim().parse::<u64>().unwrap_or(600))
    }

    async fn get_lookup_cache_capacity(&self) -> ConfigResult<usize> {
        let value = self.get_config_or_default(config_keys::LOOKUP_CACHE_CAPACITY, "1000")?;
        Ok(value.trim().parse::<usize>().unwrap_or(1000))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    use crate::domain::types::RosterVariant;

    // 文件解析
    pub const SOURCE_ENCODING: &str = "source_encoding";

    // 学生查询缓存
    pub const LOOKUP_CACHE_TTL_SECS: &str = "lookup_cache_ttl_secs";
    pub const LOOKUP_CACHE_CAPACITY: &str = "lookup_cache_capacity";

    // 名册规则表覆写（JSON）
    pub const ROSTER_PROFILE_PREFIX: &str = "roster_profile/";

    pub fn roster_profile_key(variant: RosterVariant) -> String {
        format!("{}{}", ROSTER_PROFILE_PREFIX, variant.config_key())
    }
}
