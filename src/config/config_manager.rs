// ==========================================
// 问卷题库 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::{ConfigResult, ImportConfigReader};
use crate::db::open_sqlite_connection;
use crate::domain::question::ORIGIN_IMPORTED;
use crate::domain::types::FailurePolicy;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// 配置作用域（目前只使用 global）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    Global,
}

impl ConfigScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigScope::Global => "global",
        }
    }
}

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

    /// 从 config_kv 表读取配置值
    fn get_config_value(&self, scope: ConfigScope, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![scope.as_str(), key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(ConfigScope::Global, key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![ConfigScope::Global.as_str(), key, value],
        )?;
        Ok(())
    }

    /// 获取 global 配置快照
    pub fn get_config_snapshot(&self) -> ConfigResult<HashMap<String, String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(config_map)
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 读取失败策略（非法值回退到默认值并告警）
    fn get_failure_policy(&self, key: &str, default: FailurePolicy) -> ConfigResult<FailurePolicy> {
        let value = self.get_config_or_default(key, default.as_str())?;
        match FailurePolicy::parse(&value) {
            Some(policy) => Ok(policy),
            None => {
                warn!(key, value = %value, "失败策略配置非法，使用默认值 {}", default);
                Ok(default)
            }
        }
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_default_origin(&self) -> ConfigResult<String> {
        let value = self.get_config_or_default(config_keys::DEFAULT_ORIGIN, ORIGIN_IMPORTED)?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Ok(ORIGIN_IMPORTED.to_string())
        } else {
            Ok(trimmed.to_string())
        }
    }

    async fn get_excel_failure_policy(&self) -> ConfigResult<FailurePolicy> {
        self.get_failure_policy(config_keys::EXCEL_FAILURE_POLICY, FailurePolicy::FailFast)
    }

    async fn get_csv_failure_policy(&self) -> ConfigResult<FailurePolicy> {
        self.get_failure_policy(
            config_keys::CSV_FAILURE_POLICY,
            FailurePolicy::AggregateThenReject,
        )
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 导入
    pub const DEFAULT_ORIGIN: &str = "question_import/default_origin";
    pub const EXCEL_FAILURE_POLICY: &str = "question_import/excel_failure_policy";
    pub const CSV_FAILURE_POLICY: &str = "question_import/csv_failure_policy";
}
