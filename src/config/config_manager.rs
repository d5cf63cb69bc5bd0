// ==========================================
// CheckPeso - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::report_config_trait::ReportConfigReader;
use crate::config::sampling_profile::SamplingPlanProfile;
use crate::db::open_sqlite_connection;
use crate::domain::sampling::S4_PLAN_ID;
use crate::engine::sampling::SamplingTableResolver;
use crate::i18n::DEFAULT_LOCALE;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

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
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            conn_guard.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS config_kv (
                  scope_id TEXT NOT NULL,
                  key TEXT NOT NULL,
                  value TEXT NOT NULL,
                  updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                  PRIMARY KEY (scope_id, key)
                );
                "#,
            )?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
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

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 从 config_kv 表读取配置值，带默认值
    pub fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式，键有序）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 此方法会覆盖同名的 global 配置，快照中没有的键保持不变
    /// - `__meta_` 前缀的键为元信息，不回写
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> Result<usize, Box<dyn Error>> {
        let config_map: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            if key.starts_with("__meta_") {
                continue;
            }
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value, updated_at)
                 VALUES ('global', ?1, ?2, datetime('now'))
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
                params![key, value],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }

    // ===== 抽样方案配置 =====

    /// 当前启用的抽样方案 ID（默认 S4）
    pub fn get_active_sampling_plan_id(&self) -> Result<String, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::SAMPLING_PLAN_ACTIVE, S4_PLAN_ID)?;
        let value = value.trim();
        if value.is_empty() {
            Ok(S4_PLAN_ID.to_string())
        } else {
            Ok(value.to_string())
        }
    }

    /// 切换启用的抽样方案（方案必须存在）
    pub fn set_active_sampling_plan_id(&self, plan_id: &str) -> Result<(), Box<dyn Error>> {
        let id = plan_id.trim();
        if self.get_sampling_plan(id)?.is_none() {
            return Err(format!("抽样方案不存在: {}", id).into());
        }
        self.set_global_config_value(config_keys::SAMPLING_PLAN_ACTIVE, id)
    }

    /// 读取抽样方案（存储于 config_kv: sampling_plan/{plan_id}）
    ///
    /// S4 为内置方案，未被覆写时直接返回内置表
    pub fn get_sampling_plan(
        &self,
        plan_id: &str,
    ) -> Result<Option<SamplingPlanProfile>, Box<dyn Error>> {
        let id = plan_id.trim();
        if id.is_empty() {
            return Ok(None);
        }
        if id == S4_PLAN_ID {
            return Ok(Some(SamplingPlanProfile::builtin_s4()));
        }

        let key = config_keys::sampling_plan_key(id);
        let raw = match self.get_config_value(&key)? {
            Some(v) => v,
            None => return Ok(None),
        };

        let profile: SamplingPlanProfile = serde_json::from_str(&raw)?;
        Ok(Some(profile))
    }

    /// 保存自定义抽样方案（先校验，S4 为只读）
    pub fn save_sampling_plan(&self, profile: &SamplingPlanProfile) -> Result<(), Box<dyn Error>> {
        profile.validate()?;
        if profile.plan_id.trim() == S4_PLAN_ID {
            return Err("内置 S4 方案不可覆写".into());
        }
        let key = config_keys::sampling_plan_key(profile.plan_id.trim());
        let raw = serde_json::to_string(profile)?;
        self.set_global_config_value(&key, &raw)
    }

    /// 已保存的抽样方案 ID 列表（含内置 S4）
    pub fn list_sampling_plan_ids(&self) -> Result<Vec<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let mut stmt = conn.prepare(
            "SELECT key FROM config_kv WHERE scope_id = 'global' AND key LIKE 'sampling_plan/%' ORDER BY key",
        )?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut ids = vec![S4_PLAN_ID.to_string()];
        ids.extend(
            keys.into_iter()
                .filter_map(|k| k.strip_prefix(config_keys::SAMPLING_PLAN_PREFIX).map(str::to_string)),
        );
        Ok(ids)
    }

    /// 当前启用方案的解析器
    ///
    /// 方案缺失或内容无效时回退 S4，并记录告警
    pub fn active_resolver(&self) -> Result<SamplingTableResolver, Box<dyn Error>> {
        let plan_id = self.get_active_sampling_plan_id()?;

        let profile = match self.get_sampling_plan(&plan_id) {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                tracing::warn!(plan_id = %plan_id, "启用的抽样方案不存在，回退 S4");
                return Ok(SamplingTableResolver::s4());
            }
            Err(e) => {
                tracing::warn!(plan_id = %plan_id, error = %e, "抽样方案配置格式错误，回退 S4");
                return Ok(SamplingTableResolver::s4());
            }
        };

        match profile.to_resolver() {
            Ok(resolver) => Ok(resolver),
            Err(reason) => {
                tracing::warn!(plan_id = %plan_id, reason = %reason, "抽样方案区间无效，回退 S4");
                Ok(SamplingTableResolver::s4())
            }
        }
    }
}

// ==========================================
// ReportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ReportConfigReader for ConfigManager {
    async fn get_company_name(&self) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_or_default(config_keys::REPORT_COMPANY_NAME, "")?
            .trim()
            .to_string())
    }

    async fn get_report_locale(&self) -> Result<String, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::REPORT_LOCALE, DEFAULT_LOCALE)?;
        match value.trim() {
            "en" => Ok("en".to_string()),
            _ => Ok(DEFAULT_LOCALE.to_string()), // 未识别的语言一律回退葡语
        }
    }

    async fn get_sheet_mirror_path(&self) -> Result<Option<String>, Box<dyn Error>> {
        Ok(self
            .get_config_value(config_keys::SHEET_MIRROR_PATH)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 抽样方案
    pub const SAMPLING_PLAN_ACTIVE: &str = "sampling_plan.active";
    pub const SAMPLING_PLAN_PREFIX: &str = "sampling_plan/";

    // 表格镜像
    pub const SHEET_MIRROR_PATH: &str = "sheet_mirror.path";

    // 报表
    pub const REPORT_COMPANY_NAME: &str = "report.company_name";
    pub const REPORT_LOCALE: &str = "report.locale";

    /// 自定义抽样方案的存储键
    pub fn sampling_plan_key(plan_id: &str) -> String {
        format!("{}{}", SAMPLING_PLAN_PREFIX, plan_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sampling::SamplingRange;

    fn manager() -> (tempfile::TempDir, ConfigManager) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.db");
        let manager = ConfigManager::new(path.to_str().unwrap()).unwrap();
        (dir, manager)
    }

    fn custom_plan(id: &str) -> SamplingPlanProfile {
        SamplingPlanProfile {
            plan_id: id.to_string(),
            title: "Fornecedor crítico".to_string(),
            description: None,
            ranges: vec![
                SamplingRange::new(2, Some(50), 5),
                SamplingRange::new(51, None, 13),
            ],
        }
    }

    #[test]
    fn test_defaults() {
        let (_dir, manager) = manager();
        assert_eq!(manager.get_active_sampling_plan_id().unwrap(), "S4");
        assert_eq!(manager.active_resolver().unwrap(), SamplingTableResolver::s4());
        assert_eq!(
            manager.get_sampling_plan("S4").unwrap(),
            Some(SamplingPlanProfile::builtin_s4())
        );
        assert!(manager.get_sampling_plan("NOPE").unwrap().is_none());
    }

    #[test]
    fn test_save_and_activate_custom_plan() {
        let (_dir, manager) = manager();
        manager.save_sampling_plan(&custom_plan("CRITICO")).unwrap();
        manager.set_active_sampling_plan_id("CRITICO").unwrap();

        let resolver = manager.active_resolver().unwrap();
        assert_eq!(resolver.plan_id(), "CRITICO");
        assert_eq!(resolver.resolve(60.0), 13);
        assert_eq!(
            manager.list_sampling_plan_ids().unwrap(),
            vec!["S4".to_string(), "CRITICO".to_string()]
        );
    }

    #[test]
    fn test_invalid_plans_rejected() {
        let (_dir, manager) = manager();

        let mut gap = custom_plan("GAP");
        gap.ranges[1].min = 60;
        assert!(manager.save_sampling_plan(&gap).is_err());

        assert!(manager.save_sampling_plan(&custom_plan("S4")).is_err());
        assert!(manager.set_active_sampling_plan_id("MISSING").is_err());
    }

    #[test]
    fn test_corrupted_plan_falls_back_to_s4() {
        let (_dir, manager) = manager();
        manager
            .set_global_config_value("sampling_plan/RUIM", "{not json")
            .unwrap();
        manager
            .set_global_config_value(config_keys::SAMPLING_PLAN_ACTIVE, "RUIM")
            .unwrap();
        assert_eq!(manager.active_resolver().unwrap().plan_id(), "S4");
    }

    #[test]
    fn test_snapshot_and_restore() {
        let (_dir, manager) = manager();
        manager
            .set_global_config_value(config_keys::REPORT_COMPANY_NAME, "Mercado Bom Preço")
            .unwrap();
        let snapshot = manager.get_config_snapshot().unwrap();

        manager
            .set_global_config_value(config_keys::REPORT_COMPANY_NAME, "Outro")
            .unwrap();
        let restored = manager.restore_config_from_snapshot(&snapshot).unwrap();
        assert_eq!(restored, 1);
        assert_eq!(
            manager
                .get_global_config_value(config_keys::REPORT_COMPANY_NAME)
                .unwrap()
                .as_deref(),
            Some("Mercado Bom Preço")
        );
    }

    #[tokio::test]
    async fn test_report_config_reader() {
        let (_dir, manager) = manager();
        assert_eq!(manager.get_report_locale().await.unwrap(), "pt-BR");
        assert_eq!(manager.get_sheet_mirror_path().await.unwrap(), None);

        manager
            .set_global_config_value(config_keys::REPORT_LOCALE, "en")
            .unwrap();
        manager
            .set_global_config_value(config_keys::SHEET_MIRROR_PATH, "  ")
            .unwrap();
        assert_eq!(manager.get_report_locale().await.unwrap(), "en");
        assert_eq!(manager.get_sheet_mirror_path().await.unwrap(), None);
    }
}
