// ==========================================
// CheckPeso - 配置管理 API
// ==========================================
// 职责: 配置查询/更新、抽样方案管理、配置快照
// 红线: 每次配置变更必须记录 ActionLog
// ==========================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::{config_keys, ConfigManager};
use crate::config::sampling_profile::SamplingPlanProfile;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::repository::action_log_repo::ActionLogRepository;

/// 支持的报表语言
const SUPPORTED_LOCALES: [&str; 2] = ["pt-BR", "en"];

// ==========================================
// ConfigApi - 配置管理 API
// ==========================================

/// 配置管理API
///
/// 职责：
/// 1. 配置查询（全部、单个）
/// 2. 配置更新（带取值校验）
/// 3. 抽样方案的保存与切换
/// 4. 配置快照管理
pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl ConfigApi {
    pub fn new(config_manager: Arc<ConfigManager>, action_log_repo: Arc<ActionLogRepository>) -> Self {
        Self {
            config_manager,
            action_log_repo,
        }
    }

    fn require_actor(actor: &str) -> ApiResult<()> {
        if actor.trim().is_empty() {
            return Err(ApiError::InvalidInput("操作人不能为空".to_string()));
        }
        Ok(())
    }

    fn log_action(
        &self,
        action_type: ActionType,
        actor: &str,
        payload: serde_json::Value,
        detail: String,
    ) -> ApiResult<()> {
        let action_log = ActionLog::new(action_type, actor, None, Some(payload), Some(detail));
        self.action_log_repo.insert(&action_log)?;
        Ok(())
    }

    // ==========================================
    // 键值配置
    // ==========================================

    /// 查询所有配置（键有序）
    pub fn list_configs(&self) -> ApiResult<Vec<ConfigItem>> {
        let snapshot = self.config_snapshot()?;
        let map: BTreeMap<String, String> = serde_json::from_str(&snapshot)
            .map_err(|e| ApiError::InternalError(format!("配置快照解析失败: {}", e)))?;
        Ok(map
            .into_iter()
            .map(|(key, value)| ConfigItem { key, value })
            .collect())
    }

    /// 查询单个配置
    pub fn get_config(&self, key: &str) -> ApiResult<Option<ConfigItem>> {
        let value = self
            .config_manager
            .get_global_config_value(key.trim())
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        Ok(value.map(|value| ConfigItem {
            key: key.trim().to_string(),
            value,
        }))
    }

    /// 更新配置
    ///
    /// - report.locale 只接受 pt-BR / en
    /// - sampling_plan.active 必须指向已存在的方案
    /// - 抽样方案内容只能通过 save_sampling_plan 写入
    pub fn update_config(&self, key: &str, value: &str, actor: &str) -> ApiResult<()> {
        Self::require_actor(actor)?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ApiError::InvalidInput("配置键不能为空".to_string()));
        }
        if key.starts_with(config_keys::SAMPLING_PLAN_PREFIX) {
            return Err(ApiError::InvalidInput(format!(
                "抽样方案请通过方案接口保存: {}",
                key
            )));
        }

        match key {
            config_keys::REPORT_LOCALE => {
                if !SUPPORTED_LOCALES.contains(&value.trim()) {
                    return Err(ApiError::InvalidInput(format!(
                        "不支持的报表语言: {}",
                        value
                    )));
                }
                self.set_value(key, value.trim())?;
            }
            config_keys::SAMPLING_PLAN_ACTIVE => {
                self.ensure_plan_exists(value)?;
                self.config_manager
                    .set_active_sampling_plan_id(value)
                    .map_err(|e| ApiError::ConfigError(e.to_string()))?;
            }
            _ => self.set_value(key, value)?,
        }

        self.log_action(
            ActionType::UpdateConfig,
            actor,
            serde_json::json!({ "key": key, "value": value }),
            format!("更新配置: {}={}", key, value),
        )?;
        info!(key = %key, actor = %actor, "配置已更新");
        Ok(())
    }

    fn set_value(&self, key: &str, value: &str) -> ApiResult<()> {
        self.config_manager
            .set_global_config_value(key, value)
            .map_err(|e| ApiError::ConfigError(e.to_string()))
    }

    fn ensure_plan_exists(&self, plan_id: &str) -> ApiResult<SamplingPlanProfile> {
        self.get_sampling_plan(plan_id)
    }

    // ==========================================
    // 抽样方案
    // ==========================================

    pub fn get_sampling_plan(&self, plan_id: &str) -> ApiResult<SamplingPlanProfile> {
        self.config_manager
            .get_sampling_plan(plan_id)
            .map_err(|e| ApiError::ConfigError(e.to_string()))?
            .ok_or_else(|| ApiError::NotFound(format!("抽样方案不存在: {}", plan_id.trim())))
    }

    /// 全部抽样方案（S4 在前）及当前启用方案
    pub fn list_sampling_plans(&self) -> ApiResult<SamplingPlanList> {
        let ids = self
            .config_manager
            .list_sampling_plan_ids()
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let mut plans = Vec::with_capacity(ids.len());
        for id in ids {
            match self.config_manager.get_sampling_plan(&id) {
                Ok(Some(profile)) => plans.push(profile),
                Ok(None) => {}
                Err(e) => tracing::warn!(plan_id = %id, error = %e, "跳过格式错误的抽样方案"),
            }
        }
        let active_plan_id = self
            .config_manager
            .get_active_sampling_plan_id()
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        Ok(SamplingPlanList {
            active_plan_id,
            plans,
        })
    }

    /// 保存自定义抽样方案（S4 只读）
    pub fn save_sampling_plan(&self, profile: &SamplingPlanProfile, actor: &str) -> ApiResult<()> {
        Self::require_actor(actor)?;
        if let Err(reason) = profile.validate() {
            return Err(ApiError::BusinessRuleViolation(reason));
        }
        self.config_manager
            .save_sampling_plan(profile)
            .map_err(|e| ApiError::BusinessRuleViolation(e.to_string()))?;

        self.log_action(
            ActionType::SaveSamplingPlan,
            actor,
            serde_json::to_value(profile)
                .map_err(|e| ApiError::InternalError(e.to_string()))?,
            format!("保存抽样方案: {} ({} 个区间)", profile.plan_id, profile.ranges.len()),
        )
    }

    /// 切换启用方案
    pub fn set_active_plan(&self, plan_id: &str, actor: &str) -> ApiResult<()> {
        self.update_config(config_keys::SAMPLING_PLAN_ACTIVE, plan_id.trim(), actor)
    }

    /// 按当前启用方案说明某批量的样本量
    pub fn describe_sample_size(&self, lot_size: f64) -> ApiResult<SampleSizeInfo> {
        let resolver = self
            .config_manager
            .active_resolver()
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        Ok(SampleSizeInfo {
            plan_id: resolver.plan_id().to_string(),
            lot_size,
            sample_size: resolver.resolve(lot_size),
            description: resolver.describe(lot_size),
        })
    }

    // ==========================================
    // 快照
    // ==========================================

    pub fn config_snapshot(&self) -> ApiResult<String> {
        self.config_manager
            .get_config_snapshot()
            .map_err(|e| ApiError::InternalError(e.to_string()))
    }

    /// 从快照恢复配置
    pub fn restore_snapshot(&self, snapshot_json: &str, actor: &str) -> ApiResult<usize> {
        Self::require_actor(actor)?;
        if snapshot_json.trim().is_empty() {
            return Err(ApiError::InvalidInput("快照JSON不能为空".to_string()));
        }

        let count = self
            .config_manager
            .restore_config_from_snapshot(snapshot_json)
            .map_err(|e| ApiError::InvalidInput(format!("快照恢复失败: {}", e)))?;

        self.log_action(
            ActionType::UpdateConfig,
            actor,
            serde_json::json!({ "restored_count": count }),
            format!("从快照恢复{}个配置", count),
        )?;
        Ok(count)
    }
}

// ==========================================
// DTO 类型定义
// ==========================================

/// 配置项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigItem {
    pub key: String,
    pub value: String,
}

/// 抽样方案列表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingPlanList {
    pub active_plan_id: String,
    pub plans: Vec<SamplingPlanProfile>,
}

/// 样本量说明
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleSizeInfo {
    pub plan_id: String,
    pub lot_size: f64,
    pub sample_size: u32,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_shared_connection;
    use crate::domain::sampling::SamplingRange;
    use crate::i18n::{set_locale, tests::LOCALE_TEST_LOCK, DEFAULT_LOCALE};

    fn setup() -> (tempfile::TempDir, ConfigApi, Arc<ActionLogRepository>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.db");
        let conn = open_shared_connection(path.to_str().unwrap()).unwrap();
        let logs = Arc::new(ActionLogRepository::new(conn.clone()).unwrap());
        let api = ConfigApi::new(Arc::new(ConfigManager::from_connection(conn).unwrap()), logs.clone());
        (dir, api, logs)
    }

    fn plan(id: &str) -> SamplingPlanProfile {
        SamplingPlanProfile {
            plan_id: id.to_string(),
            title: "Fornecedor A".to_string(),
            description: None,
            ranges: vec![
                SamplingRange::new(2, Some(100), 4),
                SamplingRange::new(101, None, 10),
            ],
        }
    }

    #[test]
    fn test_update_and_get_config() {
        let (_dir, api, logs) = setup();
        api.update_config("report.company_name", "Mercado Bom Preço", "ana")
            .unwrap();
        let item = api.get_config("report.company_name").unwrap().unwrap();
        assert_eq!(item.value, "Mercado Bom Preço");
        assert!(api.get_config("missing").unwrap().is_none());

        let recent = logs.list_recent(10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].action_type, "UPDATE_CONFIG");
    }

    #[test]
    fn test_update_config_validation() {
        let (_dir, api, _logs) = setup();
        assert!(api.update_config("report.locale", "fr", "ana").is_err());
        assert!(api.update_config("report.locale", "en", "ana").is_ok());
        assert!(api.update_config("sampling_plan/X", "{}", "ana").is_err());
        assert!(api.update_config("report.locale", "en", "").is_err());
        assert!(matches!(
            api.update_config("sampling_plan.active", "NOPE", "ana"),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn test_save_and_activate_plan() {
        let (_dir, api, _logs) = setup();
        api.save_sampling_plan(&plan("FORNECEDOR_A"), "ana").unwrap();
        api.set_active_plan("FORNECEDOR_A", "ana").unwrap();

        let list = api.list_sampling_plans().unwrap();
        assert_eq!(list.active_plan_id, "FORNECEDOR_A");
        let ids: Vec<_> = list.plans.iter().map(|p| p.plan_id.as_str()).collect();
        assert_eq!(ids, vec!["S4", "FORNECEDOR_A"]);

        let info = api.describe_sample_size(150.0).unwrap();
        assert_eq!(info.plan_id, "FORNECEDOR_A");
        assert_eq!(info.sample_size, 10);
    }

    #[test]
    fn test_builtin_plan_is_read_only() {
        let (_dir, api, _logs) = setup();
        let err = api.save_sampling_plan(&plan("S4"), "ana").unwrap_err();
        assert!(matches!(err, ApiError::BusinessRuleViolation(_)));

        let mut broken = plan("GAP");
        broken.ranges[1].min = 150;
        assert!(api.save_sampling_plan(&broken, "ana").is_err());
        assert!(matches!(api.get_sampling_plan("GAP"), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_describe_sample_size_default_plan() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_locale(DEFAULT_LOCALE);
        let (_dir, api, _logs) = setup();
        let info = api.describe_sample_size(100.0).unwrap();
        assert_eq!(info.plan_id, "S4");
        assert_eq!(info.sample_size, 8);
        assert!(info.description.contains("amostra de 8 caixas"));
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let (_dir, api, _logs) = setup();
        api.update_config("report.company_name", "A", "ana").unwrap();
        let snapshot = api.config_snapshot().unwrap();
        api.update_config("report.company_name", "B", "ana").unwrap();

        api.restore_snapshot(&snapshot, "ana").unwrap();
        assert_eq!(api.get_config("report.company_name").unwrap().unwrap().value, "A");
        assert!(api.restore_snapshot("not json", "ana").is_err());
        assert_eq!(api.list_configs().unwrap().len(), 1);
    }
}
