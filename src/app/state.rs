// ==========================================
// CheckPeso - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::Arc;

use crate::api::{ConfigApi, ImportApi, ReportApi, WeightAuditApi};
use crate::config::config_manager::{config_keys, ConfigManager};
use crate::db::open_shared_connection;
use crate::i18n::{normalize_locale, set_locale, DEFAULT_LOCALE};
use crate::repository::{
    action_log_repo::ActionLogRepository,
    audit_record_repo::WeightAuditRepository,
    sheet_mirror::{CsvSheetMirror, NoOpSheetMirror, SheetMirror},
};

/// 应用状态
///
/// 包含所有API实例和共享资源，所有仓储共用同一个数据库连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 称重核查API
    pub audit_api: Arc<WeightAuditApi>,

    /// 配置管理API
    pub config_api: Arc<ConfigApi>,

    /// 报表API
    pub report_api: Arc<ReportApi>,

    /// 批量导入API
    pub import_api: Arc<ImportApi>,

    /// 操作日志仓储（用于审计追踪）
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享连接并初始化所有Repository
    /// 2. 按配置选择表格镜像（未配置时不镜像）
    /// 3. 按配置切换界面/报表语言
    /// 4. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_shared_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let record_repo = Arc::new(
            WeightAuditRepository::from_connection(conn.clone())
                .map_err(|e| format!("称重记录仓储初始化失败: {}", e))?,
        );
        let action_log_repo = Arc::new(
            ActionLogRepository::new(conn.clone())
                .map_err(|e| format!("操作日志仓储初始化失败: {}", e))?,
        );
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn).map_err(|e| format!("配置管理器初始化失败: {}", e))?,
        );

        // ==========================================
        // 表格镜像 / 语言
        // ==========================================
        let mirror: Arc<dyn SheetMirror> = match config_manager
            .get_global_config_value(config_keys::SHEET_MIRROR_PATH)
            .map_err(|e| format!("读取镜像配置失败: {}", e))?
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty())
        {
            Some(path) => {
                tracing::info!("表格镜像: {}", path);
                Arc::new(CsvSheetMirror::new(path))
            }
            None => Arc::new(NoOpSheetMirror),
        };

        let locale = config_manager
            .get_config_or_default(config_keys::REPORT_LOCALE, DEFAULT_LOCALE)
            .map_err(|e| format!("读取语言配置失败: {}", e))?;
        set_locale(normalize_locale(&locale));

        // ==========================================
        // 初始化API层
        // ==========================================
        let audit_api = Arc::new(WeightAuditApi::new(
            record_repo.clone(),
            action_log_repo.clone(),
            config_manager.clone(),
            mirror,
        ));
        let config_api = Arc::new(ConfigApi::new(config_manager.clone(), action_log_repo.clone()));
        let report_api = Arc::new(ReportApi::new(record_repo, config_manager));
        let import_api = Arc::new(ImportApi::new(audit_api.clone(), action_log_repo.clone()));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            audit_api,
            config_api,
            report_api,
            import_api,
            action_log_repo,
        })
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 CHECKPESO_DB（非空时）
/// - 否则: 用户数据目录/checkpeso/checkpeso.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("CHECKPESO_DB") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./checkpeso.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("checkpeso");
        // 目录创建失败时回退当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("checkpeso.db");
        }
    }

    path.to_string_lossy().to_string()
}
