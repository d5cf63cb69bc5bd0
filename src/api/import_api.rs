// ==========================================
// CheckPeso - 导入 API
// ==========================================
// 职责: 从 CSV / XLSX 批量导入历史称重表
// 流程: WeightAuditImporter 读表 → WeightAuditApi 逐行校验落库 → ActionLog
// ==========================================

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::api::audit_api::WeightAuditApi;
use crate::api::error::{ApiError, ApiResult};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::import_batch::ImportSummary;
use crate::importer::record_importer::WeightAuditImporter;
use crate::importer::sheet_importer_trait::RecordImporter;
use crate::repository::action_log_repo::ActionLogRepository;

/// 导入API
pub struct ImportApi {
    audit_api: Arc<WeightAuditApi>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl ImportApi {
    pub fn new(audit_api: Arc<WeightAuditApi>, action_log_repo: Arc<ActionLogRepository>) -> Self {
        Self {
            audit_api,
            action_log_repo,
        }
    }

    /// 导入称重表
    ///
    /// # 参数
    /// - file_path: 文件路径（.csv / .xlsx）
    /// - actor: 操作人
    ///
    /// # 返回
    /// - Ok(ImportSummary): 导入结果（含逐行问题）
    /// - Err(ApiError): 文件级错误（文件不存在、格式不支持、缺少必填列等）
    pub async fn import_file(&self, file_path: &str, actor: &str) -> ApiResult<ImportSummary> {
        if actor.trim().is_empty() {
            return Err(ApiError::InvalidInput("操作人不能为空".to_string()));
        }
        if file_path.trim().is_empty() {
            return Err(ApiError::InvalidInput("文件路径不能为空".to_string()));
        }

        let importer = WeightAuditImporter::new(self.audit_api.clone());
        let summary = importer.import_file(Path::new(file_path), actor).await?;

        let action_log = ActionLog::new(
            ActionType::ImportBatch,
            actor,
            None,
            Some(serde_json::json!({
                "batch_id": summary.batch_id,
                "file": file_path,
                "total_rows": summary.total_rows,
                "imported": summary.imported,
                "rejected": summary.rejected,
            })),
            Some(format!(
                "导入称重表: 成功 {} 行, 拒绝 {} 行",
                summary.imported, summary.rejected
            )),
        );
        self.action_log_repo.insert(&action_log)?;

        info!(
            batch_id = %summary.batch_id,
            imported = summary.imported,
            rejected = summary.rejected,
            elapsed_ms = summary.elapsed_ms,
            "导入完成"
        );
        Ok(summary)
    }
}
