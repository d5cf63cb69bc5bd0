// ==========================================
// CheckPeso - 称重核查 API
// ==========================================
// 职责: 预览 / 新建 / 修改 / 删除 / 查询称重核查记录
// 流程: 校验 → 核算（启用的抽样方案）→ 落库 + 操作日志（同一事务）→ 表格镜像
// 红线:
// - 预览不校验、不落库
// - 每次写入必须记录 ActionLog
// - 镜像失败只告警，不回滚数据库
// ==========================================

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::validate_weighing_input;
use crate::config::config_manager::ConfigManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::record::{RecordFilter, RecordMetadata, WeightAuditRecord};
use crate::domain::weighing::{LossResult, RawWeighingInput, WeighingInput};
use crate::engine::loss::LossEngine;
use crate::importer::sheet_importer_trait::{ImportSink, ImportedRow};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::audit_record_repo::WeightAuditRepository;
use crate::repository::sheet_mirror::SheetMirror;

// ==========================================
// 请求 / 响应 DTO
// ==========================================

/// 称重表单（元信息 + 原始数值，字段名与持久化一致）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeighingForm {
    #[serde(flatten)]
    pub metadata: RecordMetadata,
    #[serde(flatten)]
    pub input: RawWeighingInput,
}

/// 预览结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub plan_id: String,
    pub input: WeighingInput,
    pub result: LossResult,
    pub sample_size_description: String,
}

/// 新建 / 修改结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMutationResponse {
    pub record: WeightAuditRecord,
    /// 表格镜像是否同步成功
    pub mirror_synced: bool,
}

/// 删除结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRecordResponse {
    pub record_id: String,
    pub mirror_synced: bool,
}

/// 分页列表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordListResponse {
    pub records: Vec<WeightAuditRecord>,
    pub total: i64,
    pub limit: usize,
    pub offset: usize,
}

// ==========================================
// WeightAuditApi - 称重核查 API
// ==========================================
pub struct WeightAuditApi {
    record_repo: Arc<WeightAuditRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    config_manager: Arc<ConfigManager>,
    mirror: Arc<dyn SheetMirror>,
}

impl WeightAuditApi {
    pub fn new(
        record_repo: Arc<WeightAuditRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        config_manager: Arc<ConfigManager>,
        mirror: Arc<dyn SheetMirror>,
    ) -> Self {
        Self {
            record_repo,
            action_log_repo,
            config_manager,
            mirror,
        }
    }

    /// 使用当前启用抽样方案的核算引擎
    fn engine(&self) -> ApiResult<LossEngine> {
        let resolver = self
            .config_manager
            .active_resolver()
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        Ok(LossEngine::with_resolver(resolver))
    }

    fn require_actor(actor: &str) -> ApiResult<()> {
        if actor.trim().is_empty() {
            return Err(ApiError::InvalidInput("操作人不能为空".to_string()));
        }
        Ok(())
    }

    fn now() -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }

    fn sync_mirror(&self, record: &WeightAuditRecord) -> bool {
        match self.mirror.upsert_row(record) {
            Ok(()) => true,
            Err(e) => {
                warn!(record_id = %record.id, mirror = self.mirror.name(), error = %e, "表格镜像同步失败");
                false
            }
        }
    }

    fn action_log(
        action_type: ActionType,
        actor: &str,
        record: &WeightAuditRecord,
        detail: String,
    ) -> ActionLog {
        ActionLog::new(
            action_type,
            actor,
            Some(record.id.clone()),
            Some(serde_json::json!({
                "fornecedor": record.metadata.supplier,
                "produto": record.metadata.product,
                "quantidade_tabela": record.result.sample_size,
                "perda_kg": record.result.loss_kg,
                "perda_percentual": record.result.loss_percent,
            })),
            Some(detail),
        )
    }

    // ==========================================
    // 预览
    // ==========================================

    /// 表单实时预览（容忍任何中间输入，不校验）
    pub fn preview(&self, input: &RawWeighingInput) -> ApiResult<PreviewResponse> {
        let engine = self.engine()?;
        let input = input.normalize();
        let result = engine.calculate(&input);

        Ok(PreviewResponse {
            plan_id: engine.resolver().plan_id().to_string(),
            input,
            result,
            sample_size_description: engine.resolver().describe(input.lot_size),
        })
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 新建记录
    #[instrument(skip(self, form), fields(supplier = %form.metadata.supplier))]
    pub fn create_record(&self, form: &WeighingForm, actor: &str) -> ApiResult<RecordMutationResponse> {
        Self::require_actor(actor)?;
        let engine = self.engine()?;
        let input = validate_weighing_input(&form.metadata, &form.input, &engine)?;
        let now = Self::now();

        let record = WeightAuditRecord {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: clean_metadata(&form.metadata),
            input,
            result: engine.calculate(&input),
            created_at: now,
            updated_at: now,
        };

        let action_log = Self::action_log(
            ActionType::CreateRecord,
            actor,
            &record,
            format!("新建称重核查: {} / {}", record.metadata.supplier, record.metadata.product),
        );
        self.record_repo.insert_with_log(&record, &action_log)?;
        let mirror_synced = self.sync_mirror(&record);

        info!(record_id = %record.id, loss_kg = record.result.loss_kg, "称重核查已保存");
        Ok(RecordMutationResponse {
            record,
            mirror_synced,
        })
    }

    /// 修改记录（按当前启用方案重新核算）
    #[instrument(skip(self, form))]
    pub fn update_record(
        &self,
        record_id: &str,
        form: &WeighingForm,
        actor: &str,
    ) -> ApiResult<RecordMutationResponse> {
        Self::require_actor(actor)?;
        let existing = self.get_record(record_id)?;
        let engine = self.engine()?;
        let input = validate_weighing_input(&form.metadata, &form.input, &engine)?;

        let record = WeightAuditRecord {
            id: existing.id.clone(),
            metadata: clean_metadata(&form.metadata),
            input,
            result: engine.calculate(&input),
            created_at: existing.created_at,
            updated_at: Self::now(),
        };

        let action_log = Self::action_log(
            ActionType::UpdateRecord,
            actor,
            &record,
            format!(
                "修改称重核查: 失重 {:.3} kg → {:.3} kg",
                existing.result.loss_kg, record.result.loss_kg
            ),
        );
        self.record_repo.update_with_log(&record, &action_log)?;
        let mirror_synced = self.sync_mirror(&record);

        Ok(RecordMutationResponse {
            record,
            mirror_synced,
        })
    }

    /// 删除记录
    #[instrument(skip(self))]
    pub fn delete_record(&self, record_id: &str, actor: &str) -> ApiResult<DeleteRecordResponse> {
        Self::require_actor(actor)?;
        let existing = self.get_record(record_id)?;

        let action_log = Self::action_log(
            ActionType::DeleteRecord,
            actor,
            &existing,
            format!("删除称重核查: {}", record_id),
        );
        self.record_repo.delete_with_log(record_id, &action_log)?;

        let mirror_synced = match self.mirror.remove_row(record_id) {
            Ok(()) => true,
            Err(e) => {
                warn!(record_id = %record_id, error = %e, "表格镜像删除失败");
                false
            }
        };

        Ok(DeleteRecordResponse {
            record_id: record_id.to_string(),
            mirror_synced,
        })
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get_record(&self, record_id: &str) -> ApiResult<WeightAuditRecord> {
        self.record_repo
            .find_by_id(record_id)?
            .ok_or_else(|| ApiError::NotFound(format!("WeightAuditRecord(id={})不存在", record_id)))
    }

    pub fn list_records(&self, filter: &RecordFilter) -> ApiResult<RecordListResponse> {
        if filter.limit == 0 || filter.limit > 1000 {
            return Err(ApiError::InvalidInput(format!(
                "limit 必须在 1..=1000 之间: {}",
                filter.limit
            )));
        }
        if let (Some(from), Some(to)) = (filter.received_from, filter.received_to) {
            if from > to {
                return Err(ApiError::InvalidInput(format!(
                    "日期范围无效: {} > {}",
                    from, to
                )));
            }
        }

        Ok(RecordListResponse {
            records: self.record_repo.list(filter)?,
            total: self.record_repo.count(filter)?,
            limit: filter.limit,
            offset: filter.offset,
        })
    }

    /// 最近的操作日志
    pub fn recent_actions(&self, limit: usize) -> ApiResult<Vec<ActionLog>> {
        Ok(self.action_log_repo.list_recent(limit.clamp(1, 500))?)
    }

    /// 指定记录的操作历史
    pub fn record_history(&self, record_id: &str) -> ApiResult<Vec<ActionLog>> {
        Ok(self.action_log_repo.list_by_record(record_id)?)
    }
}

/// 元信息清洗: TRIM，空的可选字段归为 None
fn clean_metadata(metadata: &RecordMetadata) -> RecordMetadata {
    let optional = |value: &Option<String>| {
        value
            .as_ref()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    RecordMetadata {
        supplier: metadata.supplier.trim().to_string(),
        product: metadata.product.trim().to_string(),
        invoice_number: optional(&metadata.invoice_number),
        received_on: metadata.received_on,
        inspector: optional(&metadata.inspector),
        notes: optional(&metadata.notes),
        evidence_photos: metadata
            .evidence_photos
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect(),
    }
}

// ==========================================
// 批量导入的落库入口
// ==========================================
impl ImportSink for WeightAuditApi {
    fn accept(&self, row: &ImportedRow, actor: &str) -> Result<String, String> {
        let form = WeighingForm {
            metadata: row.metadata.clone(),
            input: row.input.clone(),
        };
        self.create_record(&form, actor)
            .map(|response| response.record.id)
            .map_err(|e| match &e {
                ApiError::ValidationFailed { violations, .. } => violations
                    .iter()
                    .map(|v| format!("{}: {}", v.field, v.reason))
                    .collect::<Vec<_>>()
                    .join("; "),
                _ => e.to_string(),
            })
    }
}
