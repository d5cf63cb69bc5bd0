// ==========================================
// CheckPeso - 报表 API
// ==========================================
// 职责: 单条记录的 WhatsApp / 邮件文本，多条记录的 HTML / CSV 报表
// 红线: 报表只读持久化的核算结果，不重新核算
// ==========================================

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::config::report_config_trait::ReportConfigReader;
use crate::domain::record::{RecordFilter, WeightAuditRecord};
use crate::report::{export_csv, EmailMessage, ReportRenderer, ReportSummary};
use crate::repository::audit_record_repo::WeightAuditRepository;

pub struct ReportApi {
    record_repo: Arc<WeightAuditRepository>,
    config_manager: Arc<ConfigManager>,
}

impl ReportApi {
    pub fn new(record_repo: Arc<WeightAuditRepository>, config_manager: Arc<ConfigManager>) -> Self {
        Self {
            record_repo,
            config_manager,
        }
    }

    /// 按配置构造渲染器（语言随渲染器携带，不改全局 locale）
    pub async fn renderer(&self) -> ApiResult<ReportRenderer> {
        let reader: &dyn ReportConfigReader = self.config_manager.as_ref();
        let locale = reader
            .get_report_locale()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let company_name = reader
            .get_company_name()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        let renderer = ReportRenderer::new(Some(company_name)).with_locale(&locale);
        debug!(locale = renderer.locale(), "报表语言");
        Ok(renderer)
    }

    fn find(&self, record_id: &str) -> ApiResult<WeightAuditRecord> {
        self.record_repo
            .find_by_id(record_id)?
            .ok_or_else(|| ApiError::NotFound(format!("WeightAuditRecord(id={})不存在", record_id)))
    }

    fn records(&self, filter: &RecordFilter) -> ApiResult<Vec<WeightAuditRecord>> {
        if filter.limit == 0 {
            return Err(ApiError::InvalidInput("limit 必须 >= 1".to_string()));
        }
        Ok(self.record_repo.list(filter)?)
    }

    /// 汇总（不涉及文本）
    pub fn summary(&self, filter: &RecordFilter) -> ApiResult<ReportSummary> {
        Ok(ReportSummary::from_records(&self.records(filter)?))
    }

    /// WhatsApp 分享文本
    pub async fn whatsapp(&self, record_id: &str) -> ApiResult<String> {
        let record = self.find(record_id)?;
        Ok(self.renderer().await?.render_whatsapp(&record))
    }

    /// 邮件（主题 + 正文）
    pub async fn email(&self, record_id: &str) -> ApiResult<EmailMessage> {
        let record = self.find(record_id)?;
        Ok(self.renderer().await?.render_email(&record))
    }

    /// HTML 报表（打印 / 另存 PDF 用）
    #[instrument(skip(self))]
    pub async fn html(&self, filter: &RecordFilter) -> ApiResult<String> {
        let records = self.records(filter)?;
        let summary = ReportSummary::from_records(&records);
        Ok(self.renderer().await?.render_html(&records, &summary))
    }

    /// CSV 导出（分号分隔，逗号小数）
    pub fn csv(&self, filter: &RecordFilter) -> ApiResult<String> {
        let records = self.records(filter)?;
        let mut buffer = Vec::new();
        export_csv(&records, &mut buffer)
            .map_err(|e| ApiError::InternalError(format!("CSV 导出失败: {}", e)))?;
        String::from_utf8(buffer).map_err(|e| ApiError::InternalError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_shared_connection;
    use crate::i18n::{current_locale, set_locale, tests::LOCALE_TEST_LOCK, DEFAULT_LOCALE};
    use crate::report::test_support::lossy_record;

    fn setup() -> (tempfile::TempDir, ReportApi, Arc<ConfigManager>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.db");
        let conn = open_shared_connection(path.to_str().unwrap()).unwrap();
        let repo = Arc::new(WeightAuditRepository::from_connection(conn.clone()).unwrap());
        repo.insert(&lossy_record()).unwrap();
        let config = Arc::new(ConfigManager::from_connection(conn).unwrap());
        (dir, ReportApi::new(repo, config.clone()), config)
    }

    #[tokio::test]
    async fn test_whatsapp_uses_configured_locale() {
        let (_dir, api, config) = setup();

        let text = api.whatsapp("REC-1").await.unwrap();
        assert!(text.contains("PERDA IDENTIFICADA"));

        config.set_global_config_value("report.locale", "en").unwrap();
        let text = api.whatsapp("REC-1").await.unwrap();
        assert!(text.contains("LOSS DETECTED"));
    }

    #[tokio::test]
    async fn test_rendering_leaves_global_locale_untouched() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_locale(DEFAULT_LOCALE);
        let (_dir, api, config) = setup();
        config.set_global_config_value("report.locale", "en").unwrap();

        let email = api.email("REC-1").await.unwrap();
        assert!(email.body.contains("LOSS DETECTED"));
        assert_eq!(current_locale(), DEFAULT_LOCALE);
    }

    #[tokio::test]
    async fn test_concurrent_reports_keep_their_locale() {
        let (_dir_pt, api_pt, _config_pt) = setup();
        let (_dir_en, api_en, config_en) = setup();
        config_en.set_global_config_value("report.locale", "en").unwrap();

        for _ in 0..20 {
            let (pt, en) = tokio::join!(api_pt.whatsapp("REC-1"), api_en.whatsapp("REC-1"));
            let (pt, en) = (pt.unwrap(), en.unwrap());
            assert!(pt.contains("*PERDA IDENTIFICADA*"));
            assert!(!pt.contains("LOSS DETECTED"));
            assert!(en.contains("*LOSS DETECTED*"));
            assert!(!en.contains("PERDA IDENTIFICADA"));
        }
    }

    #[tokio::test]
    async fn test_missing_record() {
        let (_dir, api, _config) = setup();
        assert!(matches!(api.email("nope").await, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_html_includes_company_name() {
        let (_dir, api, config) = setup();
        config
            .set_global_config_value("report.company_name", "Mercado Bom Preço")
            .unwrap();
        let html = api.html(&RecordFilter::default()).await.unwrap();
        assert!(html.contains("Mercado Bom Preço"));
        assert!(html.contains("Frigorífico &lt;Sul&gt;"));
    }

    #[test]
    fn test_summary_and_csv() {
        let (_dir, api, _config) = setup();
        let summary = api.summary(&RecordFilter::default()).unwrap();
        assert_eq!(summary.record_count, 1);
        assert_eq!(summary.worst_record_id.as_deref(), Some("REC-1"));

        let csv = api.csv(&RecordFilter::default()).unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.contains("6,25"));
    }
}
