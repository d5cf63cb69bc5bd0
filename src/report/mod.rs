// ==========================================
// CheckPeso - 报表层
// ==========================================
// 职责: 汇总 + WhatsApp / 邮件 / HTML / CSV 输出
// 红线: 只读已持久化的核算结果，不重算
// 数值: 统一巴西葡语格式（format_locale_decimal）
// 文案: 全部来自 i18n
// ==========================================

pub mod csv_export;
pub mod html;
pub mod summary;
pub mod text;

pub use csv_export::export_csv;
pub use summary::ReportSummary;
pub use text::EmailMessage;

use crate::domain::locale_number::format_locale_decimal;
use crate::domain::record::WeightAuditRecord;
use crate::i18n::{normalize_locale, t_in, t_with_args_in, DEFAULT_LOCALE};
use chrono::NaiveDate;

// ==========================================
// ReportRenderer - 报表渲染器
// ==========================================
// 语言随渲染器携带，不依赖全局 locale
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    company_name: Option<String>,
    locale: &'static str,
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ReportRenderer {
    pub fn new(company_name: Option<String>) -> Self {
        Self {
            company_name: company_name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
            locale: DEFAULT_LOCALE,
        }
    }

    /// 指定报表语言（不支持的语言回落到 pt-BR）
    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = normalize_locale(locale);
        self
    }

    pub fn company_name(&self) -> Option<&str> {
        self.company_name.as_deref()
    }

    pub fn locale(&self) -> &str {
        self.locale
    }

    pub(crate) fn t(&self, key: &str) -> String {
        t_in(self.locale, key)
    }

    pub(crate) fn t_with_args(&self, key: &str, args: &[(&str, &str)]) -> String {
        t_with_args_in(self.locale, key, args)
    }

    pub(crate) fn status_label(&self, record: &WeightAuditRecord) -> String {
        if record.result.has_loss() {
            self.t("report.status_loss")
        } else {
            self.t("report.status_ok")
        }
    }

    /// 单条记录的展示字段，分三组: 收货信息 / 称重输入 / 核算结果
    pub(crate) fn record_sections(&self, record: &WeightAuditRecord) -> [Vec<(String, String)>; 3] {
        let m = &record.metadata;
        let i = &record.input;
        let r = &record.result;
        let t = |key: &str| self.t(key);

        let mut identification = vec![
            (t("report.field.supplier"), m.supplier.clone()),
            (t("report.field.product"), m.product.clone()),
        ];
        if let Some(invoice) = &m.invoice_number {
            identification.push((t("report.field.invoice"), invoice.clone()));
        }
        identification.push((t("report.field.received_on"), fmt_date(m.received_on)));
        if let Some(inspector) = &m.inspector {
            identification.push((t("report.field.inspector"), inspector.clone()));
        }

        let measurements = vec![
            (t("report.field.lot_size"), fmt_integer(i.lot_size)),
            (t("report.field.nominal_weight"), fmt_decimal(i.nominal_weight_per_box)),
            (t("report.field.tare"), fmt_decimal(i.tare_per_box)),
            (t("report.field.gross"), fmt_decimal(i.gross_sample_weight)),
            (t("report.field.underweight"), fmt_integer(i.underweight_count)),
            (t("report.field.sample_size"), r.sample_size.to_string()),
        ];

        let results = vec![
            (t("report.field.programmed"), fmt_decimal(r.programmed_weight)),
            (t("report.field.analyzed"), fmt_decimal(r.analyzed_weight)),
            (t("report.field.real"), fmt_decimal(r.real_weight)),
            (
                t("report.field.underweight_ratio"),
                fmt_decimal(r.underweight_sample_ratio * 100.0),
            ),
            (t("report.field.loss_kg"), fmt_decimal(r.loss_kg)),
            (t("report.field.loss_boxes"), fmt_integer(r.loss_boxes)),
            (t("report.field.loss_percent"), fmt_decimal(r.loss_percent)),
        ];

        [identification, measurements, results]
    }
}

pub(crate) fn fmt_decimal(value: f64) -> String {
    format_locale_decimal(value, 2)
}

pub(crate) fn fmt_integer(value: f64) -> String {
    format_locale_decimal(value, 0)
}

pub(crate) fn fmt_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}
