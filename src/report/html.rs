// ==========================================
// CheckPeso - HTML 报表
// ==========================================
// 输出完整 HTML 文档（表格 + 汇总），可直接打印为 PDF
// 红线: 所有用户输入必须转义
// ==========================================

use crate::domain::record::WeightAuditRecord;
use crate::report::summary::ReportSummary;
use crate::report::{fmt_date, fmt_decimal, fmt_integer, ReportRenderer};

/// HTML 转义（文本与属性值通用）
pub fn escape_html(value: &str) -> String {
    html_escape::encode_safe(value).into_owned()
}

const TABLE_COLUMNS: [&str; 10] = [
    "report.field.received_on",
    "report.field.supplier",
    "report.field.product",
    "report.field.invoice",
    "report.field.lot_size",
    "report.field.sample_size",
    "report.field.programmed",
    "report.field.real",
    "report.field.loss_kg",
    "report.field.loss_percent",
];

fn table_row(record: &WeightAuditRecord) -> Vec<String> {
    let m = &record.metadata;
    let r = &record.result;
    vec![
        fmt_date(m.received_on),
        m.supplier.clone(),
        m.product.clone(),
        m.invoice_number.clone().unwrap_or_default(),
        fmt_integer(record.input.lot_size),
        r.sample_size.to_string(),
        fmt_decimal(r.programmed_weight),
        fmt_decimal(r.real_weight),
        fmt_decimal(r.loss_kg),
        fmt_decimal(r.loss_percent),
    ]
}

impl ReportRenderer {
    /// 多条记录的 HTML 报表
    pub fn render_html(&self, records: &[WeightAuditRecord], summary: &ReportSummary) -> String {
        let title = escape_html(&self.t("report.title"));
        let mut html = String::new();

        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!("<title>{}</title>\n", title));
        html.push_str(
            "<style>table{border-collapse:collapse}th,td{border:1px solid #999;padding:4px 8px}\
             td.num{text-align:right}tr.loss td{color:#b00020}</style>\n",
        );
        html.push_str("</head>\n<body>\n");
        html.push_str(&format!("<h1>{}</h1>\n", title));
        if let Some(company) = self.company_name() {
            html.push_str(&format!("<h2>{}</h2>\n", escape_html(company)));
        }

        if records.is_empty() {
            html.push_str(&format!("<p>{}</p>\n", escape_html(&self.t("report.empty"))));
        } else {
            html.push_str("<table>\n<thead><tr>");
            for key in TABLE_COLUMNS {
                html.push_str(&format!("<th>{}</th>", escape_html(&self.t(key))));
            }
            html.push_str(&format!("<th>{}</th>", escape_html(&self.t("report.status"))));
            html.push_str("</tr></thead>\n<tbody>\n");

            for record in records {
                let class = if record.result.has_loss() { " class=\"loss\"" } else { "" };
                html.push_str(&format!("<tr{}>", class));
                for (idx, cell) in table_row(record).iter().enumerate() {
                    // 前四列为文本，其余为数值
                    if idx >= 4 {
                        html.push_str(&format!("<td class=\"num\">{}</td>", escape_html(cell)));
                    } else {
                        html.push_str(&format!("<td>{}</td>", escape_html(cell)));
                    }
                }
                html.push_str(&format!("<td>{}</td>", escape_html(&self.status_label(record))));
                html.push_str("</tr>\n");
            }
            html.push_str("</tbody>\n</table>\n");
        }

        html.push_str(&self.summary_block(summary));

        let generated = chrono::Local::now().format("%d/%m/%Y %H:%M").to_string();
        html.push_str(&format!(
            "<p><small>{}</small></p>\n",
            escape_html(&self.t_with_args("report.generated_at", &[("ts", &generated)]))
        ));
        html.push_str("</body>\n</html>\n");
        html
    }

    fn summary_block(&self, summary: &ReportSummary) -> String {
        let mut rows = vec![
            (self.t("report.summary.records"), summary.record_count.to_string()),
            (
                self.t("report.summary.total_programmed"),
                fmt_decimal(summary.total_programmed_kg),
            ),
            (self.t("report.summary.total_real"), fmt_decimal(summary.total_real_kg)),
            (self.t("report.summary.total_loss_kg"), fmt_decimal(summary.total_loss_kg)),
            (
                self.t("report.summary.total_loss_boxes"),
                fmt_integer(summary.total_loss_boxes),
            ),
            (
                self.t("report.summary.overall_loss_percent"),
                fmt_decimal(summary.overall_loss_percent),
            ),
        ];
        if let Some(id) = &summary.worst_record_id {
            rows.push((
                self.t("report.summary.worst_record"),
                format!("{} ({} %)", id, fmt_decimal(summary.worst_loss_percent)),
            ));
        }

        let mut out = format!("<h3>{}</h3>\n<dl>\n", escape_html(&self.t("report.summary.title")));
        for (label, value) in rows {
            out.push_str(&format!(
                "<dt>{}</dt><dd>{}</dd>\n",
                escape_html(&label),
                escape_html(&value)
            ));
        }
        out.push_str("</dl>\n");
        out
    }
}
