// ==========================================
// CheckPeso - 文本报表（WhatsApp / 邮件）
// ==========================================

use crate::domain::record::WeightAuditRecord;
use crate::report::{fmt_date, ReportRenderer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
}

impl ReportRenderer {
    /// WhatsApp 文本（*粗体* 标题）
    pub fn render_whatsapp(&self, record: &WeightAuditRecord) -> String {
        let mut lines = vec![format!("*{}*", self.t("report.title"))];
        if let Some(company) = self.company_name() {
            lines.push(format!("_{}_", company));
        }

        for section in self.record_sections(record) {
            lines.push(String::new());
            for (label, value) in section {
                lines.push(format!("*{}:* {}", label, value));
            }
        }

        lines.push(String::new());
        lines.push(format!("*{}*", self.status_label(record)));

        if let Some(notes) = &record.metadata.notes {
            lines.push(format!("{}: {}", self.t("report.field.notes"), notes));
        }
        if !record.metadata.evidence_photos.is_empty() {
            let count = record.metadata.evidence_photos.len().to_string();
            lines.push(self.t_with_args("report.photos_count", &[("count", &count)]));
        }

        lines.join("\n")
    }

    /// 邮件（纯文本正文）
    pub fn render_email(&self, record: &WeightAuditRecord) -> EmailMessage {
        let m = &record.metadata;
        let subject = self.t_with_args(
            "report.email.subject",
            &[
                ("supplier", &m.supplier),
                ("product", &m.product),
                ("date", &fmt_date(m.received_on)),
            ],
        );

        let mut lines = vec![
            self.t("report.email.greeting"),
            String::new(),
            self.t("report.email.intro"),
        ];

        for section in self.record_sections(record) {
            lines.push(String::new());
            for (label, value) in section {
                lines.push(format!("{}: {}", label, value));
            }
        }

        lines.push(String::new());
        lines.push(format!("{}: {}", self.t("report.status"), self.status_label(record)));
        if let Some(notes) = &m.notes {
            lines.push(format!("{}: {}", self.t("report.field.notes"), notes));
        }
        if !m.evidence_photos.is_empty() {
            let count = m.evidence_photos.len().to_string();
            lines.push(self.t_with_args("report.photos_count", &[("count", &count)]));
            for photo in &m.evidence_photos {
                lines.push(format!("- {}", photo));
            }
        }

        lines.push(String::new());
        lines.push(self.t("report.email.closing"));
        if let Some(company) = self.company_name() {
            lines.push(company.to_string());
        }

        EmailMessage {
            subject,
            body: lines.join("\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::test_support::lossy_record;

    #[test]
    fn test_render_whatsapp() {
        let text = ReportRenderer::new(Some("Mercado Bom Preço".to_string()))
            .render_whatsapp(&lossy_record());

        assert!(text.starts_with("*Relatório de Conferência de Peso*\n_Mercado Bom Preço_"));
        assert!(text.contains("*Fornecedor:* Frigorífico <Sul>"));
        assert!(text.contains("*Data de recebimento:* 15/03/2026"));
        assert!(text.contains("*Perda (kg):* 6,25"));
        assert!(text.contains("*Peso líquido real (kg):* 493,75"));
        assert!(text.contains("*Perda (cx):* 1"));
        assert!(text.contains("*PERDA IDENTIFICADA*"));
        assert!(text.contains("2 foto(s) anexada(s)"));
    }

    #[test]
    fn test_render_email() {
        let email = ReportRenderer::default().render_email(&lossy_record());
        assert_eq!(
            email.subject,
            "Conferência de peso - Frigorífico <Sul> - Coxa & Sobrecoxa - 15/03/2026"
        );
        assert!(email.body.starts_with("Prezados,"));
        assert!(email.body.contains("Perda (%): 1,25"));
        assert!(email.body.contains("- f2.jpg"));
        assert!(email.body.ends_with("Atenciosamente,"));
    }

    #[test]
    fn test_render_whatsapp_english() {
        let text = ReportRenderer::default()
            .with_locale("en")
            .render_whatsapp(&lossy_record());

        assert!(text.contains("*Supplier:* Frigorífico <Sul>"));
        assert!(text.contains("*LOSS DETECTED*"));
    }

    #[test]
    fn test_unknown_locale_falls_back() {
        let renderer = ReportRenderer::default().with_locale("fr");
        assert_eq!(renderer.locale(), "pt-BR");
        assert!(renderer
            .render_whatsapp(&lossy_record())
            .contains("*PERDA IDENTIFICADA*"));
    }
}
