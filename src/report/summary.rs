// ==========================================
// CheckPeso - 报表汇总
// ==========================================
// 只读聚合已持久化的核算结果，不重算
// ==========================================

use crate::domain::locale_number::finite_or_zero;
use crate::domain::record::WeightAuditRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    pub record_count: usize,
    pub total_programmed_kg: f64,
    pub total_real_kg: f64,
    pub total_loss_kg: f64,
    pub total_loss_boxes: f64,
    pub overall_loss_percent: f64, // Σ失重 / Σ应有净重 × 100
    pub worst_record_id: Option<String>,
    pub worst_loss_percent: f64,
}

impl ReportSummary {
    pub fn from_records(records: &[WeightAuditRecord]) -> Self {
        let mut summary = Self {
            record_count: records.len(),
            ..Default::default()
        };

        for record in records {
            let r = &record.result;
            summary.total_programmed_kg += r.programmed_weight;
            summary.total_real_kg += r.real_weight;
            summary.total_loss_kg += r.loss_kg;
            summary.total_loss_boxes += r.loss_boxes;

            // 仅统计有失重的记录；并列时保留先出现者
            if r.loss_percent > summary.worst_loss_percent {
                summary.worst_loss_percent = r.loss_percent;
                summary.worst_record_id = Some(record.id.clone());
            }
        }

        summary.total_programmed_kg = finite_or_zero(summary.total_programmed_kg);
        summary.total_real_kg = finite_or_zero(summary.total_real_kg);
        summary.total_loss_kg = finite_or_zero(summary.total_loss_kg);
        summary.total_loss_boxes = finite_or_zero(summary.total_loss_boxes);
        summary.overall_loss_percent = if summary.total_programmed_kg > 0.0 {
            finite_or_zero(summary.total_loss_kg / summary.total_programmed_kg * 100.0)
        } else {
            0.0
        };

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::RecordMetadata;
    use crate::domain::weighing::{LossResult, WeighingInput};
    use chrono::NaiveDate;

    fn record(id: &str, programmed: f64, loss_kg: f64, loss_boxes: f64) -> WeightAuditRecord {
        let ts = NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(7, 0, 0)
            .unwrap();
        WeightAuditRecord {
            id: id.to_string(),
            metadata: RecordMetadata {
                supplier: "F".to_string(),
                product: "P".to_string(),
                invoice_number: None,
                received_on: ts.date(),
                inspector: None,
                notes: None,
                evidence_photos: vec![],
            },
            input: WeighingInput::default(),
            result: LossResult {
                programmed_weight: programmed,
                real_weight: programmed - loss_kg,
                loss_kg,
                loss_boxes,
                loss_percent: if programmed > 0.0 { loss_kg / programmed * 100.0 } else { 0.0 },
                ..Default::default()
            },
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_summary_totals() {
        let records = vec![
            record("A", 500.0, 5.0, 1.0),
            record("B", 500.0, 20.0, 4.0),
            record("C", 0.0, 0.0, 0.0),
        ];
        let summary = ReportSummary::from_records(&records);

        assert_eq!(summary.record_count, 3);
        assert_eq!(summary.total_programmed_kg, 1000.0);
        assert_eq!(summary.total_real_kg, 975.0);
        assert_eq!(summary.total_loss_kg, 25.0);
        assert_eq!(summary.total_loss_boxes, 5.0);
        assert!((summary.overall_loss_percent - 2.5).abs() < 1e-12);
        assert_eq!(summary.worst_record_id.as_deref(), Some("B"));
    }

    #[test]
    fn test_summary_empty_and_lossless() {
        let summary = ReportSummary::from_records(&[]);
        assert_eq!(summary, ReportSummary::default());

        let summary = ReportSummary::from_records(&[record("A", 100.0, 0.0, 0.0)]);
        assert_eq!(summary.overall_loss_percent, 0.0);
        assert_eq!(summary.worst_record_id, None);
    }
}
