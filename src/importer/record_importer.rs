// ==========================================
// CheckPeso - 称重记录导入器
// ==========================================
// 流程: 读表（SheetImporter）→ 逐行交给 ImportSink → 汇总
// 红线: 行级失败只进入 issues，不中断整批
// ==========================================

use crate::domain::import_batch::{ImportSummary, RowIssue};
use crate::importer::error::ImportResult;
use crate::importer::sheet_importer::SheetImporterImpl;
use crate::importer::sheet_importer_trait::{ImportSink, RecordImporter, SheetImporter};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

// ==========================================
// WeightAuditImporter
// ==========================================
pub struct WeightAuditImporter<S>
where
    S: ImportSink,
{
    sheet_importer: Box<dyn SheetImporter>,
    sink: Arc<S>,
}

impl<S> WeightAuditImporter<S>
where
    S: ImportSink,
{
    pub fn new(sink: Arc<S>) -> Self {
        Self::with_sheet_importer(Box::new(SheetImporterImpl::default()), sink)
    }

    pub fn with_sheet_importer(sheet_importer: Box<dyn SheetImporter>, sink: Arc<S>) -> Self {
        Self {
            sheet_importer,
            sink,
        }
    }
}

#[async_trait]
impl<S> RecordImporter for WeightAuditImporter<S>
where
    S: ImportSink + 'static,
{
    #[instrument(skip(self, file_path), fields(batch_id))]
    async fn import_file(&self, file_path: &Path, actor: &str) -> ImportResult<ImportSummary> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());

        info!(file = %file_path.display(), "开始导入称重表");

        let sheet = self.sheet_importer.read_sheet(file_path).await?;
        let mut issues = sheet.issues;
        let mut imported = 0usize;

        for row in &sheet.rows {
            match self.sink.accept(row, actor) {
                Ok(record_id) => {
                    imported += 1;
                    tracing::debug!(row = row.row_number, record_id = %record_id, "行已导入");
                }
                Err(message) => {
                    warn!(row = row.row_number, reason = %message, "行被拒绝");
                    issues.push(RowIssue::new(row.row_number, message));
                }
            }
        }

        issues.sort_by_key(|issue| issue.row);

        let summary = ImportSummary {
            batch_id,
            total_rows: sheet.total_rows,
            imported,
            rejected: issues.len(),
            issues,
            elapsed_ms: start_time.elapsed().as_millis() as u64,
        };

        info!(
            total = summary.total_rows,
            imported = summary.imported,
            rejected = summary.rejected,
            elapsed_ms = summary.elapsed_ms,
            "称重表导入完成"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::sheet_importer_trait::ImportedRow;
    use std::io::Write;
    use std::sync::Mutex;

    /// 只接受批量 >= 10 的行
    #[derive(Default)]
    struct RecordingSink {
        accepted: Mutex<Vec<usize>>,
    }

    impl ImportSink for RecordingSink {
        fn accept(&self, row: &ImportedRow, _actor: &str) -> Result<String, String> {
            if row.input.normalize().lot_size < 10.0 {
                return Err("quantidade_recebida < 10".to_string());
            }
            self.accepted.lock().unwrap().push(row.row_number);
            Ok(format!("R{}", row.row_number))
        }
    }

    #[tokio::test]
    async fn test_import_file_summary() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(
            file,
            "fornecedor,produto,quantidade_recebida,peso_liquido_por_caixa\n\
             A,P,100,5\n\
             ,P,100,5\n\
             B,P,3,5\n\
             C,P,20,5\n"
        )
        .unwrap();

        let sink = Arc::new(RecordingSink::default());
        let importer = WeightAuditImporter::new(Arc::clone(&sink));
        let summary = importer.import_file(file.path(), "tester").await.unwrap();

        assert_eq!(summary.total_rows, 4);
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.rejected, 2);
        assert_eq!(
            summary.issues.iter().map(|i| i.row).collect::<Vec<_>>(),
            vec![3, 4]
        );
        assert_eq!(*sink.accepted.lock().unwrap(), vec![2, 5]);
        assert!(!summary.batch_id.is_empty());
    }
}
