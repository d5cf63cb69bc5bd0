// ==========================================
// CheckPeso - 表格导入器实现
// ==========================================
// 流程: 解析（阻塞线程池）→ 必需列检查 → 逐行映射
// 红线: 单行映射失败记为 RowIssue，不中断整表
// ==========================================

use crate::domain::import_batch::RowIssue;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::sheet_importer_trait::{
    FieldMapper as FieldMapperTrait, FileParser, ParsedSheet, SheetImporter,
};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

// ==========================================
// SheetImporterImpl - 表格导入器
// ==========================================
pub struct SheetImporterImpl {
    file_parser: Arc<dyn FileParser>,
    field_mapper: FieldMapper,
}

impl Default for SheetImporterImpl {
    fn default() -> Self {
        Self::new(Arc::new(UniversalFileParser))
    }
}

impl SheetImporterImpl {
    pub fn new(file_parser: Arc<dyn FileParser>) -> Self {
        Self {
            file_parser,
            field_mapper: FieldMapper::new(),
        }
    }
}

#[async_trait]
impl SheetImporter for SheetImporterImpl {
    #[instrument(skip(self, file_path), fields(file = %file_path.display()))]
    async fn read_sheet(&self, file_path: &Path) -> ImportResult<ParsedSheet> {
        // 文件解析为同步 I/O，放到阻塞线程池
        let parser = Arc::clone(&self.file_parser);
        let path = file_path.to_path_buf();
        let raw_rows = tokio::task::spawn_blocking(move || parser.parse_to_raw_records(&path))
            .await
            .map_err(|e| ImportError::InternalError(format!("解析任务失败: {}", e)))??;

        let Some(first) = raw_rows.first() else {
            info!("文件无数据行");
            return Ok(ParsedSheet::default());
        };

        let missing = self.field_mapper.missing_required_columns(first.cells.keys());
        if !missing.is_empty() {
            return Err(ImportError::MissingColumn(missing.join(", ")));
        }

        let today = chrono::Local::now().date_naive();
        let mut sheet = ParsedSheet {
            total_rows: raw_rows.len(),
            ..Default::default()
        };

        for raw in &raw_rows {
            match self.field_mapper.map_row(raw, today) {
                Ok(row) => sheet.rows.push(row),
                Err(e) => {
                    debug!(row = raw.row_number, error = %e, "行映射失败");
                    sheet.issues.push(RowIssue::new(raw.row_number, e.to_string()));
                }
            }
        }

        info!(
            total = sheet.total_rows,
            mapped = sheet.rows.len(),
            rejected = sheet.issues.len(),
            "表格读取完成"
        );
        Ok(sheet)
    }
}
