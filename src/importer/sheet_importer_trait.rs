// ==========================================
// CheckPeso - 表格导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 管道: 文件解析 → 字段映射 → 清洗
// 红线: 导入层只产出归一化前的原始行，不核算、不落库
// ==========================================

use crate::domain::import_batch::RowIssue;
use crate::domain::record::RecordMetadata;
use crate::domain::weighing::RawWeighingInput;
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::Path;

// ==========================================
// RawSheetRow - 解析后的原始行
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheetRow {
    pub row_number: usize,              // 原始文件行号（表头为第 1 行）
    pub cells: HashMap<String, String>, // 表头 → 单元格文本
}

// ==========================================
// ImportedRow - 映射后的导入行
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedRow {
    pub row_number: usize,
    pub metadata: RecordMetadata,
    pub input: RawWeighingInput,
}

// ==========================================
// ParsedSheet - 整张表的读取结果
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ParsedSheet {
    pub rows: Vec<ImportedRow>,
    pub issues: Vec<RowIssue>, // 映射阶段被拒绝的行
    pub total_rows: usize,
}

// ==========================================
// SheetImporter Trait
// ==========================================
// 实现者: SheetImporterImpl
#[async_trait]
pub trait SheetImporter: Send + Sync {
    /// 读取 CSV/Excel 文件并映射为导入行
    ///
    /// # 返回
    /// - Ok(ParsedSheet): 成功映射的行 + 被拒绝行的原因
    /// - Err: 文件级错误（不存在、格式不支持、缺少必需列）
    async fn read_sheet(&self, file_path: &Path) -> ImportResult<ParsedSheet>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行
    ///
    /// # 说明
    /// - 表头统一 trim
    /// - 完全空白的行跳过，但行号保持为文件中的真实行号
    fn parse_to_raw_records(&self, file_path: &Path) -> ImportResult<Vec<RawSheetRow>>;
}

// ==========================================
// FieldMapper Trait
// ==========================================
pub trait FieldMapper: Send + Sync {
    /// 原始行 → 导入行
    fn map_row(&self, row: &RawSheetRow, today: NaiveDate) -> ImportResult<ImportedRow>;
}

// ==========================================
// DataCleaner Trait
// ==========================================
pub trait DataCleaner: Send + Sync {
    /// TRIM 并折叠内部连续空白
    fn clean_text(&self, value: &str) -> String;

    /// 空字符串 / "-" / "N/A" 视为缺失
    fn normalize_null(&self, value: Option<String>) -> Option<String>;

    /// 解析日期（DD/MM/AAAA、AAAA-MM-DD、DD-MM-AAAA）
    fn parse_date_br(&self, value: &str) -> Option<NaiveDate>;

    /// 解析本地化小数（委托给 parse_locale_decimal）
    fn parse_decimal(&self, value: &str) -> f64;
}

// ==========================================
// ImportSink Trait
// ==========================================
// 用途: 接收映射后的导入行，完成校验 → 核算 → 落库 → 镜像
// 实现者: api::WeightAuditApi
pub trait ImportSink: Send + Sync {
    /// 处理单行
    ///
    /// # 返回
    /// - Ok(record_id): 已落库
    /// - Err(message): 该行被拒绝（校验失败或落库失败）
    fn accept(&self, row: &ImportedRow, actor: &str) -> Result<String, String>;
}

// ==========================================
// RecordImporter Trait
// ==========================================
// 实现者: WeightAuditImporter
#[async_trait]
pub trait RecordImporter: Send + Sync {
    /// 导入称重表文件
    ///
    /// # 导入流程
    /// 1. 文件读取与解析
    /// 2. 字段映射与清洗
    /// 3. 校验 → 核算 → 落库 → 镜像（逐行，由 ImportSink 完成）
    ///
    /// # 返回
    /// - Ok(ImportSummary): 批次汇总（含被拒绝行明细）
    /// - Err: 文件级错误
    async fn import_file(
        &self,
        file_path: &Path,
        actor: &str,
    ) -> ImportResult<crate::domain::import_batch::ImportSummary>;
}
