// ==========================================
// CheckPeso - 导入层
// ==========================================
// 职责: 读取外部 CSV/Excel 称重表，产出待核算的导入行
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod record_importer;
pub mod sheet_importer;
pub mod sheet_importer_trait;

// 重导出核心类型
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper as FieldMapperImpl;
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use record_importer::WeightAuditImporter;
pub use sheet_importer::SheetImporterImpl;

// 重导出 Trait 接口
pub use sheet_importer_trait::{
    DataCleaner, FieldMapper, FileParser, ImportSink, ImportedRow, ParsedSheet, RawSheetRow,
    RecordImporter, SheetImporter,
};
