// ==========================================
// CheckPeso - 字段映射器实现
// ==========================================
// 职责: 源表头 → 标准字段映射 + 清洗
// 表头匹配: 忽略大小写、重音、括号内单位、空格/连字符差异
// 数值字段保留原始文本，统一在核算边界归一化
// ==========================================

use crate::domain::locale_number::LocaleNumber;
use crate::domain::record::RecordMetadata;
use crate::domain::weighing::RawWeighingInput;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::sheet_importer_trait::{
    DataCleaner as _, FieldMapper as FieldMapperTrait, ImportedRow, RawSheetRow,
};
use chrono::NaiveDate;
use std::collections::HashMap;

/// 标准字段 → 可接受的表头别名（已规范化）
const FIELD_ALIASES: [(&str, &[&str]); 13] = [
    ("fornecedor", &["fornecedor", "supplier"]),
    ("produto", &["produto", "product", "item"]),
    ("nota_fiscal", &["nota_fiscal", "nf", "nfe", "numero_nf", "invoice"]),
    (
        "data_recebimento",
        &["data_recebimento", "data_de_recebimento", "data", "received_on"],
    ),
    ("responsavel", &["responsavel", "conferente", "inspector"]),
    ("observacoes", &["observacoes", "observacao", "obs", "notes"]),
    ("fotos", &["fotos", "foto", "evidencias", "photos"]),
    (
        "quantidade_recebida",
        &["quantidade_recebida", "qtd_recebida", "quantidade", "lot_size"],
    ),
    (
        "peso_liquido_por_caixa",
        &["peso_liquido_por_caixa", "peso_liquido_caixa", "peso_por_caixa", "peso_nominal"],
    ),
    ("tara_caixa", &["tara_caixa", "tara_por_caixa", "tara"]),
    (
        "peso_bruto_analise",
        &["peso_bruto_analise", "peso_bruto_amostra", "peso_bruto"],
    ),
    (
        "quantidade_baixo_peso",
        &["quantidade_baixo_peso", "qtd_baixo_peso", "caixas_baixo_peso"],
    ),
    (
        "quantidade_tabela_manual",
        &["quantidade_tabela_manual", "amostra_manual", "tamanho_amostra"],
    ),
];

/// 导入文件必须包含的列
pub const REQUIRED_COLUMNS: [&str; 4] = [
    "fornecedor",
    "produto",
    "quantidade_recebida",
    "peso_liquido_por_caixa",
];

/// 表头规范化: 小写、去重音、去括号内容、非字母数字折叠为 '_'
pub fn normalize_header(header: &str) -> String {
    let mut out = String::with_capacity(header.len());
    let mut depth = 0usize;
    for ch in header.trim().chars().flat_map(char::to_lowercase) {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ if depth > 0 => {}
            'á' | 'à' | 'â' | 'ã' | 'ä' => out.push('a'),
            'é' | 'è' | 'ê' | 'ë' => out.push('e'),
            'í' | 'ì' | 'î' | 'ï' => out.push('i'),
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => out.push('o'),
            'ú' | 'ù' | 'û' | 'ü' => out.push('u'),
            'ç' => out.push('c'),
            c if c.is_ascii_alphanumeric() => out.push(c),
            _ => {
                if !out.is_empty() && !out.ends_with('_') {
                    out.push('_');
                }
            }
        }
    }
    out.trim_end_matches('_').to_string()
}

/// 规范化表头 → 标准字段
fn canonical_field(header: &str) -> Option<&'static str> {
    let normalized = normalize_header(header);
    FIELD_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&normalized.as_str()))
        .map(|(field, _)| *field)
}

pub struct FieldMapper {
    cleaner: DataCleaner,
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldMapper {
    pub fn new() -> Self {
        Self {
            cleaner: DataCleaner,
        }
    }

    /// 检查表头是否覆盖必需列，返回缺失的列
    pub fn missing_required_columns<'a, I>(&self, headers: I) -> Vec<&'static str>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let present: Vec<&'static str> = headers
            .into_iter()
            .filter_map(|h| canonical_field(h))
            .collect();
        REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|required| !present.contains(required))
            .collect()
    }

    /// 按标准字段重建单元格表（同一字段出现多列时取首个非空值）
    fn canonical_cells(&self, row: &RawSheetRow) -> HashMap<&'static str, String> {
        let mut cells: HashMap<&'static str, String> = HashMap::new();
        for (header, value) in &row.cells {
            if let Some(field) = canonical_field(header) {
                if let Some(cleaned) = self.cleaner.normalize_null(Some(value.clone())) {
                    cells.entry(field).or_insert(cleaned);
                }
            }
        }
        cells
    }

    fn required_text(
        &self,
        cells: &HashMap<&'static str, String>,
        field: &str,
        row_number: usize,
    ) -> ImportResult<String> {
        cells
            .get(field)
            .cloned()
            .ok_or_else(|| ImportError::FieldMappingError {
                row: row_number,
                message: format!("{} 为空", field),
            })
    }

    /// 数值字段: 缺失 → None；不含任何数字 → 映射失败
    fn number(
        &self,
        cells: &HashMap<&'static str, String>,
        field: &str,
        row_number: usize,
    ) -> ImportResult<Option<LocaleNumber>> {
        match cells.get(field) {
            None => Ok(None),
            Some(text) => {
                // 数值解析为宽松前缀解析（"10 kg" → 10），这里只拦截完全无数字的文本
                if text.chars().any(|c| c.is_ascii_digit()) {
                    Ok(Some(LocaleNumber::Text(text.clone())))
                } else {
                    Err(ImportError::FieldMappingError {
                        row: row_number,
                        message: format!("{} 不是数值: {}", field, text),
                    })
                }
            }
        }
    }
}

impl FieldMapperTrait for FieldMapper {
    fn map_row(&self, row: &RawSheetRow, today: NaiveDate) -> ImportResult<ImportedRow> {
        let cells = self.canonical_cells(row);
        let row_number = row.row_number;

        let received_on = match cells.get("data_recebimento") {
            None => today,
            Some(value) => self.cleaner.parse_date_br(value).ok_or_else(|| {
                ImportError::DateFormatError {
                    row: row_number,
                    field: "data_recebimento".to_string(),
                    value: value.clone(),
                }
            })?,
        };

        let metadata = RecordMetadata {
            supplier: self.required_text(&cells, "fornecedor", row_number)?,
            product: self.required_text(&cells, "produto", row_number)?,
            invoice_number: cells.get("nota_fiscal").cloned(),
            received_on,
            inspector: cells.get("responsavel").cloned(),
            notes: cells.get("observacoes").cloned(),
            evidence_photos: cells
                .get("fotos")
                .map(|v| self.cleaner.split_photos(v))
                .unwrap_or_default(),
        };

        let input = RawWeighingInput {
            lot_size: self
                .number(&cells, "quantidade_recebida", row_number)?
                .unwrap_or_default(),
            nominal_weight_per_box: self
                .number(&cells, "peso_liquido_por_caixa", row_number)?
                .unwrap_or_default(),
            tare_per_box: self
                .number(&cells, "tara_caixa", row_number)?
                .unwrap_or_default(),
            gross_sample_weight: self
                .number(&cells, "peso_bruto_analise", row_number)?
                .unwrap_or_default(),
            underweight_count: self
                .number(&cells, "quantidade_baixo_peso", row_number)?
                .unwrap_or_default(),
            sample_size_override: self.number(&cells, "quantidade_tabela_manual", row_number)?,
        };

        Ok(ImportedRow {
            row_number,
            metadata,
            input,
        })
    }
}
