// ==========================================
// CheckPeso - 称重核查记录
// ==========================================
// 一条记录 = 收货元信息 + 原始称重输入 + 核算结果
// 核算结果在边界处计算一次，随记录持久化，报表/导出只读
// ==========================================

use crate::domain::weighing::{LossResult, WeighingInput};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// RecordMetadata - 收货元信息
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    #[serde(rename = "fornecedor")]
    pub supplier: String,
    #[serde(rename = "produto")]
    pub product: String,
    #[serde(rename = "nota_fiscal", default)]
    pub invoice_number: Option<String>,
    #[serde(rename = "data_recebimento")]
    pub received_on: NaiveDate,
    #[serde(rename = "responsavel", default)]
    pub inspector: Option<String>,
    #[serde(rename = "observacoes", default)]
    pub notes: Option<String>,
    #[serde(rename = "fotos", default)]
    pub evidence_photos: Vec<String>, // 照片证据的存储地址
}

// ==========================================
// WeightAuditRecord - 持久化记录（扁平结构）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightAuditRecord {
    pub id: String,
    #[serde(flatten)]
    pub metadata: RecordMetadata,
    #[serde(flatten)]
    pub input: WeighingInput,
    #[serde(flatten)]
    pub result: LossResult,
    #[serde(rename = "criado_em")]
    pub created_at: NaiveDateTime,
    #[serde(rename = "atualizado_em")]
    pub updated_at: NaiveDateTime,
}

impl WeightAuditRecord {
    /// 表格镜像/导出使用的列顺序
    pub const FLAT_COLUMNS: [&'static str; 30] = [
        "id",
        "fornecedor",
        "produto",
        "nota_fiscal",
        "data_recebimento",
        "responsavel",
        "observacoes",
        "fotos",
        "quantidade_recebida",
        "peso_liquido_por_caixa",
        "tara_caixa",
        "peso_bruto_analise",
        "quantidade_baixo_peso",
        "quantidade_tabela_manual",
        "quantidade_tabela",
        "peso_liquido_programado",
        "peso_liquido_ideal_analise",
        "peso_liquido_analise",
        "peso_liquido_real_analise",
        "media_baixo_peso_por_caixa",
        "percentual_qtd_caixas_com_baixo_peso",
        "media_qtd_caixas_com_baixo_peso",
        "media_baixo_peso_por_cx",
        "peso_liquido_real",
        "perda_kg",
        "perda_cx",
        "perda_percentual",
        "criado_em",
        "atualizado_em",
        "status_perda",
    ];

    /// 按 FLAT_COLUMNS 顺序输出一行；数值用 `format_number` 渲染
    pub fn flat_row<F>(&self, format_number: F) -> Vec<String>
    where
        F: Fn(f64) -> String,
    {
        let m = &self.metadata;
        let i = &self.input;
        let mut row = vec![
            self.id.clone(),
            m.supplier.clone(),
            m.product.clone(),
            m.invoice_number.clone().unwrap_or_default(),
            m.received_on.format("%Y-%m-%d").to_string(),
            m.inspector.clone().unwrap_or_default(),
            m.notes.clone().unwrap_or_default(),
            m.evidence_photos.join(" | "),
            format_number(i.lot_size),
            format_number(i.nominal_weight_per_box),
            format_number(i.tare_per_box),
            format_number(i.gross_sample_weight),
            format_number(i.underweight_count),
            i.sample_size_override
                .map(|n| n.to_string())
                .unwrap_or_default(),
        ];
        row.extend(
            self.result
                .named_values()
                .iter()
                .map(|(name, value)| match *name {
                    "quantidade_tabela" => self.result.sample_size.to_string(),
                    _ => format_number(*value),
                }),
        );
        row.push(self.created_at.format("%Y-%m-%d %H:%M:%S").to_string());
        row.push(self.updated_at.format("%Y-%m-%d %H:%M:%S").to_string());
        row.push(if self.result.has_loss() { "PERDA" } else { "OK" }.to_string());
        row
    }
}

// ==========================================
// RecordFilter - 记录查询条件
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub supplier: Option<String>, // 模糊匹配
    pub product: Option<String>,  // 模糊匹配
    pub received_from: Option<NaiveDate>,
    pub received_to: Option<NaiveDate>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self {
            supplier: None,
            product: None,
            received_from: None,
            received_to: None,
            limit: 100,
            offset: 0,
        }
    }
}
