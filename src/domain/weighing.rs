// ==========================================
// CheckPeso - 称重输入与失重结果
// ==========================================
// WeighingInput: 一次抽检的原始测量值（已归一化为数字）
// RawWeighingInput: 表单/导入边界上的原始值（数字或本地化字符串）
// LossResult: 失重核算结果，原样持久化，下游只读不重算
// 序列化字段名: 与既有报表/导出层一致的葡语 snake_case
// ==========================================

use crate::domain::locale_number::LocaleNumber;
use serde::{Deserialize, Serialize};

// ==========================================
// WeighingInput - 归一化后的称重输入
// ==========================================
// 数量类字段保留 f64: 引擎需容忍输入过程中的非法中间态（负数/小数）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WeighingInput {
    #[serde(rename = "quantidade_recebida")]
    pub lot_size: f64, // Q 收货箱数
    #[serde(rename = "peso_liquido_por_caixa")]
    pub nominal_weight_per_box: f64, // W 每箱标称净重 (kg)
    #[serde(rename = "tara_caixa")]
    pub tare_per_box: f64, // T 每箱皮重 (kg)
    #[serde(rename = "peso_bruto_analise")]
    pub gross_sample_weight: f64, // G 低重箱的毛重合计 (kg)
    #[serde(rename = "quantidade_baixo_peso")]
    pub underweight_count: f64, // U 样本中低重箱数
    #[serde(rename = "quantidade_tabela_manual", default)]
    pub sample_size_override: Option<u32>, // 人工指定样本量（优先于抽样表）
}

// ==========================================
// RawWeighingInput - 边界原始输入
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawWeighingInput {
    #[serde(rename = "quantidade_recebida", default)]
    pub lot_size: LocaleNumber,
    #[serde(rename = "peso_liquido_por_caixa", default)]
    pub nominal_weight_per_box: LocaleNumber,
    #[serde(rename = "tara_caixa", default)]
    pub tare_per_box: LocaleNumber,
    #[serde(rename = "peso_bruto_analise", default)]
    pub gross_sample_weight: LocaleNumber,
    #[serde(rename = "quantidade_baixo_peso", default)]
    pub underweight_count: LocaleNumber,
    #[serde(rename = "quantidade_tabela_manual", default)]
    pub sample_size_override: Option<LocaleNumber>,
}

impl RawWeighingInput {
    /// 在系统边界统一做一次数值归一化
    ///
    /// 人工样本量四舍五入取整，结果 < 1 视为未指定
    pub fn normalize(&self) -> WeighingInput {
        let sample_size_override = self.sample_size_override.as_ref().and_then(|raw| {
            let rounded = raw.value().round();
            if rounded >= 1.0 {
                Some(rounded.min(u32::MAX as f64) as u32)
            } else {
                None
            }
        });

        WeighingInput {
            lot_size: self.lot_size.value(),
            nominal_weight_per_box: self.nominal_weight_per_box.value(),
            tare_per_box: self.tare_per_box.value(),
            gross_sample_weight: self.gross_sample_weight.value(),
            underweight_count: self.underweight_count.value(),
            sample_size_override,
        }
    }
}

impl From<WeighingInput> for RawWeighingInput {
    fn from(input: WeighingInput) -> Self {
        Self {
            lot_size: input.lot_size.into(),
            nominal_weight_per_box: input.nominal_weight_per_box.into(),
            tare_per_box: input.tare_per_box.into(),
            gross_sample_weight: input.gross_sample_weight.into(),
            underweight_count: input.underweight_count.into(),
            sample_size_override: input
                .sample_size_override
                .map(|n| LocaleNumber::Number(f64::from(n))),
        }
    }
}

// ==========================================
// LossResult - 失重核算结果
// ==========================================
// 红线: 所有字段均为有限数；除零一律取 0
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LossResult {
    #[serde(rename = "quantidade_tabela")]
    pub sample_size: u32, // S 样本量
    #[serde(rename = "peso_liquido_programado")]
    pub programmed_weight: f64, // Q*W
    #[serde(rename = "peso_liquido_ideal_analise")]
    pub ideal_sample_weight: f64, // U*W
    #[serde(rename = "peso_liquido_analise")]
    pub analyzed_weight: f64, // G - U*T
    #[serde(rename = "peso_liquido_real_analise")]
    pub real_analyzed_weight_delta: f64,
    #[serde(rename = "media_baixo_peso_por_caixa")]
    pub avg_underweight_per_box: f64,
    #[serde(rename = "percentual_qtd_caixas_com_baixo_peso")]
    pub underweight_sample_ratio: f64, // 比例，不是百分数
    #[serde(rename = "media_qtd_caixas_com_baixo_peso")]
    pub avg_underweight_boxes_in_lot: f64,
    #[serde(rename = "media_baixo_peso_por_cx")]
    pub avg_underweight_per_box_final: f64,
    #[serde(rename = "peso_liquido_real")]
    pub real_weight: f64,
    #[serde(rename = "perda_kg")]
    pub loss_kg: f64,
    #[serde(rename = "perda_cx")]
    pub loss_boxes: f64, // 整数值，按“绝对值四舍五入再还原符号”取整
    #[serde(rename = "perda_percentual")]
    pub loss_percent: f64,
}

impl LossResult {
    /// 按持久化字段名列出全部数值（样本量转为 f64）
    pub fn named_values(&self) -> [(&'static str, f64); 13] {
        [
            ("quantidade_tabela", f64::from(self.sample_size)),
            ("peso_liquido_programado", self.programmed_weight),
            ("peso_liquido_ideal_analise", self.ideal_sample_weight),
            ("peso_liquido_analise", self.analyzed_weight),
            ("peso_liquido_real_analise", self.real_analyzed_weight_delta),
            ("media_baixo_peso_por_caixa", self.avg_underweight_per_box),
            (
                "percentual_qtd_caixas_com_baixo_peso",
                self.underweight_sample_ratio,
            ),
            (
                "media_qtd_caixas_com_baixo_peso",
                self.avg_underweight_boxes_in_lot,
            ),
            ("media_baixo_peso_por_cx", self.avg_underweight_per_box_final),
            ("peso_liquido_real", self.real_weight),
            ("perda_kg", self.loss_kg),
            ("perda_cx", self.loss_boxes),
            ("perda_percentual", self.loss_percent),
        ]
    }

    pub fn is_all_finite(&self) -> bool {
        self.named_values().iter().all(|(_, v)| v.is_finite())
    }

    pub fn has_loss(&self) -> bool {
        self.loss_kg > 0.0
    }
}
