// ==========================================
// CheckPeso - 称重表单校验器
// ==========================================
// 职责: 保存前的表单规则校验（预览不校验）
// 规则: 一次收集全部违规，不在首个违规处返回
// ==========================================

use crate::api::error::{ApiError, ApiResult, ValidationViolation};
use crate::domain::locale_number::LocaleNumber;
use crate::domain::record::RecordMetadata;
use crate::domain::weighing::{RawWeighingInput, WeighingInput};
use crate::engine::loss::LossEngine;
use serde_json::json;

fn violation(
    violation_type: &str,
    field: &str,
    reason: impl Into<String>,
    details: Option<serde_json::Value>,
) -> ValidationViolation {
    ValidationViolation {
        violation_type: violation_type.to_string(),
        field: field.to_string(),
        reason: reason.into(),
        details,
    }
}

fn is_integer(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0
}

/// 人工样本量是否填写（空文本视为未填写）
fn override_present(raw: &Option<LocaleNumber>) -> bool {
    match raw {
        None => false,
        Some(LocaleNumber::Number(_)) => true,
        Some(LocaleNumber::Text(s)) => !s.trim().is_empty(),
    }
}

/// 校验称重表单并返回归一化输入
///
/// # 规则
/// - 供应商、产品非空
/// - 收货数量为整数且 >= 1
/// - 每箱净重 > 0；皮重 >= 0；毛重 >= 0
/// - 低重箱数为整数，>= 0 且不超过有效样本量
/// - 人工样本量（如填写）为整数且 >= 1
pub fn validate_weighing_input(
    metadata: &RecordMetadata,
    raw: &RawWeighingInput,
    engine: &LossEngine,
) -> ApiResult<WeighingInput> {
    let input = raw.normalize();
    let mut violations = Vec::new();

    if metadata.supplier.trim().is_empty() {
        violations.push(violation("REQUIRED", "fornecedor", "供应商不能为空", None));
    }
    if metadata.product.trim().is_empty() {
        violations.push(violation("REQUIRED", "produto", "产品不能为空", None));
    }

    if input.lot_size < 1.0 {
        violations.push(violation(
            "OUT_OF_RANGE",
            "quantidade_recebida",
            "收货数量必须 >= 1",
            Some(json!({ "value": input.lot_size })),
        ));
    } else if !is_integer(input.lot_size) {
        violations.push(violation(
            "NOT_INTEGER",
            "quantidade_recebida",
            "收货数量必须为整数",
            Some(json!({ "value": input.lot_size })),
        ));
    }

    if input.nominal_weight_per_box <= 0.0 {
        violations.push(violation(
            "OUT_OF_RANGE",
            "peso_liquido_por_caixa",
            "每箱净重必须 > 0",
            Some(json!({ "value": input.nominal_weight_per_box })),
        ));
    }
    if input.tare_per_box < 0.0 {
        violations.push(violation(
            "OUT_OF_RANGE",
            "tara_caixa",
            "皮重不能为负",
            Some(json!({ "value": input.tare_per_box })),
        ));
    }
    if input.gross_sample_weight < 0.0 {
        violations.push(violation(
            "OUT_OF_RANGE",
            "peso_bruto_analise",
            "毛重不能为负",
            Some(json!({ "value": input.gross_sample_weight })),
        ));
    }

    if override_present(&raw.sample_size_override) {
        let value = raw
            .sample_size_override
            .as_ref()
            .map(LocaleNumber::value)
            .unwrap_or_default();
        if !is_integer(value) || value < 1.0 {
            violations.push(violation(
                "OUT_OF_RANGE",
                "quantidade_tabela_manual",
                "人工样本量必须为 >= 1 的整数",
                Some(json!({ "value": value })),
            ));
        }
    }

    let sample_size = engine.effective_sample_size(&input);
    if input.underweight_count < 0.0 {
        violations.push(violation(
            "OUT_OF_RANGE",
            "quantidade_baixo_peso",
            "低重箱数不能为负",
            Some(json!({ "value": input.underweight_count })),
        ));
    } else if !is_integer(input.underweight_count) {
        violations.push(violation(
            "NOT_INTEGER",
            "quantidade_baixo_peso",
            "低重箱数必须为整数",
            Some(json!({ "value": input.underweight_count })),
        ));
    } else if input.underweight_count > f64::from(sample_size) {
        violations.push(violation(
            "EXCEEDS_SAMPLE",
            "quantidade_baixo_peso",
            format!("低重箱数不能超过样本量 {}", sample_size),
            Some(json!({ "value": input.underweight_count, "sample_size": sample_size })),
        ));
    }

    if violations.is_empty() {
        Ok(input)
    } else {
        Err(ApiError::ValidationFailed {
            reason: format!("{} 项不合规", violations.len()),
            violations,
        })
    }
}
