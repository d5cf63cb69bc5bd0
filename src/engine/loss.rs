// ==========================================
// CheckPeso - 失重核算引擎
// ==========================================
// 输入: WeighingInput（已归一化）+ 抽样表
// 输出: LossResult（13 个字段，全部为有限数）
// 红线:
// - 计算顺序固定，后一步依赖前一步
// - 除零一律取 0，不报错
// - 相同输入必须得到逐位相同的输出
// - 引擎不持有任何 I/O 句柄
// ==========================================

use crate::domain::locale_number::finite_or_zero;
use crate::domain::weighing::{LossResult, WeighingInput};
use crate::engine::sampling::SamplingTableResolver;
use tracing::instrument;

/// 按内置 S4 方案核算
pub fn calculate_loss(input: &WeighingInput) -> LossResult {
    LossEngine::new().calculate(input)
}

/// 绝对值四舍五入（.5 远离零），再还原符号
///
/// 与 f64::round 的区别在于只看绝对值的小数部分，且非有限值归零
pub fn round_half_away_from_zero(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let sign = if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    };
    let abs = value.abs();
    let frac = abs % 1.0;
    let rounded = if frac >= 0.5 { abs.ceil() } else { abs.floor() };
    sign * rounded
}

// ==========================================
// LossEngine - 失重核算引擎
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct LossEngine {
    resolver: SamplingTableResolver,
}

impl LossEngine {
    /// 使用内置 S4 抽样表
    pub fn new() -> Self {
        Self {
            resolver: SamplingTableResolver::s4(),
        }
    }

    /// 使用指定抽样表（如配置中的自定义方案）
    pub fn with_resolver(resolver: SamplingTableResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &SamplingTableResolver {
        &self.resolver
    }

    /// 有效样本量: 人工指定 > 0 时优先，否则查抽样表
    pub fn effective_sample_size(&self, input: &WeighingInput) -> u32 {
        match input.sample_size_override {
            Some(n) if n > 0 => n,
            _ => self.resolver.resolve(finite_or_zero(input.lot_size)),
        }
    }

    /// 核算单次抽检
    pub fn calculate(&self, input: &WeighingInput) -> LossResult {
        let q = finite_or_zero(input.lot_size);
        let w = finite_or_zero(input.nominal_weight_per_box);
        let t = finite_or_zero(input.tare_per_box);
        let g = finite_or_zero(input.gross_sample_weight);
        let u = finite_or_zero(input.underweight_count);
        let s = self.effective_sample_size(input);

        // 1. 整批应有净重
        let programmed_weight = finite_or_zero(q * w);
        // 2. 低重箱皮重合计
        let total_tare = finite_or_zero(u * t);
        // 3. 低重箱理想净重
        let ideal_sample_weight = finite_or_zero(u * w);
        // 4. 低重箱实际净重
        let analyzed_weight = finite_or_zero(g - total_tare);
        // 5. 实际与理想之差（带符号）
        let real_analyzed_weight_delta = finite_or_zero(analyzed_weight - ideal_sample_weight);
        // 6. 低重箱平均净重
        let avg_underweight_per_box = if u > 0.0 {
            finite_or_zero(analyzed_weight / u)
        } else {
            0.0
        };
        // 7. 样本低重比例
        let underweight_sample_ratio = if s > 0 {
            finite_or_zero(u / f64::from(s))
        } else {
            0.0
        };
        // 8. 外推到整批的低重箱数
        let avg_underweight_boxes_in_lot = finite_or_zero(underweight_sample_ratio * q);
        // 9. 每箱平均短缺（用毛重/箱数，不与第 6 步合并）
        let avg_underweight_per_box_final = if u > 0.0 {
            finite_or_zero(((g / u) - w) * -1.0)
        } else {
            0.0
        };
        // 10. 整批实际净重
        let real_weight = finite_or_zero(
            programmed_weight - (avg_underweight_per_box_final * avg_underweight_boxes_in_lot),
        );
        // 11. 失重 (kg)
        let loss_kg = finite_or_zero(avg_underweight_per_box_final * avg_underweight_boxes_in_lot);
        // 12. 失重 (箱)
        let loss_boxes = if w > 0.0 {
            round_half_away_from_zero(loss_kg / w)
        } else {
            0.0
        };
        // 13. 失重百分比
        let loss_percent = if programmed_weight > 0.0 {
            finite_or_zero((loss_kg / programmed_weight) * 100.0)
        } else {
            0.0
        };

        LossResult {
            sample_size: s,
            programmed_weight,
            ideal_sample_weight,
            analyzed_weight,
            real_analyzed_weight_delta,
            avg_underweight_per_box,
            underweight_sample_ratio,
            avg_underweight_boxes_in_lot,
            avg_underweight_per_box_final,
            real_weight,
            loss_kg,
            loss_boxes,
            loss_percent,
        }
    }

    /// 批量核算（导入/批处理脚本用）
    #[instrument(level = "debug", skip(self, inputs), fields(count = inputs.len(), plan = %self.resolver.plan_id()))]
    pub fn calculate_batch(&self, inputs: &[WeighingInput]) -> Vec<LossResult> {
        inputs.iter().map(|input| self.calculate(input)).collect()
    }
}
