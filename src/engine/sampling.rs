// ==========================================
// CheckPeso - 抽样表解析器
// ==========================================
// 职责: 批量（收货数量）→ 样本量
// 输入: 任意实数（可能是未经校验的表单值）
// 输出: 非负整数；0 表示“数据不足，无法抽样”
// 红线: 不抛错、无副作用
// ==========================================

use crate::domain::sampling::{validate_sampling_ranges, SamplingRange, S4_PLAN_ID, S4_RANGES};
use crate::i18n::t_with_args;
use std::borrow::Cow;

/// 按内置 S4 方案解析样本量
pub fn resolve_sample_size(lot_size: f64) -> u32 {
    SamplingTableResolver::s4().resolve(lot_size)
}

// ==========================================
// SamplingTableResolver - 抽样表解析器
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingTableResolver {
    plan_id: String,
    ranges: Cow<'static, [SamplingRange]>,
}

impl SamplingTableResolver {
    /// 内置 S4 方案
    pub fn s4() -> Self {
        Self {
            plan_id: S4_PLAN_ID.to_string(),
            ranges: Cow::Borrowed(&S4_RANGES),
        }
    }

    /// 自定义方案（区间必须构成 [2, ∞) 的有效划分）
    pub fn from_ranges(plan_id: &str, ranges: Vec<SamplingRange>) -> Result<Self, String> {
        validate_sampling_ranges(&ranges)?;
        Ok(Self {
            plan_id: plan_id.to_string(),
            ranges: Cow::Owned(ranges),
        })
    }

    pub fn plan_id(&self) -> &str {
        &self.plan_id
    }

    pub fn ranges(&self) -> &[SamplingRange] {
        &self.ranges
    }

    /// 解析样本量
    ///
    /// 规则:
    /// 1) 非有限数或 <= 0 → 0
    /// 2) == 1 → 1（单箱批次）
    /// 3) 命中区间 → 该区间样本量
    /// 4) 未命中（如 8.5 落在两个区间之间）→ 0
    pub fn resolve(&self, lot_size: f64) -> u32 {
        if !lot_size.is_finite() || lot_size <= 0.0 {
            return 0;
        }
        if lot_size == 1.0 {
            return 1;
        }
        self.matching_range(lot_size)
            .map(|range| range.sample_size)
            .unwrap_or(0)
    }

    /// 查找批量所在区间
    pub fn matching_range(&self, lot_size: f64) -> Option<&SamplingRange> {
        if !lot_size.is_finite() || lot_size <= 1.0 {
            return None;
        }
        // 区间有序且不重叠，先二分定位候选区间
        let idx = self
            .ranges
            .partition_point(|range| (range.min as f64) <= lot_size);
        idx.checked_sub(1)
            .and_then(|i| self.ranges.get(i))
            .filter(|range| range.contains(lot_size))
    }

    /// 生成样本量说明（界面提示用）
    pub fn describe(&self, lot_size: f64) -> String {
        let lot = format_lot(lot_size);

        if !lot_size.is_finite() || lot_size <= 0.0 {
            return t_with_args("sampling.invalid_lot", &[("lot", &lot)]);
        }
        if lot_size == 1.0 {
            return t_with_args("sampling.single_unit", &[("plan", &self.plan_id)]);
        }

        match self.matching_range(lot_size) {
            Some(range) => {
                let min = range.min.to_string();
                let sample = range.sample_size.to_string();
                match range.max {
                    Some(max) => t_with_args(
                        "sampling.range_bounded",
                        &[
                            ("lot", &lot),
                            ("min", &min),
                            ("max", &max.to_string()),
                            ("plan", &self.plan_id),
                            ("sample", &sample),
                        ],
                    ),
                    None => t_with_args(
                        "sampling.range_unbounded",
                        &[
                            ("lot", &lot),
                            ("min", &min),
                            ("plan", &self.plan_id),
                            ("sample", &sample),
                        ],
                    ),
                }
            }
            None => t_with_args(
                "sampling.no_range",
                &[("lot", &lot), ("plan", &self.plan_id)],
            ),
        }
    }
}

impl Default for SamplingTableResolver {
    fn default() -> Self {
        Self::s4()
    }
}

fn format_lot(lot_size: f64) -> String {
    if lot_size.is_finite() && lot_size.fract() == 0.0 {
        format!("{}", lot_size as i64)
    } else {
        lot_size.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_lots() {
        assert_eq!(resolve_sample_size(1.0), 1);
        assert_eq!(resolve_sample_size(0.0), 0);
        assert_eq!(resolve_sample_size(-5.0), 0);
        assert_eq!(resolve_sample_size(f64::NAN), 0);
        assert_eq!(resolve_sample_size(f64::INFINITY), 0);
        assert_eq!(resolve_sample_size(f64::NEG_INFINITY), 0);
    }

    #[test]
    fn test_range_boundaries() {
        let cases: [(f64, u32); 12] = [
            (2.0, 2),
            (8.0, 2),
            (9.0, 2),
            (16.0, 3),
            (50.0, 5),
            (91.0, 8),
            (151.0, 13),
            (1200.0, 20),
            (35001.0, 80),
            (150001.0, 50),
            (500000.0, 50),
            (500001.0, 125),
        ];
        for (lot, expected) in cases {
            assert_eq!(resolve_sample_size(lot), expected, "lot={}", lot);
        }
        assert_eq!(resolve_sample_size(1e12), 125);
    }

    #[test]
    fn test_fractional_lot_between_ranges() {
        assert_eq!(resolve_sample_size(8.5), 0);
        assert_eq!(resolve_sample_size(1.5), 0);
        assert_eq!(resolve_sample_size(0.5), 0);
        assert_eq!(resolve_sample_size(10.5), 2);
    }

    #[test]
    fn test_every_lot_matches_exactly_one_range() {
        let resolver = SamplingTableResolver::s4();
        for q in 2u64..=500_000 {
            let lot = q as f64;
            let hits: Vec<_> = S4_RANGES.iter().filter(|r| r.contains(lot)).collect();
            assert_eq!(hits.len(), 1, "lot={}", q);
            assert_eq!(resolver.resolve(lot), hits[0].sample_size, "lot={}", q);
        }
    }

    #[test]
    fn test_custom_plan() {
        let resolver = SamplingTableResolver::from_ranges(
            "FORNECEDOR_A",
            vec![
                SamplingRange::new(2, Some(100), 4),
                SamplingRange::new(101, None, 10),
            ],
        )
        .unwrap();
        assert_eq!(resolver.plan_id(), "FORNECEDOR_A");
        assert_eq!(resolver.resolve(1.0), 1);
        assert_eq!(resolver.resolve(100.0), 4);
        assert_eq!(resolver.resolve(101.0), 10);

        assert!(SamplingTableResolver::from_ranges("X", vec![]).is_err());
    }

    #[test]
    fn test_describe_messages() {
        let _guard = crate::i18n::tests::LOCALE_TEST_LOCK
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        crate::i18n::set_locale(crate::i18n::DEFAULT_LOCALE);

        let resolver = SamplingTableResolver::s4();
        assert_eq!(
            resolver.describe(100.0),
            "Lote de 100 unidades (faixa 91 a 150, plano S4): amostra de 8 caixas."
        );
        assert!(resolver.describe(600000.0).contains("a partir de 500001"));
        assert!(resolver.describe(1.0).contains("1 unidade"));
        assert!(resolver.describe(8.5).contains("fora das faixas"));
        assert!(resolver.describe(-2.0).contains("inválida"));
    }
}
