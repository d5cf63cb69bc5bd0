// ==========================================
// CheckPeso - 抽样方案领域模型
// ==========================================
// 抽样方案 = 一组按批量（收货数量）划分的闭区间，每个区间对应一个样本量
// 不变式: 区间按 min 升序、连续、不重叠，覆盖 [2, ∞)
// ==========================================

use serde::{Deserialize, Serialize};

/// 内置 S4 抽样方案标识
pub const S4_PLAN_ID: &str = "S4";

// ==========================================
// SamplingRange - 抽样区间
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingRange {
    pub min: u64,         // 批量下限（含）
    pub max: Option<u64>, // 批量上限（含），None 表示无上限
    pub sample_size: u32, // 该区间需抽检的箱数
}

impl SamplingRange {
    pub const fn new(min: u64, max: Option<u64>, sample_size: u32) -> Self {
        Self {
            min,
            max,
            sample_size,
        }
    }

    /// 批量是否落在本区间（闭区间，按实数比较）
    pub fn contains(&self, lot_size: f64) -> bool {
        if !lot_size.is_finite() {
            return false;
        }
        lot_size >= self.min as f64 && self.max.map_or(true, |max| lot_size <= max as f64)
    }

    pub fn is_unbounded(&self) -> bool {
        self.max.is_none()
    }
}

/// S4 抽样方案（固定表）
pub const S4_RANGES: [SamplingRange; 15] = [
    SamplingRange::new(2, Some(8), 2),
    SamplingRange::new(9, Some(15), 2),
    SamplingRange::new(16, Some(25), 3),
    SamplingRange::new(26, Some(50), 5),
    SamplingRange::new(51, Some(90), 5),
    SamplingRange::new(91, Some(150), 8),
    SamplingRange::new(151, Some(280), 13),
    SamplingRange::new(281, Some(500), 13),
    SamplingRange::new(501, Some(1200), 20),
    SamplingRange::new(1201, Some(3200), 32),
    SamplingRange::new(3201, Some(10000), 32),
    SamplingRange::new(10001, Some(35000), 50),
    SamplingRange::new(35001, Some(150000), 80),
    SamplingRange::new(150001, Some(500000), 50),
    SamplingRange::new(500001, None, 125),
];

/// 校验抽样区间是否构成 [2, ∞) 上的有效划分
///
/// 规则:
/// - 非空，首区间从 2 开始
/// - 每个区间 min <= max，sample_size > 0
/// - 相邻区间首尾相接（next.min == prev.max + 1）
/// - 只有最后一个区间可以无上限
pub fn validate_sampling_ranges(ranges: &[SamplingRange]) -> Result<(), String> {
    let first = ranges
        .first()
        .ok_or_else(|| "抽样方案至少需要一个区间".to_string())?;

    if first.min != 2 {
        return Err(format!("首个区间必须从 2 开始，实际为 {}", first.min));
    }

    for (idx, range) in ranges.iter().enumerate() {
        if range.sample_size == 0 {
            return Err(format!("第 {} 个区间的样本量必须大于 0", idx + 1));
        }
        if let Some(max) = range.max {
            if range.min > max {
                return Err(format!(
                    "第 {} 个区间下限 {} 大于上限 {}",
                    idx + 1,
                    range.min,
                    max
                ));
            }
        }

        if let Some(next) = ranges.get(idx + 1) {
            let max = range
                .max
                .ok_or_else(|| format!("第 {} 个区间无上限，但不是最后一个区间", idx + 1))?;
            if max.checked_add(1) != Some(next.min) {
                return Err(format!(
                    "第 {} 与第 {} 个区间不连续: 上限 {} 之后为 {}",
                    idx + 1,
                    idx + 2,
                    max,
                    next.min
                ));
            }
        }
    }

    Ok(())
}
