// ==========================================
// CheckPeso - 本地化数值解析与格式化
// ==========================================
// 输入约定: 巴西葡语格式（逗号为小数点，点为千分位）
// 红线: 解析结果必须是有限数，任何非有限值一律归零
// ==========================================

use serde::{Deserialize, Serialize};

/// 解析表单/表格中的本地化数值
///
/// 规则（顺序执行，命中即返回）:
/// 1) 含逗号: 去掉所有 `.`，再把 `,` 换成 `.`
/// 2) 含多个 `.`: 全部视为千分位并去掉
/// 3) 其他: 直接解析
///
/// 解析为宽松前缀解析（"10 kg" → 10），无法解析或非有限 → 0
pub fn parse_locale_decimal(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let normalized = if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".")
    } else if trimmed.matches('.').count() > 1 {
        trimmed.replace('.', "")
    } else {
        trimmed.to_string()
    };

    finite_or_zero(parse_leading_float(&normalized))
}

/// 非有限值归零
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

// 取最长的合法浮点前缀: [+-]digits[.digits][e[+-]digits]
fn parse_leading_float(s: &str) -> f64 {
    let bytes = s.as_bytes();
    let len = bytes.len();
    let mut end = 0;

    if end < len && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }

    let int_start = end;
    while end < len && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digit_count = end - int_start;

    if end < len && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut j = frac_start;
        while j < len && bytes[j].is_ascii_digit() {
            j += 1;
        }
        digit_count += j - frac_start;
        end = j;
    }

    if digit_count == 0 {
        return 0.0;
    }

    if end < len && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut j = end + 1;
        if j < len && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < len && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            end = j;
        }
    }

    s[..end].parse::<f64>().unwrap_or(0.0)
}

/// 按巴西葡语习惯格式化数值（`1.234,56`）
///
/// 非有限值显示为 0；四舍五入后为零的负数不保留负号
pub fn format_locale_decimal(value: f64, decimals: usize) -> String {
    let value = finite_or_zero(value);
    let fixed = format!("{:.*}", decimals, value.abs());

    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let is_zero = fixed.chars().all(|c| c == '0' || c == '.');
    let mut out = String::new();
    if value < 0.0 && !is_zero {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(frac);
    }
    out
}

// ==========================================
// LocaleNumber - 数值或本地化字符串
// ==========================================
// 表单和导入文件里的数值字段既可能是 JSON 数字，也可能是 "1.234,56"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocaleNumber {
    Number(f64),
    Text(String),
}

impl LocaleNumber {
    /// 归一化为有限数
    pub fn value(&self) -> f64 {
        match self {
            LocaleNumber::Number(n) => finite_or_zero(*n),
            LocaleNumber::Text(s) => parse_locale_decimal(s),
        }
    }
}

impl Default for LocaleNumber {
    fn default() -> Self {
        LocaleNumber::Number(0.0)
    }
}

impl From<f64> for LocaleNumber {
    fn from(value: f64) -> Self {
        LocaleNumber::Number(value)
    }
}

impl From<&str> for LocaleNumber {
    fn from(value: &str) -> Self {
        LocaleNumber::Text(value.to_string())
    }
}

impl From<String> for LocaleNumber {
    fn from(value: String) -> Self {
        LocaleNumber::Text(value)
    }
}
