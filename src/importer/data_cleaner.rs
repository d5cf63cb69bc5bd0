// ==========================================
// CheckPeso - 数据清洗器实现
// ==========================================
// 职责: TRIM / NULL 标准化 / 巴西日期格式 / 本地化小数
// ==========================================

use crate::domain::locale_number::parse_locale_decimal;
use crate::importer::sheet_importer_trait::DataCleaner as DataCleanerTrait;
use chrono::NaiveDate;

/// 视为缺失的占位文本
const NULL_MARKERS: [&str; 4] = ["-", "n/a", "na", "null"];

pub struct DataCleaner;

impl DataCleanerTrait for DataCleaner {
    fn clean_text(&self, value: &str) -> String {
        value.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn normalize_null(&self, value: Option<String>) -> Option<String> {
        value.and_then(|v| {
            let cleaned = self.clean_text(&v);
            let lowered = cleaned.to_lowercase();
            if cleaned.is_empty() || NULL_MARKERS.contains(&lowered.as_str()) {
                None
            } else {
                Some(cleaned)
            }
        })
    }

    fn parse_date_br(&self, value: &str) -> Option<NaiveDate> {
        let trimmed = value.trim();
        // Excel 导出的日期时间只取日期部分
        let date_part = trimmed.split_whitespace().next().unwrap_or("");
        let date_part = date_part.split('T').next().unwrap_or("");

        ["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y"]
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
    }

    fn parse_decimal(&self, value: &str) -> f64 {
        parse_locale_decimal(value)
    }
}

impl DataCleaner {
    /// 拆分照片地址列表（'|' 或换行分隔）
    pub fn split_photos(&self, value: &str) -> Vec<String> {
        value
            .split(['|', '\n'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_and_null() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.clean_text("  Frango   congelado "), "Frango congelado");
        assert_eq!(cleaner.normalize_null(Some("  ".to_string())), None);
        assert_eq!(cleaner.normalize_null(Some("N/A".to_string())), None);
        assert_eq!(
            cleaner.normalize_null(Some(" NF 123 ".to_string())),
            Some("NF 123".to_string())
        );
    }

    #[test]
    fn test_parse_date_br() {
        let cleaner = DataCleaner;
        let expected = NaiveDate::from_ymd_opt(2026, 3, 9);
        assert_eq!(cleaner.parse_date_br("09/03/2026"), expected);
        assert_eq!(cleaner.parse_date_br("2026-03-09"), expected);
        assert_eq!(cleaner.parse_date_br("09-03-2026"), expected);
        assert_eq!(cleaner.parse_date_br("2026-03-09 14:30:00"), expected);
        assert_eq!(cleaner.parse_date_br("31/02/2026"), None);
        assert_eq!(cleaner.parse_date_br("ontem"), None);
    }

    #[test]
    fn test_parse_decimal_and_photos() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_decimal("1.234,5"), 1234.5);
        assert_eq!(
            cleaner.split_photos("a.jpg | b.jpg||c.jpg"),
            vec!["a.jpg", "b.jpg", "c.jpg"]
        );
    }
}
