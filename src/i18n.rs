// ==========================================
// CheckPeso - 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持巴西葡语（默认）和英文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 默认语言
pub const DEFAULT_LOCALE: &str = "pt-BR";

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"pt-BR" 或 "en"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use checkpeso::i18n::t;
/// let msg = t("report.title");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use checkpeso::i18n::t_with_args;
/// let msg = t_with_args("sampling.no_range", &[("lot", "8.5"), ("plan", "S4")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    interpolate(rust_i18n::t!(key).to_string(), args)
}

/// 按指定语言翻译（不读写全局 locale，并发渲染用）
pub fn t_in(locale: &str, key: &str) -> String {
    rust_i18n::t!(key, locale = locale).to_string()
}

/// 按指定语言翻译（带参数）
pub fn t_with_args_in(locale: &str, key: &str, args: &[(&str, &str)]) -> String {
    interpolate(t_in(locale, key), args)
}

/// 规范化语言代码: 仅支持 en，其余回落到默认语言
pub fn normalize_locale(locale: &str) -> &'static str {
    if locale.trim() == "en" {
        "en"
    } else {
        DEFAULT_LOCALE
    }
}

fn interpolate(mut text: String, args: &[(&str, &str)]) -> String {
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        text = text.replace(&placeholder, v);
    }
    text
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    // rust-i18n 的 locale 为全局状态，且 Rust 测试默认并行执行；
    // 涉及翻译文本的测试都需持有此锁。
    pub(crate) static LOCALE_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_set_locale() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_locale("en");
        assert_eq!(current_locale(), "en");

        set_locale(DEFAULT_LOCALE);
        assert_eq!(current_locale(), DEFAULT_LOCALE);
    }

    #[test]
    fn test_translate_simple() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_locale(DEFAULT_LOCALE);
        assert_eq!(t("report.field.supplier"), "Fornecedor");

        set_locale("en");
        assert_eq!(t("report.field.supplier"), "Supplier");

        set_locale(DEFAULT_LOCALE);
    }

    #[test]
    fn test_translate_with_args() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_locale(DEFAULT_LOCALE);
        let msg = t_with_args("sampling.no_range", &[("lot", "8.5"), ("plan", "S4")]);
        assert!(msg.contains("8.5"));
        assert!(msg.contains("S4"));
        assert!(!msg.contains("%{"));
    }

    #[test]
    fn test_translate_in_ignores_global_locale() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_locale(DEFAULT_LOCALE);

        assert_eq!(t_in("en", "report.field.supplier"), "Supplier");
        assert_eq!(t_in("pt-BR", "report.field.supplier"), "Fornecedor");
        assert_eq!(current_locale(), DEFAULT_LOCALE);

        let msg = t_with_args_in("en", "report.photos_count", &[("count", "3")]);
        assert!(msg.contains('3'));
        assert!(!msg.contains("%{"));
    }

    #[test]
    fn test_normalize_locale() {
        assert_eq!(normalize_locale(" en "), "en");
        assert_eq!(normalize_locale("pt-BR"), DEFAULT_LOCALE);
        assert_eq!(normalize_locale("fr"), DEFAULT_LOCALE);
    }
}
