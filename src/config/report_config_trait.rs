// ==========================================
// CheckPeso - 报表配置读取 Trait
// ==========================================
// 职责: 定义报表/镜像所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ReportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ReportConfigReader: Send + Sync {
    /// 报表抬头中的公司名称
    ///
    /// # 默认值
    /// - 空字符串（不显示）
    async fn get_company_name(&self) -> Result<String, Box<dyn Error>>;

    /// 报表语言
    ///
    /// # 默认值
    /// - pt-BR
    async fn get_report_locale(&self) -> Result<String, Box<dyn Error>>;

    /// 表格镜像文件路径
    ///
    /// # 返回
    /// - None: 未配置，不做镜像
    async fn get_sheet_mirror_path(&self) -> Result<Option<String>, Box<dyn Error>>;
}
