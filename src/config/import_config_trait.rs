// ==========================================
// 问卷题库 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::FailurePolicy;
use async_trait::async_trait;
use std::error::Error;

pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 导入时的默认来源标记（批次覆写与行内 origin 都缺失时使用）
    ///
    /// # 默认值
    /// - IMPORTED
    async fn get_default_origin(&self) -> ConfigResult<String>;

    /// Excel 上传的失败策略
    ///
    /// # 默认值
    /// - FAIL_FAST（首个失败行拒绝整次调用）
    async fn get_excel_failure_policy(&self) -> ConfigResult<FailurePolicy>;

    /// CSV 上传的失败策略
    ///
    /// # 默认值
    /// - AGGREGATE_THEN_REJECT（收集全部失败行后整体拒绝）
    async fn get_csv_failure_policy(&self) -> ConfigResult<FailurePolicy>;
}
