// ==========================================
// 问卷题库 - 题目导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 管道: 文件解析 → 行映射 → 校验 → 失败策略 → 逐条创建
// ==========================================

use crate::domain::import::{ImportOverrides, ImportReport};
use crate::domain::question::QuestionDraft;
use crate::importer::error::{FieldError, ImportResult};
use crate::importer::file_parser::RawRow;
use async_trait::async_trait;

// ==========================================
// QuestionImporter Trait
// ==========================================
// 用途: 题目导入主接口
// 实现者: QuestionImporterImpl
#[async_trait]
pub trait QuestionImporter: Send + Sync {
    /// 批量导入已结构化的题目载荷（JSON 导入）
    ///
    /// # 参数
    /// - drafts: 创建载荷列表（顺序即报告中的 index）
    /// - actor_id: 执行导入的研究人员
    /// - overrides: 批次级覆写（defaultOrigin / defaultResearchGroupId）
    ///
    /// # 返回
    /// - Ok(ImportReport): 部分成功报告（单条失败不阻断后续条目）
    /// - Err: 仅在无法开始处理时返回
    async fn import_questions(
        &self,
        drafts: Vec<QuestionDraft>,
        actor_id: &str,
        overrides: &ImportOverrides,
    ) -> ImportResult<ImportReport>;

    /// 从 Excel 字节流导入
    ///
    /// # 失败策略
    /// 由配置 `question_import/excel_failure_policy` 决定（默认 FAIL_FAST）
    async fn import_from_excel(
        &self,
        bytes: &[u8],
        actor_id: &str,
        overrides: &ImportOverrides,
    ) -> ImportResult<ImportReport>;

    /// 从 CSV 字节流导入
    ///
    /// # 失败策略
    /// 由配置 `question_import/csv_failure_policy` 决定（默认 AGGREGATE_THEN_REJECT）
    async fn import_from_csv(
        &self,
        bytes: &[u8],
        actor_id: &str,
        overrides: &ImportOverrides,
    ) -> ImportResult<ImportReport>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解码接口
// 实现者: ExcelParser, CsvParser
pub trait FileParser: Send + Sync {
    /// 解码字节流为原始行（第 1 行为表头，不出现在结果中）
    ///
    /// # 返回
    /// - Ok(Vec<RawRow>): 每行携带物理行号
    /// - Err: 字节流本身无法解码
    fn parse_rows(&self, bytes: &[u8]) -> ImportResult<Vec<RawRow>>;

    /// 生成下载模板（表头 + 示例行）
    fn generate_template(&self) -> ImportResult<Vec<u8>>;
}

// ==========================================
// RowMapper Trait
// ==========================================
// 用途: 原始行 → 创建载荷
// 实现者: QuestionRowMapper
pub trait RowMapper: Send + Sync {
    /// 映射单行
    ///
    /// # 返回
    /// - Ok(QuestionDraft): 已通过校验的载荷
    /// - Err(FieldError): 携带字段名与行号
    fn map_row(&self, row: &RawRow) -> Result<QuestionDraft, FieldError>;
}

// ==========================================
// QuestionValidator Trait
// ==========================================
// 用途: 创建载荷校验（纯函数）
// 实现者: DraftValidator
pub trait QuestionValidator: Send + Sync {
    /// text 去空白后非空
    fn validate_required_text(&self, draft: &QuestionDraft) -> Result<(), FieldError>;

    /// 按题型校验字段约束
    ///
    /// # 规则
    /// - NUMERICA: 两端都存在时 minValue <= maxValue
    /// - MULTIPLA_ESCOLHA: options 存在且选项非空
    /// - ESCALA_LIKERT: likertMin/likertMax 均存在且 likertMin < likertMax
    /// - 其他题型: 无附加约束
    fn validate_type_specific_fields(&self, draft: &QuestionDraft) -> Result<(), FieldError>;

    /// validationRegex 存在时必须可编译
    fn validate_validation_regex(&self, draft: &QuestionDraft) -> Result<(), FieldError>;

    /// 完整校验（按上述顺序，遇到首个错误即返回）
    fn validate_draft(&self, draft: &QuestionDraft) -> Result<(), FieldError> {
        self.validate_required_text(draft)?;
        self.validate_type_specific_fields(draft)?;
        self.validate_validation_regex(draft)
    }
}
