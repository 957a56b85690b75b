// ==========================================
// 问卷题库 - 题目导入器实现
// ==========================================
// 职责: 整合导入流程，从载荷/文件到数据库
// 流程: 解析 → 映射 → 校验 → 失败策略 → 覆写 → 逐条创建 → 报告
// 红线: 严格顺序处理；单条失败不阻断后续条目；批次不是原子事务
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::import::{FailedQuestion, ImportOverrides, ImportReport, ImportedQuestion};
use crate::domain::question::QuestionDraft;
use crate::domain::types::FailurePolicy;
use crate::engine::authoring::QuestionAuthoringEngine;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{
    apply_failure_policy, map_rows, parse_upload, CsvParser, ExcelParser, ParsedUpload,
    SourceFormat,
};
use crate::importer::question_importer_trait::{FileParser, QuestionImporter, RowMapper};
use crate::importer::row_mapper::QuestionRowMapper;
use crate::repository::QuestionRepository;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// 待创建条目: (0 基序号, 载荷或已确定的失败)
type PendingEntry = (usize, Result<QuestionDraft, FailedQuestion>);

// ==========================================
// QuestionImporterImpl - 题目导入器实现
// ==========================================
pub struct QuestionImporterImpl<R, C>
where
    R: QuestionRepository,
    C: ImportConfigReader,
{
    // 题目创建（校验 + 落库）
    authoring: Arc<QuestionAuthoringEngine<R>>,

    // 配置读取器
    config: C,

    // 导入组件
    excel_parser: Box<dyn FileParser>,
    csv_parser: Box<dyn FileParser>,
    row_mapper: Box<dyn RowMapper>,
}

impl<R, C> QuestionImporterImpl<R, C>
where
    R: QuestionRepository,
    C: ImportConfigReader,
{
    /// 使用默认组件创建导入器
    pub fn new(authoring: Arc<QuestionAuthoringEngine<R>>, config: C) -> Self {
        Self::with_components(
            authoring,
            config,
            Box::new(ExcelParser),
            Box::new(CsvParser),
            Box::new(QuestionRowMapper::new()),
        )
    }

    /// 创建导入器（自定义组件）
    ///
    /// # 参数
    /// - authoring: 题目维护引擎
    /// - config: 配置读取器
    /// - excel_parser / csv_parser: 文件解析器
    /// - row_mapper: 行映射器
    pub fn with_components(
        authoring: Arc<QuestionAuthoringEngine<R>>,
        config: C,
        excel_parser: Box<dyn FileParser>,
        csv_parser: Box<dyn FileParser>,
        row_mapper: Box<dyn RowMapper>,
    ) -> Self {
        Self {
            authoring,
            config,
            excel_parser,
            csv_parser,
            row_mapper,
        }
    }

    fn parser(&self, format: SourceFormat) -> &dyn FileParser {
        match format {
            SourceFormat::Excel => self.excel_parser.as_ref(),
            SourceFormat::Csv => self.csv_parser.as_ref(),
        }
    }

    async fn failure_policy(&self, format: SourceFormat) -> ImportResult<FailurePolicy> {
        let policy = match format {
            SourceFormat::Excel => self.config.get_excel_failure_policy().await,
            SourceFormat::Csv => self.config.get_csv_failure_policy().await,
        };
        policy.map_err(|e| ImportError::InternalError(format!("读取失败策略配置失败: {}", e)))
    }

    /// 解析上传文件（不落库）
    ///
    /// # 返回
    /// - Ok(ParsedUpload): 已校验载荷（PartialSuccess 策略下附带失败行）
    /// - Err(RowRejected / RowsRejected): 按配置的失败策略拒绝
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn parse_file(&self, format: SourceFormat, bytes: &[u8]) -> ImportResult<ParsedUpload> {
        let policy = self.failure_policy(format).await?;
        let upload = parse_upload(
            self.parser(format),
            self.row_mapper.as_ref(),
            bytes,
            policy,
            format,
        )?;
        info!(
            questions = upload.questions.len(),
            errors = upload.errors.len(),
            "{} questões parseadas do {}",
            upload.questions.len(),
            format.label()
        );
        Ok(upload)
    }

    /// 生成下载模板
    pub fn generate_template(&self, format: SourceFormat) -> ImportResult<Vec<u8>> {
        self.parser(format).generate_template()
    }

    /// 文件导入: 解析 → 失败策略 → 逐条创建
    async fn import_file(
        &self,
        format: SourceFormat,
        bytes: &[u8],
        actor_id: &str,
        overrides: &ImportOverrides,
    ) -> ImportResult<ImportReport> {
        let policy = self.failure_policy(format).await?;

        let rows = self.parser(format).parse_rows(bytes)?;
        debug!(rows = rows.len(), format = format.label(), "linhas encontradas");

        let parsed = apply_failure_policy(
            map_rows(self.row_mapper.as_ref(), &rows),
            policy,
            format,
        )?;

        let entries: Vec<PendingEntry> = parsed
            .into_iter()
            .map(|row| (row.index, row.into_entry()))
            .collect();

        self.create_all(entries, actor_id, overrides).await
    }

    /// 顺序创建（部分成功折叠）
    ///
    /// # 规则
    /// - 覆写优先级: defaultOrigin > 行内 origin > 配置默认来源
    /// - 任一条目失败只进入 failed 列表，继续处理后续条目
    async fn create_all(
        &self,
        entries: Vec<PendingEntry>,
        actor_id: &str,
        overrides: &ImportOverrides,
    ) -> ImportResult<ImportReport> {
        let fallback_origin = self
            .config
            .get_default_origin()
            .await
            .map_err(|e| ImportError::InternalError(format!("读取默认来源配置失败: {}", e)))?;

        let mut report = ImportReport::new(entries.len());
        for (index, entry) in entries {
            let outcome = match entry {
                Ok(draft) => {
                    let draft = overrides.apply(draft, &fallback_origin);
                    let text = draft.text.clone();
                    match self.authoring.create(draft, actor_id).await {
                        Ok(question) => Ok(ImportedQuestion {
                            index,
                            id: question.id,
                            text: question.text,
                        }),
                        Err(e) => {
                            warn!(index, error = %e, "Erro ao importar questão");
                            Err(FailedQuestion {
                                index,
                                text: Some(text),
                                error: e.to_string(),
                            })
                        }
                    }
                }
                Err(failed) => Err(failed),
            };
            report.record(outcome);
        }

        info!(
            total = report.total,
            success = report.success.len(),
            failed = report.failed.len(),
            "Importação concluída"
        );
        Ok(report)
    }
}

#[async_trait]
impl<R, C> QuestionImporter for QuestionImporterImpl<R, C>
where
    R: QuestionRepository,
    C: ImportConfigReader,
{
    #[instrument(skip(self, drafts, overrides), fields(actor = %actor_id, count = drafts.len()))]
    async fn import_questions(
        &self,
        drafts: Vec<QuestionDraft>,
        actor_id: &str,
        overrides: &ImportOverrides,
    ) -> ImportResult<ImportReport> {
        let entries: Vec<PendingEntry> = drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| (index, Ok(draft)))
            .collect();

        self.create_all(entries, actor_id, overrides).await
    }

    #[instrument(skip(self, bytes, overrides), fields(actor = %actor_id, size = bytes.len()))]
    async fn import_from_excel(
        &self,
        bytes: &[u8],
        actor_id: &str,
        overrides: &ImportOverrides,
    ) -> ImportResult<ImportReport> {
        self.import_file(SourceFormat::Excel, bytes, actor_id, overrides)
            .await
    }

    #[instrument(skip(self, bytes, overrides), fields(actor = %actor_id, size = bytes.len()))]
    async fn import_from_csv(
        &self,
        bytes: &[u8],
        actor_id: &str,
        overrides: &ImportOverrides,
    ) -> ImportResult<ImportReport> {
        self.import_file(SourceFormat::Csv, bytes, actor_id, overrides)
            .await
    }
}
