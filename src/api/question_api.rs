// ==========================================
// 问卷题库 - 题目 API
// ==========================================
// 职责: 从数据库路径装配仓储/引擎/导入器，提供题目维护与导入接口
// 红线: 批次导入返回 2xx 不代表所有条目成功，调用方必须检查 failed 列表
// ==========================================

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::config::{config_keys, ConfigManager};
use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::import::{ImportOverrides, ImportQuestionsRequest, ImportReport};
use crate::domain::lineage::QuestionDetail;
use crate::domain::question::{
    Question, QuestionDraft, QuestionFilter, QuestionStatistics, QuestionUpdate,
};
use crate::domain::types::FailurePolicy;
use crate::engine::authoring::{QuestionAuthoringEngine, DEFAULT_SIMILAR_LIMIT};
use crate::importer::file_parser::{ParsedUpload, SourceFormat};
use crate::importer::question_importer_impl::QuestionImporterImpl;
use crate::importer::question_importer_trait::QuestionImporter;
use crate::repository::question_repo_impl::QuestionRepositoryImpl;

type Importer = QuestionImporterImpl<QuestionRepositoryImpl, ConfigManager>;

// ==========================================
// QuestionApi - 题目 API
// ==========================================
pub struct QuestionApi {
    authoring: Arc<QuestionAuthoringEngine<QuestionRepositoryImpl>>,
    importer: Importer,
    config: ConfigManager,
}

impl QuestionApi {
    /// 打开数据库并装配（自动初始化表结构）
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseError(format!("Falha ao abrir banco: {}", e)))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接装配（连接在仓储与配置之间共享）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ApiError::DatabaseError(format!("锁获取失败: {}", e)))?;
            init_schema(&guard).map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        }

        let repo = Arc::new(QuestionRepositoryImpl::new(conn.clone()));
        let authoring = Arc::new(QuestionAuthoringEngine::new(repo));

        let importer_config = ConfigManager::from_connection(conn.clone())
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        let config = ConfigManager::from_connection(conn)
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

        Ok(Self {
            importer: QuestionImporterImpl::new(authoring.clone(), importer_config),
            authoring,
            config,
        })
    }

    // ==========================================
    // 题目维护
    // ==========================================

    /// 创建题目（origin 缺省 MANUAL）
    pub async fn create_question(
        &self,
        draft: QuestionDraft,
        actor_id: &str,
    ) -> ApiResult<Question> {
        Ok(self.authoring.create(draft, actor_id).await?)
    }

    /// 修订题目（生成新版本，旧版本保持不变）
    pub async fn update_question(
        &self,
        question_id: &str,
        update: QuestionUpdate,
        actor_id: &str,
    ) -> ApiResult<Question> {
        Ok(self.authoring.revise(question_id, update, actor_id).await?)
    }

    pub async fn delete_question(&self, question_id: &str, actor_id: &str) -> ApiResult<()> {
        Ok(self.authoring.delete(question_id, actor_id).await?)
    }

    pub async fn get_question(&self, question_id: &str) -> ApiResult<QuestionDetail> {
        Ok(self.authoring.find_by_id(question_id).await?)
    }

    pub async fn list_questions(&self, filter: &QuestionFilter) -> ApiResult<Vec<Question>> {
        Ok(self.authoring.find_all(filter).await?)
    }

    /// 相似题目检索（limit 缺省 10）
    pub async fn find_similar(&self, text: &str, limit: Option<usize>) -> ApiResult<Vec<Question>> {
        if text.trim().is_empty() {
            return Err(ApiError::InvalidInput("Texto é obrigatório".to_string()));
        }
        let limit = limit.unwrap_or(DEFAULT_SIMILAR_LIMIT);
        Ok(self.authoring.find_similar(text, limit).await?)
    }

    pub async fn statistics(&self) -> ApiResult<QuestionStatistics> {
        Ok(self.authoring.statistics().await?)
    }

    pub async fn link_questionnaire(
        &self,
        questionnaire_id: &str,
        question_id: &str,
        position: i32,
    ) -> ApiResult<()> {
        Ok(self
            .authoring
            .link_questionnaire(questionnaire_id, question_id, position)
            .await?)
    }

    // ==========================================
    // 导入
    // ==========================================

    /// JSON 批次导入（部分成功）
    pub async fn import_questions(
        &self,
        request: ImportQuestionsRequest,
        actor_id: &str,
    ) -> ApiResult<ImportReport> {
        Ok(self
            .importer
            .import_questions(request.questions, actor_id, &request.overrides)
            .await?)
    }

    /// 解析 Excel 上传（不落库）
    pub async fn upload_excel(&self, bytes: &[u8]) -> ApiResult<ParsedUpload> {
        Ok(self.importer.parse_file(SourceFormat::Excel, bytes).await?)
    }

    /// 解析 CSV 上传（不落库）
    pub async fn upload_csv(&self, bytes: &[u8]) -> ApiResult<ParsedUpload> {
        Ok(self.importer.parse_file(SourceFormat::Csv, bytes).await?)
    }

    pub async fn import_excel(
        &self,
        bytes: &[u8],
        actor_id: &str,
        overrides: &ImportOverrides,
    ) -> ApiResult<ImportReport> {
        Ok(self
            .importer
            .import_from_excel(bytes, actor_id, overrides)
            .await?)
    }

    pub async fn import_csv(
        &self,
        bytes: &[u8],
        actor_id: &str,
        overrides: &ImportOverrides,
    ) -> ApiResult<ImportReport> {
        Ok(self.importer.import_from_csv(bytes, actor_id, overrides).await?)
    }

    /// 按扩展名导入本地文件（.xlsx / .csv）
    #[instrument(skip(self, overrides), fields(actor = %actor_id))]
    pub async fn import_file(
        &self,
        path: &Path,
        actor_id: &str,
        overrides: &ImportOverrides,
    ) -> ApiResult<ImportReport> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let format = SourceFormat::from_extension(ext)?;

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ApiError::InvalidInput(format!("Falha ao ler {}: {}", path.display(), e))
        })?;
        info!(path = %path.display(), size = bytes.len(), "arquivo carregado");

        match format {
            SourceFormat::Excel => self.import_excel(&bytes, actor_id, overrides).await,
            SourceFormat::Csv => self.import_csv(&bytes, actor_id, overrides).await,
        }
    }

    // ==========================================
    // 模板
    // ==========================================

    pub fn excel_template(&self) -> ApiResult<Vec<u8>> {
        Ok(self.importer.generate_template(SourceFormat::Excel)?)
    }

    pub fn csv_template(&self) -> ApiResult<Vec<u8>> {
        Ok(self.importer.generate_template(SourceFormat::Csv)?)
    }

    // ==========================================
    // 配置
    // ==========================================

    /// 写入全局配置（失败策略键的值必须是合法策略）
    pub fn set_config(&self, key: &str, value: &str) -> ApiResult<()> {
        match key {
            config_keys::EXCEL_FAILURE_POLICY | config_keys::CSV_FAILURE_POLICY => {
                if FailurePolicy::parse(value).is_none() {
                    return Err(ApiError::InvalidInput(format!(
                        "Política de falha inválida: \"{}\"",
                        value
                    )));
                }
            }
            config_keys::DEFAULT_ORIGIN => {
                if value.trim().is_empty() {
                    return Err(ApiError::InvalidInput(
                        "Origem padrão não pode ser vazia".to_string(),
                    ));
                }
            }
            _ => {}
        }

        self.config
            .set_global_config_value(key, value)
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        info!(key, value, "configuração atualizada");
        Ok(())
    }

    pub fn get_config(&self, key: &str) -> ApiResult<Option<String>> {
        self.config
            .get_global_config_value(key)
            .map_err(|e| ApiError::DatabaseError(e.to_string()))
    }
}
