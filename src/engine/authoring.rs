// ==========================================
// 问卷题库 - 题目维护引擎
// ==========================================
// 职责: 创建（含校验）/ 写时复制修订 / 受保护删除 / 查询
// 红线: 已写入的题目行不修改，修订只产生新版本行
// 红线: 只有创建者可以修订或删除
// 红线: 被问卷引用的题目不可删除
// ==========================================

use crate::domain::lineage::{Lineage, QuestionDetail};
use crate::domain::question::{
    Question, QuestionDraft, QuestionFilter, QuestionStatistics, QuestionUpdate,
};
use crate::engine::error::{map_lineage_error, AuthoringError, AuthoringResult};
use crate::importer::question_importer_trait::QuestionValidator;
use crate::importer::validator::DraftValidator;
use crate::repository::error::RepositoryError;
use crate::repository::question_repo::QuestionRepository;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// 相似检索默认条数
pub const DEFAULT_SIMILAR_LIMIT: usize = 10;

/// 相似检索关键词最小长度（不含）
const MIN_KEYWORD_CHARS: usize = 3;

// ==========================================
// QuestionAuthoringEngine
// ==========================================
pub struct QuestionAuthoringEngine<R: QuestionRepository> {
    repo: Arc<R>,
    validator: DraftValidator,
}

impl<R: QuestionRepository> QuestionAuthoringEngine<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            validator: DraftValidator,
        }
    }

    /// 创建第 1 版题目
    ///
    /// # 规则
    /// - 载荷先通过完整校验
    /// - origin 缺省为 MANUAL
    #[instrument(skip(self, draft), fields(actor = %actor_id))]
    pub async fn create(&self, mut draft: QuestionDraft, actor_id: &str) -> AuthoringResult<Question> {
        draft.text = draft.text.trim().to_string();
        self.validator.validate_draft(&draft)?;

        let question = Question::from_draft(draft, actor_id);
        self.repo.insert(&question).await?;

        info!(question_id = %question.id, origin = %question.origin, "Questão criada");
        Ok(question)
    }

    /// 修订题目（写时复制）
    ///
    /// # 流程
    /// 1. 读取当前行，校验操作者为创建者
    /// 2. 读取谱系，基于当前行生成新版本（当前行必须是最新版本）
    /// 3. 合并后的新版本按创建规则校验
    /// 4. 事务内复核最新版本号后写入
    #[instrument(skip(self, update), fields(actor = %actor_id))]
    pub async fn revise(
        &self,
        question_id: &str,
        update: QuestionUpdate,
        actor_id: &str,
    ) -> AuthoringResult<Question> {
        let current = self.load(question_id).await?;

        if current.creator_id != actor_id {
            warn!(question_id, "非创建者尝试修订题目");
            return Err(AuthoringError::Forbidden(
                "Apenas o criador pode atualizar a questão".to_string(),
            ));
        }

        let lineage = self.load_lineage(current.lineage_root_id()).await?;
        let mut next = lineage
            .revise(&current, &update, actor_id)
            .map_err(|e| map_lineage_error(question_id, e))?;
        next.text = next.text.trim().to_string();

        self.validator.validate_draft(&next.to_draft())?;

        match self.repo.insert_revision(&next, current.version).await {
            Ok(()) => {}
            Err(RepositoryError::OptimisticLockFailure { actual, .. }) => {
                return Err(AuthoringError::VersionConflict {
                    question_id: question_id.to_string(),
                    base_version: current.version,
                    latest_version: actual,
                });
            }
            Err(RepositoryError::UniqueConstraintViolation(_)) => {
                return Err(AuthoringError::VersionConflict {
                    question_id: question_id.to_string(),
                    base_version: current.version,
                    latest_version: next.version,
                });
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            question_id = %next.id,
            root_id = %lineage.root_id(),
            version = next.version,
            "Nova versão criada"
        );
        Ok(next)
    }

    /// 删除题目
    ///
    /// # 规则
    /// - 只有创建者可以删除
    /// - 被问卷引用时拒绝（冲突）
    /// - 作为谱系根且存在其他版本时拒绝（冲突）
    #[instrument(skip(self), fields(actor = %actor_id))]
    pub async fn delete(&self, question_id: &str, actor_id: &str) -> AuthoringResult<()> {
        let current = self.load(question_id).await?;

        if current.creator_id != actor_id {
            return Err(AuthoringError::Forbidden(
                "Apenas o criador pode remover a questão".to_string(),
            ));
        }

        let usage = self.repo.count_questionnaire_usage(question_id).await?;
        if usage > 0 {
            return Err(AuthoringError::Conflict(format!(
                "Questão não pode ser removida pois está em uso em {} questionário(s)",
                usage
            )));
        }

        let children = self.repo.count_child_versions(question_id).await?;
        if children > 0 {
            return Err(AuthoringError::Conflict(format!(
                "Questão não pode ser removida pois possui {} versão(ões) derivada(s)",
                children
            )));
        }

        self.repo.delete(question_id).await?;
        info!(question_id, "Questão removida");
        Ok(())
    }

    /// 查询题目详情（含谱系版本摘要）
    pub async fn find_by_id(&self, question_id: &str) -> AuthoringResult<QuestionDetail> {
        let question = self.load(question_id).await?;
        let lineage = self.load_lineage(question.lineage_root_id()).await?;

        Ok(QuestionDetail {
            versions: lineage.summaries(),
            question,
        })
    }

    pub async fn find_all(&self, filter: &QuestionFilter) -> AuthoringResult<Vec<Question>> {
        Ok(self.repo.find_all(filter).await?)
    }

    /// 关键词相似检索
    ///
    /// 关键词: 按空白切分、去标点、转小写，长度 > 3 的词；任一命中即返回
    pub async fn find_similar(&self, text: &str, limit: usize) -> AuthoringResult<Vec<Question>> {
        let keywords = extract_keywords(text);
        if keywords.is_empty() {
            debug!("texto sem palavras-chave");
            return Ok(Vec::new());
        }
        Ok(self.repo.search_text(&keywords, limit).await?)
    }

    pub async fn statistics(&self) -> AuthoringResult<QuestionStatistics> {
        Ok(self.repo.statistics().await?)
    }

    /// 把题目加入问卷
    pub async fn link_questionnaire(
        &self,
        questionnaire_id: &str,
        question_id: &str,
        position: i32,
    ) -> AuthoringResult<()> {
        self.load(question_id).await?;
        self.repo
            .link_questionnaire(questionnaire_id, question_id, position)
            .await?;
        debug!(questionnaire_id, question_id, position, "questão vinculada ao questionário");
        Ok(())
    }

    async fn load(&self, question_id: &str) -> AuthoringResult<Question> {
        self.repo
            .find_by_id(question_id)
            .await?
            .ok_or_else(|| AuthoringError::question_not_found(question_id))
    }

    async fn load_lineage(&self, root_id: &str) -> AuthoringResult<Lineage> {
        let versions = self.repo.find_lineage(root_id).await?;
        Lineage::from_versions(root_id, versions).map_err(|e| map_lineage_error(root_id, e))
    }
}

/// 提取检索关键词（去重，保持出现顺序）
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for word in text.split_whitespace() {
        let word = word
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if word.chars().count() > MIN_KEYWORD_CHARS && !keywords.contains(&word) {
            keywords.push(word);
        }
    }
    keywords
}
