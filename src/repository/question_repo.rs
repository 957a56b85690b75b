// ==========================================
// 问卷题库 - 题目 Repository Trait
// ==========================================
// 职责: 定义题目与问卷引用的数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 红线: question 行写入后不做 UPDATE
// ==========================================

use crate::domain::question::{Question, QuestionFilter, QuestionStatistics};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// QuestionRepository Trait
// ==========================================
// 用途: 题目数据访问
// 实现者: QuestionRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    // ===== 写入 =====

    /// 插入第 1 版题目
    async fn insert(&self, question: &Question) -> RepositoryResult<()>;

    /// 插入修订版本（乐观并发）
    ///
    /// # 参数
    /// - question: 新版本行（parent_id 指向谱系根）
    /// - base_version: 生成该版本时所基于的版本号
    ///
    /// # 返回
    /// - Ok(()): 写入成功
    /// - Err(OptimisticLockFailure): 事务内查得的谱系最大版本号 != base_version
    async fn insert_revision(&self, question: &Question, base_version: i32)
        -> RepositoryResult<()>;

    /// 删除题目行
    ///
    /// # 返回
    /// - Ok(usize): 删除的行数（0 表示不存在）
    async fn delete(&self, id: &str) -> RepositoryResult<usize>;

    /// 把题目加入问卷（重复加入时更新位置）
    async fn link_questionnaire(
        &self,
        questionnaire_id: &str,
        question_id: &str,
        position: i32,
    ) -> RepositoryResult<()>;

    // ===== 查询 =====

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Question>>;

    /// 按过滤条件查询（创建时间倒序）
    async fn find_all(&self, filter: &QuestionFilter) -> RepositoryResult<Vec<Question>>;

    /// 查询谱系全部版本（版本号升序）
    async fn find_lineage(&self, root_id: &str) -> RepositoryResult<Vec<Question>>;

    /// 关键词检索（任一关键词命中即可，不区分大小写；创建时间倒序）
    async fn search_text(&self, keywords: &[String], limit: usize)
        -> RepositoryResult<Vec<Question>>;

    /// 引用该题目的问卷数
    async fn count_questionnaire_usage(&self, question_id: &str) -> RepositoryResult<i64>;

    /// 以该题目为谱系根的其他版本数
    async fn count_child_versions(&self, question_id: &str) -> RepositoryResult<i64>;

    /// 题库统计（总数 + 按题型/分类/来源分组）
    async fn statistics(&self) -> RepositoryResult<QuestionStatistics>;
}
