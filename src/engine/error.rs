// ==========================================
// 问卷题库 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::lineage::LineageError;
use crate::importer::error::FieldError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 题目维护引擎错误类型
#[derive(Error, Debug)]
pub enum AuthoringError {
    /// 字段校验失败
    #[error(transparent)]
    Validation(#[from] FieldError),

    /// 非创建者操作
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// 删除被引用阻止等业务冲突
    #[error("{0}")]
    Conflict(String),

    /// 修订基准不是谱系最新版本
    #[error("Conflito de versão na questão {question_id}: baseada na v{base_version}, versão atual v{latest_version}")]
    VersionConflict {
        question_id: String,
        base_version: i32,
        latest_version: i32,
    },

    #[error("谱系数据不一致: {0}")]
    LineageCorrupted(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AuthoringError {
    pub fn question_not_found(id: &str) -> Self {
        AuthoringError::NotFound(format!("Questão com ID {} não encontrada", id))
    }
}

/// Result 类型别名
pub type AuthoringResult<T> = Result<T, AuthoringError>;

pub(crate) fn map_lineage_error(question_id: &str, err: LineageError) -> AuthoringError {
    match err {
        LineageError::StaleBase {
            base_version,
            latest_version,
        } => AuthoringError::VersionConflict {
            question_id: question_id.to_string(),
            base_version,
            latest_version,
        },
        other => AuthoringError::LineageCorrupted(other.to_string()),
    }
}
