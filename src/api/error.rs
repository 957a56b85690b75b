// ==========================================
// 问卷题库 - API 层错误类型
// ==========================================
// 职责: 汇总各层错误，映射为 HTTP 状态类别与响应体
// 红线: 字段错误必须保留触发消息；授权错误不附加细节
// ==========================================

use crate::engine::error::AuthoringError;
use crate::importer::error::{ImportError, RowError};
use crate::repository::error::RepositoryError;
use serde::Serialize;
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 400 - 输入错误
    // ==========================================
    #[error("{0}")]
    InvalidInput(String),

    /// 字段校验失败（可带字段名与行号）
    #[error("{message}")]
    ValidationError {
        message: String,
        field: Option<String>,
        row: Option<usize>,
    },

    /// 文件整体被拒绝（聚合行错误）
    #[error("{message}")]
    ImportRejected {
        message: String,
        errors: Vec<RowError>,
        success_count: usize,
    },

    // ==========================================
    // 403 / 404 / 409
    // ==========================================
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    VersionConflict(String),

    // ==========================================
    // 500 - 内部错误
    // ==========================================
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(String),

    #[error("Erro interno: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// HTTP 状态类别
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidInput(_)
            | ApiError::ValidationError { .. }
            | ApiError::ImportRejected { .. } => 400,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) | ApiError::VersionConflict(_) => 409,
            ApiError::DatabaseError(_) | ApiError::InternalError(_) | ApiError::Other(_) => 500,
        }
    }

    /// 转为响应体
    pub fn to_body(&self) -> ErrorBody {
        let mut body = ErrorBody {
            status_code: self.status_code(),
            message: self.to_string(),
            field: None,
            row: None,
            errors: Vec::new(),
            success_count: None,
        };
        match self {
            ApiError::ValidationError { field, row, .. } => {
                body.field = field.clone();
                body.row = *row;
            }
            ApiError::ImportRejected {
                errors,
                success_count,
                ..
            } => {
                body.errors = errors.clone();
                body.success_count = Some(*success_count);
            }
            _ => {}
        }
        body
    }
}

/// 错误响应体
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<RowError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_count: Option<usize>,
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::OptimisticLockFailure {
                lineage_id,
                expected,
                actual,
            } => ApiError::VersionConflict(format!(
                "Conflito de versão na questão {}: baseada na v{}, versão atual v{}",
                lineage_id, expected, actual
            )),
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} com ID {} não encontrada", entity, id))
            }
            RepositoryError::UniqueConstraintViolation(msg) => ApiError::Conflict(msg),
            RepositoryError::ForeignKeyViolation(msg) => ApiError::Conflict(msg),
            RepositoryError::FieldValueError { field, message } => ApiError::ValidationError {
                message,
                field: Some(field),
                row: None,
            },
            RepositoryError::LockError(msg)
            | RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::RowRejected { row, ref source } => ApiError::ValidationError {
                field: Some(source.field.clone()),
                row: Some(row),
                message: err.to_string(),
            },
            ImportError::RowsRejected {
                message,
                errors,
                success_count,
            } => ApiError::ImportRejected {
                message,
                errors,
                success_count,
            },
            ImportError::FileReadError(_)
            | ImportError::UnsupportedFormat(_)
            | ImportError::ExcelParseError(_)
            | ImportError::CsvParseError(_) => ApiError::InvalidInput(err.to_string()),
            ImportError::TemplateError(msg) | ImportError::InternalError(msg) => {
                ApiError::InternalError(msg)
            }
            ImportError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 AuthoringError 转换
// ==========================================
impl From<AuthoringError> for ApiError {
    fn from(err: AuthoringError) -> Self {
        match err {
            AuthoringError::Validation(field_err) => ApiError::ValidationError {
                message: field_err.message,
                field: Some(field_err.field),
                row: field_err.row,
            },
            AuthoringError::Forbidden(msg) => ApiError::Forbidden(msg),
            AuthoringError::NotFound(msg) => ApiError::NotFound(msg),
            AuthoringError::Conflict(msg) => ApiError::Conflict(msg),
            err @ AuthoringError::VersionConflict { .. } => {
                ApiError::VersionConflict(err.to_string())
            }
            AuthoringError::LineageCorrupted(msg) => ApiError::InternalError(msg),
            AuthoringError::Repository(err) => err.into(),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
