// ==========================================
// 问卷题库 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==========================================
// FieldError - 字段级校验错误
// ==========================================
// 始终携带字段名；来自文件行时携带物理行号
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct FieldError {
    pub field: String,
    pub row: Option<usize>,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            row: None,
            message: message.into(),
        }
    }

    /// 附加行号（已有行号时保持不变）
    pub fn at_row(mut self, row: usize) -> Self {
        self.row.get_or_insert(row);
        self
    }
}

// ==========================================
// RowError - 行级错误（CSV 汇总拒绝时的明细）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    pub row: usize,
    pub field: String,
    pub message: String,
}

impl From<FieldError> for RowError {
    fn from(err: FieldError) -> Self {
        Self {
            row: err.row.unwrap_or(0),
            field: err.field,
            message: err.message,
        }
    }
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Linha {}: {}", self.row, self.message)
    }
}

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("Falha ao ler arquivo: {0}")]
    FileReadError(String),

    #[error("Formato de arquivo não suportado: {0} (apenas .xlsx/.csv)")]
    UnsupportedFormat(String),

    #[error("Erro ao processar arquivo Excel: {0}")]
    ExcelParseError(String),

    #[error("Erro ao processar arquivo CSV: {0}")]
    CsvParseError(String),

    // ===== 行级错误 =====
    /// 单行校验失败（FailFast 策略下拒绝整个调用）
    #[error("Erro na linha {row}: {source}")]
    RowRejected {
        row: usize,
        #[source]
        source: FieldError,
    },

    /// 汇总后整体拒绝（AggregateThenReject 策略）
    #[error("{message} ({} erro(s), {success_count} linha(s) válida(s))", .errors.len())]
    RowsRejected {
        message: String,
        errors: Vec<RowError>,
        success_count: usize,
    },

    // ===== 模板生成 =====
    #[error("Falha ao gerar template: {0}")]
    TemplateError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::XlsxError>
impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

// 实现 From<rust_xlsxwriter::XlsxError>
impl From<rust_xlsxwriter::XlsxError> for ImportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ImportError::TemplateError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
