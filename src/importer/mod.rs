// ==========================================
// 问卷题库 - 导入层
// ==========================================
// 职责: 外部题目数据导入（JSON 载荷 / Excel / CSV）
// 红线: 行级错误必须带行号；批次按条目顺序处理
// ==========================================

pub mod error;
pub mod file_parser;
pub mod question_importer_impl;
pub mod question_importer_trait;
pub mod row_mapper;
pub mod template;
pub mod validator;

// 重导出核心类型
pub use error::{FieldError, ImportError, ImportResult, RowError};
pub use file_parser::{
    CsvParser, ExcelParser, ParsedRow, ParsedUpload, RawRow, SourceFormat,
};
pub use question_importer_impl::QuestionImporterImpl;
pub use row_mapper::QuestionRowMapper;
pub use template::{TEMPLATE_COLUMNS, TEMPLATE_SHEET_NAME};
pub use validator::DraftValidator;

// 重导出 Trait 接口
pub use question_importer_trait::{FileParser, QuestionImporter, QuestionValidator, RowMapper};
