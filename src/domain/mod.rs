// ==========================================
// 问卷题库 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、版本谱系与导入报告
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod import;
pub mod lineage;
pub mod question;
pub mod types;

// 重导出核心类型
pub use import::{
    BatchResult, FailedQuestion, ImportOverrides, ImportQuestionsRequest, ImportReport,
    ImportedQuestion,
};
pub use lineage::{Lineage, LineageError, QuestionDetail, VersionSummary};
pub use question::{
    GroupCount, Question, QuestionDraft, QuestionFilter, QuestionStatistics, QuestionUpdate,
    ORIGIN_IMPORTED, ORIGIN_MANUAL,
};
pub use types::{
    normalize_enum_token, EnumDomain, FailurePolicy, QuestionCategory, QuestionScope,
    QuestionType,
};
