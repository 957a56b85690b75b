// ==========================================
// 问卷题库 - 引擎层
// ==========================================
// 职责: 实现题目维护业务规则,不拼 SQL
// 红线: Engine 不拼 SQL
// ==========================================

pub mod authoring;
pub mod error;

// 重导出核心引擎
pub use authoring::{extract_keywords, QuestionAuthoringEngine, DEFAULT_SIMILAR_LIMIT};
pub use error::{AuthoringError, AuthoringResult};
