// ==========================================
// 问卷题库 - API 层
// ==========================================
// 职责: 提供题目维护/导入接口，统一错误到 HTTP 状态类别
// ==========================================

pub mod error;
pub mod question_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult, ErrorBody};
pub use question_api::QuestionApi;
