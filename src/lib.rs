// ==========================================
// 问卷题库 - 核心库
// ==========================================
// 职责: 题目导入（JSON / Excel / CSV）、校验、写时复制版本管理
// 技术栈: Rust + SQLite (rusqlite) + calamine / csv / rust_xlsxwriter
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 题目维护规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{FailurePolicy, QuestionCategory, QuestionScope, QuestionType};

// 领域实体
pub use domain::{
    ImportOverrides, ImportQuestionsRequest, ImportReport, Lineage, Question, QuestionDetail,
    QuestionDraft, QuestionFilter, QuestionStatistics, QuestionUpdate,
};

// 引擎
pub use engine::QuestionAuthoringEngine;

// 导入器
pub use importer::{QuestionImporter, QuestionImporterImpl, SourceFormat};

// API
pub use api::{ApiError, ApiResult, QuestionApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "survey-question-bank";
