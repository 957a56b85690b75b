// ==========================================
// 问卷题库 - 领域类型定义
// ==========================================
// 职责: 题目类型/分类/范围枚举 + 导入失败策略
// 约束: 字符串 → 枚举必须经过显式映射表，未知值返回 None
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 枚举值标准化（去首尾空白 + 转大写 + 空格转下划线）
///
/// 例如 "multipla escolha" → "MULTIPLA_ESCOLHA"
pub fn normalize_enum_token(raw: &str) -> String {
    raw.trim().to_uppercase().replace(' ', "_")
}

// ==========================================
// EnumDomain - 有限取值域
// ==========================================
// 每个取值域提供完整的取值表，from_token 是全函数:
// 已知值 → Some，未知值 → None（不做隐式转换）
pub trait EnumDomain: Sized + Copy + PartialEq + 'static {
    /// 全部合法取值（顺序即错误提示中的展示顺序）
    const ALL: &'static [Self];

    /// 数据库/文件中的标准写法
    fn as_str(&self) -> &'static str;

    fn from_token(raw: &str) -> Option<Self> {
        let token = normalize_enum_token(raw);
        Self::ALL.iter().copied().find(|v| v.as_str() == token)
    }

    /// 逗号分隔的合法取值列表
    fn valid_values() -> String {
        Self::ALL
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ==========================================
// 题目类型 (Question Type)
// ==========================================
// 类型决定哪些字段有意义:
// - NUMERICA: minValue/maxValue
// - MULTIPLA_ESCOLHA: options
// - ESCALA_LIKERT: likertMin/likertMax/likertLabels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "NUMERICA")]
    Numeric,
    #[serde(rename = "MULTIPLA_ESCOLHA")]
    MultipleChoice,
    #[serde(rename = "ESCALA_LIKERT")]
    LikertScale,
    #[serde(rename = "SIM_NAO")]
    YesNo,
    #[serde(rename = "ABERTA")]
    OpenText,
    #[serde(rename = "DATA")]
    Date,
}

impl EnumDomain for QuestionType {
    const ALL: &'static [Self] = &[
        QuestionType::Numeric,
        QuestionType::MultipleChoice,
        QuestionType::LikertScale,
        QuestionType::YesNo,
        QuestionType::OpenText,
        QuestionType::Date,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Numeric => "NUMERICA",
            QuestionType::MultipleChoice => "MULTIPLA_ESCOLHA",
            QuestionType::LikertScale => "ESCALA_LIKERT",
            QuestionType::YesNo => "SIM_NAO",
            QuestionType::OpenText => "ABERTA",
            QuestionType::Date => "DATA",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 题目分类 (Question Category)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionCategory {
    #[serde(rename = "DEMOGRAFICA")]
    Demographic,
    #[serde(rename = "CLINICA")]
    Clinical,
    #[serde(rename = "COMPORTAMENTAL")]
    Behavioral,
    #[serde(rename = "HABITOS")]
    Habits,
    #[serde(rename = "PSICOLOGICA")]
    Psychological,
}

impl EnumDomain for QuestionCategory {
    const ALL: &'static [Self] = &[
        QuestionCategory::Demographic,
        QuestionCategory::Clinical,
        QuestionCategory::Behavioral,
        QuestionCategory::Habits,
        QuestionCategory::Psychological,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            QuestionCategory::Demographic => "DEMOGRAFICA",
            QuestionCategory::Clinical => "CLINICA",
            QuestionCategory::Behavioral => "COMPORTAMENTAL",
            QuestionCategory::Habits => "HABITOS",
            QuestionCategory::Psychological => "PSICOLOGICA",
        }
    }
}

impl fmt::Display for QuestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 题目范围 (Question Scope)
// ==========================================
// 地理/组织覆盖范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionScope {
    #[serde(rename = "LOCAL")]
    Local,
    #[serde(rename = "NACIONAL")]
    National,
    #[serde(rename = "INTERNACIONAL")]
    International,
}

impl EnumDomain for QuestionScope {
    const ALL: &'static [Self] = &[
        QuestionScope::Local,
        QuestionScope::National,
        QuestionScope::International,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            QuestionScope::Local => "LOCAL",
            QuestionScope::National => "NACIONAL",
            QuestionScope::International => "INTERNACIONAL",
        }
    }
}

impl fmt::Display for QuestionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 导入失败策略 (Failure Policy)
// ==========================================
// - FailFast: 首个失败行即拒绝整次调用（Excel 默认）
// - AggregateThenReject: 收集全部失败行后整体拒绝（CSV 默认）
// - PartialSuccess: 失败行进入报告，其余行继续（JSON 导入固定使用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailurePolicy {
    FailFast,
    AggregateThenReject,
    PartialSuccess,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::FailFast => "FAIL_FAST",
            FailurePolicy::AggregateThenReject => "AGGREGATE_THEN_REJECT",
            FailurePolicy::PartialSuccess => "PARTIAL_SUCCESS",
        }
    }

    /// 从配置值解析（大小写/空格不敏感），未知值返回 None
    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_enum_token(raw).as_str() {
            "FAIL_FAST" => Some(FailurePolicy::FailFast),
            "AGGREGATE_THEN_REJECT" => Some(FailurePolicy::AggregateThenReject),
            "PARTIAL_SUCCESS" => Some(FailurePolicy::PartialSuccess),
            _ => None,
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
