// ==========================================
// 问卷题库 - 题目领域模型
// ==========================================
// 职责: Question 实体、创建载荷、更新载荷、查询过滤与统计
// 红线: Question 行一旦写入不可变，修改只能产生新版本行
// ==========================================

use crate::domain::types::{QuestionCategory, QuestionScope, QuestionType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// 直接创建（非导入）时的默认来源标记
pub const ORIGIN_MANUAL: &str = "MANUAL";

/// 导入时的默认来源标记
pub const ORIGIN_IMPORTED: &str = "IMPORTED";

// ==========================================
// Question - 题目（不可变版本行）
// ==========================================
// 对齐: question 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub category: QuestionCategory,
    pub scope: QuestionScope,
    pub is_required: bool,

    // ===== NUMERICA =====
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,

    // ===== ABERTA =====
    pub validation_regex: Option<String>,

    pub help_text: Option<String>,

    // ===== MULTIPLA_ESCOLHA =====
    pub options: Option<Value>,

    // ===== ESCALA_LIKERT =====
    pub likert_min: Option<i32>,
    pub likert_max: Option<i32>,
    pub likert_labels: Option<Value>,

    pub objective: Option<String>,
    pub target_audience: Option<String>,
    pub origin: String,

    // ===== 归属 =====
    pub creator_id: String,               // 创建者（不可变）
    pub research_group_id: Option<String>, // 研究组（非拥有关系）

    // ===== 版本谱系 =====
    pub version: i32,
    pub parent_id: Option<String>, // 谱系根 ID（根版本自身为 None）

    pub created_at: DateTime<Utc>,
}

impl Question {
    /// 由创建载荷生成第 1 版题目
    pub fn from_draft(draft: QuestionDraft, creator_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: draft.text,
            question_type: draft.question_type,
            category: draft.category,
            scope: draft.scope,
            is_required: draft.is_required.unwrap_or(false),
            min_value: draft.min_value,
            max_value: draft.max_value,
            validation_regex: draft.validation_regex,
            help_text: draft.help_text,
            options: draft.options,
            likert_min: draft.likert_min,
            likert_max: draft.likert_max,
            likert_labels: draft.likert_labels,
            objective: draft.objective,
            target_audience: draft.target_audience,
            origin: draft.origin.unwrap_or_else(|| ORIGIN_MANUAL.to_string()),
            creator_id: creator_id.to_string(),
            research_group_id: draft.research_group_id,
            version: 1,
            parent_id: None,
            created_at: Utc::now(),
        }
    }

    /// 谱系根 ID: 有 parent_id 则为 parent_id，否则为自身 id
    pub fn lineage_root_id(&self) -> &str {
        self.parent_id.as_deref().unwrap_or(&self.id)
    }

    pub fn is_lineage_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// 当前行的可校验视图（用于修订后的类型约束校验）
    pub fn to_draft(&self) -> QuestionDraft {
        QuestionDraft {
            text: self.text.clone(),
            question_type: self.question_type,
            category: self.category,
            scope: self.scope,
            is_required: Some(self.is_required),
            min_value: self.min_value,
            max_value: self.max_value,
            validation_regex: self.validation_regex.clone(),
            help_text: self.help_text.clone(),
            options: self.options.clone(),
            likert_min: self.likert_min,
            likert_max: self.likert_max,
            likert_labels: self.likert_labels.clone(),
            objective: self.objective.clone(),
            target_audience: self.target_audience.clone(),
            origin: Some(self.origin.clone()),
            research_group_id: self.research_group_id.clone(),
        }
    }
}

// ==========================================
// QuestionDraft - 题目创建载荷
// ==========================================
// 来源: JSON 导入请求 / 文件行映射结果
// 序列化格式: camelCase（与导入文件列名一致）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub category: QuestionCategory,
    pub scope: QuestionScope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likert_min: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likert_max: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likert_labels: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_group_id: Option<String>,
}

impl QuestionDraft {
    /// 仅含必填字段的载荷
    pub fn new(
        text: impl Into<String>,
        question_type: QuestionType,
        category: QuestionCategory,
        scope: QuestionScope,
    ) -> Self {
        Self {
            text: text.into(),
            question_type,
            category,
            scope,
            is_required: None,
            min_value: None,
            max_value: None,
            validation_regex: None,
            help_text: None,
            options: None,
            likert_min: None,
            likert_max: None,
            likert_labels: None,
            objective: None,
            target_audience: None,
            origin: None,
            research_group_id: None,
        }
    }
}

// ==========================================
// QuestionUpdate - 题目修订载荷
// ==========================================
// 字段缺省 = 沿用当前版本的值；显式给出 = 覆盖
// 可空字段为双层 Option: None 缺省 / Some(None) 显式 null（清空）/ Some(Some(v)) 新值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestionUpdate {
    pub text: Option<String>,
    #[serde(rename = "type")]
    pub question_type: Option<QuestionType>,
    pub category: Option<QuestionCategory>,
    pub scope: Option<QuestionScope>,
    pub is_required: Option<bool>,
    #[serde(deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub min_value: Option<Option<f64>>,
    #[serde(deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub max_value: Option<Option<f64>>,
    #[serde(deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub validation_regex: Option<Option<String>>,
    #[serde(deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub help_text: Option<Option<String>>,
    #[serde(deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub options: Option<Option<Value>>,
    #[serde(deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub likert_min: Option<Option<i32>>,
    #[serde(deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub likert_max: Option<Option<i32>>,
    #[serde(deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub likert_labels: Option<Option<Value>>,
    #[serde(deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub objective: Option<Option<String>>,
    #[serde(deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<Option<String>>,
    #[serde(deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub research_group_id: Option<Option<String>>,
}

/// 字段出现即为 Some（null 解析为 Some(None)），缺省由 `default` 给出 None
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// 合并可空字段: 显式给出的值（含 null）优先，否则沿用当前值
pub fn merge_nullable<T: Clone>(patch: &Option<Option<T>>, current: &Option<T>) -> Option<T> {
    match patch {
        Some(value) => value.clone(),
        None => current.clone(),
    }
}

// ==========================================
// QuestionFilter - 列表查询过滤条件
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestionFilter {
    #[serde(rename = "type")]
    pub question_type: Option<QuestionType>,
    pub category: Option<QuestionCategory>,
    pub scope: Option<QuestionScope>,
    pub origin: Option<String>,
    pub creator_id: Option<String>,
    pub research_group_id: Option<String>,
}

// ==========================================
// QuestionStatistics - 题库统计
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupCount {
    pub key: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionStatistics {
    pub total: i64,
    pub by_type: Vec<GroupCount>,
    pub by_category: Vec<GroupCount>,
    pub by_origin: Vec<GroupCount>,
}

impl QuestionStatistics {
    pub fn count_for(groups: &[GroupCount], key: &str) -> i64 {
        groups
            .iter()
            .find(|g| g.key == key)
            .map(|g| g.count)
            .unwrap_or(0)
    }
}
