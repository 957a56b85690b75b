// ==========================================
// 问卷题库 - 导入领域模型
// ==========================================
// 职责: 批量导入请求、批次级覆写、部分成功报告
// 生命周期: 仅在一次导入调用内存在，不落库
// ==========================================

use crate::domain::question::QuestionDraft;
use serde::{Deserialize, Serialize};

// ==========================================
// BatchResult - 部分成功批次结果
// ==========================================
// 成功/失败两个列表各自保持输入顺序，互不交织
// total = 输入条数（不是 success + failed 的推算值）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult<S, F> {
    pub success: Vec<S>,
    pub failed: Vec<F>,
    pub total: usize,
}

impl<S, F> BatchResult<S, F> {
    pub fn new(total: usize) -> Self {
        Self {
            success: Vec::new(),
            failed: Vec::new(),
            total,
        }
    }

    /// 顺序折叠的单步: 把一条结果追加到对应列表
    pub fn record(&mut self, outcome: Result<S, F>) {
        match outcome {
            Ok(s) => self.success.push(s),
            Err(f) => self.failed.push(f),
        }
    }

    /// 由有序结果序列折叠出批次结果
    pub fn from_outcomes<I>(total: usize, outcomes: I) -> Self
    where
        I: IntoIterator<Item = Result<S, F>>,
    {
        outcomes.into_iter().fold(Self::new(total), |mut acc, outcome| {
            acc.record(outcome);
            acc
        })
    }

    pub fn processed(&self) -> usize {
        self.success.len() + self.failed.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty() && self.success.len() == self.total
    }
}

/// 导入成功条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedQuestion {
    pub index: usize,
    pub id: String,
    pub text: String,
}

/// 导入失败条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedQuestion {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub error: String,
}

/// 题目导入报告
pub type ImportReport = BatchResult<ImportedQuestion, FailedQuestion>;

// ==========================================
// ImportOverrides - 批次级覆写
// ==========================================
// 存在时优先于行内同名字段
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportOverrides {
    pub default_origin: Option<String>,
    #[serde(alias = "researchGroupId")]
    pub default_research_group_id: Option<String>,
}

impl ImportOverrides {
    /// 应用覆写
    ///
    /// # 规则
    /// - origin: default_origin > 行内 origin > fallback_origin
    /// - research_group_id: default_research_group_id > 行内值
    pub fn apply(&self, mut draft: QuestionDraft, fallback_origin: &str) -> QuestionDraft {
        draft.origin = self
            .default_origin
            .clone()
            .or(draft.origin)
            .or_else(|| Some(fallback_origin.to_string()));
        if let Some(group_id) = &self.default_research_group_id {
            draft.research_group_id = Some(group_id.clone());
        }
        draft
    }
}

// ==========================================
// ImportQuestionsRequest - JSON 批量导入请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportQuestionsRequest {
    pub questions: Vec<QuestionDraft>,
    #[serde(flatten)]
    pub overrides: ImportOverrides,
}
