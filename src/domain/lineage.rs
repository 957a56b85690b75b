// ==========================================
// 问卷题库 - 题目版本谱系
// ==========================================
// 职责: 把同一逻辑题目的全部版本组织为有序谱系
// 红线: 谱系内所有版本共享同一个根 ID（parent_id 指向根，不形成链）
// 红线: 新版本只能基于谱系的最新版本生成（乐观并发）
// ==========================================

use crate::domain::question::{merge_nullable, Question, QuestionUpdate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineageError {
    #[error("谱系为空: root_id={0}")]
    Empty(String),

    #[error("版本 {question_id} 不属于谱系 {root_id}")]
    ForeignEntry { root_id: String, question_id: String },

    #[error("谱系 {root_id} 中版本号重复: v{version}")]
    DuplicateVersion { root_id: String, version: i32 },

    #[error("基准版本已过期: 基于 v{base_version}，最新为 v{latest_version}")]
    StaleBase {
        base_version: i32,
        latest_version: i32,
    },
}

/// 版本摘要（详情接口中列出谱系）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub id: String,
    pub text: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

/// 题目详情: 当前行 + 所属谱系的全部版本摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDetail {
    #[serde(flatten)]
    pub question: Question,
    pub versions: Vec<VersionSummary>,
}

// ==========================================
// Lineage - 版本谱系
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct Lineage {
    root_id: String,
    entries: Vec<Question>, // 按 version 升序
}

impl Lineage {
    /// 由同一谱系的版本行构造谱系
    ///
    /// # 校验
    /// - 至少一个版本
    /// - 每个版本的谱系根都等于 root_id
    /// - 版本号不重复
    pub fn from_versions(
        root_id: impl Into<String>,
        mut versions: Vec<Question>,
    ) -> Result<Self, LineageError> {
        let root_id = root_id.into();
        if versions.is_empty() {
            return Err(LineageError::Empty(root_id));
        }

        if let Some(foreign) = versions.iter().find(|q| q.lineage_root_id() != root_id) {
            return Err(LineageError::ForeignEntry {
                root_id,
                question_id: foreign.id.clone(),
            });
        }

        versions.sort_by_key(|q| q.version);
        if let Some(pair) = versions.windows(2).find(|w| w[0].version == w[1].version) {
            return Err(LineageError::DuplicateVersion {
                root_id,
                version: pair[0].version,
            });
        }

        Ok(Self {
            root_id,
            entries: versions,
        })
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    pub fn entries(&self) -> &[Question] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 根版本（根行可能因历史原因缺失）
    pub fn root(&self) -> Option<&Question> {
        self.entries.iter().find(|q| q.id == self.root_id)
    }

    pub fn latest(&self) -> &Question {
        // from_versions 保证非空
        &self.entries[self.entries.len() - 1]
    }

    pub fn next_version(&self) -> i32 {
        self.latest().version + 1
    }

    pub fn summaries(&self) -> Vec<VersionSummary> {
        self.entries
            .iter()
            .map(|q| VersionSummary {
                id: q.id.clone(),
                text: q.text.clone(),
                version: q.version,
                created_at: q.created_at,
            })
            .collect()
    }

    /// 基于 base 生成新版本行（写时复制）
    ///
    /// # 规则
    /// - base 必须是谱系最新版本，否则 StaleBase
    /// - 除 update 中显式给出的字段外，全部字段复制自 base（显式 null 清空可空字段）
    /// - origin 保持不变，creator 为 actor_id
    /// - parent_id = 谱系根 ID，version = 最新版本号 + 1（base 即最新版本）
    ///
    /// 不做权限与类型约束校验（由调用方负责）
    pub fn revise(
        &self,
        base: &Question,
        update: &QuestionUpdate,
        actor_id: &str,
    ) -> Result<Question, LineageError> {
        if base.lineage_root_id() != self.root_id {
            return Err(LineageError::ForeignEntry {
                root_id: self.root_id.clone(),
                question_id: base.id.clone(),
            });
        }

        let latest = self.latest();
        if base.version != latest.version {
            return Err(LineageError::StaleBase {
                base_version: base.version,
                latest_version: latest.version,
            });
        }

        Ok(Question {
            id: Uuid::new_v4().to_string(),
            text: update.text.clone().unwrap_or_else(|| base.text.clone()),
            question_type: update.question_type.unwrap_or(base.question_type),
            category: update.category.unwrap_or(base.category),
            scope: update.scope.unwrap_or(base.scope),
            is_required: update.is_required.unwrap_or(base.is_required),
            min_value: merge_nullable(&update.min_value, &base.min_value),
            max_value: merge_nullable(&update.max_value, &base.max_value),
            validation_regex: merge_nullable(&update.validation_regex, &base.validation_regex),
            help_text: merge_nullable(&update.help_text, &base.help_text),
            options: merge_nullable(&update.options, &base.options),
            likert_min: merge_nullable(&update.likert_min, &base.likert_min),
            likert_max: merge_nullable(&update.likert_max, &base.likert_max),
            likert_labels: merge_nullable(&update.likert_labels, &base.likert_labels),
            objective: merge_nullable(&update.objective, &base.objective),
            target_audience: merge_nullable(&update.target_audience, &base.target_audience),
            origin: base.origin.clone(),
            creator_id: actor_id.to_string(),
            research_group_id: merge_nullable(&update.research_group_id, &base.research_group_id),
            version: self.next_version(),
            parent_id: Some(self.root_id.clone()),
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::question::QuestionDraft;
    use crate::domain::types::{QuestionCategory, QuestionScope, QuestionType};

    fn root_question() -> Question {
        let mut draft = QuestionDraft::new(
            "Qual é a sua idade?",
            QuestionType::Numeric,
            QuestionCategory::Demographic,
            QuestionScope::Local,
        );
        draft.min_value = Some(0.0);
        draft.max_value = Some(120.0);
        draft.origin = Some("IMPORTED".to_string());
        Question::from_draft(draft, "researcher-a")
    }

    #[test]
    fn test_revise_root_points_at_root() {
        let root = root_question();
        let lineage = Lineage::from_versions(root.id.clone(), vec![root.clone()]).unwrap();

        let update = QuestionUpdate {
            text: Some("Quantos anos você tem?".to_string()),
            ..Default::default()
        };
        let v2 = lineage.revise(&root, &update, "researcher-a").unwrap();

        assert_eq!(v2.version, 2);
        assert_eq!(v2.parent_id.as_deref(), Some(root.id.as_str()));
        assert_eq!(v2.text, "Quantos anos você tem?");
        // 未覆盖字段沿用基准版本
        assert_eq!(v2.max_value, Some(120.0));
        assert_eq!(v2.origin, "IMPORTED");
        assert_ne!(v2.id, root.id);
    }

    #[test]
    fn test_revise_explicit_null_clears_field() {
        let mut root = root_question();
        root.help_text = Some("Em anos completos".to_string());
        let lineage = Lineage::from_versions(root.id.clone(), vec![root.clone()]).unwrap();

        let update = QuestionUpdate {
            help_text: Some(None),
            max_value: Some(None),
            ..Default::default()
        };
        let v2 = lineage.revise(&root, &update, "researcher-a").unwrap();

        assert_eq!(v2.help_text, None);
        assert_eq!(v2.max_value, None);
        assert_eq!(v2.min_value, root.min_value);
    }

    #[test]
    fn test_revise_second_version_shares_root() {
        let root = root_question();
        let lineage = Lineage::from_versions(root.id.clone(), vec![root.clone()]).unwrap();
        let v2 = lineage
            .revise(&root, &QuestionUpdate::default(), "researcher-a")
            .unwrap();

        let lineage = Lineage::from_versions(root.id.clone(), vec![v2.clone(), root.clone()]).unwrap();
        let v3 = lineage
            .revise(&v2, &QuestionUpdate::default(), "researcher-a")
            .unwrap();

        assert_eq!(v3.version, 3);
        assert_eq!(v3.parent_id.as_deref(), Some(root.id.as_str()));
        assert_eq!(lineage.latest().id, v2.id);
        assert_eq!(lineage.root().map(|q| q.id.as_str()), Some(root.id.as_str()));
    }

    #[test]
    fn test_revise_stale_base_rejected() {
        let root = root_question();
        let lineage = Lineage::from_versions(root.id.clone(), vec![root.clone()]).unwrap();
        let v2 = lineage
            .revise(&root, &QuestionUpdate::default(), "researcher-a")
            .unwrap();
        let lineage = Lineage::from_versions(root.id.clone(), vec![root.clone(), v2]).unwrap();

        let err = lineage
            .revise(&root, &QuestionUpdate::default(), "researcher-a")
            .unwrap_err();

        assert_eq!(
            err,
            LineageError::StaleBase {
                base_version: 1,
                latest_version: 2
            }
        );
    }

    #[test]
    fn test_from_versions_rejects_foreign_entry() {
        let root = root_question();
        let other = root_question();

        let err = Lineage::from_versions(root.id.clone(), vec![root, other.clone()]).unwrap_err();

        assert!(matches!(err, LineageError::ForeignEntry { question_id, .. } if question_id == other.id));
    }

    #[test]
    fn test_from_versions_rejects_duplicate_version() {
        let root = root_question();
        let lineage = Lineage::from_versions(root.id.clone(), vec![root.clone()]).unwrap();
        let a = lineage
            .revise(&root, &QuestionUpdate::default(), "researcher-a")
            .unwrap();
        let b = lineage
            .revise(&root, &QuestionUpdate::default(), "researcher-a")
            .unwrap();

        let err = Lineage::from_versions(root.id.clone(), vec![root, a, b]).unwrap_err();

        assert!(matches!(err, LineageError::DuplicateVersion { version: 2, .. }));
    }

    #[test]
    fn test_from_versions_empty() {
        assert!(matches!(
            Lineage::from_versions("x", Vec::new()),
            Err(LineageError::Empty(_))
        ));
    }
}
