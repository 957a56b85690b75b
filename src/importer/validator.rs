// ==========================================
// 问卷题库 - 题目校验器实现
// ==========================================
// 职责: 枚举取值校验 + 按题型的字段约束校验
// 红线: 纯函数，无 I/O；失败时返回明确错误，不做改变语义的默认值填充
// ==========================================

use crate::domain::question::QuestionDraft;
use crate::domain::types::{EnumDomain, QuestionType};
use crate::importer::error::FieldError;
use crate::importer::question_importer_trait::QuestionValidator;
use regex::Regex;
use serde_json::Value;

/// 校验枚举取值
///
/// # 参数
/// - raw: 原始值（任意大小写，允许空格代替下划线）
/// - field: 字段名（写入 FieldError.field）
/// - label: 错误提示前缀，例如 "Tipo de questão inválido"
///
/// # 返回
/// - Ok(E): 取值域中的成员
/// - Err: 提示中列出全部合法取值
pub fn validate_enum<E: EnumDomain>(raw: &str, field: &str, label: &str) -> Result<E, FieldError> {
    E::from_token(raw).ok_or_else(|| {
        FieldError::new(
            field,
            format!("{}: \"{}\". Valores válidos: {}", label, raw, E::valid_values()),
        )
    })
}

/// 多选题选项列表
///
/// 支持两种写法: `[...]` 或 `{"choices": [...]}`
/// 形状不符时返回 None
pub fn resolve_choices(options: &Value) -> Option<&Vec<Value>> {
    match options {
        Value::Array(items) => Some(items),
        Value::Object(map) => map.get("choices").and_then(Value::as_array),
        _ => None,
    }
}

// ==========================================
// DraftValidator - 创建载荷校验器
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct DraftValidator;

impl DraftValidator {
    pub fn new() -> Self {
        Self
    }

    fn validate_multiple_choice(&self, options: Option<&Value>) -> Result<(), FieldError> {
        let missing = || {
            FieldError::new(
                "options",
                "Questões de múltipla escolha requerem campo \"options\" com array \"choices\"",
            )
        };
        let empty = || {
            FieldError::new(
                "options",
                "Campo \"options.choices\" deve ser array com pelo menos uma opção",
            )
        };

        let options = options.filter(|v| !v.is_null()).ok_or_else(missing)?;
        match options {
            Value::Object(map) if !map.contains_key("choices") => Err(missing()),
            other => match resolve_choices(other) {
                Some(choices) if !choices.is_empty() => Ok(()),
                Some(_) => Err(empty()),
                None if other.is_object() => Err(empty()),
                None => Err(missing()),
            },
        }
    }
}

impl QuestionValidator for DraftValidator {
    fn validate_required_text(&self, draft: &QuestionDraft) -> Result<(), FieldError> {
        if draft.text.trim().is_empty() {
            return Err(FieldError::new("text", "Campo \"text\" é obrigatório"));
        }
        Ok(())
    }

    fn validate_type_specific_fields(&self, draft: &QuestionDraft) -> Result<(), FieldError> {
        match draft.question_type {
            QuestionType::Numeric => {
                if let (Some(min), Some(max)) = (draft.min_value, draft.max_value) {
                    if min > max {
                        return Err(FieldError::new(
                            "minValue",
                            "minValue não pode ser maior que maxValue",
                        ));
                    }
                }
                Ok(())
            }
            QuestionType::MultipleChoice => self.validate_multiple_choice(draft.options.as_ref()),
            QuestionType::LikertScale => match (draft.likert_min, draft.likert_max) {
                (Some(min), Some(max)) if min >= max => Err(FieldError::new(
                    "likertMin",
                    "likertMin deve ser menor que likertMax",
                )),
                (Some(_), Some(_)) => Ok(()),
                (None, _) => Err(FieldError::new(
                    "likertMin",
                    "Questões Likert requerem likertMin e likertMax",
                )),
                (_, None) => Err(FieldError::new(
                    "likertMax",
                    "Questões Likert requerem likertMin e likertMax",
                )),
            },
            // 其余题型无附加约束
            QuestionType::YesNo | QuestionType::OpenText | QuestionType::Date => Ok(()),
        }
    }

    fn validate_validation_regex(&self, draft: &QuestionDraft) -> Result<(), FieldError> {
        match draft.validation_regex.as_deref() {
            Some(pattern) if !pattern.is_empty() => Regex::new(pattern).map(|_| ()).map_err(|e| {
                FieldError::new(
                    "validationRegex",
                    format!("validationRegex deve ser uma expressão regular válida: {}", e),
                )
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{QuestionCategory, QuestionScope};
    use serde_json::json;

    fn draft(question_type: QuestionType) -> QuestionDraft {
        QuestionDraft::new(
            "Pergunta de teste",
            question_type,
            QuestionCategory::Clinical,
            QuestionScope::Local,
        )
    }

    #[test]
    fn test_validate_enum_lists_valid_values() {
        let err = validate_enum::<QuestionScope>("regional", "scope", "Escopo inválido").unwrap_err();

        assert_eq!(err.field, "scope");
        assert_eq!(
            err.message,
            "Escopo inválido: \"regional\". Valores válidos: LOCAL, NACIONAL, INTERNACIONAL"
        );
    }

    #[test]
    fn test_validate_enum_normalizes() {
        let parsed: QuestionType =
            validate_enum("escala likert", "type", "Tipo de questão inválido").unwrap();
        assert_eq!(parsed, QuestionType::LikertScale);
    }

    #[test]
    fn test_numeric_min_greater_than_max() {
        let mut q = draft(QuestionType::Numeric);
        q.min_value = Some(50.0);
        q.max_value = Some(10.0);

        let err = DraftValidator.validate_type_specific_fields(&q).unwrap_err();
        assert_eq!(err.message, "minValue não pode ser maior que maxValue");

        q.max_value = None;
        assert!(DraftValidator.validate_type_specific_fields(&q).is_ok());
    }

    #[test]
    fn test_multiple_choice_requires_choices() {
        let mut q = draft(QuestionType::MultipleChoice);
        let err = DraftValidator.validate_type_specific_fields(&q).unwrap_err();
        assert_eq!(err.field, "options");
        assert!(err.message.contains("requerem campo \"options\""));

        q.options = Some(json!({"choices": []}));
        let err = DraftValidator.validate_type_specific_fields(&q).unwrap_err();
        assert!(err.message.contains("pelo menos uma opção"));

        q.options = Some(json!([]));
        assert!(DraftValidator.validate_type_specific_fields(&q).is_err());

        q.options = Some(json!({"choices": ["Sim", "Não"]}));
        assert!(DraftValidator.validate_type_specific_fields(&q).is_ok());

        q.options = Some(json!(["Fundamental", "Médio"]));
        assert!(DraftValidator.validate_type_specific_fields(&q).is_ok());
    }

    #[test]
    fn test_likert_bounds() {
        let mut q = draft(QuestionType::LikertScale);
        let err = DraftValidator.validate_type_specific_fields(&q).unwrap_err();
        assert_eq!(err.message, "Questões Likert requerem likertMin e likertMax");

        q.likert_min = Some(5);
        q.likert_max = Some(1);
        let err = DraftValidator.validate_type_specific_fields(&q).unwrap_err();
        assert_eq!(err.message, "likertMin deve ser menor que likertMax");

        q.likert_max = Some(5);
        assert!(DraftValidator.validate_type_specific_fields(&q).is_err());

        q.likert_min = Some(1);
        assert!(DraftValidator.validate_type_specific_fields(&q).is_ok());
    }

    #[test]
    fn test_other_types_have_no_constraints() {
        let mut q = draft(QuestionType::YesNo);
        // 与题型不匹配的字段保留但不校验
        q.min_value = Some(10.0);
        q.max_value = Some(1.0);
        assert!(DraftValidator.validate_type_specific_fields(&q).is_ok());
    }

    #[test]
    fn test_validation_regex_must_compile() {
        let mut q = draft(QuestionType::OpenText);
        q.validation_regex = Some("^[0-9]{5}-[0-9]{3}$".to_string());
        assert!(DraftValidator.validate_draft(&q).is_ok());

        q.validation_regex = Some("([a-z".to_string());
        let err = DraftValidator.validate_draft(&q).unwrap_err();
        assert_eq!(err.field, "validationRegex");
    }

    #[test]
    fn test_blank_text_rejected() {
        let mut q = draft(QuestionType::Date);
        q.text = "   ".to_string();
        let err = DraftValidator.validate_draft(&q).unwrap_err();
        assert_eq!(err.message, "Campo \"text\" é obrigatório");
    }
}
