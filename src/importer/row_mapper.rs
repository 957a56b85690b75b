// ==========================================
// 问卷题库 - 行映射器实现
// ==========================================
// 职责: 原始行（列名 → 单元格值）→ 标准化创建载荷
// 列契约: text, type, category, scope, isRequired, minValue, maxValue, helpText,
//         options, likertMin, likertMax, likertLabels, objective, targetAudience, origin
// 附加列: validationRegex, researchGroupId（存在则读取）
// ==========================================

use crate::domain::question::QuestionDraft;
use crate::domain::types::{QuestionCategory, QuestionScope, QuestionType};
use crate::importer::error::FieldError;
use crate::importer::file_parser::RawRow;
use crate::importer::question_importer_trait::{QuestionValidator, RowMapper};
use crate::importer::validator::{validate_enum, DraftValidator};
use serde_json::Value;

/// 布尔真值（不区分大小写）
const TRUTHY_TOKENS: [&str; 4] = ["true", "1", "sim", "yes"];

pub struct QuestionRowMapper<V: QuestionValidator = DraftValidator> {
    validator: V,
}

impl QuestionRowMapper<DraftValidator> {
    pub fn new() -> Self {
        Self {
            validator: DraftValidator,
        }
    }
}

impl Default for QuestionRowMapper<DraftValidator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: QuestionValidator> QuestionRowMapper<V> {
    pub fn with_validator(validator: V) -> Self {
        Self { validator }
    }

    fn map_fields(&self, row: &RawRow) -> Result<QuestionDraft, FieldError> {
        // 必填字段（按列契约顺序检查）
        let text = required_text(row, "text")?;
        let raw_type = required_text(row, "type")?;
        let raw_category = required_text(row, "category")?;
        let raw_scope = required_text(row, "scope")?;

        let question_type: QuestionType =
            validate_enum(&raw_type, "type", "Tipo de questão inválido")?;
        let category: QuestionCategory =
            validate_enum(&raw_category, "category", "Categoria inválida")?;
        let scope: QuestionScope = validate_enum(&raw_scope, "scope", "Escopo inválido")?;

        let mut draft = QuestionDraft::new(text, question_type, category, scope);

        // 可选标量字段
        draft.is_required = parse_bool(row.get("isRequired"));
        draft.min_value = parse_number(row.get("minValue"), "minValue")?;
        draft.max_value = parse_number(row.get("maxValue"), "maxValue")?;
        draft.help_text = optional_text(row, "helpText");
        draft.objective = optional_text(row, "objective");
        draft.target_audience = optional_text(row, "targetAudience");
        draft.origin = optional_text(row, "origin");
        draft.validation_regex = optional_text(row, "validationRegex");
        draft.research_group_id = optional_text(row, "researchGroupId");

        // 结构化字段（原生结构或 JSON 字符串）
        draft.options = parse_json(row.get("options"), "options")?;
        draft.likert_min = parse_integer(row.get("likertMin"), "likertMin")?;
        draft.likert_max = parse_integer(row.get("likertMax"), "likertMax")?;
        draft.likert_labels = parse_json(row.get("likertLabels"), "likertLabels")?;

        self.validator.validate_draft(&draft)?;
        Ok(draft)
    }
}

impl<V: QuestionValidator> RowMapper for QuestionRowMapper<V> {
    fn map_row(&self, row: &RawRow) -> Result<QuestionDraft, FieldError> {
        self.map_fields(row).map_err(|e| e.at_row(row.row_number))
    }
}

// ==========================================
// 单元格值转换
// ==========================================

/// 单元格文本（去首尾空白；空串视为缺失）
fn cell_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn required_text(row: &RawRow, field: &str) -> Result<String, FieldError> {
    row.get(field)
        .and_then(cell_text)
        .ok_or_else(|| FieldError::new(field, format!("Campo \"{}\" é obrigatório", field)))
}

fn optional_text(row: &RawRow, field: &str) -> Option<String> {
    row.get(field).and_then(cell_text)
}

/// 布尔转换: 真值表以外一律为 false；缺失/空串为 None
fn parse_bool(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64() == Some(1.0)),
        other => {
            let token = cell_text(other)?.to_lowercase();
            Some(TRUTHY_TOKENS.contains(&token.as_str()))
        }
    }
}

/// 数值转换: 不做本地化小数分隔符猜测（"1,5" 是错误）
fn parse_number(value: Option<&Value>, field: &str) -> Result<Option<f64>, FieldError> {
    let not_numeric = || FieldError::new(field, format!("{} deve ser numérico", field));

    let Some(value) = value else {
        return Ok(None);
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_f64().map(Some).ok_or_else(not_numeric),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(not_numeric),
        _ => Err(not_numeric()),
    }
}

/// 整数转换: 小数值是错误（不截断）
fn parse_integer(value: Option<&Value>, field: &str) -> Result<Option<i32>, FieldError> {
    let Some(number) = parse_number(value, field)? else {
        return Ok(None);
    };
    if number.fract() != 0.0 {
        return Err(FieldError::new(field, format!("{} deve ser inteiro", field)));
    }
    if number < f64::from(i32::MIN) || number > f64::from(i32::MAX) {
        return Err(FieldError::new(field, format!("{} fora do intervalo permitido", field)));
    }
    Ok(Some(number as i32))
}

/// JSON 字段: 字符串按 JSON 解析，其余值原样保留
fn parse_json(value: Option<&Value>, field: &str) -> Result<Option<Value>, FieldError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => serde_json::from_str(s.trim())
            .map(Some)
            .map_err(|_| FieldError::new(field, format!("Campo \"{}\" deve ser JSON válido", field))),
        Some(other) => Ok(Some(other.clone())),
    }
}
