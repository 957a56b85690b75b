// ==========================================
// 问卷题库 - 文件解析器实现
// ==========================================
// 职责: 字节流 → 原始行（表头为第 1 行）+ 行级失败策略
// 支持: Excel (.xlsx 第一个工作表) / CSV (UTF-8)
// 行号: 物理行号（表头为 1，首个数据行为 2）
// ==========================================

use crate::domain::import::FailedQuestion;
use crate::domain::question::QuestionDraft;
use crate::domain::types::FailurePolicy;
use crate::importer::error::{FieldError, ImportError, ImportResult, RowError};
use crate::importer::question_importer_trait::{FileParser, RowMapper};
use crate::importer::template;
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use csv::ReaderBuilder;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Cursor;
use tracing::{debug, warn};

// ==========================================
// RawRow - 原始行
// ==========================================
// 值保持单元格原始类型（Excel 数值/布尔不转字符串；CSV 全部为字符串）
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRow {
    pub row_number: usize,
    pub fields: HashMap<String, Value>,
}

impl RawRow {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            fields: HashMap::new(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    /// 全部单元格为空（跳过，但不复用行号）
    fn is_blank(&self) -> bool {
        self.fields.values().all(|v| match v {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        })
    }
}

// ==========================================
// 来源格式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Excel,
    Csv,
}

impl SourceFormat {
    pub fn label(&self) -> &'static str {
        match self {
            SourceFormat::Excel => "Excel",
            SourceFormat::Csv => "CSV",
        }
    }

    /// 按扩展名识别（不区分大小写）
    pub fn from_extension(ext: &str) -> ImportResult<Self> {
        match ext.to_lowercase().as_str() {
            "xlsx" => Ok(SourceFormat::Excel),
            "csv" => Ok(SourceFormat::Csv),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_rows(&self, bytes: &[u8]) -> ImportResult<Vec<RawRow>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(bytes);

        // 读取表头
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        // 行号从 2 开始计数（第 1 行为表头）；字节流错误中止整个调用
        let mut rows = Vec::new();
        for (offset, result) in reader.records().enumerate() {
            let record = result?;
            let mut row = RawRow::new(offset + 2);

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row.insert(header.clone(), Value::String(value.trim().to_string()));
                }
            }

            // 跳过完全空白的行
            if row.is_blank() {
                debug!(row = row.row_number, "跳过空白 CSV 行");
                continue;
            }

            rows.push(row);
        }

        Ok(rows)
    }

    fn generate_template(&self) -> ImportResult<Vec<u8>> {
        template::generate_csv_template()
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_rows(&self, bytes: &[u8]) -> ImportResult<Vec<RawRow>> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("arquivo sem planilhas".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        // 已使用区域的起始行（0 基）
        let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);

        // 提取表头（第一行）
        let mut sheet_rows = range.rows();
        let Some(header_row) = sheet_rows.next() else {
            return Ok(Vec::new());
        };
        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        // 读取数据行
        let mut rows = Vec::new();
        for (offset, data_row) in sheet_rows.enumerate() {
            let mut row = RawRow::new(first_row + offset + 2);

            for (col_idx, cell) in data_row.iter().enumerate() {
                let Some(header) = headers.get(col_idx).filter(|h| !h.is_empty()) else {
                    continue;
                };
                if let Some(value) = cell_to_value(cell) {
                    row.insert(header.clone(), value);
                }
            }

            // 跳过完全空白的行
            if row.is_blank() {
                debug!(row = row.row_number, "跳过空白 Excel 行");
                continue;
            }

            rows.push(row);
        }

        Ok(rows)
    }

    fn generate_template(&self) -> ImportResult<Vec<u8>> {
        template::generate_excel_template()
    }
}

/// 单元格 → JSON 值（空单元格视为缺失）
fn cell_to_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty => None,
        Data::Int(i) => Some(Value::from(*i)),
        Data::Float(f) => serde_json::Number::from_f64(*f).map(Value::Number),
        Data::Bool(b) => Some(Value::Bool(*b)),
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(Value::String(trimmed.to_string()))
            }
        }
        other => Some(Value::String(other.to_string())),
    }
}

// ==========================================
// 行级结果 + 失败策略
// ==========================================

/// 单行映射结果
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub row_number: usize,
    pub index: usize,
    pub text: Option<String>, // 原始 text 单元格（失败报告用）
    pub outcome: Result<QuestionDraft, FieldError>,
}

impl ParsedRow {
    /// 转为批次条目: 成功行给出载荷，失败行给出报告条目
    pub fn into_entry(self) -> Result<QuestionDraft, FailedQuestion> {
        self.outcome.map_err(|err| FailedQuestion {
            index: self.index,
            text: self.text,
            error: RowError::from(err).to_string(),
        })
    }
}

/// 上传解析结果（仅解析，不落库）
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedUpload {
    pub questions: Vec<QuestionDraft>,
    pub errors: Vec<RowError>,
}

/// 逐行映射（惰性，FailFast 时可在首个失败行停止）
///
/// index 取已解析行中的位置（空行已跳过），row_number 仅用于"Linha N"提示
pub fn map_rows<'a, M: RowMapper + ?Sized>(
    mapper: &'a M,
    rows: &'a [RawRow],
) -> impl Iterator<Item = ParsedRow> + 'a {
    rows.iter().enumerate().map(move |(index, row)| ParsedRow {
        row_number: row.row_number,
        index,
        text: row
            .get("text")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string),
        outcome: mapper.map_row(row),
    })
}

/// 应用失败策略
///
/// # 规则
/// - FailFast: 首个失败行即返回 RowRejected（之前成功的行一并丢弃）
/// - AggregateThenReject: 处理全部行，存在失败行时返回 RowsRejected
/// - PartialSuccess: 全部行原样返回，由调用方分别处理
pub fn apply_failure_policy<I>(
    rows: I,
    policy: FailurePolicy,
    format: SourceFormat,
) -> ImportResult<Vec<ParsedRow>>
where
    I: IntoIterator<Item = ParsedRow>,
{
    match policy {
        FailurePolicy::FailFast => {
            let mut accepted = Vec::new();
            for row in rows {
                if let Err(err) = &row.outcome {
                    warn!(row = row.row_number, field = %err.field, "Erro na linha: {}", err);
                    return Err(ImportError::RowRejected {
                        row: row.row_number,
                        source: err.clone(),
                    });
                }
                accepted.push(row);
            }
            Ok(accepted)
        }
        FailurePolicy::AggregateThenReject => {
            let all: Vec<ParsedRow> = rows.into_iter().collect();
            let errors: Vec<RowError> = all
                .iter()
                .filter_map(|row| row.outcome.as_ref().err().cloned().map(RowError::from))
                .collect();

            if errors.is_empty() {
                return Ok(all);
            }

            let success_count = all.len() - errors.len();
            warn!(
                errors = errors.len(),
                success_count,
                format = format.label(),
                "erros encontrados no arquivo"
            );
            Err(ImportError::RowsRejected {
                message: format!("Erros ao processar {}", format.label()),
                errors,
                success_count,
            })
        }
        FailurePolicy::PartialSuccess => Ok(rows.into_iter().collect()),
    }
}

/// 解析 + 映射 + 失败策略（上传预览用）
pub fn parse_upload<M: RowMapper + ?Sized>(
    parser: &dyn FileParser,
    mapper: &M,
    bytes: &[u8],
    policy: FailurePolicy,
    format: SourceFormat,
) -> ImportResult<ParsedUpload> {
    let rows = parser.parse_rows(bytes)?;
    debug!(rows = rows.len(), format = format.label(), "linhas encontradas");

    let parsed = apply_failure_policy(map_rows(mapper, &rows), policy, format)?;

    let mut upload = ParsedUpload {
        questions: Vec::new(),
        errors: Vec::new(),
    };
    for row in parsed {
        match row.outcome {
            Ok(draft) => upload.questions.push(draft),
            Err(err) => upload.errors.push(RowError::from(err)),
        }
    }
    Ok(upload)
}
