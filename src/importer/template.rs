// ==========================================
// 问卷题库 - 导入模板生成
// ==========================================
// 职责: 生成表头 + 示例行的下载模板（Excel / CSV）
// 约束: 列顺序与导入列契约一致；示例行必须能通过行映射校验
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use csv::{QuoteStyle, WriterBuilder};
use rust_xlsxwriter::Workbook;

/// 模板工作表名
pub const TEMPLATE_SHEET_NAME: &str = "Questões";

/// 导入列契约（模板列顺序）
pub const TEMPLATE_COLUMNS: [&str; 15] = [
    "text",
    "type",
    "category",
    "scope",
    "isRequired",
    "minValue",
    "maxValue",
    "helpText",
    "options",
    "likertMin",
    "likertMax",
    "likertLabels",
    "objective",
    "targetAudience",
    "origin",
];

/// Excel 中按数值写入的列
const NUMERIC_COLUMNS: [&str; 4] = ["minValue", "maxValue", "likertMin", "likertMax"];

/// 示例行（与 TEMPLATE_COLUMNS 一一对应，空串表示不填）
pub fn template_examples() -> Vec<[&'static str; 15]> {
    vec![
        [
            "Qual é a sua idade?",
            "NUMERICA",
            "DEMOGRAFICA",
            "LOCAL",
            "true",
            "0",
            "120",
            "Informe sua idade em anos completos",
            "",
            "",
            "",
            "",
            "Coletar dados demográficos",
            "Todos os participantes",
            "IMPORTED",
        ],
        [
            "Qual o seu nível de escolaridade?",
            "MULTIPLA_ESCOLHA",
            "DEMOGRAFICA",
            "NACIONAL",
            "true",
            "",
            "",
            "",
            r#"{"choices":["Fundamental","Médio","Superior","Pós-graduação"]}"#,
            "",
            "",
            "",
            "Identificar perfil educacional",
            "",
            "IMPORTED",
        ],
        [
            "Como você avalia o atendimento?",
            "ESCALA_LIKERT",
            "COMPORTAMENTAL",
            "LOCAL",
            "true",
            "",
            "",
            "",
            "",
            "1",
            "5",
            r#"{"1":"Muito insatisfeito","5":"Muito satisfeito"}"#,
            "",
            "",
            "IMPORTED",
        ],
    ]
}

/// 生成 Excel 模板（.xlsx 字节）
pub fn generate_excel_template() -> ImportResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(TEMPLATE_SHEET_NAME)?;

    for (col, header) in TEMPLATE_COLUMNS.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }

    for (idx, example) in template_examples().iter().enumerate() {
        let row = (idx + 1) as u32;
        for (col, (header, cell)) in TEMPLATE_COLUMNS.iter().zip(example.iter()).enumerate() {
            if cell.is_empty() {
                continue;
            }
            let number = NUMERIC_COLUMNS
                .contains(header)
                .then(|| cell.parse::<f64>().ok())
                .flatten();
            match number {
                Some(n) => sheet.write_number(row, col as u16, n)?,
                None => sheet.write_string(row, col as u16, *cell)?,
            };
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// 生成 CSV 模板（UTF-8，全部单元格加引号）
pub fn generate_csv_template() -> ImportResult<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(TEMPLATE_COLUMNS)?;
    for example in template_examples() {
        writer.write_record(example)?;
    }

    writer
        .into_inner()
        .map_err(|e| ImportError::TemplateError(e.to_string()))
}
