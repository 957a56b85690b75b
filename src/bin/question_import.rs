// Command-line importer: load an .xlsx/.csv question file into a question bank database
// and print the batch report as JSON.
//
// Usage:
//   question-import <file.xlsx|file.csv> <actor_id> [db_path] [--origin ORIGIN] [--group GROUP_ID]
//   question-import template <output_dir>
//
// Default db_path: <data_dir>/survey-question-bank/questions.db

use anyhow::{anyhow, bail, Context, Result};
use question_bank::domain::ImportOverrides;
use question_bank::{logging, ApiError, QuestionApi};
use std::path::{Path, PathBuf};

const USAGE: &str = "uso: question-import <arquivo.xlsx|arquivo.csv> <actor_id> [db_path] [--origin ORIGEM] [--group GRUPO]\n     question-import template <diretorio>";

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("-h") | Some("--help") => {
            println!("{}", USAGE);
            Ok(())
        }
        Some("template") => {
            let dir = args.get(1).ok_or_else(|| anyhow!("{}", USAGE))?;
            write_templates(Path::new(dir))
        }
        Some(_) => run_import(&args).await,
    }
}

async fn run_import(args: &[String]) -> Result<()> {
    let mut positional = Vec::new();
    let mut overrides = ImportOverrides::default();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--origin" => {
                overrides.default_origin =
                    Some(iter.next().context("--origin requer um valor")?.clone());
            }
            "--group" => {
                overrides.default_research_group_id =
                    Some(iter.next().context("--group requer um valor")?.clone());
            }
            _ => positional.push(arg.clone()),
        }
    }

    let (file, actor_id) = match positional.as_slice() {
        [file, actor_id, ..] => (PathBuf::from(file), actor_id.clone()),
        _ => bail!("{}", USAGE),
    };
    let db_path = match positional.get(2) {
        Some(path) => PathBuf::from(path),
        None => default_db_path()?,
    };

    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow!("caminho de banco inválido: {}", db_path.display()))?;
    let api = QuestionApi::new(db_path_str)?;

    match api.import_file(&file, &actor_id, &overrides).await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(err) => report_rejection(err),
    }
}

fn report_rejection(err: ApiError) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&err.to_body())?);
    Err(err.into())
}

fn default_db_path() -> Result<PathBuf> {
    let dir = dirs::data_dir()
        .context("diretório de dados do usuário indisponível")?
        .join("survey-question-bank");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("falha ao criar {}", dir.display()))?;
    Ok(dir.join("questions.db"))
}

fn write_templates(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("falha ao criar {}", dir.display()))?;

    let excel = question_bank::importer::template::generate_excel_template()?;
    let csv = question_bank::importer::template::generate_csv_template()?;

    let excel_path = dir.join("template_questoes.xlsx");
    let csv_path = dir.join("template_questoes.csv");
    std::fs::write(&excel_path, excel)?;
    std::fs::write(&csv_path, csv)?;

    println!("{}", excel_path.display());
    println!("{}", csv_path.display());
    Ok(())
}
