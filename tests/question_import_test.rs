// ==========================================
// 题目导入集成测试
// ==========================================
// 测试目标: JSON 批次部分成功 / CSV 聚合拒绝 / Excel 首错拒绝 / 失败策略配置 / 模板回读
// ==========================================


use question_bank::config::config_keys;
use question_bank::domain::{
    ImportOverrides, ImportQuestionsRequest, QuestionStatistics, ORIGIN_IMPORTED,
};
use question_bank::ApiError;
use test_helpers::{create_test_api, csv_bytes, numeric_draft, xlsx_bytes, yes_no_draft};

const CSV_HEADER: &str = "text,type,category,scope,minValue,maxValue,origin";

#[tokio::test]
async fn test_json_batch_partial_success_keeps_indices() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");

    let request = ImportQuestionsRequest {
        questions: vec![
            numeric_draft("Qual é a sua idade?", 0.0, 120.0),
            yes_no_draft("Você fuma?"),
            numeric_draft("Qual é o seu peso?", 50.0, 10.0),
            yes_no_draft("Você bebe álcool?"),
            numeric_draft("Quantas horas dorme?", 0.0, 24.0),
        ],
        overrides: ImportOverrides::default(),
    };

    let report = api
        .import_questions(request, "pesq-1")
        .await
        .expect("batch import never rejects wholesale");

    assert_eq!(report.total, 5);
    assert_eq!(report.success.len(), 4);
    let indices: Vec<usize> = report.success.iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![0, 1, 3, 4]);

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].index, 2);
    assert_eq!(report.failed[0].text.as_deref(), Some("Qual é o seu peso?"));
    assert_eq!(
        report.failed[0].error,
        "minValue não pode ser maior que maxValue"
    );

    let stats = api.statistics().await.unwrap();
    assert_eq!(stats.total, 4);
}

#[tokio::test]
async fn test_json_request_deserialization_and_overrides() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");

    let payload = serde_json::json!({
        "questions": [
            { "text": "Você fuma?", "type": "SIM_NAO", "category": "HABITOS", "scope": "LOCAL",
              "origin": "IMPORTED_EXCEL" },
            { "text": "Qual é a sua idade?", "type": "NUMERICA", "category": "DEMOGRAFICA",
              "scope": "NACIONAL", "minValue": 0, "maxValue": 120 }
        ],
        "defaultOrigin": "AI_CLAUDE",
        "defaultResearchGroupId": "grupo-1"
    });
    let request: ImportQuestionsRequest = serde_json::from_value(payload).unwrap();

    let report = api.import_questions(request, "pesq-1").await.unwrap();
    assert_eq!(report.success.len(), 2);

    for imported in &report.success {
        let detail = api.get_question(&imported.id).await.unwrap();
        assert_eq!(detail.question.origin, "AI_CLAUDE");
        assert_eq!(detail.question.research_group_id.as_deref(), Some("grupo-1"));
    }
}

#[tokio::test]
async fn test_import_origin_falls_back_to_row_then_config() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");

    let mut with_origin = yes_no_draft("Você fuma?");
    with_origin.origin = Some("IMPORTED_EXCEL".to_string());
    let request = ImportQuestionsRequest {
        questions: vec![with_origin, yes_no_draft("Você bebe café?")],
        overrides: ImportOverrides::default(),
    };

    let report = api.import_questions(request, "pesq-1").await.unwrap();

    let first = api.get_question(&report.success[0].id).await.unwrap();
    let second = api.get_question(&report.success[1].id).await.unwrap();
    assert_eq!(first.question.origin, "IMPORTED_EXCEL");
    assert_eq!(second.question.origin, ORIGIN_IMPORTED);
}

#[tokio::test]
async fn test_csv_import_all_valid() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");

    let bytes = csv_bytes(
        CSV_HEADER,
        &[
            "Qual é a sua idade?,NUMERICA,DEMOGRAFICA,LOCAL,0,120,",
            "Você fuma?,sim nao,habitos,Nacional,,,",
        ],
    );

    let report = api
        .import_csv(&bytes, "pesq-1", &ImportOverrides::default())
        .await
        .unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.success.len(), 2);
    assert!(report.failed.is_empty());

    let stats = api.statistics().await.unwrap();
    assert_eq!(QuestionStatistics::count_for(&stats.by_origin, ORIGIN_IMPORTED), 2);
}

#[tokio::test]
async fn test_csv_import_aggregate_rejection() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");

    let bytes = csv_bytes(
        CSV_HEADER,
        &[
            "Qual é a sua idade?,NUMERICA,DEMOGRAFICA,LOCAL,0,120,",
            ",NUMERICA,DEMOGRAFICA,LOCAL,0,120,",
            "Você fuma?,SIM_NAO,HABITOS,LOCAL,,,",
        ],
    );

    let err = api
        .import_csv(&bytes, "pesq-1", &ImportOverrides::default())
        .await
        .unwrap_err();

    match &err {
        ApiError::ImportRejected {
            message,
            errors,
            success_count,
        } => {
            assert_eq!(message, "Erros ao processar CSV");
            assert_eq!(*success_count, 2);
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].row, 3);
            assert_eq!(errors[0].field, "text");
        }
        other => panic!("Expected ImportRejected, got {:?}", other),
    }
    assert_eq!(err.status_code(), 400);

    // 整体拒绝时不落库
    let stats = api.statistics().await.unwrap();
    assert_eq!(stats.total, 0);
}

#[tokio::test]
async fn test_excel_import_fail_fast() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");

    let bytes = xlsx_bytes(
        &["text", "type", "category", "scope", "likertMin", "likertMax"],
        &[
            vec!["Você fuma?", "SIM_NAO", "HABITOS", "LOCAL", "", ""],
            vec!["Quão satisfeito está?", "ESCALA_LIKERT", "PSICOLOGICA", "LOCAL", "5", "1"],
            vec!["Você bebe café?", "SIM_NAO", "HABITOS", "LOCAL", "", ""],
        ],
    )
    .unwrap();

    let err = api
        .import_excel(&bytes, "pesq-1", &ImportOverrides::default())
        .await
        .unwrap_err();

    match &err {
        ApiError::ValidationError {
            message,
            field,
            row,
        } => {
            assert_eq!(*row, Some(3));
            assert_eq!(field.as_deref(), Some("likertMin"));
            assert_eq!(
                message,
                "Erro na linha 3: likertMin deve ser menor que likertMax"
            );
        }
        other => panic!("Expected ValidationError, got {:?}", other),
    }

    let stats = api.statistics().await.unwrap();
    assert_eq!(stats.total, 0);
}

#[tokio::test]
async fn test_partial_success_policy_from_config() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");
    api.set_config(config_keys::CSV_FAILURE_POLICY, "PARTIAL_SUCCESS")
        .unwrap();

    let bytes = csv_bytes(
        CSV_HEADER,
        &[
            "Qual é a sua idade?,NUMERICA,DEMOGRAFICA,LOCAL,0,120,",
            "Peso,NUMERICA,CLINICA,LOCAL,abc,,",
            "Você fuma?,SIM_NAO,HABITOS,LOCAL,,,",
        ],
    );

    let report = api
        .import_csv(&bytes, "pesq-1", &ImportOverrides::default())
        .await
        .unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.success.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].index, 1);
    assert_eq!(report.failed[0].text.as_deref(), Some("Peso"));
    assert_eq!(report.failed[0].error, "Linha 3: minValue deve ser numérico");
}

#[tokio::test]
async fn test_partial_success_indices_skip_blank_rows() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");
    api.set_config(config_keys::CSV_FAILURE_POLICY, "PARTIAL_SUCCESS")
        .unwrap();

    let bytes = csv_bytes(
        CSV_HEADER,
        &[
            ",,,,,,",
            ",,,,,,",
            "Qual é a sua idade?,NUMERICA,DEMOGRAFICA,LOCAL,0,120,",
            "Peso,NUMERICA,CLINICA,LOCAL,abc,,",
        ],
    );

    let report = api
        .import_csv(&bytes, "pesq-1", &ImportOverrides::default())
        .await
        .unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.success.len(), 1);
    assert_eq!(report.success[0].index, 0);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].index, 1);
    // 提示仍使用物理行号
    assert_eq!(report.failed[0].error, "Linha 5: minValue deve ser numérico");
    assert!(report
        .success
        .iter()
        .map(|s| s.index)
        .chain(report.failed.iter().map(|f| f.index))
        .all(|index| index < report.total));
}

#[tokio::test]
async fn test_set_config_rejects_unknown_policy() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");

    let err = api
        .set_config(config_keys::EXCEL_FAILURE_POLICY, "ALWAYS")
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    api.set_config(config_keys::DEFAULT_ORIGIN, "AI_CLAUDE").unwrap();
    assert_eq!(
        api.get_config(config_keys::DEFAULT_ORIGIN).unwrap().as_deref(),
        Some("AI_CLAUDE")
    );
}

#[tokio::test]
async fn test_upload_parses_without_persisting() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");

    let bytes = csv_bytes(
        CSV_HEADER,
        &["Qual é a sua idade?,NUMERICA,DEMOGRAFICA,LOCAL,0,120,"],
    );

    let upload = api.upload_csv(&bytes).await.unwrap();
    assert_eq!(upload.questions.len(), 1);
    assert!(upload.errors.is_empty());

    let stats = api.statistics().await.unwrap();
    assert_eq!(stats.total, 0);
}

#[tokio::test]
async fn test_templates_round_trip() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");

    let csv_template = api.csv_template().unwrap();
    let csv_upload = api.upload_csv(&csv_template).await.unwrap();
    assert_eq!(csv_upload.questions.len(), 3);
    assert!(csv_upload.errors.is_empty());

    let excel_template = api.excel_template().unwrap();
    let excel_upload = api.upload_excel(&excel_template).await.unwrap();
    assert_eq!(excel_upload.questions.len(), 3);
    assert!(excel_upload.errors.is_empty());

    assert_eq!(csv_upload.questions, excel_upload.questions);

    let report = api
        .import_excel(&excel_template, "pesq-1", &ImportOverrides::default())
        .await
        .unwrap();
    assert_eq!(report.success.len(), 3);
}
