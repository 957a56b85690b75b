// ==========================================
// 题目维护集成测试
// ==========================================
// 测试目标: 创建 / 写时复制修订 / 受保护删除 / 查询
// ==========================================


use question_bank::domain::{QuestionFilter, QuestionType, QuestionUpdate, ORIGIN_MANUAL};
use question_bank::ApiError;
use std::sync::Arc;
use test_helpers::{create_test_api, numeric_draft, yes_no_draft};

fn text_update(text: &str) -> QuestionUpdate {
    QuestionUpdate {
        text: Some(text.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_create_defaults_origin_to_manual() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");

    let question = api
        .create_question(numeric_draft("  Qual é a sua idade?  ", 0.0, 120.0), "pesq-1")
        .await
        .expect("create should succeed");

    assert_eq!(question.text, "Qual é a sua idade?");
    assert_eq!(question.origin, ORIGIN_MANUAL);
    assert_eq!(question.version, 1);
    assert!(question.parent_id.is_none());
    assert!(!question.is_required);
}

#[tokio::test]
async fn test_create_rejects_invalid_numeric_range() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");

    let err = api
        .create_question(numeric_draft("Peso", 50.0, 10.0), "pesq-1")
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert_eq!(err.to_string(), "minValue não pode ser maior que maxValue");
}

#[tokio::test]
async fn test_revisions_share_lineage_root() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");

    let v1 = api
        .create_question(yes_no_draft("Você fuma?"), "pesq-1")
        .await
        .unwrap();

    let v2 = api
        .update_question(&v1.id, text_update("Você fuma atualmente?"), "pesq-1")
        .await
        .expect("first revision should succeed");
    assert_eq!(v2.version, 2);
    assert_eq!(v2.parent_id.as_deref(), Some(v1.id.as_str()));

    let v3 = api
        .update_question(&v2.id, text_update("Você fuma diariamente?"), "pesq-1")
        .await
        .expect("second revision should succeed");
    assert_eq!(v3.version, 3);
    assert_eq!(v3.parent_id.as_deref(), Some(v1.id.as_str()));

    // 旧版本保持不变
    let original = api.get_question(&v1.id).await.unwrap();
    assert_eq!(original.question.text, "Você fuma?");
    assert_eq!(original.question.version, 1);

    let versions: Vec<i32> = original.versions.iter().map(|v| v.version).collect();
    assert_eq!(versions, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_revision_keeps_fields_not_in_update() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");

    let v1 = api
        .create_question(numeric_draft("Qual é a sua altura?", 50.0, 250.0), "pesq-1")
        .await
        .unwrap();

    let update = QuestionUpdate {
        max_value: Some(Some(230.0)),
        ..Default::default()
    };
    let v2 = api.update_question(&v1.id, update, "pesq-1").await.unwrap();

    assert_eq!(v2.text, "Qual é a sua altura?");
    assert_eq!(v2.question_type, QuestionType::Numeric);
    assert_eq!(v2.min_value, Some(50.0));
    assert_eq!(v2.max_value, Some(230.0));
    assert_eq!(v2.creator_id, "pesq-1");
}

#[tokio::test]
async fn test_revision_explicit_null_clears_fields() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");

    let mut draft = yes_no_draft("Você fuma?");
    draft.help_text = Some("ajuda antiga".to_string());
    draft.validation_regex = Some("^x$".to_string());
    draft.research_group_id = Some("grupo-1".to_string());
    let v1 = api.create_question(draft, "pesq-1").await.unwrap();

    let update: QuestionUpdate =
        serde_json::from_str(r#"{"helpText": null, "validationRegex": null}"#).unwrap();
    let v2 = api.update_question(&v1.id, update, "pesq-1").await.unwrap();

    assert_eq!(v2.help_text, None);
    assert_eq!(v2.validation_regex, None);
    // 未出现的字段沿用当前版本
    assert_eq!(v2.research_group_id.as_deref(), Some("grupo-1"));

    let stored = api.get_question(&v2.id).await.unwrap();
    assert_eq!(stored.question.help_text, None);
    assert_eq!(stored.question.validation_regex, None);

    let original = api.get_question(&v1.id).await.unwrap();
    assert_eq!(original.question.help_text.as_deref(), Some("ajuda antiga"));
}

#[tokio::test]
async fn test_revision_text_is_trimmed() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");

    let v1 = api
        .create_question(yes_no_draft("Você fuma?"), "pesq-1")
        .await
        .unwrap();

    let v2 = api
        .update_question(&v1.id, text_update("  Você fuma hoje?  "), "pesq-1")
        .await
        .unwrap();
    assert_eq!(v2.text, "Você fuma hoje?");

    let err = api
        .update_question(&v2.id, text_update("   "), "pesq-1")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_revision_merged_row_is_validated() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");

    let v1 = api
        .create_question(numeric_draft("Qual é a sua altura?", 50.0, 250.0), "pesq-1")
        .await
        .unwrap();

    let update = QuestionUpdate {
        min_value: Some(Some(300.0)),
        ..Default::default()
    };
    let err = api.update_question(&v1.id, update, "pesq-1").await.unwrap_err();
    assert_eq!(err.status_code(), 400);

    let detail = api.get_question(&v1.id).await.unwrap();
    assert_eq!(detail.versions.len(), 1);
}

#[tokio::test]
async fn test_update_by_non_creator_is_forbidden() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");

    let v1 = api
        .create_question(yes_no_draft("Você fuma?"), "user-a")
        .await
        .unwrap();

    let err = api
        .update_question(&v1.id, text_update("Texto alterado"), "user-b")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Forbidden(_)));
    assert_eq!(err.status_code(), 403);

    // 没有产生新版本
    let detail = api.get_question(&v1.id).await.unwrap();
    assert_eq!(detail.versions.len(), 1);
}

#[tokio::test]
async fn test_update_from_stale_version_conflicts() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");

    let v1 = api
        .create_question(yes_no_draft("Você fuma?"), "pesq-1")
        .await
        .unwrap();
    api.update_question(&v1.id, text_update("Você fuma atualmente?"), "pesq-1")
        .await
        .unwrap();

    let err = api
        .update_question(&v1.id, text_update("Outra edição"), "pesq-1")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::VersionConflict(_)));
    assert_eq!(err.status_code(), 409);
}

#[tokio::test]
async fn test_concurrent_revisions_only_one_wins() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");
    let api = Arc::new(api);

    let v1 = api
        .create_question(yes_no_draft("Você fuma?"), "pesq-1")
        .await
        .unwrap();

    let a = {
        let api = api.clone();
        let id = v1.id.clone();
        tokio::spawn(async move { api.update_question(&id, text_update("Edição A"), "pesq-1").await })
    };
    let b = {
        let api = api.clone();
        let id = v1.id.clone();
        tokio::spawn(async move { api.update_question(&id, text_update("Edição B"), "pesq-1").await })
    };

    let results = vec![a.await.unwrap(), b.await.unwrap()];
    let ok = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(ApiError::VersionConflict(_))))
        .count();

    assert_eq!(ok, 1);
    assert_eq!(conflicts, 1);

    let detail = api.get_question(&v1.id).await.unwrap();
    let versions: Vec<i32> = detail.versions.iter().map(|v| v.version).collect();
    assert_eq!(versions, vec![1, 2]);
}

#[tokio::test]
async fn test_delete_blocked_by_questionnaire_usage() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");

    let question = api
        .create_question(yes_no_draft("Você pratica exercícios?"), "pesq-1")
        .await
        .unwrap();
    for (i, questionnaire) in ["qn-1", "qn-2", "qn-3"].iter().enumerate() {
        api.link_questionnaire(questionnaire, &question.id, i as i32 + 1)
            .await
            .unwrap();
    }

    let err = api.delete_question(&question.id, "pesq-1").await.unwrap_err();

    assert_eq!(err.status_code(), 409);
    assert!(err.to_string().contains("3 questionário(s)"));
}

#[tokio::test]
async fn test_delete_unreferenced_question() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");

    let question = api
        .create_question(yes_no_draft("Você pratica exercícios?"), "pesq-1")
        .await
        .unwrap();

    api.delete_question(&question.id, "pesq-1")
        .await
        .expect("delete should succeed");

    let err = api.get_question(&question.id).await.unwrap_err();
    assert_eq!(err.status_code(), 404);
    assert_eq!(
        err.to_string(),
        format!("Questão com ID {} não encontrada", question.id)
    );
}

#[tokio::test]
async fn test_delete_rules() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");

    let root = api
        .create_question(yes_no_draft("Você fuma?"), "pesq-1")
        .await
        .unwrap();
    api.update_question(&root.id, text_update("Você fuma hoje?"), "pesq-1")
        .await
        .unwrap();

    // 非创建者
    let err = api.delete_question(&root.id, "pesq-2").await.unwrap_err();
    assert_eq!(err.status_code(), 403);

    // 谱系根仍有派生版本
    let err = api.delete_question(&root.id, "pesq-1").await.unwrap_err();
    assert_eq!(err.status_code(), 409);
    assert!(err.to_string().contains("1 versão(ões) derivada(s)"));
}

#[tokio::test]
async fn test_list_similar_and_statistics() {
    let (_temp_file, api) = create_test_api().expect("Failed to create test api");

    api.create_question(numeric_draft("Qual é a sua idade?", 0.0, 120.0), "pesq-1")
        .await
        .unwrap();
    api.create_question(yes_no_draft("Você fuma cigarros?"), "pesq-1")
        .await
        .unwrap();
    api.create_question(yes_no_draft("Você bebe café?"), "pesq-2")
        .await
        .unwrap();

    let filter = QuestionFilter {
        question_type: Some(QuestionType::YesNo),
        ..Default::default()
    };
    let yes_no = api.list_questions(&filter).await.unwrap();
    assert_eq!(yes_no.len(), 2);
    // 最新在前
    assert_eq!(yes_no[0].text, "Você bebe café?");

    let similar = api.find_similar("IDADE do participante", None).await.unwrap();
    assert_eq!(similar.len(), 1);
    assert_eq!(similar[0].text, "Qual é a sua idade?");

    let stats = api.statistics().await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(
        question_bank::domain::QuestionStatistics::count_for(&stats.by_type, "SIM_NAO"),
        2
    );
    assert_eq!(
        question_bank::domain::QuestionStatistics::count_for(&stats.by_origin, ORIGIN_MANUAL),
        3
    );
}
