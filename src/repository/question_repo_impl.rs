// ==========================================
// 问卷题库 - 题目 Repository 实现
// ==========================================
// 职责: 实现题目数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 并发: 修订写入在 IMMEDIATE 事务内复核谱系最大版本号
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::question::{GroupCount, Question, QuestionFilter, QuestionStatistics};
use crate::domain::types::EnumDomain;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::question_repo::QuestionRepository;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};
use serde_json::Value;
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    id, text, question_type, category, scope, is_required,
    min_value, max_value, validation_regex, help_text, options_json,
    likert_min, likert_max, likert_labels_json, objective, target_audience,
    origin, creator_id, research_group_id, version, parent_id, created_at
"#;

// ==========================================
// QuestionRow - 数据库行（未转换枚举/JSON）
// ==========================================
struct QuestionRow {
    id: String,
    text: String,
    question_type: String,
    category: String,
    scope: String,
    is_required: bool,
    min_value: Option<f64>,
    max_value: Option<f64>,
    validation_regex: Option<String>,
    help_text: Option<String>,
    options_json: Option<String>,
    likert_min: Option<i32>,
    likert_max: Option<i32>,
    likert_labels_json: Option<String>,
    objective: Option<String>,
    target_audience: Option<String>,
    origin: String,
    creator_id: String,
    research_group_id: Option<String>,
    version: i32,
    parent_id: Option<String>,
    created_at: String,
}

impl QuestionRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            text: row.get(1)?,
            question_type: row.get(2)?,
            category: row.get(3)?,
            scope: row.get(4)?,
            is_required: row.get(5)?,
            min_value: row.get(6)?,
            max_value: row.get(7)?,
            validation_regex: row.get(8)?,
            help_text: row.get(9)?,
            options_json: row.get(10)?,
            likert_min: row.get(11)?,
            likert_max: row.get(12)?,
            likert_labels_json: row.get(13)?,
            objective: row.get(14)?,
            target_audience: row.get(15)?,
            origin: row.get(16)?,
            creator_id: row.get(17)?,
            research_group_id: row.get(18)?,
            version: row.get(19)?,
            parent_id: row.get(20)?,
            created_at: row.get(21)?,
        })
    }

    fn into_question(self) -> RepositoryResult<Question> {
        Ok(Question {
            question_type: parse_enum(&self.question_type, "question_type")?,
            category: parse_enum(&self.category, "category")?,
            scope: parse_enum(&self.scope, "scope")?,
            options: parse_json_column(self.options_json.as_deref())?,
            likert_labels: parse_json_column(self.likert_labels_json.as_deref())?,
            created_at: parse_timestamp(&self.created_at)?,
            id: self.id,
            text: self.text,
            is_required: self.is_required,
            min_value: self.min_value,
            max_value: self.max_value,
            validation_regex: self.validation_regex,
            help_text: self.help_text,
            likert_min: self.likert_min,
            likert_max: self.likert_max,
            objective: self.objective,
            target_audience: self.target_audience,
            origin: self.origin,
            creator_id: self.creator_id,
            research_group_id: self.research_group_id,
            version: self.version,
            parent_id: self.parent_id,
        })
    }
}

fn parse_enum<E: EnumDomain>(raw: &str, field: &str) -> RepositoryResult<E> {
    E::from_token(raw).ok_or_else(|| RepositoryError::FieldValueError {
        field: field.to_string(),
        message: format!("未知取值: {}", raw),
    })
}

fn parse_json_column(raw: Option<&str>) -> RepositoryResult<Option<Value>> {
    match raw {
        Some(text) if !text.is_empty() => Ok(Some(serde_json::from_str(text)?)),
        _ => Ok(None),
    }
}

fn to_json_column(value: Option<&Value>) -> RepositoryResult<Option<String>> {
    value.map(serde_json::to_string).transpose().map_err(Into::into)
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(raw: &str) -> RepositoryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| RepositoryError::FieldValueError {
            field: "created_at".to_string(),
            message: e.to_string(),
        })
}

/// LIKE 模式转义（% _ \）
fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

// ==========================================
// QuestionRepositoryImpl
// ==========================================
pub struct QuestionRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl QuestionRepositoryImpl {
    /// 从共享连接创建（建表由调用方负责）
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 打开数据库文件并确保表结构存在
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入一行（事务内外通用）
    fn insert_row(conn: &Connection, q: &Question) -> RepositoryResult<()> {
        conn.execute(
            r#"INSERT INTO question (
                id, text, question_type, category, scope, is_required,
                min_value, max_value, validation_regex, help_text, options_json,
                likert_min, likert_max, likert_labels_json, objective, target_audience,
                origin, creator_id, research_group_id, version, parent_id, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22
            )"#,
            params![
                &q.id,
                &q.text,
                q.question_type.as_str(),
                q.category.as_str(),
                q.scope.as_str(),
                q.is_required,
                q.min_value,
                q.max_value,
                &q.validation_regex,
                &q.help_text,
                to_json_column(q.options.as_ref())?,
                q.likert_min,
                q.likert_max,
                to_json_column(q.likert_labels.as_ref())?,
                &q.objective,
                &q.target_audience,
                &q.origin,
                &q.creator_id,
                &q.research_group_id,
                q.version,
                &q.parent_id,
                format_timestamp(&q.created_at),
            ],
        )?;
        Ok(())
    }

    fn query_questions(
        conn: &Connection,
        sql: &str,
        values: &[String],
    ) -> RepositoryResult<Vec<Question>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), QuestionRow::from_row)?;

        let mut questions = Vec::new();
        for row in rows {
            questions.push(row?.into_question()?);
        }
        Ok(questions)
    }

    fn group_counts(conn: &Connection, column: &str) -> RepositoryResult<Vec<GroupCount>> {
        let sql = format!(
            "SELECT {col}, COUNT(*) FROM question GROUP BY {col} ORDER BY COUNT(*) DESC, {col}",
            col = column
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(GroupCount {
                key: row.get(0)?,
                count: row.get(1)?,
            })
        })?;

        let mut groups = Vec::new();
        for row in rows {
            groups.push(row?);
        }
        Ok(groups)
    }
}

#[async_trait]
impl QuestionRepository for QuestionRepositoryImpl {
    async fn insert(&self, question: &Question) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::insert_row(&conn, question)
    }

    async fn insert_revision(
        &self,
        question: &Question,
        base_version: i32,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let lineage_id = question.lineage_root_id().to_string();

        let latest: Option<i32> = tx.query_row(
            "SELECT MAX(version) FROM question WHERE COALESCE(parent_id, id) = ?1",
            params![&lineage_id],
            |row| row.get(0),
        )?;

        let latest = latest.ok_or_else(|| RepositoryError::NotFound {
            entity: "question".to_string(),
            id: lineage_id.clone(),
        })?;

        if latest != base_version {
            // tx 丢弃即回滚
            return Err(RepositoryError::OptimisticLockFailure {
                lineage_id,
                expected: base_version,
                actual: latest,
            });
        }

        Self::insert_row(&tx, question)?;
        tx.commit()?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM question WHERE id = ?1", params![id])?;
        Ok(affected)
    }

    async fn link_questionnaire(
        &self,
        questionnaire_id: &str,
        question_id: &str,
        position: i32,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO questionnaire_question (questionnaire_id, question_id, position)
               VALUES (?1, ?2, ?3)
               ON CONFLICT(questionnaire_id, question_id) DO UPDATE SET position = excluded.position"#,
            params![questionnaire_id, question_id, position],
        )?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Question>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM question WHERE id = ?1", SELECT_COLUMNS);

        match conn.query_row(&sql, params![id], QuestionRow::from_row) {
            Ok(row) => Ok(Some(row.into_question()?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_all(&self, filter: &QuestionFilter) -> RepositoryResult<Vec<Question>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(t) = filter.question_type {
            clauses.push("question_type = ?");
            values.push(t.as_str().to_string());
        }
        if let Some(c) = filter.category {
            clauses.push("category = ?");
            values.push(c.as_str().to_string());
        }
        if let Some(s) = filter.scope {
            clauses.push("scope = ?");
            values.push(s.as_str().to_string());
        }
        if let Some(origin) = &filter.origin {
            clauses.push("origin = ?");
            values.push(origin.clone());
        }
        if let Some(creator) = &filter.creator_id {
            clauses.push("creator_id = ?");
            values.push(creator.clone());
        }
        if let Some(group) = &filter.research_group_id {
            clauses.push("research_group_id = ?");
            values.push(group.clone());
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT {} FROM question {} ORDER BY created_at DESC, rowid DESC",
            SELECT_COLUMNS, where_sql
        );

        let conn = self.get_conn()?;
        Self::query_questions(&conn, &sql, &values)
    }

    async fn find_lineage(&self, root_id: &str) -> RepositoryResult<Vec<Question>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM question WHERE COALESCE(parent_id, id) = ?1 ORDER BY version ASC",
            SELECT_COLUMNS
        );
        Self::query_questions(&conn, &sql, &[root_id.to_string()])
    }

    async fn search_text(
        &self,
        keywords: &[String],
        limit: usize,
    ) -> RepositoryResult<Vec<Question>> {
        if keywords.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let conditions = vec!["lower(text) LIKE ? ESCAPE '\\'"; keywords.len()].join(" OR ");
        let sql = format!(
            "SELECT {} FROM question WHERE {} ORDER BY created_at DESC, rowid DESC LIMIT {}",
            SELECT_COLUMNS, conditions, limit
        );
        let values: Vec<String> = keywords
            .iter()
            .map(|k| like_pattern(&k.to_lowercase()))
            .collect();

        let conn = self.get_conn()?;
        Self::query_questions(&conn, &sql, &values)
    }

    async fn count_questionnaire_usage(&self, question_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT questionnaire_id) FROM questionnaire_question WHERE question_id = ?1",
            params![question_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    async fn count_child_versions(&self, question_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM question WHERE parent_id = ?1",
            params![question_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    async fn statistics(&self) -> RepositoryResult<QuestionStatistics> {
        let conn = self.get_conn()?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM question", [], |row| row.get(0))?;

        Ok(QuestionStatistics {
            total,
            by_type: Self::group_counts(&conn, "question_type")?,
            by_category: Self::group_counts(&conn, "category")?,
            by_origin: Self::group_counts(&conn, "origin")?,
        })
    }
}
