// ==========================================
// 问卷题库 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 建表脚本集中在此处，幂等执行
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS question (
    id TEXT PRIMARY KEY,
    text TEXT NOT NULL,
    question_type TEXT NOT NULL,
    category TEXT NOT NULL,
    scope TEXT NOT NULL,
    is_required INTEGER NOT NULL DEFAULT 0,
    min_value REAL,
    max_value REAL,
    validation_regex TEXT,
    help_text TEXT,
    options_json TEXT,
    likert_min INTEGER,
    likert_max INTEGER,
    likert_labels_json TEXT,
    objective TEXT,
    target_audience TEXT,
    origin TEXT NOT NULL,
    creator_id TEXT NOT NULL,
    research_group_id TEXT,
    version INTEGER NOT NULL DEFAULT 1,
    parent_id TEXT REFERENCES question(id),
    created_at TEXT NOT NULL
);

-- 谱系内版本号唯一（根行的谱系根为自身 id）
CREATE UNIQUE INDEX IF NOT EXISTS ux_question_lineage_version
    ON question (COALESCE(parent_id, id), version);
CREATE INDEX IF NOT EXISTS ix_question_creator ON question (creator_id);
CREATE INDEX IF NOT EXISTS ix_question_parent ON question (parent_id);

CREATE TABLE IF NOT EXISTS questionnaire_question (
    questionnaire_id TEXT NOT NULL,
    question_id TEXT NOT NULL REFERENCES question(id),
    position INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (questionnaire_id, question_id)
);
CREATE INDEX IF NOT EXISTS ix_questionnaire_question_question
    ON questionnaire_question (question_id);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）并记录 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }
}
