use sqlx::{Encode, PgConnection, Postgres, QueryBuilder, Type, postgres::PgPoolOptions};

use crate::{config::Config, content::Patch, error::Error};

/// 数据库连接池类型
pub type DBPool = sqlx::PgPool;

/// 根据 [`Config`] 创建数据库连接池
///
/// 连接池在进程启动时创建，经 [`crate::state::AppState`] 注入各处，
/// 退出前调用 [`DBPool::close`] 关闭。
pub async fn new_db_pool(config: &Config) -> Result<DBPool, sqlx::Error> {
    let pool = &config.pool;
    PgPoolOptions::new()
        .idle_timeout(pool.idle_timeout())
        .max_lifetime(pool.max_lifetime())
        .max_connections(pool.max_connections)
        .acquire_timeout(pool.acquire_timeout())
        .test_before_acquire(true)
        .min_connections(pool.min_connections)
        .connect(&config.database_url)
        .await
}

/// 执行 SQL 文件中的迁移语句
///
/// 将文件内容按 `;` 分割，每条 SQL 单独执行
pub async fn migrate(db: &DBPool, file: &str) -> Result<(), sqlx::Error> {
    let content = std::fs::read_to_string(file)?;

    for sql in content.split(';') {
        if sql.trim().is_empty() {
            continue;
        }
        sqlx::query(sql).execute(db).await?;
    }
    Ok(())
}

/// 根据操作结果提交或回滚事务
///
/// 失败时先回滚再返回原错误，回滚本身失败只记录日志。
pub async fn finish<T>(
    tx: sqlx::PgTransaction<'_>,
    result: crate::error::Result<T>,
    op: &'static str,
) -> crate::error::Result<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                tracing::error!(error = %rollback, op, "rollback failed");
            }
            tracing::error!(error = %e, op, "transaction rolled back");
            Err(e)
        }
    }
}

/// 在事务中锁定带版本号的行并校验 `expected_version`
///
/// 行不存在时返回 `false`，版本不一致时返回 [`Error::Conflict`]。
pub async fn lock_versioned(
    conn: &mut PgConnection,
    table: &'static str,
    id: i64,
    expected_version: Option<i32>,
) -> crate::error::Result<bool> {
    let sql = format!("SELECT version FROM {table} WHERE id = $1 FOR UPDATE");
    let version: Option<i32> = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match (version, expected_version) {
        (None, _) => Ok(false),
        (Some(current), Some(expected)) if current != expected => Err(Error::Conflict(format!(
            "{table} row {id} was modified concurrently (version {current}, expected {expected})"
        ))),
        _ => Ok(true),
    }
}

/// 动态拼接的 `UPDATE ... SET` 语句
///
/// 只有被调用 [`UpdateSet::set`] 的列会出现在 SQL 中，值全部以参数绑定。
pub struct UpdateSet<'a> {
    builder: QueryBuilder<'a, Postgres>,
    columns: usize,
}

impl<'a> UpdateSet<'a> {
    /// `head` 为固定的前缀，如 `UPDATE blog_posts SET updated_at = now()`
    pub fn new(head: &str) -> Self {
        Self {
            builder: QueryBuilder::new(head),
            columns: 0,
        }
    }

    pub fn set<T>(&mut self, column: &'static str, value: T) -> &mut Self
    where
        T: 'a + Encode<'a, Postgres> + Type<Postgres>,
    {
        self.builder.push(", ").push(column).push(" = ").push_bind(value);
        self.columns += 1;
        self
    }

    /// 仅在需要写入时追加
    pub fn set_some<T>(&mut self, column: &'static str, value: Option<T>) -> &mut Self
    where
        T: 'a + Encode<'a, Postgres> + Type<Postgres>,
    {
        if let Some(value) = value {
            self.set(column, value);
        }
        self
    }

    /// 按 [`Patch`] 语义追加，`Clear` 写入 `NULL`
    pub fn set_patch<T>(&mut self, column: &'static str, patch: Patch<T>) -> &mut Self
    where
        T: 'a + Encode<'a, Postgres> + Type<Postgres>,
    {
        if let Some(value) = patch.into_update() {
            self.set(column, value);
        }
        self
    }

    /// 除固定前缀外被修改的列数
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// 追加 `WHERE id = $n`
    pub fn where_id(mut self, id: i64) -> QueryBuilder<'a, Postgres> {
        self.builder.push(" WHERE id = ").push_bind(id);
        self.builder
    }
}
