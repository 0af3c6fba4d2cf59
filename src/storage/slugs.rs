use sqlx::PgConnection;

use crate::{
    content::slug::{generate_slug, time_suffix, with_suffix},
    error::{Error, Result},
};

const MAX_ATTEMPTS: usize = 8;

/// 拥有 slug 列的表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugScope {
    Post,
    BlogCategory,
    BlogTag,
    Listing,
    DirectoryCategory,
}

impl SlugScope {
    fn table(&self) -> &'static str {
        match self {
            SlugScope::Post => "blog_posts",
            SlugScope::BlogCategory => "blog_categories",
            SlugScope::BlogTag => "blog_tags",
            SlugScope::Listing => "directory_listings",
            SlugScope::DirectoryCategory => "directory_categories",
        }
    }
}

/// 选取 slug 的基础值：显式给出的 slug 优先，否则由名称生成
pub fn base_slug(explicit: Option<&str>, name: &str) -> Result<String> {
    let base = match explicit {
        Some(slug) => slug.to_string(),
        None => generate_slug(name),
    };
    if base.is_empty() {
        return Err(Error::validation(format!(
            "cannot derive a slug from `{name}`, provide one explicitly"
        )));
    }
    Ok(base)
}

/// 查询 slug 是否已被占用，`exclude_id` 用于更新时排除自身
pub async fn slug_taken(
    conn: &mut PgConnection,
    scope: SlugScope,
    slug: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let sql = format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE slug = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        scope.table()
    );
    Ok(sqlx::query_scalar(&sql)
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(conn)
        .await?)
}

/// 返回表内唯一的 slug
///
/// `base` 未被占用时原样返回，否则追加基于时间的 4 位后缀并重试。
pub async fn unique_slug(
    conn: &mut PgConnection,
    scope: SlugScope,
    base: &str,
    exclude_id: Option<i64>,
) -> Result<String> {
    if !slug_taken(conn, scope, base, exclude_id).await? {
        return Ok(base.to_string());
    }

    for attempt in 0..MAX_ATTEMPTS {
        let mut suffix = time_suffix();
        if attempt > 0 {
            // 同一毫秒内重试时错开后缀
            suffix.push_str(&attempt.to_string());
        }
        let candidate = with_suffix(base, &suffix);
        if !slug_taken(conn, scope, &candidate, exclude_id).await? {
            tracing::debug!(%base, %candidate, "slug collision resolved with suffix");
            return Ok(candidate);
        }
    }

    Err(Error::Conflict(format!("could not find a free slug for `{base}`")))
}
