use std::collections::HashMap;

use sqlx::PgConnection;

use super::{DBPool, listings::LISTING_SELECT, posts::POST_SELECT};
use crate::{
    content::{BlogPost, DirectoryListing, ListingRow, TagRef},
    error::Result,
};

/// 替换文章的全部标签
///
/// 先删除全部旧关联再插入新集合，不做差异比较，需在调用方的事务中执行。
/// 不存在的标签 id 会触发外键错误，整个事务随之回滚。
pub async fn replace_post_tags(conn: &mut PgConnection, post_id: i64, tag_ids: &[i64]) -> Result<()> {
    sqlx::query("DELETE FROM blog_post_tags WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut *conn)
        .await?;

    if tag_ids.is_empty() {
        return Ok(());
    }

    let mut ids = tag_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    sqlx::query(
        r#"
        INSERT INTO blog_post_tags (post_id, tag_id)
        SELECT $1, UNNEST($2::BIGINT[])
        "#,
    )
    .bind(post_id)
    .bind(&ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// 按文章 id 批量查询标签
pub async fn tags_for_posts(db: &DBPool, post_ids: &[i64]) -> Result<HashMap<i64, Vec<TagRef>>> {
    if post_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i64, i64, String, String)> = sqlx::query_as(
        r#"
        SELECT pt.post_id, t.id, t.name, t.slug
        FROM blog_post_tags pt
        INNER JOIN blog_tags t ON t.id = pt.tag_id
        WHERE pt.post_id = ANY($1)
        ORDER BY t.name
        "#,
    )
    .bind(post_ids)
    .fetch_all(db)
    .await?;

    let mut tags: HashMap<i64, Vec<TagRef>> = HashMap::new();
    for (post_id, id, name, slug) in rows {
        tags.entry(post_id)
            .or_default()
            .push(TagRef { id, name, slug });
    }
    Ok(tags)
}

/// 为文章列表填充标签
pub async fn attach_tags(db: &DBPool, posts: &mut [BlogPost]) -> Result<()> {
    let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
    let mut tags = tags_for_posts(db, &ids).await?;
    for post in posts {
        post.tags = tags.remove(&post.id).unwrap_or_default();
    }
    Ok(())
}

/// 文章与商户之间的关联
pub trait LinkStore: Send + Sync {
    /// 建立关联，已存在时不做任何事
    fn link_post_listing(
        &self,
        post_id: i64,
        listing_id: i64,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// 删除关联，返回是否确有记录被删除
    fn unlink_post_listing(
        &self,
        post_id: i64,
        listing_id: i64,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// 文章中提到的商户
    fn listings_for_post(
        &self,
        post_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<DirectoryListing>>> + Send;

    /// 提到该商户的文章
    fn posts_for_listing(
        &self,
        listing_id: i64,
        published_only: bool,
    ) -> impl std::future::Future<Output = Result<Vec<BlogPost>>> + Send;
}

impl LinkStore for DBPool {
    async fn link_post_listing(&self, post_id: i64, listing_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO blog_post_listings (post_id, listing_id)
            VALUES ($1, $2)
            ON CONFLICT (post_id, listing_id) DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(listing_id)
        .execute(self)
        .await?;
        Ok(())
    }

    async fn unlink_post_listing(&self, post_id: i64, listing_id: i64) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM blog_post_listings WHERE post_id = $1 AND listing_id = $2")
                .bind(post_id)
                .bind(listing_id)
                .execute(self)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn listings_for_post(&self, post_id: i64) -> Result<Vec<DirectoryListing>> {
        let sql = format!(
            "{LISTING_SELECT}
            INNER JOIN blog_post_listings bl ON bl.listing_id = l.id
            WHERE bl.post_id = $1
            ORDER BY l.name"
        );
        let rows: Vec<ListingRow> = sqlx::query_as(&sql).bind(post_id).fetch_all(self).await?;
        Ok(rows.into_iter().map(DirectoryListing::from).collect())
    }

    async fn posts_for_listing(&self, listing_id: i64, published_only: bool) -> Result<Vec<BlogPost>> {
        let sql = format!(
            "{POST_SELECT}
            INNER JOIN blog_post_listings bl ON bl.post_id = p.id
            WHERE bl.listing_id = $1
            AND ($2 = FALSE OR p.published = TRUE)
            ORDER BY p.published_at DESC NULLS LAST, p.id DESC"
        );
        let mut posts: Vec<BlogPost> = sqlx::query_as(&sql)
            .bind(listing_id)
            .bind(published_only)
            .fetch_all(self)
            .await?;
        attach_tags(self, &mut posts).await?;
        Ok(posts)
    }
}
