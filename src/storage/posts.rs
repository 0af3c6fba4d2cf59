use chrono::{DateTime, Utc};
use sqlx::{PgConnection, QueryBuilder};

use super::{
    DBPool,
    associations::{attach_tags, replace_post_tags},
    filter::{Page, PostFilter, push_order},
    postgres::{UpdateSet, finish, lock_versioned},
    slugs::{SlugScope, base_slug, unique_slug},
};
use crate::{
    content::{BlogPost, NewPost, PostPatch, Publication},
    error::{Error, Result},
};

/// 文章查询的公共部分，文章表别名为 `p`
pub(crate) const POST_SELECT: &str = r#"
SELECT p.id, p.title, p.slug, p.content, p.excerpt, p.featured_image,
       p.author_id, u.name AS author_name,
       p.category_id, c.name AS category_name,
       p.published, p.published_at, p.status, p.views_count,
       p.meta_title, p.meta_description, p.version,
       p.created_at, p.updated_at
FROM blog_posts p
LEFT JOIN users u ON u.id = p.author_id
LEFT JOIN blog_categories c ON c.id = p.category_id
"#;

/// 博客文章存储
pub trait PostStore: Send + Sync {
    /// 按条件分页查询文章，结果附带标签
    fn list_posts(
        &self,
        filter: &PostFilter,
    ) -> impl std::future::Future<Output = Result<Page<BlogPost>>> + Send;

    fn post_by_id(&self, id: i64) -> impl std::future::Future<Output = Result<Option<BlogPost>>> + Send;

    /// 按 slug 查询文章
    ///
    /// `increment_views` 为真时，已发布文章的浏览数加一，草稿不计数。
    fn post_by_slug(
        &self,
        slug: &str,
        increment_views: bool,
    ) -> impl std::future::Future<Output = Result<Option<BlogPost>>> + Send;

    /// 新建文章，文章与标签在同一事务中写入
    fn create_post(&self, post: NewPost) -> impl std::future::Future<Output = Result<BlogPost>> + Send;

    /// 局部更新文章，文章不存在时返回 `None`
    fn update_post(
        &self,
        id: i64,
        patch: PostPatch,
    ) -> impl std::future::Future<Output = Result<Option<BlogPost>>> + Send;

    /// 删除文章，标签与商户关联级联删除
    fn delete_post(&self, id: i64) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// 整体替换文章标签
    fn set_post_tags(
        &self,
        id: i64,
        tag_ids: Vec<i64>,
    ) -> impl std::future::Future<Output = Result<Option<BlogPost>>> + Send;

    /// 发布所有到期的定时文章，返回被发布的文章 id
    fn publish_due_posts(
        &self,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Vec<i64>>> + Send;
}

impl PostStore for DBPool {
    async fn list_posts(&self, filter: &PostFilter) -> Result<Page<BlogPost>> {
        let pagination = filter.pagination();
        let (field, direction) = filter.sort();

        let mut query = QueryBuilder::new(POST_SELECT);
        filter.push_predicate(&mut query);
        push_order(&mut query, "p", field, direction);
        pagination.push_to(&mut query);
        let mut posts = query.build_query_as::<BlogPost>().fetch_all(self).await?;

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM blog_posts p");
        filter.push_predicate(&mut count);
        let total = count.build_query_scalar::<i64>().fetch_one(self).await?;

        attach_tags(self, &mut posts).await?;
        Ok(Page::new(posts, total, pagination))
    }

    async fn post_by_id(&self, id: i64) -> Result<Option<BlogPost>> {
        let sql = format!("{POST_SELECT} WHERE p.id = $1");
        let post: Option<BlogPost> = sqlx::query_as(&sql).bind(id).fetch_optional(self).await?;
        hydrate(self, post).await
    }

    async fn post_by_slug(&self, slug: &str, increment_views: bool) -> Result<Option<BlogPost>> {
        if increment_views {
            sqlx::query(
                "UPDATE blog_posts SET views_count = views_count + 1 WHERE slug = $1 AND published = TRUE",
            )
            .bind(slug)
            .execute(self)
            .await?;
        }

        let sql = format!("{POST_SELECT} WHERE p.slug = $1");
        let post: Option<BlogPost> = sqlx::query_as(&sql).bind(slug).fetch_optional(self).await?;
        hydrate(self, post).await
    }

    async fn create_post(&self, post: NewPost) -> Result<BlogPost> {
        post.validate()?;
        let publication = post.publish.resolve_for_create(Utc::now());

        let mut tx = self.begin().await?;
        let result = insert_post(&mut tx, post, publication).await;
        let id = finish(tx, result, "create post").await?;

        tracing::info!(id, status = %publication.status, "post created");
        self.post_by_id(id).await?.ok_or(Error::NotFound)
    }

    async fn update_post(&self, id: i64, patch: PostPatch) -> Result<Option<BlogPost>> {
        patch.validate()?;

        let mut tx = self.begin().await?;
        let result = apply_post_patch(&mut tx, id, patch, Utc::now()).await;
        if !finish(tx, result, "update post").await? {
            return Ok(None);
        }
        self.post_by_id(id).await
    }

    async fn delete_post(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
            .bind(id)
            .execute(self)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_post_tags(&self, id: i64, tag_ids: Vec<i64>) -> Result<Option<BlogPost>> {
        let mut tx = self.begin().await?;
        let result = retag_post(&mut tx, id, &tag_ids).await;
        if !finish(tx, result, "set post tags").await? {
            return Ok(None);
        }
        self.post_by_id(id).await
    }

    async fn publish_due_posts(&self, now: DateTime<Utc>) -> Result<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            UPDATE blog_posts
            SET status = 'published', published = TRUE,
                updated_at = now(), version = version + 1
            WHERE status = 'scheduled' AND published_at <= $1
            RETURNING id
            "#,
        )
        .bind(now)
        .fetch_all(self)
        .await?;

        if !ids.is_empty() {
            tracing::info!(count = ids.len(), ?ids, "scheduled posts published");
        }
        Ok(ids)
    }
}

async fn hydrate(db: &DBPool, post: Option<BlogPost>) -> Result<Option<BlogPost>> {
    let Some(post) = post else {
        return Ok(None);
    };
    let mut posts = [post];
    attach_tags(db, &mut posts).await?;
    let [post] = posts;
    Ok(Some(post))
}

async fn insert_post(conn: &mut PgConnection, post: NewPost, publication: Publication) -> Result<i64> {
    let base = base_slug(post.slug.as_deref(), &post.title)?;
    let slug = unique_slug(conn, SlugScope::Post, &base, None).await?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO blog_posts (
            title, slug, content, excerpt, featured_image, author_id, category_id,
            published, published_at, status, meta_title, meta_description
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING id
        "#,
    )
    .bind(&post.title)
    .bind(&slug)
    .bind(&post.content)
    .bind(&post.excerpt)
    .bind(&post.featured_image)
    .bind(post.author_id)
    .bind(post.category_id)
    .bind(publication.published)
    .bind(publication.published_at)
    .bind(publication.status)
    .bind(&post.meta_title)
    .bind(&post.meta_description)
    .fetch_one(&mut *conn)
    .await?;

    replace_post_tags(conn, id, &post.tag_ids).await?;
    Ok(id)
}

async fn apply_post_patch(
    conn: &mut PgConnection,
    id: i64,
    patch: PostPatch,
    now: DateTime<Utc>,
) -> Result<bool> {
    if !lock_versioned(conn, "blog_posts", id, patch.expected_version).await? {
        return Ok(false);
    }

    let mut update = UpdateSet::new("UPDATE blog_posts SET updated_at = now(), version = version + 1");
    if let Some(slug) = patch.slug {
        let slug = unique_slug(conn, SlugScope::Post, &slug, Some(id)).await?;
        update.set("slug", slug);
    }
    update
        .set_some("title", patch.title)
        .set_some("content", patch.content)
        .set_patch("excerpt", patch.excerpt)
        .set_patch("featured_image", patch.featured_image)
        .set_patch("category_id", patch.category_id)
        .set_patch("meta_title", patch.meta_title)
        .set_patch("meta_description", patch.meta_description);

    // 未携带发布意图时不修改发布字段
    if let Some(publication) = patch.publish.resolve(now) {
        update
            .set("status", publication.status)
            .set("published", publication.published)
            .set("published_at", publication.published_at);
    }

    update.where_id(id).build().execute(&mut *conn).await?;

    if let Some(tag_ids) = patch.tag_ids {
        replace_post_tags(conn, id, &tag_ids).await?;
    }
    Ok(true)
}

async fn retag_post(conn: &mut PgConnection, id: i64, tag_ids: &[i64]) -> Result<bool> {
    if !lock_versioned(conn, "blog_posts", id, None).await? {
        return Ok(false);
    }
    replace_post_tags(conn, id, tag_ids).await?;
    sqlx::query("UPDATE blog_posts SET updated_at = now(), version = version + 1 WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(true)
}
