use super::{
    DBPool,
    postgres::UpdateSet,
    slugs::{SlugScope, base_slug, unique_slug},
};
use crate::{
    content::{Category, NewTerm, Tag, TermPatch},
    error::{Error, Result},
};

/// 分类所属的板块
///
/// 博客分类与商户分类结构相同，只有表名和删除策略不同：
/// 删除博客分类时文章的 `category_id` 置空，商户分类下仍有商户时拒绝删除。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    Blog,
    Directory,
}

impl CategoryKind {
    fn table(&self) -> &'static str {
        match self {
            CategoryKind::Blog => "blog_categories",
            CategoryKind::Directory => "directory_categories",
        }
    }

    fn items_table(&self) -> &'static str {
        match self {
            CategoryKind::Blog => "blog_posts",
            CategoryKind::Directory => "directory_listings",
        }
    }

    fn scope(&self) -> SlugScope {
        match self {
            CategoryKind::Blog => SlugScope::BlogCategory,
            CategoryKind::Directory => SlugScope::DirectoryCategory,
        }
    }

    fn select(&self) -> String {
        format!(
            r#"
            SELECT c.id, c.name, c.slug, c.description, c.created_at, c.updated_at,
                   (SELECT COUNT(*) FROM {items} i WHERE i.category_id = c.id) AS item_count
            FROM {table} c
            "#,
            items = self.items_table(),
            table = self.table(),
        )
    }
}

const TAG_SELECT: &str = r#"
SELECT t.id, t.name, t.slug, t.created_at,
       (SELECT COUNT(*) FROM blog_post_tags pt WHERE pt.tag_id = t.id) AS post_count
FROM blog_tags t
"#;

/// 分类与标签存储
pub trait TaxonomyStore: Send + Sync {
    /// 按名称排序列出分类，附带文章或商户数量
    fn list_categories(
        &self,
        kind: CategoryKind,
    ) -> impl std::future::Future<Output = Result<Vec<Category>>> + Send;

    fn category_by_id(
        &self,
        kind: CategoryKind,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<Category>>> + Send;

    fn category_by_slug(
        &self,
        kind: CategoryKind,
        slug: &str,
    ) -> impl std::future::Future<Output = Result<Option<Category>>> + Send;

    fn create_category(
        &self,
        kind: CategoryKind,
        term: NewTerm,
    ) -> impl std::future::Future<Output = Result<Category>> + Send;

    fn update_category(
        &self,
        kind: CategoryKind,
        id: i64,
        patch: TermPatch,
    ) -> impl std::future::Future<Output = Result<Option<Category>>> + Send;

    fn delete_category(
        &self,
        kind: CategoryKind,
        id: i64,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn list_tags(&self) -> impl std::future::Future<Output = Result<Vec<Tag>>> + Send;

    fn tag_by_id(&self, id: i64) -> impl std::future::Future<Output = Result<Option<Tag>>> + Send;

    fn tag_by_slug(&self, slug: &str) -> impl std::future::Future<Output = Result<Option<Tag>>> + Send;

    fn create_tag(&self, term: NewTerm) -> impl std::future::Future<Output = Result<Tag>> + Send;

    fn update_tag(
        &self,
        id: i64,
        patch: TermPatch,
    ) -> impl std::future::Future<Output = Result<Option<Tag>>> + Send;

    fn delete_tag(&self, id: i64) -> impl std::future::Future<Output = Result<bool>> + Send;
}

impl TaxonomyStore for DBPool {
    async fn list_categories(&self, kind: CategoryKind) -> Result<Vec<Category>> {
        let sql = format!("{} ORDER BY c.name, c.id", kind.select());
        Ok(sqlx::query_as(&sql).fetch_all(self).await?)
    }

    async fn category_by_id(&self, kind: CategoryKind, id: i64) -> Result<Option<Category>> {
        let sql = format!("{} WHERE c.id = $1", kind.select());
        Ok(sqlx::query_as(&sql).bind(id).fetch_optional(self).await?)
    }

    async fn category_by_slug(&self, kind: CategoryKind, slug: &str) -> Result<Option<Category>> {
        let sql = format!("{} WHERE c.slug = $1", kind.select());
        Ok(sqlx::query_as(&sql).bind(slug).fetch_optional(self).await?)
    }

    async fn create_category(&self, kind: CategoryKind, term: NewTerm) -> Result<Category> {
        term.validate()?;
        let base = base_slug(term.slug.as_deref(), &term.name)?;

        let mut conn = self.acquire().await?;
        let slug = unique_slug(&mut conn, kind.scope(), &base, None).await?;
        let sql = format!(
            "INSERT INTO {} (name, slug, description) VALUES ($1, $2, $3) RETURNING id",
            kind.table()
        );
        let id: i64 = sqlx::query_scalar(&sql)
            .bind(term.name.trim())
            .bind(&slug)
            .bind(&term.description)
            .fetch_one(&mut *conn)
            .await?;
        drop(conn);

        tracing::info!(id, %slug, table = kind.table(), "category created");
        self.category_by_id(kind, id).await?.ok_or(Error::NotFound)
    }

    async fn update_category(&self, kind: CategoryKind, id: i64, patch: TermPatch) -> Result<Option<Category>> {
        patch.validate()?;

        let mut conn = self.acquire().await?;
        let mut update = UpdateSet::new(&format!("UPDATE {} SET updated_at = now()", kind.table()));
        if let Some(slug) = patch.slug {
            let slug = unique_slug(&mut conn, kind.scope(), &slug, Some(id)).await?;
            update.set("slug", slug);
        }
        update
            .set_some("name", patch.name.map(|name| name.trim().to_string()))
            .set_patch("description", patch.description);

        let result = update.where_id(id).build().execute(&mut *conn).await?;
        drop(conn);

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.category_by_id(kind, id).await
    }

    async fn delete_category(&self, kind: CategoryKind, id: i64) -> Result<bool> {
        if kind == CategoryKind::Directory {
            let listings: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM directory_listings WHERE category_id = $1")
                    .bind(id)
                    .fetch_one(self)
                    .await?;
            if listings > 0 {
                return Err(Error::Conflict(format!(
                    "directory category {id} still has {listings} listings"
                )));
            }
        }

        let sql = format!("DELETE FROM {} WHERE id = $1", kind.table());
        let result = sqlx::query(&sql).bind(id).execute(self).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        let sql = format!("{TAG_SELECT} ORDER BY t.name, t.id");
        Ok(sqlx::query_as(&sql).fetch_all(self).await?)
    }

    async fn tag_by_id(&self, id: i64) -> Result<Option<Tag>> {
        let sql = format!("{TAG_SELECT} WHERE t.id = $1");
        Ok(sqlx::query_as(&sql).bind(id).fetch_optional(self).await?)
    }

    async fn tag_by_slug(&self, slug: &str) -> Result<Option<Tag>> {
        let sql = format!("{TAG_SELECT} WHERE t.slug = $1");
        Ok(sqlx::query_as(&sql).bind(slug).fetch_optional(self).await?)
    }

    async fn create_tag(&self, term: NewTerm) -> Result<Tag> {
        term.validate()?;
        let base = base_slug(term.slug.as_deref(), &term.name)?;

        let mut conn = self.acquire().await?;
        let slug = unique_slug(&mut conn, SlugScope::BlogTag, &base, None).await?;
        let id: i64 = sqlx::query_scalar("INSERT INTO blog_tags (name, slug) VALUES ($1, $2) RETURNING id")
            .bind(term.name.trim())
            .bind(&slug)
            .fetch_one(&mut *conn)
            .await?;
        drop(conn);

        self.tag_by_id(id).await?.ok_or(Error::NotFound)
    }

    async fn update_tag(&self, id: i64, patch: TermPatch) -> Result<Option<Tag>> {
        patch.validate()?;

        let mut conn = self.acquire().await?;
        let slug = match patch.slug {
            Some(slug) => Some(unique_slug(&mut conn, SlugScope::BlogTag, &slug, Some(id)).await?),
            None => None,
        };
        let result = sqlx::query(
            "UPDATE blog_tags SET name = COALESCE($2, name), slug = COALESCE($3, slug) WHERE id = $1",
        )
        .bind(id)
        .bind(patch.name.as_deref().map(str::trim))
        .bind(slug)
        .execute(&mut *conn)
        .await?;
        drop(conn);

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.tag_by_id(id).await
    }

    async fn delete_tag(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blog_tags WHERE id = $1")
            .bind(id)
            .execute(self)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_kind_tables() {
        assert_eq!(CategoryKind::Blog.table(), "blog_categories");
        assert_eq!(CategoryKind::Directory.items_table(), "directory_listings");
        assert_eq!(CategoryKind::Directory.scope(), SlugScope::DirectoryCategory);

        let sql = CategoryKind::Blog.select();
        assert!(sql.contains("FROM blog_posts i WHERE i.category_id = c.id"));
        assert!(sql.contains("FROM blog_categories c"));
    }
}
