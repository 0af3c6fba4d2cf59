use sqlx::{PgConnection, QueryBuilder};

use super::{
    DBPool,
    bulk::{self, BulkOutcome},
    filter::{ListingFilter, Page, push_order},
    postgres::{UpdateSet, finish, lock_versioned},
    slugs::{SlugScope, base_slug, unique_slug},
};
use crate::{
    content::{DirectoryListing, ListingPatch, ListingRow, NewListing, Patch, codec},
    error::{Error, Result},
};

/// 商户查询的公共部分，商户表别名为 `l`
///
/// 评论数与平均分由 LATERAL 子查询汇总，没有评论时平均分为 `NULL`。
pub(crate) const LISTING_SELECT: &str = r#"
SELECT l.id, l.name, l.slug, l.category_id, c.name AS category_name,
       l.description, l.location, l.location_data, l.coordinates,
       l.website, l.phone, l.email, l.price_range, l.hours, l.images,
       l.featured, l.version, l.created_at, l.updated_at,
       COALESCE(r.review_count, 0) AS review_count, r.average_rating
FROM directory_listings l
LEFT JOIN directory_categories c ON c.id = l.category_id
LEFT JOIN LATERAL (
    SELECT COUNT(*) AS review_count, AVG(rating)::FLOAT8 AS average_rating
    FROM directory_reviews
    WHERE listing_id = l.id
) r ON TRUE
"#;

/// 商户存储
pub trait ListingStore: Send + Sync {
    fn list_listings(
        &self,
        filter: &ListingFilter,
    ) -> impl std::future::Future<Output = Result<Page<DirectoryListing>>> + Send;

    fn listing_by_id(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<DirectoryListing>>> + Send;

    fn listing_by_slug(
        &self,
        slug: &str,
    ) -> impl std::future::Future<Output = Result<Option<DirectoryListing>>> + Send;

    /// 新建商户，slug 冲突时自动追加后缀
    fn create_listing(
        &self,
        listing: NewListing,
    ) -> impl std::future::Future<Output = Result<DirectoryListing>> + Send;

    fn update_listing(
        &self,
        id: i64,
        patch: ListingPatch,
    ) -> impl std::future::Future<Output = Result<Option<DirectoryListing>>> + Send;

    /// 删除商户，评论与文章关联级联删除
    fn delete_listing(&self, id: i64) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn set_featured(
        &self,
        id: i64,
        featured: bool,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn bulk_set_featured(
        &self,
        ids: &[i64],
        featured: bool,
    ) -> impl std::future::Future<Output = BulkOutcome> + Send;

    fn bulk_delete_listings(&self, ids: &[i64]) -> impl std::future::Future<Output = BulkOutcome> + Send;
}

impl ListingStore for DBPool {
    async fn list_listings(&self, filter: &ListingFilter) -> Result<Page<DirectoryListing>> {
        let pagination = filter.pagination();
        let (field, direction) = filter.sort();

        let mut query = QueryBuilder::new(LISTING_SELECT);
        filter.push_predicate(&mut query);
        push_order(&mut query, "l", field, direction);
        pagination.push_to(&mut query);
        let rows = query.build_query_as::<ListingRow>().fetch_all(self).await?;

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM directory_listings l");
        filter.push_predicate(&mut count);
        let total = count.build_query_scalar::<i64>().fetch_one(self).await?;

        Ok(Page::new(rows, total, pagination).map(DirectoryListing::from))
    }

    async fn listing_by_id(&self, id: i64) -> Result<Option<DirectoryListing>> {
        let sql = format!("{LISTING_SELECT} WHERE l.id = $1");
        let row: Option<ListingRow> = sqlx::query_as(&sql).bind(id).fetch_optional(self).await?;
        Ok(row.map(DirectoryListing::from))
    }

    async fn listing_by_slug(&self, slug: &str) -> Result<Option<DirectoryListing>> {
        let sql = format!("{LISTING_SELECT} WHERE l.slug = $1");
        let row: Option<ListingRow> = sqlx::query_as(&sql).bind(slug).fetch_optional(self).await?;
        Ok(row.map(DirectoryListing::from))
    }

    async fn create_listing(&self, listing: NewListing) -> Result<DirectoryListing> {
        let listing = listing.normalize()?;

        let mut tx = self.begin().await?;
        let result = insert_listing(&mut tx, &listing).await;
        let id = finish(tx, result, "create listing").await?;

        tracing::info!(id, name = %listing.name, "listing created");
        self.listing_by_id(id).await?.ok_or(Error::NotFound)
    }

    async fn update_listing(&self, id: i64, patch: ListingPatch) -> Result<Option<DirectoryListing>> {
        let patch = patch.normalize()?;

        let mut tx = self.begin().await?;
        let result = apply_listing_patch(&mut tx, id, patch).await;
        if !finish(tx, result, "update listing").await? {
            return Ok(None);
        }
        self.listing_by_id(id).await
    }

    async fn delete_listing(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM directory_listings WHERE id = $1")
            .bind(id)
            .execute(self)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_featured(&self, id: i64, featured: bool) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE directory_listings
            SET featured = $2, updated_at = now(), version = version + 1
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(featured)
        .execute(self)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn bulk_set_featured(&self, ids: &[i64], featured: bool) -> BulkOutcome {
        bulk::run(ids, |id| self.set_featured(id, featured)).await
    }

    async fn bulk_delete_listings(&self, ids: &[i64]) -> BulkOutcome {
        bulk::run(ids, |id| self.delete_listing(id)).await
    }
}

async fn insert_listing(conn: &mut PgConnection, listing: &NewListing) -> Result<i64> {
    let base = base_slug(listing.slug.as_deref(), &listing.name)?;
    let slug = unique_slug(conn, SlugScope::Listing, &base, None).await?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO directory_listings (
            name, slug, category_id, description, location, location_data, coordinates,
            website, phone, email, price_range, hours, images, featured
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING id
        "#,
    )
    .bind(listing.name.trim())
    .bind(&slug)
    .bind(listing.category_id)
    .bind(&listing.description)
    .bind(&listing.location)
    .bind(codec::encode(listing.location_data.as_ref())?)
    .bind(listing.coordinates())
    .bind(&listing.website)
    .bind(&listing.phone)
    .bind(&listing.email)
    .bind(listing.price_range)
    .bind(codec::encode(listing.hours.as_ref())?)
    .bind(codec::encode(listing.images.as_ref())?)
    .bind(listing.featured)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

async fn apply_listing_patch(conn: &mut PgConnection, id: i64, patch: ListingPatch) -> Result<bool> {
    if !lock_versioned(conn, "directory_listings", id, patch.expected_version).await? {
        return Ok(false);
    }

    let mut update =
        UpdateSet::new("UPDATE directory_listings SET updated_at = now(), version = version + 1");
    if let Some(slug) = patch.slug {
        let slug = unique_slug(conn, SlugScope::Listing, &slug, Some(id)).await?;
        update.set("slug", slug);
    }

    // 坐标文本始终跟随结构化位置一起写入
    let coordinates = match &patch.location_data {
        Patch::Keep => Patch::Keep,
        Patch::Clear => Patch::Clear,
        Patch::Set(data) => data.coordinates().map_or(Patch::Clear, Patch::Set),
    };

    update
        .set_some("name", patch.name.map(|name| name.trim().to_string()))
        .set_some("category_id", patch.category_id)
        .set_some("description", patch.description)
        .set_some("location", patch.location.map(|location| location.trim().to_string()))
        .set_patch("location_data", codec::encode_patch(patch.location_data)?)
        .set_patch("coordinates", coordinates)
        .set_patch("website", patch.website)
        .set_patch("phone", patch.phone)
        .set_patch("email", patch.email)
        .set_patch("price_range", patch.price_range)
        .set_patch("hours", codec::encode_patch(patch.hours)?)
        .set_patch("images", codec::encode_patch(patch.images)?)
        .set_some("featured", patch.featured);

    update.where_id(id).build().execute(&mut *conn).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::LocationData;

    #[test]
    fn test_listing_patch_update_sql() {
        let patch: ListingPatch = serde_json::from_str(
            r#"{
                "location_data": { "lat": 1.5, "lng": 2.5, "address": "Ubud" },
                "website": null,
                "price_range": "$$"
            }"#,
        )
        .unwrap();
        let patch = patch.normalize().unwrap();
        assert!(matches!(
            patch.location_data,
            Patch::Set(LocationData { lat: Some(_), .. })
        ));

        let mut update =
            UpdateSet::new("UPDATE directory_listings SET updated_at = now(), version = version + 1");
        update
            .set_patch("location_data", codec::encode_patch(patch.location_data).unwrap())
            .set_patch("website", patch.website)
            .set_patch("price_range", patch.price_range)
            .set_patch("hours", codec::encode_patch(patch.hours).unwrap());
        assert_eq!(update.columns(), 3);

        let builder = update.where_id(9);
        let sql = builder.sql();
        assert!(sql.contains("location_data = $1, website = $2, price_range = $3"), "{sql}");
        assert!(sql.ends_with("WHERE id = $4"), "{sql}");
    }
}
