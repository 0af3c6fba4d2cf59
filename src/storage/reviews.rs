use super::DBPool;
use crate::{
    content::{DirectoryReview, NewReport, NewResponse, NewReview, RatingSummary, ReviewReport, ReviewResponse},
    error::Result,
};

/// 评论查询的公共部分，商家回复以 JSON 形式内嵌
const REVIEW_SELECT: &str = r#"
SELECT r.id, r.listing_id, r.user_id, r.user_name, r.rating, r.content,
       r.helpful_count, r.created_at, r.updated_at,
       (SELECT to_jsonb(rr) FROM directory_review_responses rr WHERE rr.review_id = r.id) AS response
FROM directory_reviews r
"#;

/// 商户评论存储
///
/// 评论、回复与举报都挂在商户或评论之下，父记录不存在时返回 `None`。
pub trait ReviewStore: Send + Sync {
    fn create_review(
        &self,
        listing_id: i64,
        review: NewReview,
    ) -> impl std::future::Future<Output = Result<Option<DirectoryReview>>> + Send;

    /// 商户的全部评论，新评论在前
    fn reviews_for_listing(
        &self,
        listing_id: i64,
    ) -> impl std::future::Future<Output = Result<Option<Vec<DirectoryReview>>>> + Send;

    fn review_by_id(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<DirectoryReview>>> + Send;

    /// 调整有用计数，计数不会小于 0，返回新的计数
    fn toggle_helpful(
        &self,
        review_id: i64,
        increment: bool,
    ) -> impl std::future::Future<Output = Result<Option<i32>>> + Send;

    /// 商家回复，已有回复时覆盖
    fn respond(
        &self,
        review_id: i64,
        response: NewResponse,
    ) -> impl std::future::Future<Output = Result<Option<ReviewResponse>>> + Send;

    fn report(
        &self,
        review_id: i64,
        report: NewReport,
    ) -> impl std::future::Future<Output = Result<Option<ReviewReport>>> + Send;

    fn delete_review(&self, id: i64) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// 全部举报，新举报在前
    fn reports(&self) -> impl std::future::Future<Output = Result<Vec<ReviewReport>>> + Send;

    fn rating_summary(
        &self,
        listing_id: i64,
    ) -> impl std::future::Future<Output = Result<RatingSummary>> + Send;
}

impl ReviewStore for DBPool {
    async fn create_review(&self, listing_id: i64, review: NewReview) -> Result<Option<DirectoryReview>> {
        let rating = review.validate()?;

        let id: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO directory_reviews (listing_id, user_id, user_name, rating, content)
            SELECT $1, $2, $3, $4, $5
            WHERE EXISTS (SELECT 1 FROM directory_listings WHERE id = $1)
            RETURNING id
            "#,
        )
        .bind(listing_id)
        .bind(review.user_id)
        .bind(review.user_name.trim())
        .bind(rating.get())
        .bind(review.content.trim())
        .fetch_optional(self)
        .await?;

        let Some(id) = id else {
            return Ok(None);
        };
        tracing::info!(id, listing_id, rating = rating.get(), "review created");
        self.review_by_id(id).await
    }

    async fn reviews_for_listing(&self, listing_id: i64) -> Result<Option<Vec<DirectoryReview>>> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM directory_listings WHERE id = $1)")
                .bind(listing_id)
                .fetch_one(self)
                .await?;
        if !exists {
            return Ok(None);
        }

        let sql = format!("{REVIEW_SELECT} WHERE r.listing_id = $1 ORDER BY r.created_at DESC, r.id DESC");
        let reviews: Vec<DirectoryReview> = sqlx::query_as(&sql).bind(listing_id).fetch_all(self).await?;
        Ok(Some(reviews))
    }

    async fn review_by_id(&self, id: i64) -> Result<Option<DirectoryReview>> {
        let sql = format!("{REVIEW_SELECT} WHERE r.id = $1");
        Ok(sqlx::query_as(&sql).bind(id).fetch_optional(self).await?)
    }

    async fn toggle_helpful(&self, review_id: i64, increment: bool) -> Result<Option<i32>> {
        let delta: i32 = if increment { 1 } else { -1 };
        Ok(sqlx::query_scalar(
            r#"
            UPDATE directory_reviews
            SET helpful_count = GREATEST(helpful_count + $2, 0), updated_at = now()
            WHERE id = $1
            RETURNING helpful_count
            "#,
        )
        .bind(review_id)
        .bind(delta)
        .fetch_optional(self)
        .await?)
    }

    async fn respond(&self, review_id: i64, response: NewResponse) -> Result<Option<ReviewResponse>> {
        response.validate()?;

        Ok(sqlx::query_as(
            r#"
            INSERT INTO directory_review_responses (review_id, content, respondent_name)
            SELECT $1, $2, $3
            WHERE EXISTS (SELECT 1 FROM directory_reviews WHERE id = $1)
            ON CONFLICT (review_id) DO UPDATE
            SET content = EXCLUDED.content,
                respondent_name = EXCLUDED.respondent_name,
                created_at = now()
            RETURNING id, review_id, content, respondent_name, created_at
            "#,
        )
        .bind(review_id)
        .bind(response.content.trim())
        .bind(response.respondent_name.trim())
        .fetch_optional(self)
        .await?)
    }

    async fn report(&self, review_id: i64, report: NewReport) -> Result<Option<ReviewReport>> {
        report.validate()?;

        let report: Option<ReviewReport> = sqlx::query_as(
            r#"
            INSERT INTO directory_review_reports (review_id, user_id, reason)
            SELECT $1, $2, $3
            WHERE EXISTS (SELECT 1 FROM directory_reviews WHERE id = $1)
            RETURNING id, review_id, user_id, reason, reported_at
            "#,
        )
        .bind(review_id)
        .bind(report.user_id)
        .bind(report.reason.trim())
        .fetch_optional(self)
        .await?;

        if let Some(report) = &report {
            tracing::warn!(review_id, report_id = report.id, "review reported");
        }
        Ok(report)
    }

    async fn delete_review(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM directory_reviews WHERE id = $1")
            .bind(id)
            .execute(self)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn reports(&self) -> Result<Vec<ReviewReport>> {
        Ok(sqlx::query_as(
            r#"
            SELECT id, review_id, user_id, reason, reported_at
            FROM directory_review_reports
            ORDER BY reported_at DESC, id DESC
            "#,
        )
        .fetch_all(self)
        .await?)
    }

    async fn rating_summary(&self, listing_id: i64) -> Result<RatingSummary> {
        Ok(sqlx::query_as(
            r#"
            SELECT COUNT(*) AS review_count, AVG(rating)::FLOAT8 AS average_rating
            FROM directory_reviews
            WHERE listing_id = $1
            "#,
        )
        .bind(listing_id)
        .fetch_one(self)
        .await?)
    }
}
