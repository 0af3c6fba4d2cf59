use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    content::{DirectoryReview, NewReport, NewResponse, NewReview, RatingSummary, ReviewReport, ReviewResponse},
    error::{Error, Result},
    state::AppState,
    storage::{DBPool, ListingStore, ReviewStore},
};

/// 公开的评论接口。
///
/// - `GET|POST /listings/{slug}/reviews`：评论列表与提交
/// - `GET /listings/{slug}/rating`：评分汇总
/// - `POST /reviews/{id}/helpful`：有用计数加一或减一
/// - `POST /reviews/{id}/report`：举报
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/listings/{slug}/reviews", get(list).post(create))
        .route("/listings/{slug}/rating", get(rating))
        .route("/reviews/{id}/helpful", post(helpful))
        .route("/reviews/{id}/report", post(report))
}

/// 评论管理接口。
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews/reports", get(reports))
        .route("/reviews/{id}", axum::routing::delete(remove))
        .route("/reviews/{id}/response", put(respond))
}

async fn listing_id(pool: &DBPool, slug: &str) -> Result<i64> {
    pool.listing_by_slug(slug)
        .await?
        .map(|listing| listing.id)
        .ok_or(Error::NotFound)
}

async fn list(Path(slug): Path<String>, State(pool): State<DBPool>) -> Result<Json<Vec<DirectoryReview>>> {
    let id = listing_id(&pool, &slug).await?;
    pool.reviews_for_listing(id)
        .await?
        .map(Json)
        .ok_or(Error::NotFound)
}

async fn create(
    Path(slug): Path<String>,
    State(pool): State<DBPool>,
    Json(review): Json<NewReview>,
) -> Result<(StatusCode, Json<DirectoryReview>)> {
    let id = listing_id(&pool, &slug).await?;
    let review = pool.create_review(id, review).await?.ok_or(Error::NotFound)?;
    Ok((StatusCode::CREATED, Json(review)))
}

async fn rating(Path(slug): Path<String>, State(pool): State<DBPool>) -> Result<Json<RatingSummary>> {
    let id = listing_id(&pool, &slug).await?;
    pool.rating_summary(id).await.map(Json)
}

#[derive(Debug, Deserialize)]
struct Helpful {
    #[serde(default = "default_increment")]
    increment: bool,
}

fn default_increment() -> bool {
    true
}

async fn helpful(
    Path(id): Path<i64>,
    State(pool): State<DBPool>,
    Json(body): Json<Helpful>,
) -> Result<Json<Value>> {
    let count = pool
        .toggle_helpful(id, body.increment)
        .await?
        .ok_or(Error::NotFound)?;
    Ok(Json(json!({ "id": id, "helpful_count": count })))
}

async fn report(
    Path(id): Path<i64>,
    State(pool): State<DBPool>,
    Json(body): Json<NewReport>,
) -> Result<(StatusCode, Json<ReviewReport>)> {
    let report = pool.report(id, body).await?.ok_or(Error::NotFound)?;
    Ok((StatusCode::CREATED, Json(report)))
}

async fn respond(
    Path(id): Path<i64>,
    State(pool): State<DBPool>,
    Json(body): Json<NewResponse>,
) -> Result<Json<ReviewResponse>> {
    pool.respond(id, body).await?.map(Json).ok_or(Error::NotFound)
}

async fn remove(Path(id): Path<i64>, State(pool): State<DBPool>) -> Result<StatusCode> {
    match pool.delete_review(id).await? {
        true => Ok(StatusCode::NO_CONTENT),
        false => Err(Error::NotFound),
    }
}

async fn reports(State(pool): State<DBPool>) -> Result<Json<Vec<ReviewReport>>> {
    pool.reports().await.map(Json)
}
