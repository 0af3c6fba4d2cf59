use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use axum_extra::extract::Query;
use serde::Deserialize;

use crate::{
    content::{BlogPost, DirectoryListing, ListingPatch, NewListing},
    error::{Error, Result},
    state::AppState,
    storage::{BulkOutcome, DBPool, LinkStore, ListingFilter, ListingStore, Page},
};

/// 公开的商户接口。
///
/// - `GET /listings`：商户列表
/// - `GET /listings/{slug}`：商户详情，附带评分汇总
/// - `GET /listings/{slug}/posts`：提到该商户的已发布文章
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/listings", get(list))
        .route("/listings/{slug}", get(by_slug))
        .route("/listings/{slug}/posts", get(listing_posts))
}

/// 商户管理接口。
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/listings", get(list).post(create))
        .route("/listings/bulk/feature", post(bulk_feature))
        .route("/listings/bulk/delete", post(bulk_delete))
        .route("/listings/{id}", get(get_one).put(update).delete(remove))
        .route("/listings/{id}/featured", put(set_featured))
}

async fn list(
    Query(filter): Query<ListingFilter>,
    State(pool): State<DBPool>,
) -> Result<Json<Page<DirectoryListing>>> {
    pool.list_listings(&filter).await.map(Json)
}

async fn by_slug(Path(slug): Path<String>, State(pool): State<DBPool>) -> Result<Json<DirectoryListing>> {
    pool.listing_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or(Error::NotFound)
}

async fn listing_posts(Path(slug): Path<String>, State(pool): State<DBPool>) -> Result<Json<Vec<BlogPost>>> {
    let listing = pool.listing_by_slug(&slug).await?.ok_or(Error::NotFound)?;
    pool.posts_for_listing(listing.id, true).await.map(Json)
}

async fn get_one(Path(id): Path<i64>, State(pool): State<DBPool>) -> Result<Json<DirectoryListing>> {
    pool.listing_by_id(id).await?.map(Json).ok_or(Error::NotFound)
}

async fn create(
    State(pool): State<DBPool>,
    Json(listing): Json<NewListing>,
) -> Result<(StatusCode, Json<DirectoryListing>)> {
    let listing = pool.create_listing(listing).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

async fn update(
    Path(id): Path<i64>,
    State(pool): State<DBPool>,
    Json(patch): Json<ListingPatch>,
) -> Result<Json<DirectoryListing>> {
    pool.update_listing(id, patch)
        .await?
        .map(Json)
        .ok_or(Error::NotFound)
}

async fn remove(Path(id): Path<i64>, State(pool): State<DBPool>) -> Result<StatusCode> {
    match pool.delete_listing(id).await? {
        true => Ok(StatusCode::NO_CONTENT),
        false => Err(Error::NotFound),
    }
}

#[derive(Debug, Deserialize)]
struct Featured {
    featured: bool,
}

async fn set_featured(
    Path(id): Path<i64>,
    State(pool): State<DBPool>,
    Json(body): Json<Featured>,
) -> Result<Json<DirectoryListing>> {
    if !pool.set_featured(id, body.featured).await? {
        return Err(Error::NotFound);
    }
    pool.listing_by_id(id).await?.map(Json).ok_or(Error::NotFound)
}

#[derive(Debug, Deserialize)]
struct BulkRequest {
    ids: Vec<i64>,
    #[serde(default = "default_featured")]
    featured: bool,
}

fn default_featured() -> bool {
    true
}

/// 全部成功返回 200，部分失败返回 207
fn bulk_response(outcome: BulkOutcome) -> (StatusCode, Json<BulkOutcome>) {
    let status = match outcome.complete {
        true => StatusCode::OK,
        false => StatusCode::MULTI_STATUS,
    };
    (status, Json(outcome))
}

async fn bulk_feature(
    State(pool): State<DBPool>,
    Json(body): Json<BulkRequest>,
) -> (StatusCode, Json<BulkOutcome>) {
    bulk_response(pool.bulk_set_featured(&body.ids, body.featured).await)
}

async fn bulk_delete(
    State(pool): State<DBPool>,
    Json(body): Json<BulkRequest>,
) -> (StatusCode, Json<BulkOutcome>) {
    bulk_response(pool.bulk_delete_listings(&body.ids).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::BulkFailure;

    #[test]
    fn test_bulk_response_status() {
        let complete = BulkOutcome {
            succeeded: vec![1, 2],
            failed: vec![],
            complete: true,
        };
        assert_eq!(bulk_response(complete).0, StatusCode::OK);

        let partial = BulkOutcome {
            succeeded: vec![1, 2],
            failed: vec![BulkFailure {
                id: 3,
                error: "Not Found".into(),
            }],
            complete: false,
        };
        assert_eq!(bulk_response(partial).0, StatusCode::MULTI_STATUS);
    }

    #[test]
    fn test_bulk_request_defaults_to_feature() {
        let body: BulkRequest = serde_json::from_str(r#"{"ids": [1, 2]}"#).unwrap();
        assert!(body.featured);
        assert_eq!(body.ids, vec![1, 2]);
    }
}
