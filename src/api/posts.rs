use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use axum_extra::extract::Query;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    content::{BlogPost, DirectoryListing, NewPost, PostPatch},
    error::{Error, Result},
    state::AppState,
    storage::{DBPool, LinkStore, Page, PostFilter, PostStore},
};

/// 公开的文章接口，只返回已发布的文章。
///
/// - `GET /posts`：文章列表
/// - `GET /posts/{slug}`：单篇文章，浏览数加一
/// - `GET /posts/{slug}/listings`：文章中提到的商户
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(published_list))
        .route("/posts/{slug}", get(published_post))
        .route("/posts/{slug}/listings", get(post_listings))
}

/// 文章管理接口。
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list).post(create))
        .route("/posts/publish-due", post(publish_due))
        .route("/posts/{id}", get(get_one).put(update).delete(remove))
        .route("/posts/{id}/tags", put(set_tags))
        .route("/posts/{id}/listings/{listing_id}", put(link).delete(unlink))
}

async fn published_list(
    Query(mut filter): Query<PostFilter>,
    State(pool): State<DBPool>,
) -> Result<Json<Page<BlogPost>>> {
    filter.published = Some(true);
    filter.status = None;
    pool.list_posts(&filter).await.map(Json)
}

/// 草稿与定时文章对外视为不存在。
async fn published_post(Path(slug): Path<String>, State(pool): State<DBPool>) -> Result<Json<BlogPost>> {
    pool.post_by_slug(&slug, true)
        .await?
        .filter(|post| post.published)
        .map(Json)
        .ok_or(Error::NotFound)
}

async fn post_listings(
    Path(slug): Path<String>,
    State(pool): State<DBPool>,
) -> Result<Json<Vec<DirectoryListing>>> {
    let post = pool
        .post_by_slug(&slug, false)
        .await?
        .filter(|post| post.published)
        .ok_or(Error::NotFound)?;
    pool.listings_for_post(post.id).await.map(Json)
}

async fn list(Query(filter): Query<PostFilter>, State(pool): State<DBPool>) -> Result<Json<Page<BlogPost>>> {
    pool.list_posts(&filter).await.map(Json)
}

async fn get_one(Path(id): Path<i64>, State(pool): State<DBPool>) -> Result<Json<BlogPost>> {
    pool.post_by_id(id).await?.map(Json).ok_or(Error::NotFound)
}

async fn create(
    State(pool): State<DBPool>,
    Json(post): Json<NewPost>,
) -> Result<(StatusCode, Json<BlogPost>)> {
    let post = pool.create_post(post).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn update(
    Path(id): Path<i64>,
    State(pool): State<DBPool>,
    Json(patch): Json<PostPatch>,
) -> Result<Json<BlogPost>> {
    pool.update_post(id, patch)
        .await?
        .map(Json)
        .ok_or(Error::NotFound)
}

async fn remove(Path(id): Path<i64>, State(pool): State<DBPool>) -> Result<StatusCode> {
    match pool.delete_post(id).await? {
        true => Ok(StatusCode::NO_CONTENT),
        false => Err(Error::NotFound),
    }
}

#[derive(Debug, Deserialize)]
struct TagIds {
    tag_ids: Vec<i64>,
}

async fn set_tags(
    Path(id): Path<i64>,
    State(pool): State<DBPool>,
    Json(body): Json<TagIds>,
) -> Result<Json<BlogPost>> {
    pool.set_post_tags(id, body.tag_ids)
        .await?
        .map(Json)
        .ok_or(Error::NotFound)
}

/// 由外部定时任务调用，发布所有到期的定时文章。
async fn publish_due(State(pool): State<DBPool>) -> Result<Json<Value>> {
    let ids = pool.publish_due_posts(Utc::now()).await?;
    Ok(Json(json!({ "published": ids })))
}

async fn link(
    Path((id, listing_id)): Path<(i64, i64)>,
    State(pool): State<DBPool>,
) -> Result<StatusCode> {
    pool.link_post_listing(id, listing_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn unlink(
    Path((id, listing_id)): Path<(i64, i64)>,
    State(pool): State<DBPool>,
) -> Result<StatusCode> {
    match pool.unlink_post_listing(id, listing_id).await? {
        true => Ok(StatusCode::NO_CONTENT),
        false => Err(Error::NotFound),
    }
}
